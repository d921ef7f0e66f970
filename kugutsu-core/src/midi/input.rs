use std::sync::Arc;

use midir::{Ignore, MidiInput, MidiInputConnection};

use super::{find_port, MidiError, CLIENT_NAME};
use crate::density::DensityTracker;

/// Live connection from an input port into a [`DensityTracker`].
///
/// midir invokes the callback on its own thread; every raw message goes
/// straight to `DensityTracker::on_midi`, which drops anything that is not a
/// note message.
pub struct MidiActivitySource {
    connection: Option<MidiInputConnection<()>>,
    port_name: String,
}

impl MidiActivitySource {
    /// Connect to the first input port whose name contains `port_hint`. If
    /// none matches, open a virtual input named `virtual_name` where the
    /// platform supports it.
    pub fn connect(
        port_hint: &str,
        virtual_name: &str,
        tracker: Arc<DensityTracker>,
    ) -> Result<Self, MidiError> {
        let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_in.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();
        log::debug!(target: "midi", "input ports: {:?}", names);

        let callback = move |_timestamp: u64, message: &[u8], _: &mut ()| {
            tracker.on_midi(message);
        };

        if let Some(index) = find_port(&names, port_hint) {
            let connection = midi_in
                .connect(&ports[index], "kugutsu-input", callback, ())
                .map_err(|e| MidiError(e.to_string()))?;
            log::info!(target: "midi", "activity input: {}", names[index]);
            return Ok(Self {
                connection: Some(connection),
                port_name: names[index].clone(),
            });
        }

        Self::open_virtual(midi_in, virtual_name, callback)
    }

    #[cfg(unix)]
    fn open_virtual<F>(midi_in: MidiInput, virtual_name: &str, callback: F) -> Result<Self, MidiError>
    where
        F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
    {
        use midir::os::unix::VirtualInput;

        let connection = midi_in
            .create_virtual(virtual_name, callback, ())
            .map_err(|e| MidiError(e.to_string()))?;
        log::info!(target: "midi", "activity input not found, opened virtual port {}", virtual_name);
        Ok(Self {
            connection: Some(connection),
            port_name: virtual_name.to_string(),
        })
    }

    #[cfg(not(unix))]
    fn open_virtual<F>(_midi_in: MidiInput, virtual_name: &str, _callback: F) -> Result<Self, MidiError>
    where
        F: FnMut(u64, &[u8], &mut ()) + Send + 'static,
    {
        Err(MidiError(format!(
            "no matching input port and virtual port {} is unsupported here",
            virtual_name
        )))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            log::info!(target: "midi", "activity input {} closed", self.port_name);
        }
    }
}

impl Drop for MidiActivitySource {
    fn drop(&mut self) {
        self.disconnect();
    }
}
