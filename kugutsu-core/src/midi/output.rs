use std::sync::Mutex;

use midir::{MidiOutput, MidiOutputConnection};

use super::{find_port, MidiError, CLIENT_NAME};
use crate::sink::{OutputSink, SinkError, SinkResult};

/// [`OutputSink`] on a midir output connection.
pub struct MidirSink {
    connection: Mutex<MidiOutputConnection>,
    port_name: String,
}

impl MidirSink {
    /// Connect to the first output port whose name contains `port_hint`,
    /// else open a virtual output named `virtual_name` where supported.
    pub fn connect(port_hint: &str, virtual_name: &str) -> Result<Self, MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError(e.to_string()))?;
        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();
        log::debug!(target: "midi", "output ports: {:?}", names);

        let (connection, port_name) = match find_port(&names, port_hint) {
            Some(index) => {
                let conn = midi_out
                    .connect(&ports[index], "kugutsu-output")
                    .map_err(|e| MidiError(e.to_string()))?;
                (conn, names[index].clone())
            }
            None => (open_virtual(midi_out, virtual_name)?, virtual_name.to_string()),
        };
        log::info!(target: "midi", "output: {}", port_name);

        Ok(Self {
            connection: Mutex::new(connection),
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&self, message: &[u8]) -> SinkResult {
        let mut conn = self.connection.lock().unwrap_or_else(|e| e.into_inner());
        conn.send(message)
            .map_err(|e| SinkError(format!("{}: {}", self.port_name, e)))
    }
}

#[cfg(unix)]
fn open_virtual(midi_out: MidiOutput, virtual_name: &str) -> Result<MidiOutputConnection, MidiError> {
    use midir::os::unix::VirtualOutput;

    midi_out
        .create_virtual(virtual_name)
        .map_err(|e| MidiError(e.to_string()))
}

#[cfg(not(unix))]
fn open_virtual(_midi_out: MidiOutput, virtual_name: &str) -> Result<MidiOutputConnection, MidiError> {
    Err(MidiError(format!(
        "no matching output port and virtual port {} is unsupported here",
        virtual_name
    )))
}

impl OutputSink for MidirSink {
    fn note_on(&self, channel: u8, pitch: u8, velocity: u8) -> SinkResult {
        self.send(&[0x90 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F])
    }

    fn note_off(&self, channel: u8, pitch: u8) -> SinkResult {
        self.send(&[0x80 | (channel & 0x0F), pitch & 0x7F, 0])
    }

    fn control_change(&self, channel: u8, controller: u8, value: u8) -> SinkResult {
        self.send(&[0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F])
    }
}
