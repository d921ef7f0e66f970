//! MIDI port plumbing over midir: the activity input and the output sink.

mod input;
mod output;

use std::fmt;

use midir::{MidiInput, MidiOutput};

pub use input::MidiActivitySource;
pub use output::MidirSink;

const CLIENT_NAME: &str = "kugutsu";

/// Port discovery or connection failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiError(pub String);

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MidiError {}

impl From<String> for MidiError {
    fn from(s: String) -> Self {
        MidiError(s)
    }
}

/// Information about an available MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

pub fn list_input_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError(e.to_string()))?;
    Ok(midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_in.port_name(port).ok().map(|name| MidiPortInfo { index, name })
        })
        .collect())
}

pub fn list_output_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError(e.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_out.port_name(port).ok().map(|name| MidiPortInfo { index, name })
        })
        .collect())
}

/// Index of the first port whose name contains `hint`.
pub(crate) fn find_port(names: &[String], hint: &str) -> Option<usize> {
    if hint.is_empty() {
        return None;
    }
    names.iter().position(|name| name.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_first_substring_match() {
        let ports = names(&["Midi Through", "SuperCollider:in0", "SuperCollider:in1"]);
        assert_eq!(find_port(&ports, "SuperCollider"), Some(1));
    }

    #[test]
    fn no_match_is_none() {
        let ports = names(&["Midi Through"]);
        assert_eq!(find_port(&ports, "Game of Life"), None);
    }

    #[test]
    fn empty_hint_matches_nothing() {
        let ports = names(&["Midi Through"]);
        assert_eq!(find_port(&ports, ""), None);
    }
}
