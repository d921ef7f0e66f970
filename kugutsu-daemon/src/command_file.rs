//! File-based transport control: an external process writes `start` or
//! `stop` into a well-known file and the daemon polls it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kugutsu_core::playback::PlaybackController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
}

impl Command {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            _ => None,
        }
    }

    /// Drive the controller. Both transitions are no-ops when already in
    /// the requested state.
    pub fn apply(self, controller: &PlaybackController) -> bool {
        match self {
            Command::Start => controller.start(),
            Command::Stop => controller.stop(),
        }
    }
}

pub struct CommandFile {
    path: PathBuf,
    last_unknown: Option<String>,
}

impl CommandFile {
    /// Take over `path`, resetting it to `stop` so a stale `start` from a
    /// previous run does not start playback.
    pub fn init(path: &Path) -> io::Result<Self> {
        fs::write(path, "stop\n")?;
        log::info!(target: "control", "watching {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            last_unknown: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current command. An unreadable file means stop; unknown contents
    /// mean no command.
    pub fn poll(&mut self) -> Option<Command> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                log::debug!(target: "control", "{} unreadable ({}), treating as stop", self.path.display(), e);
                return Some(Command::Stop);
            }
        };

        let token = contents.trim();
        match Command::parse(token) {
            Some(cmd) => {
                self.last_unknown = None;
                Some(cmd)
            }
            None => {
                if self.last_unknown.as_deref() != Some(token) {
                    log::debug!(target: "control", "ignoring unknown command {:?}", token);
                    self.last_unknown = Some(token.to_string());
                }
                None
            }
        }
    }
}
