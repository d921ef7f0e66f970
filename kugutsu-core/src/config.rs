//! TOML configuration: an embedded default file overlaid by an optional
//! user file, then validated into an [`EngineConfig`].

use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use kugutsu_types::{DrumMap, GrooveSettings, Voicing, MIDI_CHANNELS, STEPS_PER_BAR};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Accepted tempo range in bpm.
pub const TEMPO_RANGE: RangeInclusive<f32> = 1.0..=1000.0;

/// Configuration that cannot drive the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse { source: String, message: String },
    InvalidTempo(f32),
    ChannelOutOfRange { name: &'static str, value: u8 },
    SwingOutOfRange { amount: f32, jitter: f32 },
    SmoothingOutOfRange(f32),
    ZeroHitDuration,
    ZeroSaturation,
    EmptyScale,
    NoteOutOfRange(u8),
    UnknownVoicing(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read config {}: {}", path.display(), message)
            }
            ConfigError::Parse { source, message } => {
                write!(f, "malformed config {}: {}", source, message)
            }
            ConfigError::InvalidTempo(bpm) => write!(
                f,
                "tempo must be within {}..={} bpm, got {}",
                TEMPO_RANGE.start(),
                TEMPO_RANGE.end(),
                bpm
            ),
            ConfigError::ChannelOutOfRange { name, value } => {
                write!(f, "{} must be in 0..{}, got {}", name, MIDI_CHANNELS, value)
            }
            ConfigError::SwingOutOfRange { amount, jitter } => write!(
                f,
                "swing amount {} and jitter {} must be non-negative and sum below one step",
                amount, jitter
            ),
            ConfigError::SmoothingOutOfRange(s) => {
                write!(f, "energy smoothing must be within [0, 1], got {}", s)
            }
            ConfigError::ZeroHitDuration => write!(f, "step hit duration must be non-zero"),
            ConfigError::ZeroSaturation => write!(f, "saturation density must be non-zero"),
            ConfigError::EmptyScale => write!(f, "scale voicing needs at least one note"),
            ConfigError::NoteOutOfRange(n) => write!(f, "note {} is outside 0..128", n),
            ConfigError::UnknownVoicing(mode) => {
                write!(f, "unknown voicing mode {:?} (expected \"drums\" or \"scale\")", mode)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Beats per minute.
    pub tempo: f32,
    /// Activity channel filter; `None` accepts every channel.
    pub channel_in: Option<u8>,
    pub channel_out: u8,
    /// Delay before each hit's note-off.
    pub step_hit_duration: Duration,
    pub groove: GrooveSettings,
    pub density_jump_threshold: u32,
    /// Weight of the new target in the per-bar energy update.
    pub energy_smoothing: f32,
    /// Density that maps to energy 1.0.
    pub saturation_density: u32,
    /// RNG seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    pub voicing: Voicing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo: 75.0,
            channel_in: Some(0),
            channel_out: 9,
            step_hit_duration: Duration::from_millis(40),
            groove: GrooveSettings::default(),
            density_jump_threshold: 3,
            energy_smoothing: 0.3,
            saturation_density: 6,
            seed: None,
            voicing: Voicing::default(),
        }
    }
}

impl EngineConfig {
    /// Duration of one sixteenth step at the configured tempo.
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.tempo as f64 / 4.0)
    }

    /// Nominal bar length: sixteen steps.
    pub fn bar_duration(&self) -> Duration {
        self.step_duration() * STEPS_PER_BAR as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TEMPO_RANGE.contains(&self.tempo) {
            return Err(ConfigError::InvalidTempo(self.tempo));
        }
        if let Some(ch) = self.channel_in {
            if ch >= MIDI_CHANNELS {
                return Err(ConfigError::ChannelOutOfRange { name: "channel_in", value: ch });
            }
        }
        if self.channel_out >= MIDI_CHANNELS {
            return Err(ConfigError::ChannelOutOfRange {
                name: "channel_out",
                value: self.channel_out,
            });
        }
        let GrooveSettings { swing_amount, swing_jitter } = self.groove;
        if !(swing_amount >= 0.0 && swing_jitter >= 0.0 && self.groove.max_fraction() < 1.0) {
            return Err(ConfigError::SwingOutOfRange {
                amount: swing_amount,
                jitter: swing_jitter,
            });
        }
        if !(0.0..=1.0).contains(&self.energy_smoothing) {
            return Err(ConfigError::SmoothingOutOfRange(self.energy_smoothing));
        }
        if self.step_hit_duration.is_zero() {
            return Err(ConfigError::ZeroHitDuration);
        }
        if self.saturation_density == 0 {
            return Err(ConfigError::ZeroSaturation);
        }
        match &self.voicing {
            Voicing::Drums(map) => {
                for voice in kugutsu_types::Voice::all() {
                    check_note(map.note(*voice))?;
                }
            }
            Voicing::Scale(notes) => {
                if notes.is_empty() {
                    return Err(ConfigError::EmptyScale);
                }
                for n in notes {
                    check_note(*n)?;
                }
            }
        }
        Ok(())
    }
}

fn check_note(note: u8) -> Result<(), ConfigError> {
    if note >= 128 {
        Err(ConfigError::NoteOutOfRange(note))
    } else {
        Ok(())
    }
}

/// MIDI port selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    /// Substring of the activity input port name.
    pub input: String,
    /// Substring of the output port name.
    pub output: String,
    /// Name for the virtual input opened when `input` is not found.
    pub virtual_input: String,
    /// Name for the virtual output opened when `output` is not found.
    pub virtual_output: String,
}

/// External control surface settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    pub command_file: PathBuf,
    pub poll_interval: Duration,
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineSection,
    #[serde(default)]
    voicing: VoicingSection,
    #[serde(default)]
    ports: PortsSection,
    #[serde(default)]
    control: ControlSection,
}

#[derive(Deserialize, Default)]
struct EngineSection {
    tempo: Option<f32>,
    channel_in: Option<u8>,
    omni: Option<bool>,
    channel_out: Option<u8>,
    step_hit_duration_ms: Option<u64>,
    swing_amount: Option<f32>,
    swing_jitter: Option<f32>,
    density_jump_threshold: Option<u32>,
    energy_smoothing: Option<f32>,
    saturation_density: Option<u32>,
    seed: Option<u64>,
}

#[derive(Deserialize, Default)]
struct VoicingSection {
    mode: Option<String>,
    scale: Option<Vec<u8>>,
    drums: Option<DrumMap>,
}

#[derive(Deserialize, Default)]
struct PortsSection {
    input: Option<String>,
    output: Option<String>,
    virtual_input: Option<String>,
    virtual_output: Option<String>,
}

#[derive(Deserialize, Default)]
struct ControlSection {
    command_file: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
}

/// Merged configuration file contents.
pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Embedded defaults overlaid by the user config, if one exists.
    /// A malformed or unreadable user file is logged and ignored.
    pub fn load() -> Result<Self, ConfigError> {
        let mut base = parse(DEFAULT_CONFIG, "<embedded>")?;

        if let Some(path) = user_config_path() {
            if path.exists() {
                match read_file(&path) {
                    Ok(user) => merge(&mut base, user),
                    Err(e) => log::warn!(target: "config", "ignoring user config: {}", e),
                }
            }
        }

        Ok(Config { file: base })
    }

    /// Embedded defaults overlaid by an explicitly named file. Unlike
    /// [`Config::load`], problems with the named file are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut base = parse(DEFAULT_CONFIG, "<embedded>")?;
        merge(&mut base, read_file(path)?);
        Ok(Config { file: base })
    }

    /// Embedded defaults overlaid by TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut base = parse(DEFAULT_CONFIG, "<embedded>")?;
        merge(&mut base, parse(contents, "<string>")?);
        Ok(Config { file: base })
    }

    /// Build and validate the engine parameters.
    pub fn engine(&self) -> Result<EngineConfig, ConfigError> {
        let fallback = EngineConfig::default();
        let e = &self.file.engine;
        let channel_in = if e.omni.unwrap_or(false) {
            None
        } else {
            e.channel_in.or(fallback.channel_in)
        };

        let config = EngineConfig {
            tempo: e.tempo.unwrap_or(fallback.tempo),
            channel_in,
            channel_out: e.channel_out.unwrap_or(fallback.channel_out),
            step_hit_duration: e
                .step_hit_duration_ms
                .map(Duration::from_millis)
                .unwrap_or(fallback.step_hit_duration),
            groove: GrooveSettings {
                swing_amount: e.swing_amount.unwrap_or(fallback.groove.swing_amount),
                swing_jitter: e.swing_jitter.unwrap_or(fallback.groove.swing_jitter),
            },
            density_jump_threshold: e
                .density_jump_threshold
                .unwrap_or(fallback.density_jump_threshold),
            energy_smoothing: e.energy_smoothing.unwrap_or(fallback.energy_smoothing),
            saturation_density: e.saturation_density.unwrap_or(fallback.saturation_density),
            seed: e.seed,
            voicing: self.voicing()?,
        };
        config.validate()?;
        Ok(config)
    }

    fn voicing(&self) -> Result<Voicing, ConfigError> {
        let v = &self.file.voicing;
        match v.mode.as_deref().unwrap_or("drums") {
            "drums" => Ok(Voicing::Drums(v.drums.unwrap_or_default())),
            "scale" => Ok(Voicing::Scale(v.scale.clone().unwrap_or_default())),
            other => Err(ConfigError::UnknownVoicing(other.to_string())),
        }
    }

    pub fn ports(&self) -> PortSettings {
        let p = &self.file.ports;
        PortSettings {
            input: p.input.clone().unwrap_or_else(|| "Game of Life".to_string()),
            output: p.output.clone().unwrap_or_else(|| "SuperCollider".to_string()),
            virtual_input: p
                .virtual_input
                .clone()
                .unwrap_or_else(|| "kugutsu-monitor".to_string()),
            virtual_output: p.virtual_output.clone().unwrap_or_else(|| "kugutsu".to_string()),
        }
    }

    pub fn control(&self) -> ControlSettings {
        let c = &self.file.control;
        ControlSettings {
            command_file: c
                .command_file
                .clone()
                .unwrap_or_else(|| PathBuf::from("/tmp/drum.cmd")),
            poll_interval: Duration::from_millis(c.poll_interval_ms.unwrap_or(50).clamp(1, 1_000)),
        }
    }
}

/// `<config dir>/kugutsu/config.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kugutsu").join("config.toml"))
}

fn parse(contents: &str, source: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(contents).map_err(|e| ConfigError::Parse {
        source: source.to_string(),
        message: e.to_string(),
    })
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse(&contents, &path.display().to_string())
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_engine(&mut base.engine, user.engine);

    let (b, u) = (&mut base.voicing, user.voicing);
    if u.mode.is_some() {
        b.mode = u.mode;
    }
    if u.scale.is_some() {
        b.scale = u.scale;
    }
    if u.drums.is_some() {
        b.drums = u.drums;
    }

    let (b, u) = (&mut base.ports, user.ports);
    if u.input.is_some() {
        b.input = u.input;
    }
    if u.output.is_some() {
        b.output = u.output;
    }
    if u.virtual_input.is_some() {
        b.virtual_input = u.virtual_input;
    }
    if u.virtual_output.is_some() {
        b.virtual_output = u.virtual_output;
    }

    let (b, u) = (&mut base.control, user.control);
    if u.command_file.is_some() {
        b.command_file = u.command_file;
    }
    if u.poll_interval_ms.is_some() {
        b.poll_interval_ms = u.poll_interval_ms;
    }
}

fn merge_engine(base: &mut EngineSection, user: EngineSection) {
    if user.tempo.is_some() {
        base.tempo = user.tempo;
    }
    if user.channel_in.is_some() {
        base.channel_in = user.channel_in;
    }
    if user.omni.is_some() {
        base.omni = user.omni;
    }
    if user.channel_out.is_some() {
        base.channel_out = user.channel_out;
    }
    if user.step_hit_duration_ms.is_some() {
        base.step_hit_duration_ms = user.step_hit_duration_ms;
    }
    if user.swing_amount.is_some() {
        base.swing_amount = user.swing_amount;
    }
    if user.swing_jitter.is_some() {
        base.swing_jitter = user.swing_jitter;
    }
    if user.density_jump_threshold.is_some() {
        base.density_jump_threshold = user.density_jump_threshold;
    }
    if user.energy_smoothing.is_some() {
        base.energy_smoothing = user.energy_smoothing;
    }
    if user.saturation_density.is_some() {
        base.saturation_density = user.saturation_density;
    }
    if user.seed.is_some() {
        base.seed = user.seed;
    }
}
