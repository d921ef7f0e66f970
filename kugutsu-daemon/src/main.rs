mod command_file;

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kugutsu_core::clock::MonotonicClock;
use kugutsu_core::config::Config;
use kugutsu_core::engine::Engine;
use kugutsu_core::midi::{self, MidiActivitySource, MidirSink};
use kugutsu_core::playback::PlaybackController;

use command_file::CommandFile;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kugutsu")
        .join("kugutsu.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    match File::create(&log_path).or_else(|_| File::create("/tmp/kugutsu.log")) {
        Ok(file) => loggers.push(WriteLogger::new(log_level, simplelog::Config::default(), file)),
        Err(e) => eprintln!("kugutsu: no log file ({}), logging to terminal only", e),
    }

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("kugutsu: logger already initialized");
        return;
    }

    log::info!("kugutsu starting (log level: {:?})", log_level);
}

fn print_ports() -> Result<(), midi::MidiError> {
    println!("inputs:");
    for port in midi::list_input_ports()? {
        println!("  {}: {}", port.index, port.name);
    }
    println!("outputs:");
    for port in midi::list_output_ports()? {
        println!("  {}: {}", port.index, port.name);
    }
    Ok(())
}

/// Apply commands from the file every `poll` until `running` is cleared.
fn control_loop(
    commands: &mut CommandFile,
    controller: &PlaybackController,
    running: &AtomicBool,
    poll: Duration,
) {
    while running.load(Ordering::SeqCst) {
        if let Some(cmd) = commands.poll() {
            if cmd.apply(controller) {
                log::info!(target: "control", "transport {}", controller.state().name());
            }
        }
        thread::sleep(poll);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    if args.iter().any(|a| a == "--list-ports") {
        return Ok(print_ports()?);
    }

    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);
    let seed: Option<u64> = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok());

    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    let mut engine_config = config.engine()?;
    if seed.is_some() {
        engine_config.seed = seed;
    }
    let ports = config.ports();
    let control = config.control();

    let sink = Arc::new(MidirSink::connect(&ports.output, &ports.virtual_output)?);
    let sink_name = sink.port_name().to_string();
    let engine = Engine::new(engine_config, sink, Arc::new(MonotonicClock::new()))?;
    let input = MidiActivitySource::connect(&ports.input, &ports.virtual_input, engine.tracker())?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    let mut commands = CommandFile::init(&control.command_file)?;
    let handle = engine.spawn()?;
    log::info!(
        target: "control",
        "ready: {} -> {}, write start/stop to {}",
        input.port_name(),
        sink_name,
        commands.path().display()
    );

    control_loop(&mut commands, handle.controller(), &running, control.poll_interval);

    log::info!(target: "control", "interrupted, shutting down");
    // stops playback (all notes off), flushes note-offs and joins the engine
    drop(handle);
    drop(input);
    Ok(())
}
