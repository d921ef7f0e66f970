//! Engine context and the thread that runs the step loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::Clock;
use crate::config::{ConfigError, EngineConfig};
use crate::density::DensityTracker;
use crate::playback::PlaybackController;
use crate::scheduler::{BarReport, StepScheduler};
use crate::sink::OutputSink;

/// Sleep between transport polls while stopped.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Everything the components share for one engine instance.
pub struct EngineContext {
    pub config: EngineConfig,
    pub tracker: Arc<DensityTracker>,
    pub controller: Arc<PlaybackController>,
    pub sink: Arc<dyn OutputSink>,
    pub clock: Arc<dyn Clock>,
}

impl EngineContext {
    /// Validate `config` and build the shared state. Fails before anything
    /// starts running if the configuration is unusable.
    pub fn init(
        config: EngineConfig,
        sink: Arc<dyn OutputSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: Arc::new(DensityTracker::new(config.channel_in)),
            controller: Arc::new(PlaybackController::new(sink.clone())),
            config,
            sink,
            clock,
        })
    }
}

/// Engine owned by the caller's thread. Drive it bar by bar with
/// [`Engine::play_bar`], or hand it to its own thread with [`Engine::spawn`].
pub struct Engine {
    ctx: Arc<EngineContext>,
    scheduler: StepScheduler,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        sink: Arc<dyn OutputSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let ctx = Arc::new(EngineContext::init(config, sink, clock)?);
        let scheduler = StepScheduler::new(&ctx);
        log::info!(
            target: "engine",
            "engine ready: {} bpm, in {:?}, out {}",
            ctx.config.tempo, ctx.config.channel_in, ctx.config.channel_out
        );
        Ok(Self { ctx, scheduler })
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    pub fn controller(&self) -> Arc<PlaybackController> {
        Arc::clone(&self.ctx.controller)
    }

    pub fn tracker(&self) -> Arc<DensityTracker> {
        Arc::clone(&self.ctx.tracker)
    }

    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    pub fn play_bar(&mut self) -> BarReport {
        self.scheduler.play_bar(&self.ctx)
    }

    /// Run the loop until `shutdown` is set: bars while playing, idle
    /// polls while stopped.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::SeqCst) {
            if self.ctx.controller.is_playing() {
                let report = self.play_bar();
                if report.late_steps > 0 {
                    log::debug!(
                        target: "engine",
                        "bar {}: {} late steps",
                        report.bar_index, report.late_steps
                    );
                }
            } else {
                self.ctx.clock.sleep(IDLE_POLL);
            }
        }
    }

    /// Move the loop onto a dedicated thread.
    pub fn spawn(mut self) -> std::io::Result<EngineHandle> {
        let ctx = Arc::clone(&self.ctx);
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);

        let join_handle = thread::Builder::new()
            .name("kugutsu-engine".to_string())
            .spawn(move || self.run(&thread_shutdown))?;

        Ok(EngineHandle {
            ctx,
            shutdown,
            join_handle: Some(join_handle),
        })
    }
}

/// Handle to an engine running on its own thread. Dropping it shuts the
/// engine down.
pub struct EngineHandle {
    ctx: Arc<EngineContext>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn controller(&self) -> &PlaybackController {
        &self.ctx.controller
    }

    pub fn tracker(&self) -> Arc<DensityTracker> {
        Arc::clone(&self.ctx.tracker)
    }

    pub fn is_playing(&self) -> bool {
        self.ctx.controller.is_playing()
    }

    /// Stop playback (silencing every channel) and join the engine thread.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.ctx.controller.stop();
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                log::error!(target: "engine", "engine thread panicked");
            }
            log::info!(target: "engine", "engine shut down");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
