// Control loop with a single logical executor.
//
// A 50 Hz tick services the paddle and polls the host link; an accepted
// disposal then runs synchronously inside the tick, blocking everything else
// for its duration (hundreds of milliseconds to a few seconds). That
// starvation is the accepted trade-off: disposals are rare and short next to
// the paddle's rest interval, and the busy flag plus the completion
// acknowledgment keep the host aware that the device is unresponsive
// meanwhile rather than enabling concurrency.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::interval;
use tracing::info;

use crate::config::{ConfigError, HOST_BAUD, HOST_PORT, LOOP_HZ, SorterConfig};
use crate::hal::SorterIo;
use crate::hal::sim::SimRig;
use crate::link::{HostLink, LinkError};
use crate::messages::TrashCategory;
use crate::motion::{MotionDriver, MotionTuning, MotorBank, Sequencer};
use crate::paddle::PaddleController;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Startup options from the CLI.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub port: String,
    pub baud: u32,
    pub config: Option<PathBuf>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            port: HOST_PORT.to_string(),
            baud: HOST_BAUD,
            config: None,
        }
    }
}

/// Everything that runs against the mechanism IO: motion driver, disposal
/// sequencer, paddle controller.
pub struct Runtime<IO: SorterIo> {
    driver: MotionDriver<IO>,
    sequencer: Sequencer,
    paddle: PaddleController,
    done_code: i32,
}

impl<IO: SorterIo> Runtime<IO> {
    pub fn new(io: IO, config: &SorterConfig) -> Self {
        Self {
            driver: MotionDriver::new(io, MotorBank::standard(), MotionTuning::from_config(config)),
            sequencer: Sequencer::new(),
            paddle: PaddleController::new(config),
            done_code: config.done_code,
        }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn driver(&self) -> &MotionDriver<IO> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut MotionDriver<IO> {
        &mut self.driver
    }

    pub fn paddle(&self) -> &PaddleController {
        &self.paddle
    }

    pub fn paddle_mut(&mut self) -> &mut PaddleController {
        &mut self.paddle
    }

    pub fn done_code(&self) -> i32 {
        self.done_code
    }

    /// Hand one received category to the sequencer. Returns true when a
    /// disposal is now pending.
    pub fn on_command(&mut self, category: TrashCategory) -> bool {
        self.sequencer.accept(category)
    }

    /// Per-tick paddle service: phase timer, then the output line.
    pub fn service_paddle(&mut self) {
        let now = self.driver.io_mut().uptime();
        self.paddle.update_phase(now);
        self.paddle.apply(self.driver.io_mut());
    }

    /// Run the pending disposal to completion (blocking). Returns the
    /// category that was disposed.
    pub fn run_disposal(&mut self) -> TrashCategory {
        let done = self.sequencer.dispose(&mut self.driver);
        info!(?done, "disposal complete");
        done
    }

    /// The host has seen the completion acknowledgment; accept commands
    /// again.
    pub fn acknowledge(&mut self) {
        self.sequencer.clear_busy();
    }
}

/// Open the host link and run the control loop against the simulated rig.
///
/// Board integrations construct their own [`SorterIo`] and call
/// [`run_with`] instead.
pub async fn run(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let config = match &options.config {
        Some(path) => SorterConfig::load(path)?,
        None => SorterConfig::default(),
    };
    run_with(SimRig::new(), config, options).await
}

pub async fn run_with<IO: SorterIo>(
    io: IO,
    config: SorterConfig,
    options: RuntimeOptions,
) -> Result<(), RuntimeError> {
    info!("Opening host link on {} at {} baud", options.port, options.baud);
    let mut link = HostLink::open(&options.port, options.baud, config.step_pause())?;

    let mut runtime = Runtime::new(io, &config);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, done code {}",
        LOOP_HZ, config.done_code
    );

    loop {
        tick.tick().await;

        runtime.service_paddle();

        // While a disposal is in flight the link is not read at all; the
        // grace-window drain in send_completion clears whatever piled up.
        if runtime.sequencer().busy() {
            continue;
        }

        let category = link.receive_command()?;
        if runtime.on_command(category) {
            runtime.run_disposal();
            link.send_completion(runtime.done_code())?;
            runtime.acknowledge();
        }
    }
}
