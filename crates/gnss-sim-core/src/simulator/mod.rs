//! Telemetry Publisher
//!
//! The [`Simulator`] task is the single owner of the vehicle state, the
//! publish mode and the replay source. Input events and mode changes reach
//! it through a [`SimHandle`] command queue and are applied between ticks,
//! so a published frame never mixes a heading and a position from different
//! input applications.
//!
//! Live mode publishes the projected pose every tick interval. Replay mode
//! publishes recorded samples paced by the recording itself.

mod handle;

pub use handle::SimHandle;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::kinematics::{InputEvent, VehicleSnapshot, VehicleState};
use crate::projection::Projection;
use crate::replay::{Recording, ReplaySource};
use crate::telemetry::{LiveFrame, PublishError, TelemetryFrame, TelemetrySink};
use crate::unit_conversion::model_to_compass_heading;

/// Commands queued to the simulator task
const COMMAND_QUEUE_DEPTH: usize = 1024;

/// Source of published telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Publish the simulated vehicle pose
    #[default]
    Live,
    /// Publish samples from the loaded recording
    Replay,
}

impl Mode {
    /// Parse the "from logs" toggle sent by the control page: `"true"`
    /// selects replay, anything else selects live.
    pub fn from_toggle(value: &str) -> Self {
        if value == "true" {
            Mode::Replay
        } else {
            Mode::Live
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Replay => write!(f, "replay"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "replay" => Ok(Mode::Replay),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Snapshot reported by [`SimHandle::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimStatus {
    /// Current telemetry source
    pub mode: Mode,
    /// Vehicle pose and last keys
    pub vehicle: VehicleSnapshot,
    /// Next replay index, if a recording is loaded
    pub replay_cursor: Option<usize>,
    /// Completed replay passes, if a recording is loaded
    pub replay_loops: Option<u64>,
    /// Frames accepted by the sink
    pub frames_published: u64,
}

/// Messages from handles to the simulator task
#[derive(Debug)]
pub enum SimCommand {
    /// Apply an input event to the vehicle
    Input(InputEvent),
    /// Switch the telemetry source and report whether it was accepted
    SetMode(Mode, oneshot::Sender<Result<(), SimError>>),
    /// Report the current status
    Status(oneshot::Sender<SimStatus>),
}

/// Single-owner simulation and publishing task
pub struct Simulator {
    state: VehicleState,
    mode: Mode,
    replay: Option<ReplaySource>,
    projection: Arc<dyn Projection>,
    sink: Arc<dyn TelemetrySink>,
    commands: mpsc::Receiver<SimCommand>,
    shutdown: CancellationToken,
    tick_interval: Duration,
    rng: StdRng,
    frames_published: u64,
}

impl Simulator {
    /// Create a simulator in live mode and the handle that drives it
    pub fn new(
        state: VehicleState,
        projection: Arc<dyn Projection>,
        sink: Arc<dyn TelemetrySink>,
    ) -> (Self, SimHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let shutdown = CancellationToken::new();

        let simulator = Self {
            state,
            mode: Mode::Live,
            replay: None,
            projection,
            sink,
            commands: rx,
            shutdown: shutdown.clone(),
            tick_interval: Duration::from_millis(100),
            rng: StdRng::from_entropy(),
            frames_published: 0,
        };
        let handle = SimHandle::new(tx, shutdown);
        (simulator, handle)
    }

    /// Build a simulator from configuration and an optional recording
    pub fn from_config(
        config: &SimConfig,
        recording: Option<Recording>,
        projection: Arc<dyn Projection>,
        sink: Arc<dyn TelemetrySink>,
    ) -> (Self, SimHandle) {
        let vehicle = &config.vehicle;
        let state = VehicleState::with_heading(
            vehicle.initial_x,
            vehicle.initial_y,
            vehicle.initial_heading,
            vehicle.zone,
            vehicle.band,
        );

        let (mut simulator, handle) = Self::new(state, projection, sink);
        simulator = simulator.with_tick_interval(config.telemetry.tick_interval());
        if let Some(seed) = config.telemetry.quality_seed {
            simulator = simulator.with_quality_seed(seed);
        }
        if let Some(recording) = recording {
            let source =
                ReplaySource::new(recording).with_loop_cooldown(config.replay.loop_cooldown());
            simulator = simulator.with_replay(source);
            if config.replay.start_in_replay {
                simulator.mode = Mode::Replay;
            }
        }
        (simulator, handle)
    }

    /// Attach a replay source, enabling replay mode
    pub fn with_replay(mut self, source: ReplaySource) -> Self {
        self.replay = Some(source);
        self
    }

    /// Live publishing period
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Make the synthetic fix quality sequence reproducible
    pub fn with_quality_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start in the given mode. Replay falls back to live without a recording.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        if let Err(e) = self.set_mode(mode) {
            tracing::warn!("Starting in {} mode: {}", self.mode, e);
        }
        self
    }

    /// Current telemetry source
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Publish until shutdown is requested or every handle is dropped
    pub async fn run(mut self) {
        tracing::info!(
            "Simulator started in {} mode at ({:.3}, {:.3}) zone {}{}",
            self.mode,
            self.state.x,
            self.state.y,
            self.state.zone,
            self.state.band
        );

        loop {
            let running = match self.mode {
                Mode::Live => self.live_tick().await,
                Mode::Replay => self.replay_tick().await,
            };
            if !running {
                break;
            }
        }

        tracing::info!(
            "Simulator stopped after {} frames",
            self.frames_published
        );
    }

    async fn live_tick(&mut self) -> bool {
        self.state.update_speed(Instant::now());
        if let Some(frame) = self.live_frame() {
            self.publish(&TelemetryFrame::Live(frame));
        }
        self.wait(self.tick_interval).await
    }

    async fn replay_tick(&mut self) -> bool {
        let Some(replay) = self.replay.as_mut() else {
            tracing::warn!("No recording loaded, falling back to live mode");
            self.mode = Mode::Live;
            return true;
        };

        // The sample is committed once taken; a mode switch during the wait
        // takes effect on the following tick.
        let step = replay.next_step();
        if !self.wait(step.delay()).await {
            return false;
        }
        self.publish(&TelemetryFrame::Replay(step.payload));
        true
    }

    fn live_frame(&mut self) -> Option<LiveFrame> {
        let geo = match self.projection.to_geographic(&self.state.projected()) {
            Ok(geo) => geo,
            Err(e) => {
                tracing::warn!("Skipping live frame, projection failed: {}", e);
                return None;
            }
        };

        Some(LiveFrame {
            x: self.state.x,
            y: self.state.y,
            lat: geo.lat,
            lon: geo.lon,
            quality: self.rng.gen_range(1..=6),
            heading: model_to_compass_heading(self.state.heading),
            speed: self.state.speed,
        })
    }

    fn publish(&mut self, frame: &TelemetryFrame) {
        match self.sink.publish(frame) {
            Ok(()) => self.frames_published += 1,
            Err(PublishError::NoSubscribers(topic)) => {
                tracing::trace!("Dropped frame, no subscribers on {}", topic);
            }
            Err(PublishError::Broker(e)) => {
                tracing::debug!("Dropped frame, broker queue: {}", e);
            }
            Err(e) => tracing::warn!("Failed to publish telemetry: {}", e),
        }
    }

    /// Wait for `duration` while applying queued commands.
    ///
    /// Returns false when the simulator should stop.
    async fn wait(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                _ = tokio::time::sleep_until(deadline) => return true,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        tracing::debug!("All simulator handles dropped");
                        return false;
                    }
                },
            }
        }
    }

    fn handle(&mut self, command: SimCommand) {
        match command {
            SimCommand::Input(event) => {
                if let InputEvent::DiscreteKeys(keys) = &event {
                    tracing::debug!("Keys pressed: {:?}", keys.identifiers());
                }
                self.state.apply(&event);
            }
            SimCommand::SetMode(mode, reply) => {
                let _ = reply.send(self.set_mode(mode));
            }
            SimCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn set_mode(&mut self, mode: Mode) -> Result<(), SimError> {
        if mode == Mode::Replay && self.replay.is_none() {
            tracing::warn!("Ignoring replay mode request, no recording loaded");
            return Err(SimError::ReplayUnavailable);
        }
        if mode != self.mode {
            tracing::info!("Switching telemetry to {} mode", mode);
            self.mode = mode;
        }
        Ok(())
    }

    /// Snapshot of mode, pose and replay progress
    pub fn status(&self) -> SimStatus {
        SimStatus {
            mode: self.mode,
            vehicle: self.state.snapshot(),
            replay_cursor: self.replay.as_ref().map(ReplaySource::cursor),
            replay_loops: self.replay.as_ref().map(ReplaySource::loops),
            frames_published: self.frames_published,
        }
    }
}
