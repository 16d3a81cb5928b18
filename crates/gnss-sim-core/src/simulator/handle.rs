//! Handle for driving a running simulator

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{Mode, SimCommand, SimStatus};
use crate::error::SimError;
use crate::kinematics::{AnalogInput, InputEvent, KeySet};

/// Cloneable sender side of the simulator command queue.
///
/// Dropping every handle stops the simulator.
#[derive(Debug, Clone)]
pub struct SimHandle {
    commands: mpsc::Sender<SimCommand>,
    shutdown: CancellationToken,
}

impl SimHandle {
    pub(super) fn new(commands: mpsc::Sender<SimCommand>, shutdown: CancellationToken) -> Self {
        Self { commands, shutdown }
    }

    async fn send(&self, command: SimCommand) -> Result<(), SimError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SimError::Stopped)
    }

    /// Queue an input event.
    ///
    /// Analog samples with non-finite or out-of-range axes are rejected
    /// with [`SimError::Input`] and never reach the vehicle.
    pub async fn apply(&self, event: InputEvent) -> Result<(), SimError> {
        event.validate()?;
        self.send(SimCommand::Input(event)).await
    }

    /// Queue a discrete key event from browser key identifiers
    pub async fn send_keys<I, S>(&self, keys: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.apply(InputEvent::DiscreteKeys(KeySet::from_identifiers(keys)))
            .await
    }

    /// Queue an analog controller sample
    pub async fn send_analog(&self, input: AnalogInput) -> Result<(), SimError> {
        self.apply(InputEvent::Analog(input)).await
    }

    /// Switch the telemetry source, effective on the next tick.
    ///
    /// Fails with [`SimError::ReplayUnavailable`] when replay is requested
    /// and the simulator holds no recording.
    pub async fn set_mode(&self, mode: Mode) -> Result<(), SimError> {
        let (tx, rx) = oneshot::channel();
        self.send(SimCommand::SetMode(mode, tx)).await?;
        rx.await.map_err(|_| SimError::Stopped)?
    }

    /// Query the simulator state after all previously queued commands
    pub async fn status(&self) -> Result<SimStatus, SimError> {
        let (tx, rx) = oneshot::channel();
        self.send(SimCommand::Status(tx)).await?;
        rx.await.map_err(|_| SimError::Stopped)
    }

    /// Ask the simulator to stop, interrupting any pacing wait
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// The simulator task has exited
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
