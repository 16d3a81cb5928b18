//! Replay source
//!
//! Plays back a [`Recording`] in a loop, reproducing the recorded gaps
//! between samples.
//!
//! Playback starts at index 1 and every loop restarts at index 1, so the
//! first recorded sample is never emitted. Existing consumers rely on this,
//! so it is kept.

use std::time::Duration;

use serde_json::{Map, Value};

use super::Recording;

/// Pause before playback restarts from the beginning
pub const DEFAULT_LOOP_COOLDOWN: Duration = Duration::from_secs(3);

/// First index ever emitted
const FIRST_PLAYED_INDEX: usize = 1;

/// One playback step: the sample to publish and how long to wait first
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    /// Index of the sample in the recording
    pub index: usize,
    /// Recorded fields, speed already in m/s
    pub payload: Map<String, Value>,
    /// Loop restart pause (zero unless this step wrapped around)
    pub cooldown: Duration,
    /// Recorded gap between this sample and the one before it
    pub gap: Duration,
}

impl ReplayStep {
    /// Total wait before the sample is due
    pub fn delay(&self) -> Duration {
        self.cooldown + self.gap
    }
}

/// Looping, self-paced player over a recording
pub struct ReplaySource {
    recording: Recording,
    /// Next index to play
    cursor: usize,
    loop_cooldown: Duration,
    /// Completed passes over the recording
    loops: u64,
}

impl ReplaySource {
    /// Create a new replay source
    pub fn new(recording: Recording) -> Self {
        Self {
            recording,
            cursor: FIRST_PLAYED_INDEX,
            loop_cooldown: DEFAULT_LOOP_COOLDOWN,
            loops: 0,
        }
    }

    /// Override the pause taken when playback wraps around
    pub fn with_loop_cooldown(mut self, cooldown: Duration) -> Self {
        self.loop_cooldown = cooldown;
        self
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.recording.len()
    }

    /// No samples
    pub fn is_empty(&self) -> bool {
        self.recording.is_empty()
    }

    /// Index of the next sample to play
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Completed passes over the recording
    pub fn loops(&self) -> u64 {
        self.loops
    }

    /// The recording being played
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Seek to an index; index 0 is not playable and maps to 1
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.clamp(FIRST_PLAYED_INDEX, self.len());
    }

    /// Take the next sample without waiting.
    ///
    /// The caller is responsible for waiting [`ReplayStep::delay`] before
    /// publishing the payload.
    pub fn next_step(&mut self) -> ReplayStep {
        let mut cooldown = Duration::ZERO;
        if self.cursor >= self.recording.len() {
            self.cursor = FIRST_PLAYED_INDEX;
            self.loops += 1;
            cooldown = self.loop_cooldown;
            tracing::info!("Replay loop reset (pass {})", self.loops);
        }

        let index = self.cursor;
        let samples = self.recording.samples();
        let sample = &samples[index];
        let previous = &samples[index - 1];

        let gap_secs = (sample.elapsed - previous.elapsed).abs();
        let gap = Duration::try_from_secs_f64(gap_secs).unwrap_or_else(|_| {
            tracing::warn!("Unrepresentable replay gap {}s at '{}'", gap_secs, sample.key);
            Duration::ZERO
        });

        self.cursor += 1;

        ReplayStep {
            index,
            payload: sample.payload(),
            cooldown,
            gap,
        }
    }

    /// Take the next sample, sleeping for the loop cooldown and the
    /// recorded gap before returning it.
    pub async fn next(&mut self) -> Map<String, Value> {
        let step = self.next_step();
        if !step.cooldown.is_zero() {
            tokio::time::sleep(step.cooldown).await;
        }
        tokio::time::sleep(step.gap).await;
        step.payload
    }
}
