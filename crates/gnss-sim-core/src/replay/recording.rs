//! Recording file format
//!
//! A recording is a JSON object whose keys are elapsed times in seconds
//! (as strings) and whose values are telemetry objects with at least a
//! numeric `speed` in km/h:
//!
//! ```json
//! {
//!   "0.0": {"lat": 51.59, "lon": 19.89, "speed": 0.0},
//!   "0.1": {"lat": 51.59, "lon": 19.89, "speed": 3.2}
//! }
//! ```
//!
//! Key order in the file is playback order.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::{ReplaySample, SPEED_FIELD};

/// Minimum samples for playback: sample 0 only anchors the first gap
pub const MIN_SAMPLES: usize = 2;

/// Errors loading a recording
#[derive(Error, Debug)]
pub enum RecordingError {
    /// The file could not be read
    #[error("Failed to read recording {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON
    #[error("Recording is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top level is not an object
    #[error("Recording must be a JSON object keyed by elapsed time")]
    NotAnObject,

    /// A key does not parse as seconds
    #[error("Elapsed-time key '{0}' is not a finite number")]
    InvalidKey(String),

    /// A sample is not an object
    #[error("Sample '{0}' is not a JSON object")]
    InvalidSample(String),

    /// A sample lacks a numeric `speed`
    #[error("Sample '{0}' has no numeric speed")]
    MissingSpeed(String),

    /// Fewer samples than playback needs
    #[error("Recording has {0} samples, at least {MIN_SAMPLES} are required")]
    TooShort(usize),
}

/// An immutable, ordered set of recorded samples
#[derive(Debug, Clone)]
pub struct Recording {
    samples: Vec<ReplaySample>,
}

impl Recording {
    /// Load a recording from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RecordingError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let recording = Self::from_json(&content)?;
        tracing::info!(
            "Loaded recording {} ({} samples, {:.1}s)",
            path.display(),
            recording.len(),
            recording.duration_secs()
        );
        Ok(recording)
    }

    /// Parse a recording from JSON text
    pub fn from_json(content: &str) -> Result<Self, RecordingError> {
        let root: Value = serde_json::from_str(content)?;
        let Value::Object(entries) = root else {
            return Err(RecordingError::NotAnObject);
        };

        let mut samples = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let elapsed = key
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .ok_or_else(|| RecordingError::InvalidKey(key.clone()))?;

            let Value::Object(fields) = value else {
                return Err(RecordingError::InvalidSample(key));
            };

            let speed_kmh = fields
                .get(SPEED_FIELD)
                .and_then(Value::as_f64)
                .ok_or_else(|| RecordingError::MissingSpeed(key.clone()))?;

            samples.push(ReplaySample {
                key,
                elapsed,
                speed_kmh,
                fields,
            });
        }

        Self::from_samples(samples)
    }

    /// Build a recording from already parsed samples
    pub fn from_samples(samples: Vec<ReplaySample>) -> Result<Self, RecordingError> {
        if samples.len() < MIN_SAMPLES {
            return Err(RecordingError::TooShort(samples.len()));
        }
        Ok(Self { samples })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// No samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`, in file order
    pub fn get(&self, index: usize) -> Option<&ReplaySample> {
        self.samples.get(index)
    }

    /// All samples in file order
    pub fn samples(&self) -> &[ReplaySample] {
        &self.samples
    }

    /// Time span between the first and last sample in seconds
    pub fn duration_secs(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (last.elapsed - first.elapsed).abs(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_file_order() {
        let rec = Recording::from_json(
            r#"{"0": {"speed": 0.0}, "10": {"speed": 1.0}, "2": {"speed": 2.0}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = rec.samples().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "10", "2"]);
        assert_eq!(rec.get(1).unwrap().elapsed, 10.0);
    }

    #[test]
    fn test_pass_through_fields_preserved() {
        let rec = Recording::from_json(
            r#"{"0.0": {"quality": 4, "speed": 7.2, "note": "a"}, "0.5": {"speed": 3.6}}"#,
        )
        .unwrap();
        let first = rec.get(0).unwrap();
        assert_eq!(first.speed_kmh, 7.2);
        assert_eq!(first.fields["note"], "a");
        assert_eq!(first.fields["quality"], 4);
    }

    #[test]
    fn test_rejects_non_numeric_key() {
        let err = Recording::from_json(r#"{"start": {"speed": 0}, "1": {"speed": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, RecordingError::InvalidKey(k) if k == "start"));
    }

    #[test]
    fn test_rejects_missing_speed() {
        let err =
            Recording::from_json(r#"{"0": {"speed": 0}, "1": {"lat": 1.0}}"#).unwrap_err();
        assert!(matches!(err, RecordingError::MissingSpeed(k) if k == "1"));

        let err = Recording::from_json(r#"{"0": {"speed": "fast"}, "1": {"speed": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, RecordingError::MissingSpeed(_)));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(matches!(
            Recording::from_json("[1, 2]").unwrap_err(),
            RecordingError::NotAnObject
        ));
        assert!(matches!(
            Recording::from_json(r#"{"0": {"speed": 0}, "1": 5}"#).unwrap_err(),
            RecordingError::InvalidSample(_)
        ));
        assert!(matches!(
            Recording::from_json("{not json").unwrap_err(),
            RecordingError::Json(_)
        ));
    }

    #[test]
    fn test_rejects_too_short() {
        assert!(matches!(
            Recording::from_json("{}").unwrap_err(),
            RecordingError::TooShort(0)
        ));
        assert!(matches!(
            Recording::from_json(r#"{"0": {"speed": 0}}"#).unwrap_err(),
            RecordingError::TooShort(1)
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Recording::load("/nonexistent/recording.json").unwrap_err();
        assert!(matches!(err, RecordingError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"0": {"speed": 0}, "1.5": {"speed": 18}}"#).unwrap();

        let rec = Recording::load(&path).unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.duration_secs(), 1.5);
    }
}
