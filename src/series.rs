//! Recorded sample series and the background loader that reads them.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::Deserialize;
use tracing::debug;

use crate::error::{GaugeError, Result};

/// Raw shape of a series document: `{ "data": [...], "frequency": f, "unit": "m" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesDocument {
    pub data: Vec<f64>,
    pub frequency: f64,
    #[serde(default)]
    pub unit: String,
}

/// Samples recorded at a fixed frequency. `samples[i]` is the value at `i / frequency` seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SeriesDocument")]
pub struct TimeSeries {
    samples: Vec<f64>,
    frequency: f64,
    unit: String,
}

impl TryFrom<SeriesDocument> for TimeSeries {
    type Error = GaugeError;

    fn try_from(doc: SeriesDocument) -> Result<Self> {
        Self::new(doc.data, doc.frequency, doc.unit)
    }
}

impl TimeSeries {
    pub fn new(samples: Vec<f64>, frequency: f64, unit: impl Into<String>) -> Result<Self> {
        if samples.is_empty() {
            return Err(GaugeError::InvalidInput(
                "series contains no samples".to_string(),
            ));
        }
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(GaugeError::InvalidInput(format!(
                "sampling frequency must be positive, got {frequency}"
            )));
        }
        Ok(Self {
            samples,
            frequency,
            unit: unit.into(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length covered by the samples, in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.frequency
    }

    /// Index of the sample at or just before `elapsed` seconds. May be negative or past the end.
    pub fn index_at(&self, elapsed: f64) -> i64 {
        (elapsed * self.frequency).floor() as i64
    }

    /// Nearest preceding sample, or `None` when `elapsed` falls outside the recording.
    pub fn lookup(&self, elapsed: f64) -> Option<f64> {
        let index = self.index_at(elapsed);
        usize::try_from(index)
            .ok()
            .and_then(|i| self.samples.get(i))
            .copied()
    }

    /// Like [`lookup`](Self::lookup) but holds the first and last samples outside the recording.
    pub fn lookup_clamped(&self, elapsed: f64) -> f64 {
        let last = self.samples.len() - 1;
        let index = self.index_at(elapsed).clamp(0, last as i64) as usize;
        self.samples[index]
    }
}

/// Reads a series file on a worker thread. The receiver yields exactly one result.
pub fn spawn_load(path: impl Into<PathBuf>) -> Receiver<Result<TimeSeries>> {
    let path = path.into();
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        debug!(path = %path.display(), "Loading series data");
        let result = TimeSeries::from_file(&path);
        // The controller may have been disposed meanwhile.
        let _ = sender.send(result);
    });
    receiver
}
