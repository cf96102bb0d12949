//! Detector capability - one adapter per external model library

use async_trait::async_trait;
use emoscope_core::{EmoscopeResult, FaceObservation, MAX_FACES};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::Frame;

/// Model loading progress for a loading indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProgress {
    /// 0 - 100
    pub percent: u8,
    pub message: String,
}

impl LoadProgress {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        LoadProgress {
            percent: percent.min(100),
            message: message.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(0, "Waiting to start")
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// Publishes [`LoadProgress`]; observers poll or await a receiver
#[derive(Debug)]
pub struct ProgressReporter {
    tx: watch::Sender<LoadProgress>,
}

impl ProgressReporter {
    pub fn new() -> (Self, watch::Receiver<LoadProgress>) {
        let (tx, rx) = watch::channel(LoadProgress::idle());
        (ProgressReporter { tx }, rx)
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let progress = LoadProgress::new(percent, message);
        debug!(percent = progress.percent, message = %progress.message, "load progress");
        self.tx.send_replace(progress);
    }

    pub fn current(&self) -> LoadProgress {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadProgress> {
        self.tx.subscribe()
    }
}

/// Per-call detector options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    pub max_faces: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        DetectorOptions {
            max_faces: MAX_FACES,
        }
    }
}

/// "Detect all faces in this frame"
///
/// Implementations wrap an external model. `load` must complete before the
/// first `detect`; it may report progress through the reporter.
#[async_trait]
pub trait Detector: Send {
    fn name(&self) -> &str;

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()>;

    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>>;
}
