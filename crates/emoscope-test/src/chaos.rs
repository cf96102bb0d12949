//! Fault injection for the detection loop
//!
//! Wraps detectors and capture sources with hostile behavior:
//! - Intermittent detection failures
//! - Calls that never return
//! - Model load failure
//! - Camera permission denied

use std::time::Duration;

use async_trait::async_trait;
use emoscope_core::{EmoscopeError, EmoscopeResult, FaceObservation, FrameSize};
use emoscope_runtime::{CaptureSource, Detector, DetectorOptions, Frame, ProgressReporter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which calls of a wrapped detector misbehave
#[derive(Clone, Debug, PartialEq)]
pub enum FaultPlan {
    /// Never
    None,
    /// Every n-th call (1-based)
    Every(u64),
    /// Each call independently with this probability
    Random { rate: f64, seed: u64 },
}

#[derive(Debug)]
struct FaultSchedule {
    plan: FaultPlan,
    rng: StdRng,
    calls: u64,
}

impl FaultSchedule {
    fn new(plan: FaultPlan) -> Self {
        let seed = match plan {
            FaultPlan::Random { seed, .. } => seed,
            _ => 0,
        };
        FaultSchedule {
            plan,
            rng: StdRng::seed_from_u64(seed),
            calls: 0,
        }
    }

    fn next_faulty(&mut self) -> bool {
        self.calls += 1;
        match self.plan {
            FaultPlan::None => false,
            FaultPlan::Every(n) => n > 0 && self.calls % n == 0,
            FaultPlan::Random { rate, .. } => self.rng.gen_bool(rate.clamp(0.0, 1.0)),
        }
    }
}

/// Fails scheduled calls with a recoverable error
pub struct FlakyDetector {
    inner: Box<dyn Detector>,
    schedule: FaultSchedule,
    injected: u64,
}

impl FlakyDetector {
    pub fn new(inner: Box<dyn Detector>, plan: FaultPlan) -> Self {
        FlakyDetector {
            inner,
            schedule: FaultSchedule::new(plan),
            injected: 0,
        }
    }

    pub fn injected(&self) -> u64 {
        self.injected
    }
}

#[async_trait]
impl Detector for FlakyDetector {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()> {
        self.inner.load(progress).await
    }

    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>> {
        if self.schedule.next_faulty() {
            self.injected += 1;
            return Err(EmoscopeError::DetectionCycle(format!(
                "injected failure on frame {}",
                frame.index
            )));
        }
        self.inner.detect(frame, options).await
    }
}

/// Scheduled calls stall for `stall`, or forever when `None`
pub struct HangingDetector {
    inner: Box<dyn Detector>,
    schedule: FaultSchedule,
    stall: Option<Duration>,
}

impl HangingDetector {
    pub fn new(inner: Box<dyn Detector>, plan: FaultPlan) -> Self {
        HangingDetector {
            inner,
            schedule: FaultSchedule::new(plan),
            stall: None,
        }
    }

    /// Stall for a bounded time, then answer normally
    pub fn stalling_for(mut self, stall: Duration) -> Self {
        self.stall = Some(stall);
        self
    }
}

#[async_trait]
impl Detector for HangingDetector {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()> {
        self.inner.load(progress).await
    }

    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>> {
        if self.schedule.next_faulty() {
            match self.stall {
                Some(stall) => tokio::time::sleep(stall).await,
                None => std::future::pending::<()>().await,
            }
        }
        self.inner.detect(frame, options).await
    }
}

/// Model that never loads
#[derive(Debug, Clone)]
pub struct FailingLoadDetector {
    reason: String,
    /// Progress reached before failing
    fail_at: u8,
}

impl FailingLoadDetector {
    pub fn new(reason: impl Into<String>) -> Self {
        FailingLoadDetector {
            reason: reason.into(),
            fail_at: 60,
        }
    }
}

#[async_trait]
impl Detector for FailingLoadDetector {
    fn name(&self) -> &str {
        "failing-load"
    }

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()> {
        progress.report(self.fail_at, "Loading expression model");
        Err(EmoscopeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            self.reason.clone(),
        )))
    }

    async fn detect(
        &mut self,
        _frame: &Frame,
        _options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>> {
        Err(EmoscopeError::ModelNotReady)
    }
}

/// Camera that refuses to open
#[derive(Debug, Clone, Default)]
pub struct DeniedCapture;

#[async_trait]
impl CaptureSource for DeniedCapture {
    async fn open(&mut self) -> EmoscopeResult<FrameSize> {
        Err(EmoscopeError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "camera permission denied",
        )))
    }

    async fn next_frame(&mut self) -> EmoscopeResult<Frame> {
        Err(EmoscopeError::CaptureUnavailable("camera is closed".into()))
    }
}
