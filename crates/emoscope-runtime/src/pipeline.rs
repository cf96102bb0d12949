//! Detection pipeline - the self-re-arming loop
//!
//! ```text
//! Idle --start--> Loading --ok--> Ready --cycle--> Running --shutdown--> Stopped
//!                    |                                |
//!                    +--capture/model error--> Failed <+ (non-recoverable)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use emoscope_aggregate::{display_name, AggregationSession, Mode, ModeView};
use emoscope_core::{
    EmoscopeError, EmoscopeResult, FaceObservation, FaceResult, FrameSize, SessionClock,
    SystemClock,
};
use emoscope_expand::EmotionExpander;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{CaptureSource, Detector, DetectorOptions, LoadProgress, ProgressReporter, RuntimeConfig};

/// Pending commands beyond this are rejected
const COMMAND_BUFFER: usize = 32;

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Loading,
    /// Capture open and model loaded; no cycle has completed
    Ready,
    Running,
    Stopped,
    Failed,
}

/// User interaction, applied between cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "mode", rename_all = "snake_case")]
pub enum Command {
    SetMode(Mode),
    NextPracticeTarget,
    ResetTimeline,
}

/// Everything a presenter needs after one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub cycle: u64,
    pub elapsed_secs: u64,
    pub frame_size: FrameSize,
    pub face_count: usize,
    pub faces: Vec<FaceResult>,
    pub mode: Mode,
    pub view: ModeView,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {} [{}] t={}s {} face(s)",
            self.cycle, self.mode, self.elapsed_secs, self.face_count
        )?;
        for face in &self.faces {
            match face.headline() {
                Some(headline) => write!(
                    f,
                    " | {} {} {}%",
                    face.id,
                    display_name(&headline.name),
                    headline.percent()
                )?,
                None => write!(f, " | {} {}", face.id, face.dominant.expression)?,
            }
        }
        Ok(())
    }
}

/// Loop counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    /// Cycles attempted
    pub cycles: u64,
    pub completed: u64,
    pub failed_cycles: u64,
    /// Subset of `failed_cycles`
    pub timeouts: u64,
    pub faces_seen: u64,
    pub commands_applied: u64,
    pub last_cycle_duration: Duration,
}

/// Control surface for a pipeline running on another task
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    shutdown: Arc<watch::Sender<bool>>,
    commands: mpsc::Sender<Command>,
    reports: watch::Receiver<Option<FrameReport>>,
    progress: watch::Receiver<LoadProgress>,
}

impl PipelineHandle {
    /// Stop the loop before its next cycle
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Queue a command; false once the pipeline is gone
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Queue a command without waiting; false if full or gone
    pub fn try_send(&self, command: Command) -> bool {
        self.commands.try_send(command).is_ok()
    }

    pub fn latest_report(&self) -> Option<FrameReport> {
        self.reports.borrow().clone()
    }

    pub fn reports(&self) -> watch::Receiver<Option<FrameReport>> {
        self.reports.clone()
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress.borrow().clone()
    }
}

/// Capture, detector, expander and session wired into one loop
pub struct Pipeline {
    config: RuntimeConfig,
    capture: Box<dyn CaptureSource>,
    detector: Box<dyn Detector>,
    expander: EmotionExpander,
    session: AggregationSession,
    clock: Arc<dyn SessionClock>,
    state: PipelineState,
    frame_size: Option<FrameSize>,
    stats: RuntimeStats,
    progress: ProgressReporter,
    progress_rx: watch::Receiver<LoadProgress>,
    reports: watch::Sender<Option<FrameReport>>,
    report_sink: Option<mpsc::UnboundedSender<FrameReport>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    commands_tx: mpsc::Sender<Command>,
    commands_rx: mpsc::Receiver<Command>,
}

impl Pipeline {
    pub fn new(
        config: RuntimeConfig,
        capture: Box<dyn CaptureSource>,
        detector: Box<dyn Detector>,
    ) -> EmoscopeResult<Self> {
        config.validate()?;

        let clock: Arc<dyn SessionClock> = Arc::new(SystemClock);
        let expander = EmotionExpander::standard(config.expander.clone());
        let session = AggregationSession::new(config.timeline, clock.now()).with_mode(config.initial_mode);
        let (progress, progress_rx) = ProgressReporter::new();
        let (reports, _) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);

        Ok(Pipeline {
            config,
            capture,
            detector,
            expander,
            session,
            clock,
            state: PipelineState::Idle,
            frame_size: None,
            stats: RuntimeStats::default(),
            progress,
            progress_rx,
            reports,
            report_sink: None,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            commands_tx,
            commands_rx,
        })
    }

    /// Drive session time from `clock`; re-anchors the session
    pub fn with_clock(mut self, clock: Arc<dyn SessionClock>) -> Self {
        self.session = AggregationSession::new(self.config.timeline, clock.now())
            .with_mode(self.session.mode());
        self.clock = clock;
        self
    }

    /// Replace the expander, e.g. one built over a custom library
    pub fn with_expander(mut self, expander: EmotionExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Every report in cycle order, unlike the latest-only watch
    ///
    /// The stream ends when the pipeline is dropped. A second call replaces
    /// the first stream.
    pub fn report_stream(&mut self) -> mpsc::UnboundedReceiver<FrameReport> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.report_sink = Some(tx);
        rx
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            shutdown: Arc::clone(&self.shutdown_tx),
            commands: self.commands_tx.clone(),
            reports: self.reports.subscribe(),
            progress: self.progress_rx.clone(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    pub fn session(&self) -> &AggregationSession {
        &self.session
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame_size
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Open the capture and load the model
    ///
    /// Either failure is terminal: the state becomes `Failed` and the loop
    /// can never start.
    pub async fn start(&mut self) -> EmoscopeResult<()> {
        self.state = PipelineState::Loading;

        self.progress.report(10, "Starting camera");
        let size = match self.capture.open().await {
            Ok(size) => size,
            Err(e) => {
                let err = match e {
                    EmoscopeError::CaptureUnavailable(_) => e,
                    other => EmoscopeError::CaptureUnavailable(other.to_string()),
                };
                error!(error = %err, "Camera unavailable");
                self.progress.report(0, "Please allow camera permission");
                self.state = PipelineState::Failed;
                return Err(err);
            }
        };
        self.frame_size = Some(size);

        self.progress.report(30, "Loading face detection models");
        if let Err(e) = self.detector.load(&self.progress).await {
            let err = match e {
                EmoscopeError::ModelLoadFailed(_) => e,
                other => EmoscopeError::ModelLoadFailed(other.to_string()),
            };
            error!(detector = self.detector.name(), error = %err, "Model loading failed");
            self.progress.report(0, "Model loading failed");
            self.state = PipelineState::Failed;
            return Err(err);
        }

        self.progress.report(100, "Complete");
        self.state = PipelineState::Ready;
        self.session.reset_timeline(self.clock.now());
        info!(
            detector = self.detector.name(),
            width = size.width,
            height = size.height,
            "Pipeline ready"
        );
        Ok(())
    }

    /// Apply one command immediately
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SetMode(mode) => {
                debug!(%mode, "Switching mode");
                self.session.set_mode(mode);
            }
            Command::NextPracticeTarget => {
                let target = self.session.next_practice_target();
                debug!(practice_target = target, "Next practice target");
            }
            Command::ResetTimeline => {
                self.session.reset_timeline(self.clock.now());
                debug!("Timeline reset");
            }
        }
        self.stats.commands_applied += 1;
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            self.apply(command);
        }
    }

    /// Run one cycle: frame, detect, expand, aggregate, publish
    pub async fn run_cycle(&mut self) -> EmoscopeResult<FrameReport> {
        if !matches!(self.state, PipelineState::Ready | PipelineState::Running) {
            return Err(EmoscopeError::ModelNotReady);
        }

        let start = Instant::now();
        self.stats.cycles += 1;

        let (frame_size, observations) = match self.detect_frame().await {
            Ok(detected) => detected,
            Err(e) => {
                self.stats.failed_cycles += 1;
                if matches!(e, EmoscopeError::DetectionTimeout(_)) {
                    self.stats.timeouts += 1;
                }
                self.stats.last_cycle_duration = start.elapsed();
                return Err(e);
            }
        };

        // Stage 4: expand
        let faces = self.expander.analyze(&observations);

        // Stage 5: aggregate
        let now = self.clock.now();
        let view = self.session.observe(faces, now);
        self.state = PipelineState::Running;

        // Stage 6: publish
        let faces = self.session.faces().to_vec();
        let report = FrameReport {
            cycle: self.stats.cycles,
            elapsed_secs: self.session.elapsed_secs(now),
            frame_size,
            face_count: faces.len(),
            faces,
            mode: view.mode(),
            view,
        };
        self.reports.send_replace(Some(report.clone()));
        let closed = self
            .report_sink
            .as_ref()
            .map_or(false, |sink| sink.send(report.clone()).is_err());
        if closed {
            self.report_sink = None;
        }

        self.stats.completed += 1;
        self.stats.faces_seen += report.face_count as u64;
        self.stats.last_cycle_duration = start.elapsed();
        Ok(report)
    }

    /// Stages 1-3; every error comes back recoverable
    async fn detect_frame(&mut self) -> EmoscopeResult<(FrameSize, Vec<FaceObservation>)> {
        // Stage 1: frame
        let frame = self.capture.next_frame().await.map_err(into_cycle_error)?;

        // Stage 2: detect
        let options = DetectorOptions {
            max_faces: self.config.max_faces,
        };
        let detection = self.detector.detect(&frame, &options);
        let observations = match self.config.detect_timeout {
            Some(limit) => tokio::time::timeout(limit, detection)
                .await
                .map_err(|_| EmoscopeError::DetectionTimeout(limit))?,
            None => detection.await,
        }
        .map_err(into_cycle_error)?;

        // Stage 3: cap, clamp scores to [0, 1], rescale
        let mut observations = observations;
        observations.truncate(self.config.max_faces);
        for observation in &mut observations {
            observation.expressions = observation.expressions.sanitized();
        }
        let size = match self.config.display_size {
            Some(display) => {
                let (sx, sy) = frame.size.scale_to(display);
                observations = observations.into_iter().map(|o| o.rescale(sx, sy)).collect();
                display
            }
            None => frame.size,
        };

        Ok((size, observations))
    }

    /// Cycle until shutdown or `max_cycles`
    ///
    /// Failed cycles are logged and skipped. The next cycle is armed only
    /// after the current one finishes.
    pub async fn run(&mut self) -> EmoscopeResult<RuntimeStats> {
        if !matches!(self.state, PipelineState::Ready | PipelineState::Running) {
            return Err(EmoscopeError::ModelNotReady);
        }
        info!(
            mode = %self.session.mode(),
            delay = ?self.config.cycle_delay,
            timeout = ?self.config.detect_timeout,
            "Detection loop started"
        );

        loop {
            if *self.shutdown_rx.borrow_and_update() {
                info!("Shutdown requested");
                break;
            }

            self.drain_commands();

            if let Some(max) = self.config.max_cycles {
                if self.stats.cycles >= max {
                    debug!(max, "Cycle limit reached");
                    break;
                }
            }

            match self.run_cycle().await {
                Ok(report) => debug!(
                    cycle = report.cycle,
                    faces = report.face_count,
                    mode = %report.mode,
                    "Cycle complete"
                ),
                Err(e) if e.is_recoverable() => {
                    warn!(cycle = self.stats.cycles, error = %e, "Detection cycle failed");
                }
                Err(e) => {
                    error!(error = %e, "Detection loop aborted");
                    self.state = PipelineState::Failed;
                    return Err(e);
                }
            }

            tokio::select! {
                _ = self.shutdown_rx.changed() => {}
                _ = tokio::time::sleep(self.config.cycle_delay) => {}
            }
        }

        self.state = PipelineState::Stopped;
        info!(
            cycles = self.stats.cycles,
            completed = self.stats.completed,
            failed = self.stats.failed_cycles,
            "Detection loop stopped"
        );
        Ok(self.stats.clone())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("detector", &self.detector.name())
            .field("state", &self.state)
            .field("mode", &self.session.mode())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Mid-loop failures never end the session
fn into_cycle_error(e: EmoscopeError) -> EmoscopeError {
    if e.is_recoverable() {
        e
    } else {
        EmoscopeError::DetectionCycle(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlankCapture, Frame, ReplayDetector};
    use async_trait::async_trait;
    use emoscope_aggregate::SessionPhase;
    use emoscope_core::{BaseExpression, BoundingBox, ExpressionScores, ManualClock};

    fn face(expression: BaseExpression, x: f32) -> FaceObservation {
        FaceObservation::new(
            BoundingBox::new(x, 0.0, 64.0, 64.0),
            ExpressionScores::empty().with(expression, 0.9),
        )
    }

    fn replay(frames: Vec<Vec<FaceObservation>>) -> Box<dyn Detector> {
        Box::new(ReplayDetector::from_frames(frames))
    }

    fn pipeline(config: RuntimeConfig, detector: Box<dyn Detector>) -> Pipeline {
        Pipeline::new(config, Box::new(BlankCapture::default()), detector).unwrap()
    }

    /// Fails every other call
    struct Alternating {
        calls: u32,
    }

    #[async_trait]
    impl Detector for Alternating {
        fn name(&self) -> &str {
            "alternating"
        }

        async fn load(&mut self, _progress: &ProgressReporter) -> EmoscopeResult<()> {
            Ok(())
        }

        async fn detect(
            &mut self,
            _frame: &Frame,
            _options: &DetectorOptions,
        ) -> EmoscopeResult<Vec<FaceObservation>> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                Err(EmoscopeError::DetectionCycle("model hiccup".into()))
            } else {
                Ok(vec![face(BaseExpression::Happy, 0.0)])
            }
        }
    }

    /// Never answers
    struct Stalled;

    #[async_trait]
    impl Detector for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn load(&mut self, _progress: &ProgressReporter) -> EmoscopeResult<()> {
            Ok(())
        }

        async fn detect(
            &mut self,
            _frame: &Frame,
            _options: &DetectorOptions,
        ) -> EmoscopeResult<Vec<FaceObservation>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cycle_requires_start() {
        let mut p = pipeline(RuntimeConfig::default(), replay(vec![vec![]]));
        assert!(matches!(p.run_cycle().await, Err(EmoscopeError::ModelNotReady)));
        assert!(matches!(p.run().await, Err(EmoscopeError::ModelNotReady)));
        assert_eq!(p.stats().cycles, 0);
    }

    #[tokio::test]
    async fn test_capture_failure_is_terminal() {
        let mut p = Pipeline::new(
            RuntimeConfig::default(),
            Box::new(BlankCapture::new(FrameSize::new(0, 0))),
            replay(vec![vec![]]),
        )
        .unwrap();
        let handle = p.handle();

        assert!(matches!(p.start().await, Err(EmoscopeError::CaptureUnavailable(_))));
        assert_eq!(p.state(), PipelineState::Failed);
        assert_eq!(handle.progress().message, "Please allow camera permission");
        assert!(matches!(p.run().await, Err(EmoscopeError::ModelNotReady)));
    }

    #[tokio::test]
    async fn test_model_failure_is_terminal() {
        let mut p = pipeline(RuntimeConfig::default(), replay(Vec::new()));
        assert!(matches!(p.start().await, Err(EmoscopeError::ModelLoadFailed(_))));
        assert_eq!(p.state(), PipelineState::Failed);
        assert_eq!(p.handle().progress().percent, 0);
    }

    #[tokio::test]
    async fn test_single_cycle_report() {
        let mut p = pipeline(
            RuntimeConfig::default(),
            replay(vec![vec![face(BaseExpression::Happy, 0.0), face(BaseExpression::Sad, 100.0)]]),
        );
        p.start().await.unwrap();
        assert_eq!(p.state(), PipelineState::Ready);
        assert!(p.handle().progress().is_complete());

        let report = p.run_cycle().await.unwrap();
        assert_eq!(p.state(), PipelineState::Running);
        assert_eq!(p.session().phase(), SessionPhase::Running);
        assert_eq!(report.cycle, 1);
        assert_eq!(report.face_count, 2);
        assert_eq!(report.mode, Mode::Analyze);
        assert_eq!(report.faces[0].id.to_string(), "#1");
        assert_eq!(report.faces[1].color, "#FF6B6B");
        assert_eq!(p.handle().latest_report(), Some(report.clone()));
        assert!(report.to_string().starts_with("cycle 1 [analyze]"));
    }

    #[tokio::test]
    async fn test_truncates_and_rescales() {
        let config = RuntimeConfig {
            max_faces: 2,
            display_size: Some(FrameSize::new(1280, 960)),
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, replay(vec![vec![face(BaseExpression::Happy, 10.0); 4]]));
        p.start().await.unwrap();

        let report = p.run_cycle().await.unwrap();
        assert_eq!(report.face_count, 2);
        assert_eq!(report.frame_size, FrameSize::new(1280, 960));
        assert_eq!(report.faces[0].bbox.x, 20.0);
        assert_eq!(report.faces[0].bbox.width, 128.0);
    }

    /// Reports raw, unclamped scores
    struct OutOfRange;

    #[async_trait]
    impl Detector for OutOfRange {
        fn name(&self) -> &str {
            "out-of-range"
        }

        async fn load(&mut self, _progress: &ProgressReporter) -> EmoscopeResult<()> {
            Ok(())
        }

        async fn detect(
            &mut self,
            _frame: &Frame,
            _options: &DetectorOptions,
        ) -> EmoscopeResult<Vec<FaceObservation>> {
            let expressions: ExpressionScores =
                serde_json::from_str(r#"{"happy":3.0,"sad":-2.0}"#).unwrap();
            Ok(vec![FaceObservation::new(BoundingBox::new(0.0, 0.0, 64.0, 64.0), expressions)])
        }
    }

    #[tokio::test]
    async fn test_detector_scores_clamped() {
        let config = RuntimeConfig {
            initial_mode: Mode::Practice,
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, Box::new(OutOfRange));
        p.start().await.unwrap();

        let report = p.run_cycle().await.unwrap();
        let face = &report.faces[0];
        assert_eq!(face.dominant.expression, BaseExpression::Happy);
        assert_eq!(face.dominant.value, 1.0);
        assert_eq!(face.dominant_percent(), 100);
        assert_eq!(face.expressions.get(BaseExpression::Sad), 0.0);
        assert!(face.expressions.iter().all(|(_, v)| (0.0..=1.0).contains(&v)));
        match report.view {
            ModeView::Practice(view) => {
                assert_eq!(view.target_base, BaseExpression::Happy);
                assert_eq!(view.score.percent, 100.0);
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failures() {
        let config = RuntimeConfig {
            max_cycles: Some(6),
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, Box::new(Alternating { calls: 0 }));
        p.start().await.unwrap();

        let stats = p.run().await.unwrap();
        assert_eq!(stats.cycles, 6);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.failed_cycles, 3);
        assert_eq!(stats.faces_seen, 3);
        assert_eq!(p.state(), PipelineState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_fatal() {
        let config = RuntimeConfig {
            max_cycles: Some(2),
            detect_timeout: Some(Duration::from_millis(500)),
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, Box::new(Stalled));
        p.start().await.unwrap();

        let stats = p.run().await.unwrap();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.timeouts, 2);
        assert_eq!(stats.completed, 0);
        assert!(p.handle().latest_report().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_between_cycles() {
        let mut p = pipeline(
            RuntimeConfig::default(),
            replay(vec![vec![face(BaseExpression::Happy, 0.0)]]),
        );
        p.start().await.unwrap();
        let handle = p.handle();

        let task = tokio::spawn(async move {
            let stats = p.run().await;
            (stats, p.state())
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.shutdown();
        let (stats, state) = task.await.unwrap();
        let stats = stats.unwrap();

        assert_eq!(state, PipelineState::Stopped);
        assert!(stats.cycles >= 3 && stats.cycles <= 5, "cycles = {}", stats.cycles);
        assert_eq!(stats.cycles, stats.completed);
        assert!(handle.is_shutdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_stream_keeps_every_cycle() {
        let config = RuntimeConfig {
            max_cycles: Some(4),
            cycle_delay: Duration::ZERO,
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, Box::new(Alternating { calls: 0 }));
        p.start().await.unwrap();
        let mut reports = p.report_stream();

        let task = tokio::spawn(async move { p.run().await });
        let mut cycles = Vec::new();
        while let Some(report) = reports.recv().await {
            cycles.push(report.cycle);
        }
        let stats = task.await.unwrap().unwrap();

        // even cycles fail and publish nothing
        assert_eq!(cycles, vec![1, 3]);
        assert_eq!(stats.completed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_applied_between_cycles() {
        let clock = ManualClock::new();
        let config = RuntimeConfig {
            max_cycles: Some(1),
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, replay(vec![vec![face(BaseExpression::Happy, 0.0)]]))
            .with_clock(Arc::new(clock.clone()));
        p.start().await.unwrap();
        let handle = p.handle();

        assert!(handle.send(Command::SetMode(Mode::Timeline)).await);
        clock.advance(Duration::from_secs(3));
        p.run().await.unwrap();

        let report = handle.latest_report().unwrap();
        assert_eq!(report.mode, Mode::Timeline);
        assert_eq!(report.elapsed_secs, 3);
        match report.view {
            ModeView::Timeline(view) => {
                assert!(view.sampled);
                assert_eq!(view.points[0].time, 3);
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(p.stats().commands_applied, 1);
    }

    #[tokio::test]
    async fn test_practice_and_reset_commands() {
        let clock = ManualClock::new();
        let config = RuntimeConfig {
            initial_mode: Mode::Timeline,
            ..RuntimeConfig::default()
        };
        let mut p = pipeline(config, replay(vec![vec![face(BaseExpression::Happy, 0.0)]]))
            .with_clock(Arc::new(clock.clone()));
        p.start().await.unwrap();

        p.run_cycle().await.unwrap();
        assert_eq!(p.session().timeline().len(), 1);

        p.apply(Command::ResetTimeline);
        assert!(p.session().timeline().is_empty());

        p.apply(Command::NextPracticeTarget);
        assert_eq!(p.session().practice().target(), "optimism");
        assert_eq!(p.stats().commands_applied, 2);
    }

    #[test]
    fn test_command_serde() {
        let json = serde_json::to_string(&Command::SetMode(Mode::Compare)).unwrap();
        assert_eq!(json, r#"{"command":"set_mode","mode":"compare"}"#);
        let back: Command = serde_json::from_str(r#"{"command":"reset_timeline"}"#).unwrap();
        assert_eq!(back, Command::ResetTimeline);
    }
}
