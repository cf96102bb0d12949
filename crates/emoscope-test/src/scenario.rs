//! End-to-end scenarios
//!
//! Drives a full pipeline over synthetic faces and checks, on every report:
//! - face count never exceeds the cap
//! - every intensity lies in [0, 1]
//! - ids run 1..=n with the palette swatch for each slot
//! - the timeline never exceeds its capacity
//! - diversity is absent exactly when no faces are in frame

use std::sync::Arc;
use std::time::Duration;

use emoscope_aggregate::{diversity_score, Mode, ModeView};
use emoscope_core::{EmoscopeResult, FaceId, ManualClock};
use emoscope_runtime::{
    BlankCapture, Command, Detector, FrameReport, Pipeline, PipelineState, RuntimeConfig,
    RuntimeStats,
};
use tracing::debug;

use crate::{FaultPlan, FlakyDetector, HangingDetector, SyntheticConfig, SyntheticDetector};

/// Scenario configuration
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub cycles: u64,
    pub synthetic: SyntheticConfig,
    pub failures: FaultPlan,
    pub hangs: FaultPlan,
    pub runtime: RuntimeConfig,
    /// Session time per cycle
    pub tick: Duration,
    /// Commands applied before the cycle with the given number
    pub commands: Vec<(u64, Command)>,
}

impl ScenarioConfig {
    /// A few clean cycles
    pub fn minimal() -> Self {
        ScenarioConfig {
            cycles: 10,
            synthetic: SyntheticConfig::seeded(1),
            failures: FaultPlan::None,
            hangs: FaultPlan::None,
            runtime: RuntimeConfig {
                cycle_delay: Duration::ZERO,
                ..RuntimeConfig::default()
            },
            tick: Duration::from_millis(500),
            commands: Vec::new(),
        }
    }

    /// Timeline over a long session with intermittent failures
    pub fn standard() -> Self {
        ScenarioConfig {
            cycles: 200,
            failures: FaultPlan::Every(7),
            runtime: RuntimeConfig {
                initial_mode: Mode::Timeline,
                ..Self::minimal().runtime
            },
            ..Self::minimal()
        }
    }

    /// Crowded frames, random failures and stalls
    pub fn stress() -> Self {
        ScenarioConfig {
            cycles: 400,
            synthetic: SyntheticConfig {
                min_faces: 3,
                max_faces: 9,
                ..SyntheticConfig::seeded(42)
            },
            failures: FaultPlan::Random { rate: 0.2, seed: 42 },
            hangs: FaultPlan::Every(25),
            runtime: RuntimeConfig {
                initial_mode: Mode::Timeline,
                detect_timeout: Some(Duration::from_millis(200)),
                ..Self::minimal().runtime
            },
            ..Self::minimal()
        }
    }

    pub fn with_command(mut self, before_cycle: u64, command: Command) -> Self {
        self.commands.push((before_cycle, command));
        self
    }
}

/// What a scenario observed
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub stats: RuntimeStats,
    pub final_state: PipelineState,
    pub reports: Vec<FrameReport>,
    /// Human-readable invariant breaches
    pub violations: Vec<String>,
    pub max_timeline_len: usize,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.reports.last()
    }
}

/// Runs one scenario to completion
pub struct ScenarioHarness {
    config: ScenarioConfig,
    clock: ManualClock,
}

impl ScenarioHarness {
    pub fn new(config: ScenarioConfig) -> Self {
        ScenarioHarness {
            config,
            clock: ManualClock::new(),
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    fn detector(&self) -> Box<dyn Detector> {
        let synthetic: Box<dyn Detector> = Box::new(SyntheticDetector::new(self.config.synthetic.clone()));
        let flaky: Box<dyn Detector> = Box::new(FlakyDetector::new(synthetic, self.config.failures.clone()));
        Box::new(HangingDetector::new(flaky, self.config.hangs.clone()))
    }

    /// Run every cycle, checking invariants after each
    pub async fn run(&mut self) -> EmoscopeResult<ScenarioResult> {
        let runtime = self.config.runtime.clone();
        let capacity = runtime.timeline.capacity;
        let max_faces = runtime.max_faces;

        let mut pipeline = Pipeline::new(runtime, Box::new(BlankCapture::default()), self.detector())?
            .with_clock(Arc::new(self.clock.clone()));
        pipeline.start().await?;

        let mut reports = Vec::new();
        let mut violations = Vec::new();
        let mut max_timeline_len = 0;

        for cycle in 1..=self.config.cycles {
            for (_, command) in self.config.commands.iter().filter(|(at, _)| *at == cycle) {
                pipeline.apply(*command);
            }

            if let Ok(report) = pipeline.run_cycle().await {
                check_report(&report, max_faces, capacity, &mut violations);
                reports.push(report);
            }
            max_timeline_len = max_timeline_len.max(pipeline.session().timeline().len());

            self.clock.advance(self.config.tick);
        }

        debug!(
            cycles = pipeline.stats().cycles,
            violations = violations.len(),
            "Scenario finished"
        );

        Ok(ScenarioResult {
            stats: pipeline.stats().clone(),
            final_state: pipeline.state(),
            reports,
            violations,
            max_timeline_len,
        })
    }
}

fn check_report(report: &FrameReport, max_faces: usize, capacity: usize, violations: &mut Vec<String>) {
    let cycle = report.cycle;

    if report.face_count > max_faces {
        violations.push(format!("cycle {}: {} faces over cap {}", cycle, report.face_count, max_faces));
    }
    if report.face_count != report.faces.len() {
        violations.push(format!("cycle {}: face_count disagrees with faces", cycle));
    }

    for (slot, face) in report.faces.iter().enumerate() {
        let expected = FaceId::from_slot(slot);
        if face.id != expected || face.color != expected.color() {
            violations.push(format!("cycle {}: face {} has id {} color {}", cycle, slot, face.id, face.color));
        }
        for emotion in &face.top_emotions {
            if !(0.0..=1.0).contains(&emotion.intensity) {
                violations.push(format!(
                    "cycle {}: {} intensity {} out of range",
                    cycle, emotion.name, emotion.intensity
                ));
            }
        }
    }

    if diversity_score(&report.faces).is_some() == report.faces.is_empty() {
        violations.push(format!("cycle {}: diversity presence wrong", cycle));
    }

    if let ModeView::Timeline(view) = &report.view {
        if view.points.len() > capacity {
            violations.push(format!("cycle {}: timeline holds {} points", cycle, view.points.len()));
        }
        if view.points.windows(2).any(|w| w[0].time >= w[1].time) {
            violations.push(format!("cycle {}: timeline out of order", cycle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeniedCapture, FailingLoadDetector};
    use emoscope_core::EmoscopeError;

    #[tokio::test]
    async fn test_minimal_scenario() {
        let result = ScenarioHarness::new(ScenarioConfig::minimal()).run().await.unwrap();
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.stats.cycles, 10);
        assert_eq!(result.stats.completed, 10);
        assert_eq!(result.final_state, PipelineState::Running);
    }

    #[tokio::test]
    async fn test_standard_scenario_survives_failures() {
        let result = ScenarioHarness::new(ScenarioConfig::standard()).run().await.unwrap();
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.stats.cycles, 200);
        // every 7th call of 200 fails
        assert_eq!(result.stats.failed_cycles, 28);
        assert_eq!(result.stats.completed, 172);
        assert_eq!(result.reports.len(), 172);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stress_scenario() {
        let result = ScenarioHarness::new(ScenarioConfig::stress()).run().await.unwrap();
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.stats.cycles, 400);
        assert_eq!(result.stats.timeouts, 16);
        assert!(result.stats.failed_cycles > result.stats.timeouts);
        assert!(result.max_timeline_len <= 30);
        // 200 s of session time at a 2 s interval fills the buffer
        assert_eq!(result.max_timeline_len, 30);
        assert!(result.reports.iter().all(|r| r.face_count <= 5));
    }

    #[tokio::test]
    async fn test_timeline_samples_every_interval() {
        let config = ScenarioConfig {
            cycles: 20,
            synthetic: SyntheticConfig::crowd(5, 2),
            ..ScenarioConfig::standard()
        };
        let config = ScenarioConfig {
            failures: FaultPlan::None,
            ..config
        };
        let result = ScenarioHarness::new(config).run().await.unwrap();
        let last = result.last_report().unwrap();
        match &last.view {
            ModeView::Timeline(view) => {
                // a cycle every 0.5 s; each sample must be strictly more than 2 s after the last
                let times: Vec<u64> = view.points.iter().map(|p| p.time).collect();
                assert_eq!(times, vec![0, 3, 6, 9]);
                assert_eq!(view.stats.duration_secs, 9);
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_commands_switch_views() {
        let config = ScenarioConfig {
            synthetic: SyntheticConfig::crowd(8, 3),
            ..ScenarioConfig::minimal()
        }
        .with_command(3, Command::SetMode(Mode::Compare))
        .with_command(6, Command::SetMode(Mode::Practice))
        .with_command(8, Command::NextPracticeTarget);

        let result = ScenarioHarness::new(config).run().await.unwrap();
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.reports[1].mode, Mode::Analyze);
        assert_eq!(result.reports[2].mode, Mode::Compare);
        assert_eq!(result.reports[5].mode, Mode::Practice);

        match &result.last_report().unwrap().view {
            ModeView::Practice(view) => {
                assert_eq!(view.target, "Optimism");
                assert_eq!(view.history.len(), 1);
                assert_eq!(view.history[0].emotion, "Joy");
            }
            other => panic!("unexpected view {:?}", other),
        }
        assert_eq!(result.stats.commands_applied, 3);
    }

    #[tokio::test]
    async fn test_reports_are_json_lines() {
        let config = ScenarioConfig::minimal().with_command(2, Command::SetMode(Mode::Compare));
        let result = ScenarioHarness::new(config).run().await.unwrap();

        for report in &result.reports {
            let line = serde_json::to_string(report).unwrap();
            assert!(!line.contains('\n'));
            let value: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(value["cycle"], report.cycle);
            assert_eq!(value["mode"], report.mode.to_string());
            assert_eq!(value["face_count"], report.faces.len());
        }
        let last: FrameReport =
            serde_json::from_str(&serde_json::to_string(result.last_report().unwrap()).unwrap()).unwrap();
        assert_eq!(last.mode, Mode::Compare);
    }

    #[tokio::test]
    async fn test_never_starts_without_model() {
        let mut pipeline = Pipeline::new(
            RuntimeConfig::default(),
            Box::new(BlankCapture::default()),
            Box::new(FailingLoadDetector::new("weights missing")),
        )
        .unwrap();
        let handle = pipeline.handle();

        let err = pipeline.start().await.unwrap_err();
        assert!(matches!(err, EmoscopeError::ModelLoadFailed(_)));
        assert!(err.to_string().contains("weights missing"));
        assert_eq!(handle.progress().message, "Model loading failed");
        assert!(matches!(pipeline.run().await, Err(EmoscopeError::ModelNotReady)));
        assert_eq!(pipeline.stats().cycles, 0);
    }

    #[tokio::test]
    async fn test_denied_camera() {
        let mut pipeline = Pipeline::new(
            RuntimeConfig::default(),
            Box::new(DeniedCapture),
            Box::new(SyntheticDetector::new(SyntheticConfig::default())),
        )
        .unwrap();

        let err = pipeline.start().await.unwrap_err();
        assert!(matches!(err, EmoscopeError::CaptureUnavailable(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_shutdown() {
        let config = RuntimeConfig {
            detect_timeout: Some(Duration::from_secs(1)),
            ..RuntimeConfig::default()
        };
        let detector = HangingDetector::new(
            Box::new(SyntheticDetector::new(SyntheticConfig::seeded(3))),
            FaultPlan::Every(2),
        )
        .stalling_for(Duration::from_millis(300));
        let mut pipeline = Pipeline::new(config, Box::new(BlankCapture::default()), Box::new(detector)).unwrap();
        pipeline.start().await.unwrap();
        let handle = pipeline.handle();

        let task = tokio::spawn(async move { pipeline.run().await });

        let mut reports = handle.reports();
        reports.changed().await.unwrap();
        assert!(handle.latest_report().is_some());
        assert!(handle.send(Command::SetMode(Mode::Compare)).await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.shutdown();
        let stats = task.await.unwrap().unwrap();

        assert!(stats.completed >= 4, "completed = {}", stats.completed);
        assert_eq!(stats.failed_cycles, 0);
        assert_eq!(stats.commands_applied, 1);
        assert_eq!(handle.latest_report().map(|r| r.mode), Some(Mode::Compare));
    }
}
