//! Aggregation session - all per-session state as one explicit record
//!
//! The runtime calls [`AggregationSession::observe`] once per detection
//! cycle with the freshly analyzed faces. The session keeps the current
//! faces, the timeline, the practice target and the active mode, and builds
//! the view for whichever mode is active.
//!
//! ```text
//! Uninitialized --observe--> Running --observe--> Running
//!                               |                    ^
//!                               +------ reset -------+
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use emoscope_core::{elapsed_secs, FaceResult};
use serde::{Deserialize, Serialize};

use crate::{
    Comparison, GroupStats, PracticeSession, PracticeView, Timeline, TimelineConfig,
    TimelinePoint, TimelineStats,
};

/// Which panel the presenter is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Analyze,
    Practice,
    Compare,
    Timeline,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Analyze, Mode::Practice, Mode::Compare, Mode::Timeline];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Analyze => "analyze",
            Mode::Practice => "practice",
            Mode::Compare => "compare",
            Mode::Timeline => "timeline",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown mode '{}'", s))
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No detection cycle has completed yet
    Uninitialized,
    Running,
}

/// Analyze-mode panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeView {
    /// True while no faces are in frame
    pub waiting: bool,
    pub group: GroupStats,
}

/// Timeline-mode panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    /// Oldest first
    pub points: Vec<TimelinePoint>,
    pub stats: TimelineStats,
    /// Whether this cycle appended a point
    pub sampled: bool,
}

/// The view of the active mode after one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeView {
    Analyze(AnalyzeView),
    Practice(PracticeView),
    Compare(Comparison),
    Timeline(TimelineView),
}

impl ModeView {
    pub fn mode(&self) -> Mode {
        match self {
            ModeView::Analyze(_) => Mode::Analyze,
            ModeView::Practice(_) => Mode::Practice,
            ModeView::Compare(_) => Mode::Compare,
            ModeView::Timeline(_) => Mode::Timeline,
        }
    }
}

/// Explicit session state fed once per cycle
#[derive(Debug, Clone)]
pub struct AggregationSession {
    phase: SessionPhase,
    mode: Mode,
    faces: Vec<FaceResult>,
    timeline: Timeline,
    practice: PracticeSession,
    anchor: Instant,
    frames_observed: u64,
    sampled_last: bool,
}

impl AggregationSession {
    pub fn new(config: TimelineConfig, now: Instant) -> Self {
        AggregationSession {
            phase: SessionPhase::Uninitialized,
            mode: Mode::default(),
            faces: Vec::new(),
            timeline: Timeline::new(config),
            practice: PracticeSession::new(),
            anchor: now,
            frames_observed: 0,
            sampled_last: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the current faces with this cycle's and update the timeline
    ///
    /// The timeline only samples while the timeline mode is active and at
    /// least one face is in frame.
    pub fn observe(&mut self, faces: Vec<FaceResult>, now: Instant) -> ModeView {
        self.phase = SessionPhase::Running;
        self.frames_observed += 1;
        self.faces = faces;

        self.sampled_last = false;
        if self.mode == Mode::Timeline && !self.faces.is_empty() {
            let elapsed = elapsed_secs(self.anchor, now);
            self.sampled_last = self.timeline.record(&self.faces, elapsed).is_some();
        }

        self.view()
    }

    /// View of the active mode over the current faces
    pub fn view(&self) -> ModeView {
        match self.mode {
            Mode::Analyze => ModeView::Analyze(AnalyzeView {
                waiting: self.faces.is_empty(),
                group: GroupStats::from_faces(&self.faces),
            }),
            Mode::Practice => ModeView::Practice(self.practice.view(&self.faces)),
            Mode::Compare => ModeView::Compare(Comparison::from_faces(&self.faces)),
            Mode::Timeline => ModeView::Timeline(TimelineView {
                points: self.timeline.points().copied().collect(),
                stats: self.timeline.stats(),
                sampled: self.sampled_last,
            }),
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn faces(&self) -> &[FaceResult] {
        &self.faces
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn practice(&self) -> &PracticeSession {
        &self.practice
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames_observed
    }

    /// Whole seconds since the session anchor
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        elapsed_secs(self.anchor, now)
    }

    /// Advance the practice target, recording the attempt if faces are present
    pub fn next_practice_target(&mut self) -> &'static str {
        self.practice.advance(&self.faces)
    }

    /// Clear the timeline and re-anchor elapsed time at `now`
    ///
    /// Current faces, mode, practice state and phase are untouched.
    pub fn reset_timeline(&mut self, now: Instant) {
        self.timeline.reset();
        self.anchor = now;
        self.sampled_last = false;
    }
}
