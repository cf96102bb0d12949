//! Timeline - periodic samples of group-averaged confidence
//!
//! A point is appended when the buffer is empty or the elapsed time has moved
//! strictly past `last.time + sample_interval_secs`. The buffer is a FIFO
//! capped at `capacity`.

use std::collections::VecDeque;

use emoscope_core::{BaseExpression, FaceResult};
use serde::{Deserialize, Serialize};

/// Expressions tracked on the timeline, in chart order
pub const TIMELINE_EXPRESSIONS: [BaseExpression; 3] =
    [BaseExpression::Happy, BaseExpression::Sad, BaseExpression::Angry];

/// Timeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub sample_interval_secs: u64,
    pub capacity: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            sample_interval_secs: 2,
            capacity: 30,
        }
    }
}

/// One sample: seconds since session start and group averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: u64,
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
}

impl TimelinePoint {
    /// Average the tracked expressions over `faces`
    ///
    /// Returns `None` for an empty face set.
    pub fn average(time: u64, faces: &[FaceResult]) -> Option<Self> {
        if faces.is_empty() {
            return None;
        }
        let n = faces.len() as f32;
        let mean = |e: BaseExpression| faces.iter().map(|f| f.expressions.get(e)).sum::<f32>() / n;
        Some(TimelinePoint {
            time,
            happy: mean(BaseExpression::Happy),
            sad: mean(BaseExpression::Sad),
            angry: mean(BaseExpression::Angry),
        })
    }

    pub fn get(&self, expression: BaseExpression) -> Option<f32> {
        match expression {
            BaseExpression::Happy => Some(self.happy),
            BaseExpression::Sad => Some(self.sad),
            BaseExpression::Angry => Some(self.angry),
            _ => None,
        }
    }
}

/// Summary panel for the timeline mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineStats {
    /// Elapsed seconds at the latest sample
    pub duration_secs: u64,
    /// Tracked expression with the highest single sample
    pub peak: Option<BaseExpression>,
    /// First face's dominant at the latest sample
    pub current_dominant: Option<BaseExpression>,
    pub change_count: u64,
    pub samples: usize,
}

/// Bounded sample buffer plus the change counter
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    config: TimelineConfig,
    points: VecDeque<TimelinePoint>,
    change_count: u64,
    last_dominant: Option<BaseExpression>,
    last_time: Option<u64>,
}

impl Timeline {
    pub fn new(config: TimelineConfig) -> Self {
        Timeline {
            config,
            points: VecDeque::with_capacity(config.capacity),
            change_count: 0,
            last_dominant: None,
            last_time: None,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Whether a sample at `elapsed` would pass the gate
    pub fn is_due(&self, elapsed: u64) -> bool {
        match self.last_time {
            None => true,
            Some(last) => elapsed > last.saturating_add(self.config.sample_interval_secs),
        }
    }

    /// Sample the faces if the gate passes; returns the appended point
    ///
    /// The change counter compares the first face's dominant expression with
    /// the one recorded at the previous sample. It is a coarse volatility
    /// proxy, not a per-person metric.
    pub fn record(&mut self, faces: &[FaceResult], elapsed: u64) -> Option<TimelinePoint> {
        if !self.is_due(elapsed) {
            return None;
        }
        let point = TimelinePoint::average(elapsed, faces)?;

        self.points.push_back(point);
        while self.points.len() > self.config.capacity {
            self.points.pop_front();
        }
        self.last_time = Some(elapsed);

        let current = faces[0].dominant.expression;
        if matches!(self.last_dominant, Some(previous) if previous != current) {
            self.change_count += 1;
        }
        self.last_dominant = Some(current);

        Some(point)
    }

    /// Oldest first
    pub fn points(&self) -> impl Iterator<Item = &TimelinePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&TimelinePoint> {
        self.points.back()
    }

    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn last_dominant(&self) -> Option<BaseExpression> {
        self.last_dominant
    }

    /// Tracked expression whose largest sample is highest
    ///
    /// Starts at happy/0 and only moves on a strictly greater value.
    pub fn peak(&self) -> Option<BaseExpression> {
        if self.points.is_empty() {
            return None;
        }
        let mut peak = BaseExpression::Happy;
        let mut peak_value = 0.0f32;
        for expression in TIMELINE_EXPRESSIONS {
            let max = self
                .points
                .iter()
                .filter_map(|p| p.get(expression))
                .fold(f32::MIN, f32::max);
            if max > peak_value {
                peak = expression;
                peak_value = max;
            }
        }
        Some(peak)
    }

    pub fn stats(&self) -> TimelineStats {
        TimelineStats {
            duration_secs: self.latest().map(|p| p.time).unwrap_or(0),
            peak: self.peak(),
            current_dominant: self.last_dominant,
            change_count: self.change_count,
            samples: self.points.len(),
        }
    }

    /// Drop every sample and counter
    pub fn reset(&mut self) {
        self.points.clear();
        self.change_count = 0;
        self.last_dominant = None;
        self.last_time = None;
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}
