//! Face records - detector output in, analyzed faces out
//!
//! Everything here is a plain serializable record so presenters (canvas,
//! terminal, log) never see detector-specific types.

use serde::{Deserialize, Serialize};

use crate::{BaseExpression, BoundingBox, Dominant, ExpressionScores, FaceId, Point};

/// What a detector reports for one face in one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<Point>,
    #[serde(default)]
    pub expressions: ExpressionScores,
}

impl FaceObservation {
    pub fn new(bbox: BoundingBox, expressions: ExpressionScores) -> Self {
        Self {
            bbox,
            landmarks: Vec::new(),
            expressions,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Vec<Point>) -> Self {
        self.landmarks = landmarks;
        self
    }

    /// Map box and landmarks by per-axis factors
    pub fn rescale(mut self, sx: f32, sy: f32) -> Self {
        self.bbox = self.bbox.scale(sx, sy);
        for p in &mut self.landmarks {
            *p = p.scale(sx, sy);
        }
        self
    }
}

/// An extended display emotion derived from a base expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedEmotion {
    pub name: String,
    /// Always within [0, 1]
    pub intensity: f32,
    pub base_emotion: BaseExpression,
}

impl ExpandedEmotion {
    /// Intensity as a whole percentage
    pub fn percent(&self) -> u32 {
        (self.intensity * 100.0).round() as u32
    }
}

/// One analyzed face for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    pub id: FaceId,
    pub color: String,
    pub dominant: Dominant,
    pub top_emotions: Vec<ExpandedEmotion>,
    pub expressions: ExpressionScores,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<Point>,
}

impl FaceResult {
    /// Strongest extended emotion, if the library produced any
    pub fn headline(&self) -> Option<&ExpandedEmotion> {
        self.top_emotions.first()
    }

    /// Dominant confidence as a whole percentage
    pub fn dominant_percent(&self) -> u32 {
        (self.dominant.value * 100.0).round() as u32
    }
}
