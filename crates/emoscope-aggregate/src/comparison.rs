//! Pairwise comparison - how aligned are the people in frame?

use std::fmt;

use emoscope_core::{BaseExpression, FaceId, FaceResult};
use serde::{Deserialize, Serialize};

use crate::{display_name, EmotionHistogram};

/// Classification of a face set by its dominant expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonInsight {
    /// Fewer than two faces
    NeedMoreFaces,
    /// Everyone shares one dominant expression
    Synchrony {
        expression: BaseExpression,
        people: usize,
    },
    /// Every face has a different dominant expression
    HighDiversity { people: usize },
    Mixed { distinct: usize, people: usize },
}

impl ComparisonInsight {
    pub fn from_faces(faces: &[FaceResult]) -> Self {
        let histogram = EmotionHistogram::from_faces(faces);
        let people = histogram.faces();
        if people < 2 {
            return ComparisonInsight::NeedMoreFaces;
        }

        let distinct = histogram.distinct();
        match histogram.most_common() {
            Some(expression) if distinct == 1 => ComparisonInsight::Synchrony { expression, people },
            _ if distinct == people => ComparisonInsight::HighDiversity { people },
            _ => ComparisonInsight::Mixed { distinct, people },
        }
    }
}

impl fmt::Display for ComparisonInsight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonInsight::NeedMoreFaces => {
                write!(f, "Need at least 2 faces to compare")
            }
            ComparisonInsight::Synchrony { expression, people } => write!(
                f,
                "All {} people are feeling {}! Strong emotional synchrony.",
                people, expression
            ),
            ComparisonInsight::HighDiversity { .. } => {
                write!(f, "Everyone is experiencing different emotions. High emotional diversity!")
            }
            ComparisonInsight::Mixed { distinct, people } => write!(
                f,
                "Mix of emotions detected. {} different emotional states among {} people.",
                distinct, people
            ),
        }
    }
}

/// Side-by-side card for one face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonCard {
    pub id: FaceId,
    pub color: String,
    /// Capitalized top extended emotion, or the dominant base if none
    pub label: String,
    pub dominant_percent: u32,
}

impl ComparisonCard {
    pub fn from_face(face: &FaceResult) -> Self {
        let label = match face.headline() {
            Some(emotion) => display_name(&emotion.name),
            None => display_name(face.dominant.expression.as_str()),
        };
        ComparisonCard {
            id: face.id,
            color: face.color.clone(),
            label,
            dominant_percent: face.dominant_percent(),
        }
    }
}

/// Compare-mode panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Empty below two faces
    pub cards: Vec<ComparisonCard>,
    pub insight: ComparisonInsight,
}

impl Comparison {
    pub fn from_faces(faces: &[FaceResult]) -> Self {
        let insight = ComparisonInsight::from_faces(faces);
        let cards = match insight {
            ComparisonInsight::NeedMoreFaces => Vec::new(),
            _ => faces.iter().map(ComparisonCard::from_face).collect(),
        };
        Comparison { cards, insight }
    }
}
