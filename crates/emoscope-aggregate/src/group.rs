//! Group statistics - dominant-emotion histogram and diversity

use emoscope_core::{BaseExpression, FaceResult};
use serde::{Deserialize, Serialize};

/// Faces sharing one dominant expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub expression: BaseExpression,
    pub count: usize,
    /// Share of all faces, 0 - 100
    pub percent: f32,
}

/// Count of faces per dominant expression
///
/// Buckets are sorted by descending count. Equal counts keep the order in
/// which each expression first appeared among the faces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionHistogram {
    buckets: Vec<HistogramBucket>,
    faces: usize,
}

impl EmotionHistogram {
    pub fn from_faces(faces: &[FaceResult]) -> Self {
        Self::from_dominants(faces.iter().map(|f| f.dominant.expression))
    }

    pub fn from_dominants<I>(dominants: I) -> Self
    where
        I: IntoIterator<Item = BaseExpression>,
    {
        let mut buckets: Vec<HistogramBucket> = Vec::new();
        let mut faces = 0;
        for expression in dominants {
            faces += 1;
            match buckets.iter_mut().find(|b| b.expression == expression) {
                Some(bucket) => bucket.count += 1,
                None => buckets.push(HistogramBucket {
                    expression,
                    count: 1,
                    percent: 0.0,
                }),
            }
        }

        for bucket in &mut buckets {
            bucket.percent = bucket.count as f32 / faces as f32 * 100.0;
        }
        // stable: first appearance wins ties
        buckets.sort_by(|a, b| b.count.cmp(&a.count));

        EmotionHistogram { buckets, faces }
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    pub fn count(&self, expression: BaseExpression) -> usize {
        self.buckets
            .iter()
            .find(|b| b.expression == expression)
            .map(|b| b.count)
            .unwrap_or(0)
    }

    /// Number of distinct dominant expressions
    pub fn distinct(&self) -> usize {
        self.buckets.len()
    }

    pub fn faces(&self) -> usize {
        self.faces
    }

    pub fn most_common(&self) -> Option<BaseExpression> {
        self.buckets.first().map(|b| b.expression)
    }

    /// `round(distinct / faces * 100)`, or `None` with no faces
    pub fn diversity(&self) -> Option<u32> {
        if self.faces == 0 {
            return None;
        }
        Some((self.distinct() as f64 / self.faces as f64 * 100.0).round() as u32)
    }
}

/// Diversity score of a frame's faces
pub fn diversity_score(faces: &[FaceResult]) -> Option<u32> {
    EmotionHistogram::from_faces(faces).diversity()
}

/// Group panel for the analyze mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub face_count: usize,
    pub histogram: Vec<HistogramBucket>,
    pub most_common: Option<BaseExpression>,
    pub diversity: Option<u32>,
}

impl GroupStats {
    pub fn from_faces(faces: &[FaceResult]) -> Self {
        let histogram = EmotionHistogram::from_faces(faces);
        GroupStats {
            face_count: histogram.faces(),
            most_common: histogram.most_common(),
            diversity: histogram.diversity(),
            histogram: histogram.buckets,
        }
    }

    /// `"67%"`, or `"-"` with no faces
    pub fn diversity_label(&self) -> String {
        match self.diversity {
            Some(score) => format!("{}%", score),
            None => "-".to_string(),
        }
    }

    pub fn most_common_label(&self) -> &'static str {
        self.most_common.map(BaseExpression::as_str).unwrap_or("-")
    }
}
