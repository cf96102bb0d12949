//! Base expressions - the 7 primitive categories a detector scores
//!
//! The canonical order below is also the tie-break order: when two
//! expressions share the maximum confidence, the one listed first wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the 7 primitive emotion categories produced by a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseExpression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl BaseExpression {
    /// All expressions in canonical order
    pub const ALL: [BaseExpression; 7] = [
        BaseExpression::Neutral,
        BaseExpression::Happy,
        BaseExpression::Sad,
        BaseExpression::Angry,
        BaseExpression::Fearful,
        BaseExpression::Disgusted,
        BaseExpression::Surprised,
    ];

    pub const COUNT: usize = 7;

    /// Position in canonical order
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseExpression::Neutral => "neutral",
            BaseExpression::Happy => "happy",
            BaseExpression::Sad => "sad",
            BaseExpression::Angry => "angry",
            BaseExpression::Fearful => "fearful",
            BaseExpression::Disgusted => "disgusted",
            BaseExpression::Surprised => "surprised",
        }
    }

    /// Display swatch used by presenters for bars and chart lines
    pub fn color(self) -> &'static str {
        match self {
            BaseExpression::Happy => "#FFD700",
            BaseExpression::Sad => "#4A90E2",
            BaseExpression::Angry => "#E74C3C",
            BaseExpression::Fearful => "#9B59B6",
            BaseExpression::Disgusted => "#95A5A6",
            BaseExpression::Surprised => "#F39C12",
            BaseExpression::Neutral => "#3498DB",
        }
    }
}

impl fmt::Display for BaseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseExpression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" => Ok(BaseExpression::Neutral),
            "happy" => Ok(BaseExpression::Happy),
            "sad" => Ok(BaseExpression::Sad),
            "angry" => Ok(BaseExpression::Angry),
            "fearful" => Ok(BaseExpression::Fearful),
            "disgusted" => Ok(BaseExpression::Disgusted),
            "surprised" => Ok(BaseExpression::Surprised),
            other => Err(format!("unknown base expression '{}'", other)),
        }
    }
}

/// The dominant expression of one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dominant {
    #[serde(rename = "type")]
    pub expression: BaseExpression,
    pub value: f32,
}

impl Dominant {
    /// Fallback when nothing scores above zero
    pub const NEUTRAL_ZERO: Dominant = Dominant {
        expression: BaseExpression::Neutral,
        value: 0.0,
    };
}

/// Confidence per base expression for one face
///
/// Missing keys read as 0. Values are sanitized on the way in: NaN and
/// negatives become 0, anything above 1 is clamped to 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionScores {
    pub neutral: f32,
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
    pub fearful: f32,
    pub disgusted: f32,
    pub surprised: f32,
}

impl ExpressionScores {
    /// All-zero mapping
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(name, confidence)` pairs; unknown names are skipped
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut scores = Self::empty();
        for (name, value) in pairs {
            if let Ok(expression) = name.parse::<BaseExpression>() {
                scores.set(expression, value);
            }
        }
        scores
    }

    #[inline]
    pub fn get(&self, expression: BaseExpression) -> f32 {
        match expression {
            BaseExpression::Neutral => self.neutral,
            BaseExpression::Happy => self.happy,
            BaseExpression::Sad => self.sad,
            BaseExpression::Angry => self.angry,
            BaseExpression::Fearful => self.fearful,
            BaseExpression::Disgusted => self.disgusted,
            BaseExpression::Surprised => self.surprised,
        }
    }

    pub fn set(&mut self, expression: BaseExpression, value: f32) {
        let value = sanitize(value);
        match expression {
            BaseExpression::Neutral => self.neutral = value,
            BaseExpression::Happy => self.happy = value,
            BaseExpression::Sad => self.sad = value,
            BaseExpression::Angry => self.angry = value,
            BaseExpression::Fearful => self.fearful = value,
            BaseExpression::Disgusted => self.disgusted = value,
            BaseExpression::Surprised => self.surprised = value,
        }
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, expression: BaseExpression, value: f32) -> Self {
        self.set(expression, value);
        self
    }

    /// Re-apply sanitization, e.g. after deserializing untrusted input
    pub fn sanitized(self) -> Self {
        let mut out = Self::empty();
        for (expression, value) in self.iter() {
            out.set(expression, value);
        }
        out
    }

    /// `(expression, confidence)` in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (BaseExpression, f32)> + '_ {
        BaseExpression::ALL.iter().map(move |e| (*e, self.get(*e)))
    }

    /// Argmax in canonical order, strictly-greater replacement
    ///
    /// Starts from neutral/0, so an all-zero mapping yields neutral/0 and a
    /// tie goes to whichever expression comes first in canonical order.
    pub fn dominant(&self) -> Dominant {
        let mut dominant = Dominant::NEUTRAL_ZERO;
        for (expression, value) in self.iter() {
            if value > dominant.value {
                dominant = Dominant { expression, value };
            }
        }
        dominant
    }

    /// The `k` highest-scoring expressions, ties in canonical order
    ///
    /// Zero scores are kept; callers that only want contributing bases
    /// filter on `value > 0`.
    pub fn top(&self, k: usize) -> Vec<Dominant> {
        let mut ranked: Vec<Dominant> = self
            .iter()
            .map(|(expression, value)| Dominant { expression, value })
            .collect();
        // stable sort keeps canonical order under ties
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(k);
        ranked
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
