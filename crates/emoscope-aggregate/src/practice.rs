//! Practice mode - mimic a target emotion and get scored
//!
//! The target cycles through a fixed 21-term vocabulary. Each term maps to
//! the base expression that scores it; the match score is the first face's
//! confidence for that base, as a percentage.

use std::collections::VecDeque;
use std::fmt;

use emoscope_core::{BaseExpression, FaceResult};
use serde::{Deserialize, Serialize};

use crate::display_name;

/// Practice targets in cycling order, with the base that scores each
pub const PRACTICE_VOCABULARY: [(&str, BaseExpression); 21] = [
    ("admiration", BaseExpression::Neutral),
    ("aggressiveness", BaseExpression::Angry),
    ("amazement", BaseExpression::Surprised),
    ("annoyance", BaseExpression::Angry),
    ("apprehension", BaseExpression::Fearful),
    ("boredom", BaseExpression::Disgusted),
    ("disappointment", BaseExpression::Sad),
    ("disgust", BaseExpression::Disgusted),
    ("ecstasy", BaseExpression::Happy),
    ("grief", BaseExpression::Sad),
    ("interest", BaseExpression::Neutral),
    ("joy", BaseExpression::Happy),
    ("optimism", BaseExpression::Happy),
    ("pensiveness", BaseExpression::Sad),
    ("rage", BaseExpression::Angry),
    ("sadness", BaseExpression::Sad),
    ("surprise", BaseExpression::Surprised),
    ("tears of joy", BaseExpression::Happy),
    ("terror", BaseExpression::Fearful),
    ("trust", BaseExpression::Neutral),
    ("vigilance", BaseExpression::Fearful),
];

/// Index of `joy`, where practice starts
pub const PRACTICE_START: usize = 11;

/// Attempts remembered in the history panel
pub const PRACTICE_HISTORY_LEN: usize = 5;

/// Feedback tier for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeFeedback {
    /// No face in frame
    NoFace,
    Excellent,
    Good,
    GettingBetter,
    KeepTrying,
}

impl PracticeFeedback {
    pub fn for_score(percent: f32) -> Self {
        if percent > 80.0 {
            PracticeFeedback::Excellent
        } else if percent > 60.0 {
            PracticeFeedback::Good
        } else if percent > 40.0 {
            PracticeFeedback::GettingBetter
        } else {
            PracticeFeedback::KeepTrying
        }
    }
}

impl fmt::Display for PracticeFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PracticeFeedback::NoFace => "Position your face to start practice!",
            PracticeFeedback::Excellent => "Excellent! Perfect expression!",
            PracticeFeedback::Good => "Good job! Almost there!",
            PracticeFeedback::GettingBetter => "Getting better! Keep trying!",
            PracticeFeedback::KeepTrying => "Try to express the emotion more clearly!",
        };
        f.write_str(text)
    }
}

/// Score of the current frame against the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PracticeScore {
    /// 0 - 100, unrounded
    pub percent: f32,
    pub feedback: PracticeFeedback,
}

impl PracticeScore {
    pub fn rounded(&self) -> u32 {
        self.percent.round() as u32
    }
}

/// One finished attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeAttempt {
    pub emotion: String,
    pub score: u32,
}

/// Practice-mode panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeView {
    pub target: String,
    pub target_base: BaseExpression,
    pub score: PracticeScore,
    /// Newest first
    pub history: Vec<PracticeAttempt>,
}

/// Cycling target plus recent attempts
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSession {
    index: usize,
    history: VecDeque<PracticeAttempt>,
}

impl PracticeSession {
    pub fn new() -> Self {
        PracticeSession {
            index: PRACTICE_START,
            history: VecDeque::with_capacity(PRACTICE_HISTORY_LEN),
        }
    }

    pub fn target(&self) -> &'static str {
        PRACTICE_VOCABULARY[self.index].0
    }

    pub fn target_base(&self) -> BaseExpression {
        PRACTICE_VOCABULARY[self.index].1
    }

    /// Score the first face against the current target
    pub fn score(&self, faces: &[FaceResult]) -> PracticeScore {
        match faces.first() {
            None => PracticeScore {
                percent: 0.0,
                feedback: PracticeFeedback::NoFace,
            },
            Some(face) => {
                let percent = face.expressions.get(self.target_base()) * 100.0;
                PracticeScore {
                    percent,
                    feedback: PracticeFeedback::for_score(percent),
                }
            }
        }
    }

    /// Move to the next target
    ///
    /// With faces in frame, the attempt at the outgoing target is pushed to
    /// the front of the history.
    pub fn advance(&mut self, faces: &[FaceResult]) -> &'static str {
        if !faces.is_empty() {
            let attempt = PracticeAttempt {
                emotion: display_name(self.target()),
                score: self.score(faces).rounded(),
            };
            self.history.push_front(attempt);
            self.history.truncate(PRACTICE_HISTORY_LEN);
        }
        self.index = (self.index + 1) % PRACTICE_VOCABULARY.len();
        self.target()
    }

    /// Newest first
    pub fn history(&self) -> impl Iterator<Item = &PracticeAttempt> {
        self.history.iter()
    }

    pub fn view(&self, faces: &[FaceResult]) -> PracticeView {
        PracticeView {
            target: display_name(self.target()),
            target_base: self.target_base(),
            score: self.score(faces),
            history: self.history.iter().cloned().collect(),
        }
    }
}

impl Default for PracticeSession {
    fn default() -> Self {
        Self::new()
    }
}
