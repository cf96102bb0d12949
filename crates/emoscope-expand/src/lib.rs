//! Emoscope Expand - base expressions to extended emotions
//!
//! A detector scores 7 base expressions. This crate maps the dominant one
//! (or the top few) onto a curated vocabulary of display emotions through a
//! static weight table:
//!
//! ```text
//! intensity = clamp(base_confidence * weight * jitter, 0, 1)
//! ```
//!
//! then sorts by intensity and keeps the top N.
//!
//! ```rust
//! use emoscope_core::{BaseExpression, ExpressionScores};
//! use emoscope_expand::{EmotionExpander, ExpanderConfig};
//!
//! let mut expander = EmotionExpander::standard(ExpanderConfig::default());
//! let scores = ExpressionScores::empty().with(BaseExpression::Happy, 0.9);
//! let expansion = expander.expand(&scores);
//! assert_eq!(expansion.dominant.expression, BaseExpression::Happy);
//! assert_eq!(expansion.emotions[0].name, "joy");
//! ```

pub mod expander;
pub mod jitter;
pub mod library;

pub use expander::*;
pub use jitter::*;
pub use library::*;
