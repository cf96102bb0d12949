//! Emoscope Aggregate - group statistics over the faces of a frame
//!
//! This crate turns a frame's [`FaceResult`](emoscope_core::FaceResult)s into:
//! - a dominant-emotion histogram and diversity score
//! - a pairwise comparison insight
//! - a sampled timeline of averaged happy/sad/angry confidence
//! - practice-mode scoring against a target emotion
//!
//! [`AggregationSession`] holds all of it as one explicit record that the
//! runtime feeds once per detection cycle.

pub mod comparison;
pub mod group;
pub mod practice;
pub mod session;
pub mod timeline;

pub use comparison::*;
pub use group::*;
pub use practice::*;
pub use session::*;
pub use timeline::*;

/// Upper-case the first character, as the front-ends label emotions
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
