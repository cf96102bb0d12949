//! Emoscope Core - Fundamental records shared by every pipeline stage
//!
//! This crate defines the detector-agnostic vocabulary of the pipeline:
//! - Base expressions and their confidence mappings
//! - Face observations (what a detector hands us) and face results
//!   (what the expander hands the aggregator and presenter)
//! - Frame-local face identifiers and the swatch palette
//! - Session clocks
//! - The error type

pub mod error;
pub mod expression;
pub mod face;
pub mod geometry;
pub mod id;
pub mod time;

pub use error::*;
pub use expression::*;
pub use face::*;
pub use geometry::*;
pub use id::*;
pub use time::*;
