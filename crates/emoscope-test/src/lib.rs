//! Emoscope Test Harness - synthetic faces, fault injection, scenarios
//!
//! This crate provides:
//! - Seeded synthetic detectors
//! - Flaky, hanging and failing detector wrappers
//! - A denied camera
//! - End-to-end scenarios with per-report invariant checks

pub mod chaos;
pub mod scenario;
pub mod synthetic;

pub use chaos::*;
pub use scenario::*;
pub use synthetic::*;
