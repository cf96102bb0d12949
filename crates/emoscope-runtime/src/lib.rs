//! Emoscope Runtime - the detection loop and its collaborators
//!
//! One cycle runs to completion before the next is armed:
//! 1. Pull a frame from the [`CaptureSource`]
//! 2. Run the [`Detector`] (bounded by a timeout)
//! 3. Cap and rescale detections
//! 4. Expand each face's expressions
//! 5. Feed the aggregation session
//! 6. Publish a [`FrameReport`]
//!
//! Capture and model-load failures end the session. A failing cycle is
//! logged and the loop keeps going.

pub mod capture;
pub mod config;
pub mod detector;
pub mod observability;
pub mod pipeline;
pub mod replay;

pub use capture::*;
pub use config::*;
pub use detector::*;
pub use observability::*;
pub use pipeline::*;
pub use replay::*;
