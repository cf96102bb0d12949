//! Frame-local face identity
//!
//! Face ids are 1-based slot numbers within a single frame. They carry no
//! identity across frames: face #1 now need not be the person who was face
//! #1 a cycle ago.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Swatches assigned to face slots, in slot order
pub const FACE_PALETTE: [&str; 5] = ["#517bf2", "#FF6B6B", "#4CAF50", "#FFA726", "#9C27B0"];

/// Default cap on faces analyzed per frame
pub const MAX_FACES: usize = 5;

/// 1-based face slot within one frame
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u32);

impl FaceId {
    /// Id for the face at zero-based position `slot`
    #[inline]
    pub fn from_slot(slot: usize) -> Self {
        FaceId(slot as u32 + 1)
    }

    /// Zero-based position in the frame
    #[inline]
    pub fn slot(self) -> usize {
        self.0.saturating_sub(1) as usize
    }

    /// Palette swatch for this slot, wrapping past the palette length
    pub fn color(self) -> &'static str {
        FACE_PALETTE[self.slot() % FACE_PALETTE.len()]
    }
}

impl fmt::Debug for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Face(#{})", self.0)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
