//! Frame geometry - boxes, points and frame sizes in pixel space

use serde::{Deserialize, Serialize};

/// A 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

/// Axis-aligned face box: top-left corner, width, height
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }
}

/// Frame or display dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Per-axis factors mapping coordinates in `self` onto `target`
    ///
    /// A zero-sized source maps with factor 1 so nothing blows up.
    pub fn scale_to(&self, target: FrameSize) -> (f32, f32) {
        let axis = |from: u32, to: u32| {
            if from == 0 {
                1.0
            } else {
                to as f32 / from as f32
            }
        };
        (
            axis(self.width, target.width),
            axis(self.height, target.height),
        )
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        // capture request used by the webcam front-ends
        FrameSize::new(640, 480)
    }
}
