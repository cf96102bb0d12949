//! Capture sources - where frames come from

use async_trait::async_trait;
use bytes::Bytes;
use emoscope_core::{EmoscopeError, EmoscopeResult, FrameSize};

/// One captured frame; the pixel layout is the detector's business
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub size: FrameSize,
    pub data: Bytes,
}

/// Supplier of live frames
///
/// `open` failing (permission denied, no device) ends the session with
/// [`EmoscopeError::CaptureUnavailable`].
#[async_trait]
pub trait CaptureSource: Send {
    async fn open(&mut self) -> EmoscopeResult<FrameSize>;

    async fn next_frame(&mut self) -> EmoscopeResult<Frame>;
}

/// Fixed-size frames with no pixel data
///
/// Pairs with detectors that do not look at pixels, such as replays.
#[derive(Debug, Clone)]
pub struct BlankCapture {
    size: FrameSize,
    next_index: u64,
    open: bool,
}

impl BlankCapture {
    pub fn new(size: FrameSize) -> Self {
        BlankCapture {
            size,
            next_index: 0,
            open: false,
        }
    }
}

impl Default for BlankCapture {
    fn default() -> Self {
        Self::new(FrameSize::default())
    }
}

#[async_trait]
impl CaptureSource for BlankCapture {
    async fn open(&mut self) -> EmoscopeResult<FrameSize> {
        if self.size.width == 0 || self.size.height == 0 {
            return Err(EmoscopeError::CaptureUnavailable(format!(
                "degenerate frame size {}x{}",
                self.size.width, self.size.height
            )));
        }
        self.open = true;
        Ok(self.size)
    }

    async fn next_frame(&mut self) -> EmoscopeResult<Frame> {
        if !self.open {
            return Err(EmoscopeError::DetectionCycle("capture is not open".into()));
        }
        let frame = Frame {
            index: self.next_index,
            size: self.size,
            data: Bytes::new(),
        };
        self.next_index += 1;
        Ok(frame)
    }
}
