//! Replay detector - recorded detections played back frame by frame
//!
//! A recording is JSON lines: each non-blank line holds the array of
//! [`FaceObservation`]s for one frame. Lines starting with `#` are comments.
//!
//! ```text
//! # two people, then one
//! [{"bbox":{"x":10,"y":20,"width":80,"height":80},"expressions":{"happy":0.9}}, ...]
//! [{"bbox":{"x":12,"y":21,"width":80,"height":80},"expressions":{"sad":0.7}}]
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use emoscope_core::{EmoscopeError, EmoscopeResult, FaceObservation};
use tracing::{debug, info};

use crate::{Detector, DetectorOptions, Frame, ProgressReporter};

/// Plays back a recording, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    path: Option<PathBuf>,
    frames: Vec<Vec<FaceObservation>>,
    cursor: usize,
    loaded: bool,
}

impl ReplayDetector {
    /// Detector that reads `path` on load
    pub fn open(path: impl Into<PathBuf>) -> Self {
        ReplayDetector {
            path: Some(path.into()),
            frames: Vec::new(),
            cursor: 0,
            loaded: false,
        }
    }

    /// Detector over in-memory frames; load only validates
    pub fn from_frames(frames: Vec<Vec<FaceObservation>>) -> Self {
        ReplayDetector {
            path: None,
            frames,
            cursor: 0,
            loaded: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Parse a JSON-lines recording
pub fn parse_recording(text: &str) -> EmoscopeResult<Vec<Vec<FaceObservation>>> {
    let mut frames = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let faces: Vec<FaceObservation> = serde_json::from_str(line).map_err(|e| {
            EmoscopeError::ModelLoadFailed(format!("recording line {}: {}", lineno + 1, e))
        })?;
        frames.push(faces);
    }
    Ok(frames)
}

#[async_trait]
impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        "replay"
    }

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()> {
        if let Some(path) = &self.path {
            progress.report(40, "Reading recording");
            let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                EmoscopeError::ModelLoadFailed(format!("{}: {}", path.display(), e))
            })?;
            progress.report(80, "Parsing recording");
            self.frames = parse_recording(&text)?;
        }

        if self.frames.is_empty() {
            return Err(EmoscopeError::ModelLoadFailed("recording has no frames".into()));
        }

        self.cursor = 0;
        self.loaded = true;
        info!(frames = self.frames.len(), "Replay loaded");
        Ok(())
    }

    async fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>> {
        if !self.loaded {
            return Err(EmoscopeError::DetectionCycle("replay is not loaded".into()));
        }

        let mut faces = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        faces.truncate(options.max_faces);

        debug!(frame = frame.index, faces = faces.len(), "Replayed detections");
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use emoscope_core::{BaseExpression, BoundingBox, ExpressionScores, FrameSize};

    fn frame(index: u64) -> Frame {
        Frame {
            index,
            size: FrameSize::default(),
            data: Bytes::new(),
        }
    }

    fn face(expression: BaseExpression) -> FaceObservation {
        FaceObservation::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            ExpressionScores::empty().with(expression, 0.9),
        )
    }

    #[test]
    fn test_parse_recording() {
        let text = r#"
# comment
[{"bbox":{"x":1,"y":2,"width":3,"height":4},"expressions":{"happy":0.9,"sad":1.5}}]

[]
"#;
        let frames = parse_recording(text).unwrap();
        assert_eq!(frames.len(), 2);
        // clamped later by the pipeline
        assert_eq!(frames[0][0].expressions.get(BaseExpression::Sad), 1.5);
        assert!(frames[1].is_empty());
    }

    #[test]
    fn test_parse_reports_line() {
        let err = parse_recording("[]\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_detect_before_load_fails() {
        let mut detector = ReplayDetector::from_frames(vec![vec![face(BaseExpression::Happy)]]);
        let err = detector
            .detect(&frame(0), &DetectorOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_cycles_and_caps() {
        let (progress, _rx) = ProgressReporter::new();
        let mut detector = ReplayDetector::from_frames(vec![
            vec![face(BaseExpression::Happy); 3],
            vec![face(BaseExpression::Sad)],
        ]);
        detector.load(&progress).await.unwrap();

        let options = DetectorOptions { max_faces: 2 };
        assert_eq!(detector.detect(&frame(0), &options).await.unwrap().len(), 2);
        assert_eq!(detector.detect(&frame(1), &options).await.unwrap().len(), 1);
        assert_eq!(detector.detect(&frame(2), &options).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_recording_fails_load() {
        let (progress, _rx) = ProgressReporter::new();
        let mut detector = ReplayDetector::from_frames(Vec::new());
        assert!(matches!(
            detector.load(&progress).await,
            Err(EmoscopeError::ModelLoadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_fails_load() {
        let (progress, _rx) = ProgressReporter::new();
        let mut detector = ReplayDetector::open("/nonexistent/emoscope/recording.jsonl");
        assert!(matches!(
            detector.load(&progress).await,
            Err(EmoscopeError::ModelLoadFailed(_))
        ));
    }
}
