//! Synthetic detections
//!
//! Seeded random faces so a scenario replays identically:
//! - a random face count per frame
//! - one strong expression per face plus low background noise
//! - boxes laid out left to right

use async_trait::async_trait;
use emoscope_core::{
    BaseExpression, BoundingBox, EmoscopeError, EmoscopeResult, ExpressionScores, FaceObservation,
    Point,
};
use emoscope_runtime::{Detector, DetectorOptions, Frame, ProgressReporter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Synthetic face generator configuration
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Inclusive face count range per frame
    pub min_faces: usize,
    pub max_faces: usize,
    /// Range of the strong expression's confidence
    pub peak: (f32, f32),
    /// Upper bound of background confidences
    pub noise: f32,
    /// Landmarks per face
    pub landmarks: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            seed: 0,
            min_faces: 0,
            max_faces: 3,
            peak: (0.5, 0.99),
            noise: 0.1,
            landmarks: 68,
        }
    }
}

impl SyntheticConfig {
    pub fn seeded(seed: u64) -> Self {
        SyntheticConfig {
            seed,
            ..Self::default()
        }
    }

    /// Always exactly `n` faces
    pub fn crowd(seed: u64, n: usize) -> Self {
        SyntheticConfig {
            seed,
            min_faces: n,
            max_faces: n,
            ..Self::default()
        }
    }
}

/// Random face generator
#[derive(Debug)]
pub struct FaceGenerator {
    config: SyntheticConfig,
    rng: StdRng,
}

impl FaceGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        FaceGenerator { config, rng }
    }

    /// Scores with one strong expression
    pub fn scores(&mut self) -> ExpressionScores {
        let strong = BaseExpression::ALL[self.rng.gen_range(0..BaseExpression::COUNT)];
        self.scores_for(strong)
    }

    pub fn scores_for(&mut self, strong: BaseExpression) -> ExpressionScores {
        let mut scores = ExpressionScores::empty();
        for expression in BaseExpression::ALL {
            let value = if expression == strong {
                self.rng.gen_range(self.config.peak.0..=self.config.peak.1)
            } else {
                self.rng.gen_range(0.0..=self.config.noise)
            };
            scores.set(expression, value);
        }
        scores
    }

    /// One frame's faces
    pub fn frame(&mut self) -> Vec<FaceObservation> {
        let count = self
            .rng
            .gen_range(self.config.min_faces..=self.config.max_faces.max(self.config.min_faces));
        (0..count).map(|slot| self.face(slot)).collect()
    }

    fn face(&mut self, slot: usize) -> FaceObservation {
        let size: f32 = self.rng.gen_range(60.0..140.0);
        let x = slot as f32 * 150.0 + self.rng.gen_range(0.0..10.0);
        let y: f32 = self.rng.gen_range(40.0..200.0);
        let bbox = BoundingBox::new(x, y, size, size);

        let landmarks = (0..self.config.landmarks)
            .map(|_| {
                Point::new(
                    x + self.rng.gen_range(0.0..size),
                    y + self.rng.gen_range(0.0..size),
                )
            })
            .collect();

        FaceObservation::new(bbox, self.scores()).with_landmarks(landmarks)
    }
}

/// Detector backed by a [`FaceGenerator`]
#[derive(Debug)]
pub struct SyntheticDetector {
    generator: FaceGenerator,
    loaded: bool,
    calls: u64,
}

impl SyntheticDetector {
    pub fn new(config: SyntheticConfig) -> Self {
        SyntheticDetector {
            generator: FaceGenerator::new(config),
            loaded: false,
            calls: 0,
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

#[async_trait]
impl Detector for SyntheticDetector {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn load(&mut self, progress: &ProgressReporter) -> EmoscopeResult<()> {
        progress.report(60, "Warming up synthetic faces");
        self.loaded = true;
        Ok(())
    }

    async fn detect(
        &mut self,
        _frame: &Frame,
        options: &DetectorOptions,
    ) -> EmoscopeResult<Vec<FaceObservation>> {
        if !self.loaded {
            return Err(EmoscopeError::DetectionCycle("synthetic detector not loaded".into()));
        }
        self.calls += 1;
        let mut faces = self.generator.frame();
        faces.truncate(options.max_faces);
        Ok(faces)
    }
}
