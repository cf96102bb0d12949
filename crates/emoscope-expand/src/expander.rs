//! Emotion Expander - dominant expression to ranked extended emotions

use std::sync::Arc;

use emoscope_core::{
    Dominant, EmoscopeError, EmoscopeResult, ExpandedEmotion, ExpressionScores, FaceId, FaceObservation,
    FaceResult,
};
use serde::{Deserialize, Serialize};

use crate::{EmotionLibrary, JitterSource, NoJitter, UniformJitter};

/// How intensities are jittered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterMode {
    #[default]
    Off,
    /// Reproducible noise over the default range
    Seeded(u64),
    /// OS-seeded noise over the default range
    Entropy,
}

/// Expander configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpanderConfig {
    /// Entries kept after sorting
    pub top_n: usize,
    /// How many base expressions feed the expansion (1 = dominant only)
    pub bases_considered: usize,
    pub jitter: JitterMode,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        ExpanderConfig {
            top_n: 3,
            bases_considered: 1,
            jitter: JitterMode::Off,
        }
    }
}

impl ExpanderConfig {
    /// Wide view: top 8 drawn from the 3 strongest bases
    pub fn wide() -> Self {
        ExpanderConfig {
            top_n: 8,
            bases_considered: 3,
            jitter: JitterMode::Off,
        }
    }

    /// Default view with seeded jitter
    pub fn lively(seed: u64) -> Self {
        ExpanderConfig {
            jitter: JitterMode::Seeded(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EmoscopeResult<()> {
        if self.top_n == 0 {
            return Err(EmoscopeError::InvalidConfig(
                "top_n must be at least 1".into(),
            ));
        }
        if self.bases_considered == 0 {
            return Err(EmoscopeError::InvalidConfig(
                "bases_considered must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Result of expanding one confidence mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    pub dominant: Dominant,
    /// Descending by intensity, at most `top_n` long
    pub emotions: Vec<ExpandedEmotion>,
}

/// Maps confidence mappings onto the extended vocabulary
pub struct EmotionExpander {
    library: Arc<EmotionLibrary>,
    config: ExpanderConfig,
    jitter: Box<dyn JitterSource>,
}

impl EmotionExpander {
    pub fn new(library: Arc<EmotionLibrary>, config: ExpanderConfig) -> Self {
        let jitter: Box<dyn JitterSource> = match config.jitter {
            JitterMode::Off => Box::new(NoJitter),
            JitterMode::Seeded(seed) => Box::new(UniformJitter::seeded(seed)),
            JitterMode::Entropy => Box::new(UniformJitter::from_entropy()),
        };
        EmotionExpander {
            library,
            config,
            jitter,
        }
    }

    /// Expander over the standard library
    pub fn standard(config: ExpanderConfig) -> Self {
        Self::new(Arc::new(EmotionLibrary::standard()), config)
    }

    /// Swap in a custom noise source
    pub fn with_jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn library(&self) -> &Arc<EmotionLibrary> {
        &self.library
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Expand one face's confidence mapping
    pub fn expand(&mut self, scores: &ExpressionScores) -> Expansion {
        let dominant = scores.dominant();

        let bases = if self.config.bases_considered <= 1 {
            vec![dominant]
        } else {
            let top: Vec<Dominant> = scores
                .top(self.config.bases_considered)
                .into_iter()
                .filter(|d| d.value > 0.0)
                .collect();
            if top.is_empty() {
                vec![dominant]
            } else {
                top
            }
        };

        let mut emotions = Vec::new();
        for base in bases {
            for entry in self.library.entries(base.expression) {
                let intensity = base.value * entry.weight * self.jitter.factor();
                emotions.push(ExpandedEmotion {
                    name: entry.name.clone(),
                    intensity: clamp_unit(intensity),
                    base_emotion: base.expression,
                });
            }
        }

        emotions.sort_by(|a, b| b.intensity.total_cmp(&a.intensity));
        emotions.truncate(self.config.top_n);

        Expansion { dominant, emotions }
    }

    /// Analyze every face of a frame, assigning ids and swatches by slot
    pub fn analyze(&mut self, observations: &[FaceObservation]) -> Vec<FaceResult> {
        observations
            .iter()
            .enumerate()
            .map(|(slot, observation)| {
                let expansion = self.expand(&observation.expressions);
                let id = FaceId::from_slot(slot);
                FaceResult {
                    id,
                    color: id.color().to_string(),
                    dominant: expansion.dominant,
                    top_emotions: expansion.emotions,
                    expressions: observation.expressions,
                    bbox: observation.bbox,
                    landmarks: observation.landmarks.clone(),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for EmotionExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionExpander")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
