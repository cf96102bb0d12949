//! Emotion library - the static weight table
//!
//! Each base expression owns an ordered list of display emotions with a
//! weight in (0, 1]. The table is built once and read-only afterwards.

use std::collections::BTreeMap;

use emoscope_core::{BaseExpression, EmoscopeError, EmoscopeResult};
use serde::{Deserialize, Serialize};

/// One display emotion under a base expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEntry {
    pub name: String,
    pub weight: f32,
}

impl EmotionEntry {
    pub fn new(name: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

const STANDARD_TABLE: [(BaseExpression, &[(&str, f32)]); 7] = [
    (
        BaseExpression::Neutral,
        &[("trust", 0.3), ("pensiveness", 0.25), ("interest", 0.2), ("admiration", 0.15)],
    ),
    (
        BaseExpression::Happy,
        &[("joy", 0.4), ("optimism", 0.3), ("ecstasy", 0.2), ("tears of joy", 0.15)],
    ),
    (
        BaseExpression::Sad,
        &[("sadness", 0.35), ("grief", 0.25), ("pensiveness", 0.2), ("disappointment", 0.15)],
    ),
    (
        BaseExpression::Angry,
        &[("anger", 0.35), ("rage", 0.3), ("annoyance", 0.25), ("aggressiveness", 0.15)],
    ),
    (
        BaseExpression::Fearful,
        &[("fear", 0.35), ("terror", 0.3), ("apprehension", 0.25), ("vigilance", 0.2)],
    ),
    (BaseExpression::Disgusted, &[("disgust", 0.4), ("boredom", 0.3)]),
    (BaseExpression::Surprised, &[("surprise", 0.4), ("amazement", 0.3)]),
];

/// Weight table keyed by base expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmotionLibrary {
    entries: [Vec<EmotionEntry>; BaseExpression::COUNT],
}

impl EmotionLibrary {
    /// Empty library; every base contributes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// The curated table used by the webcam front-ends
    pub fn standard() -> Self {
        let mut library = Self::new();
        for (base, entries) in STANDARD_TABLE.iter() {
            library.entries[base.index()] = entries
                .iter()
                .map(|(name, weight)| EmotionEntry::new(*name, *weight))
                .collect();
        }
        library
    }

    /// Replace the entries of one base, validating each weight
    pub fn with_entries(
        mut self,
        base: BaseExpression,
        entries: Vec<EmotionEntry>,
    ) -> EmoscopeResult<Self> {
        for entry in &entries {
            validate_entry(base, entry)?;
        }
        self.entries[base.index()] = entries;
        Ok(self)
    }

    /// Build from a `{ "happy": [{"name": .., "weight": ..}], .. }` table
    pub fn from_table(table: BTreeMap<BaseExpression, Vec<EmotionEntry>>) -> EmoscopeResult<Self> {
        table
            .into_iter()
            .try_fold(Self::new(), |library, (base, entries)| {
                library.with_entries(base, entries)
            })
    }

    pub fn from_json(json: &str) -> EmoscopeResult<Self> {
        let table: BTreeMap<BaseExpression, Vec<EmotionEntry>> = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Entries for one base, in table order
    #[inline]
    pub fn entries(&self, base: BaseExpression) -> &[EmotionEntry] {
        &self.entries[base.index()]
    }

    /// Every distinct display name, first occurrence order
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entries in &self.entries {
            for entry in entries {
                if !names.contains(&entry.name.as_str()) {
                    names.push(entry.name.as_str());
                }
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Vec::is_empty)
    }
}

fn validate_entry(base: BaseExpression, entry: &EmotionEntry) -> EmoscopeResult<()> {
    if entry.name.trim().is_empty() {
        return Err(EmoscopeError::InvalidLibrary(format!(
            "empty emotion name under '{}'",
            base
        )));
    }
    if !entry.weight.is_finite() || entry.weight <= 0.0 || entry.weight > 1.0 {
        return Err(EmoscopeError::InvalidLibrary(format!(
            "weight {} for '{}' under '{}' is outside (0, 1]",
            entry.weight, entry.name, base
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_shape() {
        let library = EmotionLibrary::standard();
        assert_eq!(library.entries(BaseExpression::Happy).len(), 4);
        assert_eq!(library.entries(BaseExpression::Disgusted).len(), 2);
        assert_eq!(library.entries(BaseExpression::Happy)[0], EmotionEntry::new("joy", 0.4));

        for base in BaseExpression::ALL {
            for entry in library.entries(base) {
                assert!(entry.weight > 0.0 && entry.weight <= 1.0);
            }
        }
    }

    #[test]
    fn test_vocabulary_dedupes() {
        let library = EmotionLibrary::standard();
        let vocabulary = library.vocabulary();
        // pensiveness appears under both neutral and sad
        assert_eq!(vocabulary.iter().filter(|n| **n == "pensiveness").count(), 1);
        assert_eq!(vocabulary.len(), 23);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let bad = EmotionLibrary::new().with_entries(
            BaseExpression::Happy,
            vec![EmotionEntry::new("joy", 1.5)],
        );
        assert!(matches!(bad, Err(EmoscopeError::InvalidLibrary(_))));

        let bad = EmotionLibrary::new().with_entries(
            BaseExpression::Happy,
            vec![EmotionEntry::new("joy", 0.0)],
        );
        assert!(bad.is_err());

        let bad = EmotionLibrary::new().with_entries(
            BaseExpression::Sad,
            vec![EmotionEntry::new("  ", 0.5)],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_from_json() {
        let library = EmotionLibrary::from_json(
            r#"{"happy":[{"name":"Joy","weight":0.4},{"name":"Optimism","weight":0.3}]}"#,
        )
        .unwrap();
        assert_eq!(library.entries(BaseExpression::Happy).len(), 2);
        assert!(library.entries(BaseExpression::Sad).is_empty());

        assert!(EmotionLibrary::from_json(r#"{"happy":[{"name":"Joy","weight":2.0}]}"#).is_err());
        assert!(EmotionLibrary::from_json(r#"{"joyful":[]}"#).is_err());
    }
}
