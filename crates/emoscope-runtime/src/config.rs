//! Runtime configuration
//!
//! Defaults match the webcam front-ends. [`RuntimeConfig::from_env`] layers
//! `EMOSCOPE_*` variables on top:
//!
//! | variable                      | example   |
//! |-------------------------------|-----------|
//! | `EMOSCOPE_CYCLE_DELAY`        | `100ms`   |
//! | `EMOSCOPE_DETECT_TIMEOUT`     | `5s`, `off` |
//! | `EMOSCOPE_MAX_FACES`          | `5`       |
//! | `EMOSCOPE_MODE`               | `compare` |
//! | `EMOSCOPE_TOP_N`              | `8`       |
//! | `EMOSCOPE_BASES`              | `3`       |
//! | `EMOSCOPE_JITTER_SEED`        | `42`      |
//! | `EMOSCOPE_TIMELINE_INTERVAL`  | `2`       |
//! | `EMOSCOPE_TIMELINE_CAPACITY`  | `30`      |

use std::str::FromStr;
use std::time::Duration;

use emoscope_aggregate::{Mode, TimelineConfig};
use emoscope_core::{EmoscopeError, EmoscopeResult, FrameSize, MAX_FACES};
use emoscope_expand::{ExpanderConfig, JitterMode};

/// Detection loop configuration
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Delay between the end of one cycle and the start of the next
    pub cycle_delay: Duration,
    /// Upper bound on one detector call; `None` waits forever
    pub detect_timeout: Option<Duration>,
    /// Faces analyzed per frame
    pub max_faces: usize,
    /// Rescale detections from frame size to this size
    pub display_size: Option<FrameSize>,
    /// Stop after this many cycles
    pub max_cycles: Option<u64>,
    pub initial_mode: Mode,
    pub timeline: TimelineConfig,
    pub expander: ExpanderConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            cycle_delay: Duration::from_millis(100),
            detect_timeout: Some(Duration::from_secs(5)),
            max_faces: MAX_FACES,
            display_size: None,
            max_cycles: None,
            initial_mode: Mode::Analyze,
            timeline: TimelineConfig::default(),
            expander: ExpanderConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `EMOSCOPE_*` environment variables
    pub fn from_env() -> EmoscopeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable
    pub fn from_lookup<F>(lookup: F) -> EmoscopeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RuntimeConfig::default();

        if let Some(raw) = lookup("EMOSCOPE_CYCLE_DELAY") {
            config.cycle_delay = parse_duration("EMOSCOPE_CYCLE_DELAY", &raw)?;
        }
        if let Some(raw) = lookup("EMOSCOPE_DETECT_TIMEOUT") {
            config.detect_timeout = match raw.trim() {
                "off" | "none" => None,
                value => Some(parse_duration("EMOSCOPE_DETECT_TIMEOUT", value)?),
            };
        }
        if let Some(raw) = lookup("EMOSCOPE_MAX_FACES") {
            config.max_faces = parse_value("EMOSCOPE_MAX_FACES", &raw)?;
        }
        if let Some(raw) = lookup("EMOSCOPE_MODE") {
            config.initial_mode = raw
                .parse::<Mode>()
                .map_err(|e| EmoscopeError::InvalidConfig(format!("EMOSCOPE_MODE: {}", e)))?;
        }
        if let Some(raw) = lookup("EMOSCOPE_TOP_N") {
            config.expander.top_n = parse_value("EMOSCOPE_TOP_N", &raw)?;
        }
        if let Some(raw) = lookup("EMOSCOPE_BASES") {
            config.expander.bases_considered = parse_value("EMOSCOPE_BASES", &raw)?;
        }
        if let Some(raw) = lookup("EMOSCOPE_JITTER_SEED") {
            config.expander.jitter = JitterMode::Seeded(parse_value("EMOSCOPE_JITTER_SEED", &raw)?);
        }
        if let Some(raw) = lookup("EMOSCOPE_TIMELINE_INTERVAL") {
            config.timeline.sample_interval_secs = parse_value("EMOSCOPE_TIMELINE_INTERVAL", &raw)?;
        }
        if let Some(raw) = lookup("EMOSCOPE_TIMELINE_CAPACITY") {
            config.timeline.capacity = parse_value("EMOSCOPE_TIMELINE_CAPACITY", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EmoscopeResult<()> {
        if self.max_faces == 0 {
            return Err(EmoscopeError::InvalidConfig("max_faces must be at least 1".into()));
        }
        if self.timeline.capacity == 0 {
            return Err(EmoscopeError::InvalidConfig(
                "timeline capacity must be at least 1".into(),
            ));
        }
        if self.detect_timeout == Some(Duration::ZERO) {
            return Err(EmoscopeError::InvalidConfig(
                "detect timeout must be positive; use `off` to disable".into(),
            ));
        }
        self.expander.validate()
    }
}

fn parse_duration(key: &str, raw: &str) -> EmoscopeResult<Duration> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| EmoscopeError::InvalidConfig(format!("{}: {}", key, e)))
}

fn parse_value<T>(key: &str, raw: &str) -> EmoscopeResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| EmoscopeError::InvalidConfig(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.cycle_delay, Duration::from_millis(100));
        assert_eq!(config.max_faces, 5);
        assert_eq!(config.timeline.capacity, 30);
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("EMOSCOPE_CYCLE_DELAY", "250ms"),
            ("EMOSCOPE_DETECT_TIMEOUT", "off"),
            ("EMOSCOPE_MODE", "timeline"),
            ("EMOSCOPE_TOP_N", "8"),
            ("EMOSCOPE_JITTER_SEED", "42"),
            ("EMOSCOPE_TIMELINE_CAPACITY", "10"),
        ]))
        .unwrap();
        assert_eq!(config.cycle_delay, Duration::from_millis(250));
        assert_eq!(config.detect_timeout, None);
        assert_eq!(config.initial_mode, Mode::Timeline);
        assert_eq!(config.expander.top_n, 8);
        assert_eq!(config.expander.jitter, JitterMode::Seeded(42));
        assert_eq!(config.timeline.capacity, 10);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(RuntimeConfig::from_lookup(lookup(&[("EMOSCOPE_CYCLE_DELAY", "soon")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("EMOSCOPE_MAX_FACES", "0")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("EMOSCOPE_MODE", "dance")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("EMOSCOPE_DETECT_TIMEOUT", "0s")])).is_err());
    }
}
