//! Run configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Parameters of a simulation run.
///
/// ## Presets
///
/// | Preset | Pacing | Use |
/// |--------|--------|-----|
/// | [`NetworkConfig::fast`] | none | tests, batch runs |
/// | [`NetworkConfig::paced`] | 20ms per round | watching a run live |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Abort with `RoundLimitExceeded` once this many rounds have run.
    /// `None` runs until quiescence, however long that takes.
    pub max_rounds: Option<u64>,

    /// Wall-clock pause after each round. Rounds are synchronized by the
    /// barrier, not by this delay.
    #[serde(with = "millis")]
    pub round_period: Duration,

    /// Emit a trace event for every message a node handles.
    pub trace_messages: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::fast()
    }
}

impl NetworkConfig {
    /// No pacing, no round limit.
    pub fn fast() -> Self {
        Self {
            max_rounds: None,
            round_period: Duration::ZERO,
            trace_messages: true,
        }
    }

    /// One round every 20ms.
    pub fn paced() -> Self {
        Self {
            round_period: Duration::from_millis(20),
            ..Self::fast()
        }
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, limit: u64) -> Self {
        self.max_rounds = Some(limit);
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
