//! Core configuration for vizij-sequencer-core.

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// Default step duration in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 500.0;

/// Default easing alias applied when a step does not name one.
pub const DEFAULT_EASING: &str = "easeOutExpo";

/// How the renderer performs a step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Declarative transitions; supports pause, resume and rewind.
    #[default]
    Transition,
    /// Renderer-driven discrete interpolation; no mid-flight control.
    Animate,
}

impl TransportMode {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transition => "transition",
            Self::Animate => "animate",
        }
    }

    /// Whether pause/resume/rewind can act on in-flight steps.
    #[inline]
    pub fn supports_mid_flight_control(&self) -> bool {
        matches!(self, Self::Transition)
    }
}

/// Sequence-level defaults and feature flags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Duration used when a step omits one.
    pub default_duration_ms: f64,
    /// Easing alias used when a step omits one or names an unknown alias.
    pub default_easing: String,
    /// Renderer transport mode.
    pub transport: TransportMode,
    /// Emit lifecycle debug logs.
    pub debug: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
            default_easing: DEFAULT_EASING.to_string(),
            transport: TransportMode::default(),
            debug: false,
        }
    }
}

impl SequencerConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, SequencerError> {
        let cfg: SequencerConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SequencerError> {
        if !self.default_duration_ms.is_finite() || self.default_duration_ms < 0.0 {
            return Err(SequencerError::invalid(format!(
                "default duration must be a finite, non-negative number of ms (got {})",
                self.default_duration_ms
            )));
        }
        if self.default_easing.is_empty() {
            return Err(SequencerError::invalid("default easing alias is empty"));
        }
        Ok(())
    }
}
