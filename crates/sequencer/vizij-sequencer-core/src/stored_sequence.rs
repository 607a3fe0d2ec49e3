use serde::{Deserialize, Serialize};

use crate::error::SequencerError;
use crate::ids::StepId;
use crate::renderer::Renderer;
use crate::sequence::Sequence;
use crate::step::StepConfig;
use crate::value::Properties;
use crate::Result;

/// Declarative sequence as stored on disk (camelCase keys, ms timings).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSequence {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub pad_time: Option<f64>,
    pub steps: Vec<StoredStep>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredStep {
    pub target: String,
    pub properties: Properties,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub easing: Option<String>,
    #[serde(default)]
    pub when: Option<f64>,
}

impl StoredStep {
    pub fn config(&self) -> StepConfig {
        StepConfig {
            duration_ms: self.duration,
            easing: self.easing.clone(),
            when: self.when,
        }
    }
}

/// Parse stored-sequence JSON.
///
/// Only structure is checked here; timing and easing validation happen when
/// the steps are added to a sequence (`Sequence::load_stored`).
pub fn parse_stored_sequence_json(s: &str) -> Result<StoredSequence> {
    let stored: StoredSequence = serde_json::from_str(s)?;
    if let Some(pad) = stored.pad_time {
        if !pad.is_finite() || pad < 0.0 {
            return Err(SequencerError::invalid(format!(
                "padTime must be a finite, non-negative number of ms (got {pad})"
            )));
        }
    }
    for (i, step) in stored.steps.iter().enumerate() {
        if step.target.is_empty() {
            return Err(SequencerError::invalid(format!("step {i} has an empty target")));
        }
    }
    Ok(stored)
}

impl<R: Renderer> Sequence<R> {
    /// Append every step of `stored` and apply its name, debug flag and pad.
    ///
    /// All-or-nothing: every step is validated and its target resolved
    /// before the sequence changes, so a failed load leaves it untouched.
    pub fn load_stored(&mut self, stored: &StoredSequence) -> Result<Vec<StepId>> {
        let prepared = stored
            .steps
            .iter()
            .map(|step| self.prepare_step(&step.target, step.properties.clone(), step.config()))
            .collect::<Result<Vec<_>>>()?;
        if let Some(name) = &stored.name {
            self.set_name(name.clone());
        }
        if stored.debug {
            self.set_debug(true);
        }
        if let Some(pad) = stored.pad_time {
            self.wait(pad);
        }
        Ok(prepared
            .into_iter()
            .map(|step| self.commit_step(step))
            .collect())
    }

    /// `parse_stored_sequence_json` followed by `load_stored`.
    pub fn load_stored_json(&mut self, json: &str) -> Result<Vec<StepId>> {
        let stored = parse_stored_sequence_json(json)?;
        self.load_stored(&stored)
    }
}
