//! Stimulus catalog
//!
//! The catalog is the static ordered list of stimuli available to the survey.
//! It is supplied by configuration at process start and never mutated at
//! runtime; sessions draw their randomized trial order from it.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One paired visual/audio stimulus
///
/// `visual_ref` and `audio_ref` are opaque asset references (file names or
/// URLs); the external UI is responsible for resolving and rendering them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusDescriptor {
    /// Stable identifier, unique within the catalog (e.g. "S01")
    pub id: String,
    /// Visual asset reference shown during the trial
    pub visual_ref: String,
    /// Audio asset reference played during the trial
    pub audio_ref: String,
}

/// Validated, ordered stimulus catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    stimuli: Vec<StimulusDescriptor>,
}

impl Catalog {
    /// Build a catalog from configured descriptors
    ///
    /// Rejects an empty list and duplicate stimulus ids; both are
    /// configuration errors that must halt startup before any session exists.
    pub fn new(stimuli: Vec<StimulusDescriptor>) -> Result<Self> {
        if stimuli.is_empty() {
            return Err(Error::Config(
                "stimulus catalog is empty; at least one [[stimuli]] entry is required".to_string(),
            ));
        }

        for (i, stimulus) in stimuli.iter().enumerate() {
            if stimulus.id.trim().is_empty() {
                return Err(Error::Config(format!(
                    "stimulus at position {} has an empty id",
                    i
                )));
            }
            if stimuli[..i].iter().any(|earlier| earlier.id == stimulus.id) {
                return Err(Error::Config(format!(
                    "duplicate stimulus id '{}' in catalog",
                    stimulus.id
                )));
            }
        }

        Ok(Self { stimuli })
    }

    /// Number of stimuli in the catalog
    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    /// True when the catalog holds no stimuli (never true for a validated catalog)
    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    /// All stimuli in catalog order
    pub fn stimuli(&self) -> &[StimulusDescriptor] {
        &self.stimuli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> StimulusDescriptor {
        StimulusDescriptor {
            id: id.to_string(),
            visual_ref: format!("{}.jpg", id),
            audio_ref: format!("{}.wav", id),
        }
    }

    #[test]
    fn accepts_distinct_ids() {
        let catalog = Catalog::new(vec![descriptor("S01"), descriptor("S02")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.stimuli()[0].id, "S01");
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = Catalog::new(vec![]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![descriptor("S01"), descriptor("S01")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("duplicate"));
        assert!(msg.contains("S01"));
    }

    #[test]
    fn rejects_blank_id() {
        let mut bad = descriptor("S01");
        bad.id = "  ".to_string();
        assert!(Catalog::new(vec![bad]).is_err());
    }
}
