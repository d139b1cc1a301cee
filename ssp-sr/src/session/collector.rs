//! Submission payload validation
//!
//! The UI posts one `RawSubmission` per trial. Validation happens here, in
//! one place, before any timing or store logic runs: a rejected submission
//! leaves the trial untouched and costs nothing.
//!
//! Category semantics: the participant selects which sound categories they
//! heard, and rates satisfaction for exactly those. An unheard category never
//! carries a rating; a heard category always does. The validated output has
//! one entry per known category in canonical order, so the store row shape
//! never depends on what the participant selected.

use serde::Deserialize;
use std::collections::HashMap;

use ssp_common::record::{CategoryResponse, Demographics, SoundCategory, AGE_RANGE};
use ssp_common::{Error, Result};

/// One trial's answers as posted by the UI
#[derive(Debug, Clone, Deserialize)]
pub struct RawSubmission {
    /// Acoustic comfort rating in [0, 1]
    pub comfort: f64,
    /// Pleasantness rating in [0, 1]
    pub pleasantness: f64,
    /// Soundscape appropriateness rating in [0, 1]
    pub appropriateness: f64,
    /// Categories the participant reports hearing
    #[serde(default)]
    pub heard: Vec<SoundCategory>,
    /// Satisfaction in [0, 1] for each heard category, keyed by category
    #[serde(default)]
    pub satisfaction: HashMap<SoundCategory, f64>,
}

/// A submission that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedResponses {
    pub comfort: f64,
    pub pleasantness: f64,
    pub appropriateness: f64,
    /// One entry per `SoundCategory::ALL` element, in that order
    pub categories: Vec<CategoryResponse>,
}

/// Validate a raw submission into canonical per-category responses
pub fn validate_submission(raw: &RawSubmission) -> Result<ValidatedResponses> {
    check_unit_interval("comfort", raw.comfort)?;
    check_unit_interval("pleasantness", raw.pleasantness)?;
    check_unit_interval("appropriateness", raw.appropriateness)?;

    for (i, category) in raw.heard.iter().enumerate() {
        if raw.heard[..i].contains(category) {
            return Err(Error::Validation(format!(
                "category '{}' listed as heard more than once",
                category.column_key()
            )));
        }
    }

    for category in &raw.heard {
        match raw.satisfaction.get(category) {
            Some(&score) => {
                check_unit_interval(
                    &format!("satisfaction for '{}'", category.column_key()),
                    score,
                )?;
            }
            None => {
                return Err(Error::Validation(format!(
                    "heard category '{}' is missing a satisfaction rating",
                    category.column_key()
                )));
            }
        }
    }

    for category in raw.satisfaction.keys() {
        if !raw.heard.contains(category) {
            return Err(Error::Validation(format!(
                "satisfaction rating given for unheard category '{}'",
                category.column_key()
            )));
        }
    }

    let categories = SoundCategory::ALL
        .iter()
        .map(|category| match raw.satisfaction.get(category) {
            Some(&score) if raw.heard.contains(category) => CategoryResponse::heard(score),
            _ => CategoryResponse::not_heard(),
        })
        .collect();

    Ok(ValidatedResponses {
        comfort: raw.comfort,
        pleasantness: raw.pleasantness,
        appropriateness: raw.appropriateness,
        categories,
    })
}

/// Validate demographics posted with the consent affirmation
pub fn validate_demographics(demographics: &Demographics) -> Result<()> {
    if !AGE_RANGE.contains(&demographics.age) {
        return Err(Error::Validation(format!(
            "age {} outside accepted range {}..={}",
            demographics.age,
            AGE_RANGE.start(),
            AGE_RANGE.end()
        )));
    }
    if demographics.gender.as_str().is_empty() {
        return Err(Error::Validation(
            "gender must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::Validation(format!("{} must be a finite number", name)));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Validation(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}
