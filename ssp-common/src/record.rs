//! Response record types and the external store row schema
//!
//! A `ResponseRecord` is the canonical result of one completed trial. The
//! external store is an append-only sheet with a fixed column order; this
//! module owns that order (`ResponseRecord::header()`) and the serialization
//! of a record into one row (`ResponseRecord::to_row()`). Every append for a
//! given sheet must use the same column order, so nothing outside this module
//! builds rows by hand.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::StimulusDescriptor;
use crate::time::format_row_timestamp;

/// Satisfaction cell marker for categories the participant did not select
///
/// Deliberately a non-numeric sentinel: `0.0` always means a true zero
/// rating, never "no rating applies". Heard flag 0 + `NA` is the one
/// consistent encoding of "not heard" across the whole store.
pub const NOT_APPLICABLE: &str = "NA";

/// Closed set of sound categories a participant can report hearing
///
/// The order of `ALL` is the column order in the external store; it must not
/// change once a sheet holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCategory {
    Birdsong,
    Wind,
    Water,
    HumanVoice,
    Car,
    Bicycle,
    Aircraft,
    Construction,
    Music,
    Other,
}

impl SoundCategory {
    /// All categories in canonical (store column) order
    pub const ALL: [SoundCategory; 10] = [
        SoundCategory::Birdsong,
        SoundCategory::Wind,
        SoundCategory::Water,
        SoundCategory::HumanVoice,
        SoundCategory::Car,
        SoundCategory::Bicycle,
        SoundCategory::Aircraft,
        SoundCategory::Construction,
        SoundCategory::Music,
        SoundCategory::Other,
    ];

    /// Human-readable label for UI display
    pub fn label(&self) -> &'static str {
        match self {
            SoundCategory::Birdsong => "Birdsong",
            SoundCategory::Wind => "Wind",
            SoundCategory::Water => "Water",
            SoundCategory::HumanVoice => "Human voice",
            SoundCategory::Car => "Car",
            SoundCategory::Bicycle => "Bicycle",
            SoundCategory::Aircraft => "Airplane/Helicopter",
            SoundCategory::Construction => "Construction noise",
            SoundCategory::Music => "Music",
            SoundCategory::Other => "Other",
        }
    }

    /// Column key used in the store header (`heard_<key>`, `satisfaction_<key>`)
    pub fn column_key(&self) -> &'static str {
        match self {
            SoundCategory::Birdsong => "birdsong",
            SoundCategory::Wind => "wind",
            SoundCategory::Water => "water",
            SoundCategory::HumanVoice => "human_voice",
            SoundCategory::Car => "car",
            SoundCategory::Bicycle => "bicycle",
            SoundCategory::Aircraft => "aircraft",
            SoundCategory::Construction => "construction",
            SoundCategory::Music => "music",
            SoundCategory::Other => "other",
        }
    }
}

/// Participant gender, a fixed choice or free text
///
/// Serialized as a plain string: the fixed labels round-trip exactly, any
/// other non-empty string is carried through as self-described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    PreferNotToSay,
    SelfDescribed(String),
}

impl Gender {
    /// String form as written to the store
    pub fn as_str(&self) -> &str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::NonBinary => "Non-binary",
            Gender::PreferNotToSay => "Prefer not to say",
            Gender::SelfDescribed(text) => text,
        }
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        match value.trim() {
            "Female" => Gender::Female,
            "Male" => Gender::Male,
            "Non-binary" => Gender::NonBinary,
            "Prefer not to say" => Gender::PreferNotToSay,
            _ => Gender::SelfDescribed(value.trim().to_string()),
        }
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Participant demographics, captured exactly once per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in years, 1..=100
    pub age: u32,
    /// Gender choice or self-description; must be non-empty
    pub gender: Gender,
}

/// Minimum and maximum accepted participant age
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Generate a fresh participant identifier: `P_` plus six random digits
///
/// Leading zeros are allowed, so the space is a flat million ids. Identifiers
/// are pseudonymous labels for grouping a participant's rows in the store,
/// not authentication material.
pub fn generate_participant_id() -> String {
    let mut rng = rand::thread_rng();
    format!("P_{:06}", rng.gen_range(0..1_000_000u32))
}

/// Heard flag and (for selected categories) satisfaction for one category
///
/// Invariant, enforced by the response collector: `heard` is true exactly
/// when `satisfaction` is `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub heard: bool,
    pub satisfaction: Option<f64>,
}

impl CategoryResponse {
    /// Response for a category the participant did not select
    pub fn not_heard() -> Self {
        Self {
            heard: false,
            satisfaction: None,
        }
    }

    /// Response for a selected category with its satisfaction score
    pub fn heard(satisfaction: f64) -> Self {
        Self {
            heard: true,
            satisfaction: Some(satisfaction),
        }
    }
}

/// Canonical record of one completed trial
///
/// Assembled by the session controller (which injects timestamp and identity)
/// from a validated submission, owned by the submission pipeline during the
/// append attempt, and discarded afterward.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    /// Wall-clock submission time (UTC)
    pub timestamp: DateTime<Utc>,
    pub participant_id: String,
    /// 0-based position within the session's trial order
    pub trial_index: usize,
    pub stimulus: StimulusDescriptor,
    pub age: u32,
    pub gender: Gender,
    /// Acoustic comfort rating in [0, 1]
    pub comfort: f64,
    /// Pleasantness rating in [0, 1]
    pub pleasantness: f64,
    /// Soundscape appropriateness rating in [0, 1]
    pub appropriateness: f64,
    /// One entry per `SoundCategory::ALL` element, in that order
    pub categories: Vec<CategoryResponse>,
    /// Milliseconds from gate unlock to submission
    pub reaction_time_ms: i64,
}

impl ResponseRecord {
    /// Total number of columns in a serialized row
    pub const COLUMN_COUNT: usize = 11 + 2 * SoundCategory::ALL.len() + 1;

    /// Canonical header row for the external store
    ///
    /// Operators use this to initialize a fresh sheet; `to_row` cells align
    /// with it index for index.
    pub fn header() -> Vec<String> {
        let mut columns = vec![
            "timestamp".to_string(),
            "participant_id".to_string(),
            "trial_index".to_string(),
            "stimulus_id".to_string(),
            "visual_ref".to_string(),
            "audio_ref".to_string(),
            "age".to_string(),
            "gender".to_string(),
            "comfort".to_string(),
            "pleasantness".to_string(),
            "appropriateness".to_string(),
        ];
        for category in SoundCategory::ALL {
            columns.push(format!("heard_{}", category.column_key()));
            columns.push(format!("satisfaction_{}", category.column_key()));
        }
        columns.push("reaction_time_ms".to_string());
        columns
    }

    /// Serialize this record as one store row in canonical column order
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            format_row_timestamp(self.timestamp),
            self.participant_id.clone(),
            self.trial_index.to_string(),
            self.stimulus.id.clone(),
            self.stimulus.visual_ref.clone(),
            self.stimulus.audio_ref.clone(),
            self.age.to_string(),
            self.gender.to_string(),
            self.comfort.to_string(),
            self.pleasantness.to_string(),
            self.appropriateness.to_string(),
        ];
        for response in &self.categories {
            row.push(if response.heard { "1" } else { "0" }.to_string());
            row.push(match response.satisfaction {
                Some(score) => score.to_string(),
                None => NOT_APPLICABLE.to_string(),
            });
        }
        row.push(self.reaction_time_ms.to_string());
        row
    }
}
