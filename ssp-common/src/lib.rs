//! # SSP Common Library
//!
//! Shared code for the Soundscape Survey Platform:
//! - Stimulus catalog types
//! - Response record types and the external store row schema
//! - Event types (SurveyEvent enum) and EventBus
//! - Configuration loading
//! - Timestamp utilities

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod record;
pub mod time;

pub use error::{Error, Result};
