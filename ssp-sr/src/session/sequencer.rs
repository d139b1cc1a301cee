//! Trial order construction
//!
//! Each session draws its own randomized trial order from the shared catalog
//! at creation time. The order is fixed for the life of the session; nothing
//! reshuffles mid-run.

use rand::seq::SliceRandom;
use rand::Rng;
use ssp_common::catalog::{Catalog, StimulusDescriptor};

/// Build a randomized trial order for one session
///
/// Draws `requested` stimuli from the catalog without replacement, in random
/// order. A request larger than the catalog is clamped to the catalog size,
/// so every stimulus appears at most once per session.
pub fn build_trial_order(
    catalog: &Catalog,
    requested: usize,
    rng: &mut impl Rng,
) -> Vec<StimulusDescriptor> {
    let mut pool: Vec<StimulusDescriptor> = catalog.stimuli().to_vec();
    pool.shuffle(rng);
    pool.truncate(requested.min(catalog.len()));
    pool
}
