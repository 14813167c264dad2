//! Insertion operators
//!
//! Only producer-less units (fillers) are ever inserted, so anchors are
//! never duplicated.

use super::{clamp_probability, pick, MutationOperator};
use crate::candidate::Candidate;
use poe_core::{Request, UnitId};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Insert a random filler at a random position
#[derive(Debug, Clone, Copy)]
pub struct AddRunner {
    probability: f64,
}

impl AddRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }
}

impl MutationOperator for AddRunner {
    fn name(&self) -> &'static str {
        "add"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        let unit = *request.fillers().choose(rng)?;
        let position = rng.random_range(0..=parent.len());
        let mut genes = parent.genes().to_vec();
        genes.insert(position, unit);
        Some(genes)
    }
}

/// Repair an unsatisfied position by inserting a filler right before it
///
/// The filler must strictly reduce the number of tag constraints the
/// position violates. Positions failing only on scope resolution are left
/// alone.
#[derive(Debug, Clone, Copy)]
pub struct AddPreRunner {
    probability: f64,
}

impl AddPreRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }
}

impl MutationOperator for AddPreRunner {
    fn name(&self) -> &'static str {
        "add-pre"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        let evaluation = parent.evaluation();
        let index = pick(evaluation.unsatisfied(), rng)?;
        let live = request.live(parent.genes()[index])?;
        let before = &evaluation.before_tags()[index];

        let deficit = live.deficit(before);
        if deficit == 0 {
            return None;
        }

        let helpful: Vec<UnitId> = request
            .fillers()
            .iter()
            .copied()
            .filter(|&filler| {
                request
                    .unit(filler)
                    .is_some_and(|unit| live.deficit(&unit.effect.apply(before)) < deficit)
            })
            .collect();
        let unit = *helpful.choose(rng)?;

        let mut genes = parent.genes().to_vec();
        genes.insert(index, unit);
        Some(genes)
    }
}

/// Extend a satisfied position with a filler whose constraints hold right
/// after it
#[derive(Debug, Clone, Copy)]
pub struct AddPostRunner {
    probability: f64,
}

impl AddPostRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }
}

impl MutationOperator for AddPostRunner {
    fn name(&self) -> &'static str {
        "add-post"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        let evaluation = parent.evaluation();
        let index = pick(evaluation.satisfied(), rng)?;
        let after = &evaluation.before_tags()[index + 1];

        let compatible: Vec<UnitId> = request
            .fillers()
            .iter()
            .copied()
            .filter(|&filler| request.live(filler).is_some_and(|live| live.is_satisfied_by(after)))
            .collect();
        let unit = *compatible.choose(rng)?;

        let mut genes = parent.genes().to_vec();
        genes.insert(index + 1, unit);
        Some(genes)
    }
}
