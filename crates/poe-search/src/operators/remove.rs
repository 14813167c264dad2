//! Removal operators

use super::{clamp_probability, pick, MutationOperator};
use crate::candidate::Candidate;
use poe_core::{Request, UnitId};
use rand::rngs::StdRng;
use rand::Rng;

/// Remove the unit at a random position unless it is an anchor
#[derive(Debug, Clone, Copy)]
pub struct RemoveRunner {
    probability: f64,
}

impl RemoveRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }
}

impl MutationOperator for RemoveRunner {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        if parent.is_empty() {
            return None;
        }
        let index = rng.random_range(0..parent.len());
        remove_filler(parent, request, index)
    }
}

/// Remove a random unsatisfied unit unless it is an anchor
#[derive(Debug, Clone, Copy)]
pub struct RemoveUnsatisfiedRunner {
    probability: f64,
}

impl RemoveUnsatisfiedRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }
}

impl MutationOperator for RemoveUnsatisfiedRunner {
    fn name(&self) -> &'static str {
        "remove-unsatisfied"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        let index = pick(parent.evaluation().unsatisfied(), rng)?;
        remove_filler(parent, request, index)
    }
}

fn remove_filler(parent: &Candidate, request: &Request, index: usize) -> Option<Vec<UnitId>> {
    let unit = *parent.genes().get(index)?;
    if request.is_anchor(unit) {
        return None;
    }
    let mut genes = parent.genes().to_vec();
    genes.remove(index);
    Some(genes)
}
