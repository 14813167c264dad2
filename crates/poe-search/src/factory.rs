//! Generation-zero seeding

use crate::candidate::{Candidate, EvaluationCache};
use poe_core::{Request, UnitId};

/// Seeds the initial population from the request's anchor units
///
/// Every initial individual is the same sequence: all units delivering a
/// target production, in registry order.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFactory<'r> {
    request: &'r Request,
}

impl<'r> CandidateFactory<'r> {
    /// Create a factory for `request`
    #[inline]
    #[must_use]
    pub fn new(request: &'r Request) -> Self {
        Self { request }
    }

    /// Gene sequence every seed individual starts from
    #[must_use]
    pub fn seed_genes(&self) -> Vec<UnitId> {
        self.request.anchors().to_vec()
    }

    /// `size` identical seed individuals
    pub fn population(&self, size: usize, cache: &mut EvaluationCache) -> Vec<Candidate> {
        let seed = cache.candidate(self.request, self.seed_genes());
        vec![seed; size]
    }
}
