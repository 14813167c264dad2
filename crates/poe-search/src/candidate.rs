//! Immutable candidates and the evaluation cache

use crate::evaluator::Evaluation;
use crate::stats::SatisfactionStats;
use moka::sync::Cache;
use poe_core::{Registry, Request, UnitId};
use std::fmt;
use std::sync::Arc;

/// One gene sequence together with its evaluation
///
/// Candidates are never edited in place; every mutation produces a new one.
#[derive(Debug, Clone)]
pub struct Candidate {
    genes: Arc<[UnitId]>,
    evaluation: Arc<Evaluation>,
}

impl Candidate {
    /// Evaluate `genes` without going through a cache
    #[must_use]
    pub fn evaluate(request: &Request, genes: Vec<UnitId>) -> Self {
        let evaluation = Arc::new(Evaluation::of(request, &genes));
        Self {
            genes: genes.into(),
            evaluation,
        }
    }

    /// Ordered units
    #[inline]
    #[must_use]
    pub fn genes(&self) -> &[UnitId] {
        &self.genes
    }

    /// Evaluation of the gene sequence
    #[inline]
    #[must_use]
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Fitness score
    #[inline]
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.evaluation.fitness()
    }

    /// Zero unsatisfied constraints
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.evaluation.is_valid()
    }

    /// Number of units
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// No units at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Unit names in order
    #[must_use]
    pub fn describe(&self, registry: &Registry) -> Vec<String> {
        self.genes
            .iter()
            .map(|id| registry.unit_name(*id).to_string())
            .collect()
    }
}

/// Memoized evaluator keyed by gene sequence
///
/// Optionally feeds [`SatisfactionStats`] with every fresh evaluation.
pub struct EvaluationCache {
    inner: Cache<Arc<[UnitId]>, Arc<Evaluation>>,
    stats: Option<Arc<SatisfactionStats>>,
    hits: u64,
    misses: u64,
}

impl EvaluationCache {
    /// Create a cache holding at most `capacity` sequences
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Cache::new(u64::try_from(capacity).unwrap_or(u64::MAX)),
            stats: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Record fresh evaluations into `stats`
    #[must_use]
    pub fn with_statistics(mut self, stats: Arc<SatisfactionStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Build the candidate for `genes`, evaluating only on a cache miss
    pub fn candidate(&mut self, request: &Request, genes: Vec<UnitId>) -> Candidate {
        let genes: Arc<[UnitId]> = genes.into();
        if let Some(evaluation) = self.inner.get(&genes) {
            self.hits += 1;
            return Candidate { genes, evaluation };
        }

        self.misses += 1;
        let evaluation = Arc::new(Evaluation::of(request, &genes));
        if let Some(stats) = &self.stats {
            stats.record(request, &evaluation);
        }
        self.inner.insert(Arc::clone(&genes), Arc::clone(&evaluation));
        Candidate { genes, evaluation }
    }

    /// Lookups served from the cache
    #[inline]
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Evaluations actually performed
    #[inline]
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl fmt::Debug for EvaluationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("entries", &self.inner.entry_count())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}
