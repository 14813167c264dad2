//! Mutation operators and the mutation pipeline
//!
//! Provides the [`MutationOperator`] trait for structural edits over
//! candidates, the six operators the search uses, and
//! [`MutationPipeline`], which applies them in a fixed order.

mod insert;
mod movement;
mod remove;

pub use insert::{AddPostRunner, AddPreRunner, AddRunner};
pub use movement::MoveRunner;
pub use remove::{RemoveRunner, RemoveUnsatisfiedRunner};

use crate::candidate::{Candidate, EvaluationCache};
use crate::config::SearchConfig;
use poe_core::{Request, UnitId};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::trace;

/// Structural edit over a candidate
///
/// # Contract
/// `propose` never edits the parent and never removes or duplicates an
/// anchor unit. Returning `None` means the edit does not apply.
pub trait MutationOperator: Send + Sync + std::fmt::Debug {
    /// Operator name (for tracing)
    fn name(&self) -> &'static str;

    /// Chance the operator fires per candidate per generation
    fn probability(&self) -> f64;

    /// Propose the edited gene sequence
    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng)
        -> Option<Vec<UnitId>>;
}

/// Operators applied in sequence to every offspring
#[derive(Debug)]
pub struct MutationPipeline {
    operators: Vec<Box<dyn MutationOperator>>,
}

impl MutationPipeline {
    /// Create a pipeline from explicit operators
    #[inline]
    #[must_use]
    pub fn new(operators: Vec<Box<dyn MutationOperator>>) -> Self {
        Self { operators }
    }

    /// The six standard operators, weighted by `config`
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(vec![
            Box::new(AddRunner::new(config.add_probability)),
            Box::new(AddPreRunner::new(config.add_pre_probability)),
            Box::new(AddPostRunner::new(config.add_post_probability)),
            Box::new(RemoveRunner::new(config.remove_probability)),
            Box::new(RemoveUnsatisfiedRunner::new(config.remove_unsatisfied_probability)),
            Box::new(MoveRunner::new(config.move_probability)),
        ])
    }

    /// Operators in application order
    #[inline]
    #[must_use]
    pub fn operators(&self) -> &[Box<dyn MutationOperator>] {
        &self.operators
    }

    /// Run every operator once over `parent`, re-evaluating after each edit
    pub fn apply(
        &self,
        parent: Candidate,
        request: &Request,
        cache: &mut EvaluationCache,
        rng: &mut StdRng,
    ) -> Candidate {
        let mut current = parent;
        for operator in &self.operators {
            if !rng.random_bool(clamp_probability(operator.probability())) {
                continue;
            }
            if let Some(genes) = operator.propose(&current, request, rng) {
                trace!(operator = operator.name(), len = genes.len(), "mutation applied");
                current = cache.candidate(request, genes);
            }
        }
        current
    }
}

/// Clamp into `[0, 1]`, mapping NaN to zero
pub(crate) fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Uniformly pick one of `positions`
pub(crate) fn pick(positions: &[usize], rng: &mut StdRng) -> Option<usize> {
    positions.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_test_utils::{fixtures, genes};
    use rand::SeedableRng;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = MutationPipeline::from_config(&SearchConfig::default());
        let names: Vec<_> = pipeline.operators().iter().map(|op| op.name()).collect();
        assert_eq!(
            names,
            [
                "add",
                "add-pre",
                "add-post",
                "remove",
                "remove-unsatisfied",
                "move"
            ]
        );
    }

    #[test]
    fn silent_pipeline_returns_parent() {
        let request = fixtures::scenario_a();
        let config = SearchConfig {
            add_probability: 0.0,
            add_pre_probability: 0.0,
            add_post_probability: 0.0,
            remove_probability: 0.0,
            remove_unsatisfied_probability: 0.0,
            move_probability: 0.0,
            ..SearchConfig::default()
        };
        let pipeline = MutationPipeline::from_config(&config);
        let mut cache = EvaluationCache::new(16);
        let mut rng = StdRng::seed_from_u64(1);

        let parent = cache.candidate(&request, genes(&request, &["B"]));
        let child = pipeline.apply(parent.clone(), &request, &mut cache, &mut rng);
        assert_eq!(child.genes(), parent.genes());
    }

    #[test]
    fn add_pre_repairs_scenario_a() {
        let request = fixtures::scenario_a();
        let pipeline = MutationPipeline::new(vec![Box::new(AddPreRunner::new(1.0))]);
        let mut cache = EvaluationCache::new(16);
        let mut rng = StdRng::seed_from_u64(7);

        let parent = cache.candidate(&request, genes(&request, &["B"]));
        let child = pipeline.apply(parent, &request, &mut cache, &mut rng);
        assert!(child.is_valid());
        assert_eq!(child.genes(), genes(&request, &["A", "B"]).as_slice());
    }

    #[test]
    fn probabilities_are_clamped() {
        assert_eq!(clamp_probability(1.5), 1.0);
        assert_eq!(clamp_probability(-0.5), 0.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
    }
}
