//! Backward relocation of satisfied units

use super::{clamp_probability, pick, MutationOperator};
use crate::candidate::Candidate;
use crate::evaluator::Walker;
use poe_core::{Request, UnitId};
use rand::rngs::StdRng;
use rand::Rng;

/// Slide a satisfied unit towards the front of the sequence
///
/// A slide of `k` places the unit at `i - k`, directly before the unit
/// that previously sat there. Slides stay inside the satisfied group that
/// holds the unit. Every slide in `1..=max` keeps both the moved unit and
/// its new successor satisfied; the check replays the recorded prefix state
/// at the destination, so it is exact for scopes and tags.
#[derive(Debug, Clone, Copy)]
pub struct MoveRunner {
    probability: f64,
}

impl MoveRunner {
    /// Create with firing probability
    #[must_use]
    pub fn new(probability: f64) -> Self {
        Self {
            probability: clamp_probability(probability),
        }
    }

    /// Furthest legal backward slide for the unit at `index`
    #[must_use]
    pub fn max_slide(parent: &Candidate, request: &Request, index: usize) -> usize {
        let genes = parent.genes();
        let evaluation = parent.evaluation();
        let Some(&moved) = genes.get(index) else {
            return 0;
        };

        let floor = evaluation
            .group_of(index)
            .filter(|group| group.satisfied)
            .map_or(index, |group| group.start);

        let mut slide = 0;
        for destination in (floor..index).rev() {
            let mut walker = Walker::resume(
                request,
                evaluation.before_stacks()[destination].clone(),
                evaluation.before_tags()[destination].snapshot(),
            );
            if !walker.step(moved).satisfied || !walker.step(genes[destination]).satisfied {
                break;
            }
            slide += 1;
        }
        slide
    }
}

impl MutationOperator for MoveRunner {
    fn name(&self) -> &'static str {
        "move"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn propose(&self, parent: &Candidate, request: &Request, rng: &mut StdRng) -> Option<Vec<UnitId>> {
        let index = pick(parent.evaluation().satisfied(), rng)?;
        let max = Self::max_slide(parent, request, index);
        if max == 0 {
            return None;
        }
        let slide = rng.random_range(1..=max);

        let mut genes = parent.genes().to_vec();
        let unit = genes.remove(index);
        genes.insert(index - slide, unit);
        Some(genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_core::{Registry, UnitSpec};
    use poe_test_utils::{fixtures, genes, names};
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn consumer_cannot_pass_its_producer() {
        let request = fixtures::scenario_a();
        let parent = Candidate::evaluate(&request, genes(&request, &["A", "B"]));
        assert_eq!(MoveRunner::max_slide(&parent, &request, 1), 0);
    }

    #[test]
    fn independent_units_swap() {
        let mut builder = Registry::builder("program");
        builder
            .unit(UnitSpec::new("a", "program").adds(["x"]))
            .unit(UnitSpec::new("b", "program").adds(["y"]).produces(["out"]));
        let registry = Arc::new(builder.build().unwrap());
        let request = Request::builder(registry).target("out").build().unwrap();

        let parent = Candidate::evaluate(&request, genes(&request, &["a", "b"]));
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(MoveRunner::max_slide(&parent, &request, 1), 1);
        let child = loop {
            if let Some(child) = MoveRunner::new(1.0).propose(&parent, &request, &mut rng) {
                break child;
            }
        };
        assert_eq!(names(&request, &child), vec!["b", "a"]);
    }

    #[test]
    fn slide_stays_inside_satisfied_group() {
        let request = fixtures::scenario_a();
        // the unsatisfied `B` at 0 bounds the group holding both `A`s
        let parent = Candidate::evaluate(&request, genes(&request, &["B", "A", "A"]));
        assert_eq!(parent.evaluation().unsatisfied(), &[0]);
        assert_eq!(MoveRunner::max_slide(&parent, &request, 2), 1);
        assert_eq!(MoveRunner::max_slide(&parent, &request, 0), 0);
    }

    #[test]
    fn slide_stops_at_first_conflict() {
        let request = fixtures::compiler_pipeline();
        let parent = Candidate::evaluate(
            &request,
            genes(
                &request,
                &["parse", "resolve-types", "build-cfg", "ssa", "parse", "optimize"],
            ),
        );
        assert!(parent.is_valid());
        // past the second `parse`, not past `ssa`
        assert_eq!(MoveRunner::max_slide(&parent, &request, 5), 1);
    }
}
