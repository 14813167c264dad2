//! Property tests for the mutation operators

use poe_core::{Request, UnitId};
use poe_search::{
    AddPostRunner, AddPreRunner, AddRunner, Candidate, MoveRunner, MutationOperator, RemoveRunner,
    RemoveUnsatisfiedRunner,
};
use poe_test_utils::strategies::arb_request_and_genes;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn anchor_counts(request: &Request, genes: &[UnitId]) -> Vec<usize> {
    request
        .registry()
        .units()
        .iter()
        .map(|unit| {
            if request.is_anchor(unit.id) {
                genes.iter().filter(|id| **id == unit.id).count()
            } else {
                0
            }
        })
        .collect()
}

fn all_operators() -> Vec<Box<dyn MutationOperator>> {
    vec![
        Box::new(AddRunner::new(1.0)),
        Box::new(AddPreRunner::new(1.0)),
        Box::new(AddPostRunner::new(1.0)),
        Box::new(RemoveRunner::new(1.0)),
        Box::new(RemoveUnsatisfiedRunner::new(1.0)),
        Box::new(MoveRunner::new(1.0)),
    ]
}

proptest! {
    #[test]
    fn operators_never_remove_or_duplicate_anchors(
        (request, genes) in arb_request_and_genes(),
        seed in any::<u64>(),
    ) {
        let parent = Candidate::evaluate(&request, genes);
        let before = anchor_counts(&request, parent.genes());
        let mut rng = StdRng::seed_from_u64(seed);

        for operator in all_operators() {
            for _ in 0..4 {
                if let Some(child) = operator.propose(&parent, &request, &mut rng) {
                    prop_assert_eq!(
                        anchor_counts(&request, &child),
                        before.clone(),
                        "operator {}",
                        operator.name()
                    );
                }
            }
        }
    }

    #[test]
    fn removals_shrink_by_exactly_one(
        (request, genes) in arb_request_and_genes(),
        seed in any::<u64>(),
    ) {
        let parent = Candidate::evaluate(&request, genes);
        let mut rng = StdRng::seed_from_u64(seed);

        for operator in [
            Box::new(RemoveRunner::new(1.0)) as Box<dyn MutationOperator>,
            Box::new(RemoveUnsatisfiedRunner::new(1.0)),
        ] {
            if let Some(child) = operator.propose(&parent, &request, &mut rng) {
                prop_assert_eq!(child.len() + 1, parent.len());
            }
        }
    }

    #[test]
    fn every_legal_slide_keeps_moved_unit_and_successor_satisfied(
        (request, genes) in arb_request_and_genes(),
    ) {
        let parent = Candidate::evaluate(&request, genes);

        for &index in parent.evaluation().satisfied() {
            let max = MoveRunner::max_slide(&parent, &request, index);
            let group = parent.evaluation().group_of(index).unwrap();
            prop_assert!(group.satisfied);
            prop_assert!(index - max >= group.start);
            for slide in 1..=max {
                let mut moved = parent.genes().to_vec();
                let unit = moved.remove(index);
                let destination = index - slide;
                moved.insert(destination, unit);

                let child = Candidate::evaluate(&request, moved);
                let positions = child.evaluation().positions();
                prop_assert!(positions[destination].satisfied);
                prop_assert!(positions[destination + 1].satisfied);
            }
        }
    }

    #[test]
    fn add_pre_strictly_reduces_the_target_deficit(
        (request, genes) in arb_request_and_genes(),
        seed in any::<u64>(),
    ) {
        let parent = Candidate::evaluate(&request, genes);
        let mut rng = StdRng::seed_from_u64(seed);

        if let Some(child) = AddPreRunner::new(1.0).propose(&parent, &request, &mut rng) {
            let genes = parent.genes();
            let repaired = Candidate::evaluate(&request, child.clone());
            let reduced = parent.evaluation().unsatisfied().iter().any(|&index| {
                let inserted_here =
                    child[..index] == genes[..index] && child[index + 1..] == genes[index..];
                let live = request.live(genes[index]).unwrap();
                inserted_here
                    && live.deficit(&repaired.evaluation().before_tags()[index + 1])
                        < live.deficit(&parent.evaluation().before_tags()[index])
            });
            prop_assert!(reduced);
        }
    }
}
