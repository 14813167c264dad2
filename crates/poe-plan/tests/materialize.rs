//! Evaluator and materializer agreement

use poe_plan::{Materializer, PlanNode, Planner};
use poe_search::{Candidate, EvolutionEngine, SearchConfig};
use poe_test_utils::strategies::{arb_request, arb_request_and_genes};
use poe_test_utils::{fixtures, genes};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn valid_candidates_materialize_in_order((request, genes) in arb_request_and_genes()) {
        let candidate = Candidate::evaluate(&request, genes);
        if candidate.is_valid() {
            let plan = Materializer::new(&request).materialize(candidate.genes());
            prop_assert!(plan.is_ok(), "{:?}", plan);
            let plan = plan.unwrap();
            prop_assert_eq!(plan.units(), candidate.genes().to_vec());
            prop_assert_eq!(plan.adapter_count(), candidate.evaluation().adapter_count());
        }
    }

    #[test]
    fn resolved_scopes_materialize((request, genes) in arb_request_and_genes()) {
        let candidate = Candidate::evaluate(&request, genes);
        let all_resolved = candidate
            .evaluation()
            .positions()
            .iter()
            .all(|position| position.scope_resolved);
        let plan = Materializer::new(&request).materialize(candidate.genes());
        prop_assert_eq!(plan.is_ok(), all_resolved);
    }

    #[test]
    fn search_winners_materialize(request in arb_request(), seed in any::<u64>()) {
        let config = SearchConfig::default().with_stagnation_limit(15);
        let engine = EvolutionEngine::new(Arc::clone(&request), config).unwrap();
        let outcome = engine.run(&mut StdRng::seed_from_u64(seed));
        if outcome.best.is_valid() {
            let plan = Materializer::new(&request).materialize(outcome.best.genes()).unwrap();
            prop_assert_eq!(plan.units(), outcome.best.genes().to_vec());
        }
    }
}

#[test]
fn scenario_b_plan_enters_method_through_v() {
    let request = fixtures::scenario_b();
    let planner = Planner::new(SearchConfig::default().with_stagnation_limit(10)).unwrap();
    let planned = planner.plan(Arc::clone(&request), Some(3)).unwrap();

    let registry = request.registry();
    assert_eq!(
        planned.plan.describe(registry),
        PlanNode::Scope {
            scope: "program".into(),
            via: None,
            items: vec![PlanNode::Scope {
                scope: "method".into(),
                via: Some("V".into()),
                items: vec![PlanNode::Unit { name: "C".into() }],
            }],
        }
    );
}

#[test]
fn describe_serializes_as_tagged_tree() {
    let request = fixtures::scenario_b();
    let plan = Materializer::new(&request)
        .materialize(&genes(&request, &["C"]))
        .unwrap();
    let json = serde_json::to_value(plan.describe(request.registry())).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "kind": "scope",
            "scope": "program",
            "items": [{
                "kind": "scope",
                "scope": "method",
                "via": "V",
                "items": [{ "kind": "unit", "name": "C" }]
            }]
        })
    );
}

#[test]
fn verified_pipeline_needs_the_gated_unit() {
    let request = fixtures::verified_pipeline();
    let planner = Planner::new(SearchConfig::default().with_stagnation_limit(300)).unwrap();
    let planned = planner.plan(Arc::clone(&request), Some(11)).unwrap();

    let names: Vec<String> = planned
        .plan
        .units()
        .iter()
        .map(|id| request.registry().unit_name(*id).to_string())
        .collect();
    let at = |name: &str| names.iter().position(|n| n == name);
    assert!(at("verify").is_some(), "{names:?}");
    assert!(at("verify") < at("emit"));
}
