//! Loading the bundled demo manifest and resolving scopes through it

use poe_core::{Manifest, ScopeId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn demo_pipeline_loads() {
    let manifest = Manifest::from_path(demo("pipeline.yaml")).unwrap();
    let (registry, request) = manifest.build().unwrap();

    assert_eq!(registry.units().len(), 8);
    assert_eq!(registry.scopes().adapters().len(), 2);
    let anchors: Vec<_> = request
        .anchors()
        .iter()
        .map(|id| registry.unit_name(*id))
        .collect();
    assert_eq!(anchors, vec!["emit"]);

    let emit = registry.unit_by_name("emit").unwrap().id;
    assert_eq!(request.live(emit).unwrap().needs.len(), 2);
}

#[test]
fn two_step_chain_is_precomputed() {
    let manifest = Manifest::from_path(demo("pipeline.yaml")).unwrap();
    let registry = manifest.registry().unwrap();
    let scopes = registry.scopes();
    let program = scopes.names().get("program").unwrap();
    let method = scopes.names().get("method").unwrap();

    let chain: Vec<_> = scopes
        .chain(program, method)
        .unwrap()
        .iter()
        .map(|id| scopes.adapter(*id).unwrap().name.as_str())
        .collect();
    assert_eq!(chain, vec!["types", "methods"]);
    assert!(scopes.chain(method, program).is_none());
}

proptest! {
    #[test]
    fn resolution_lands_on_target(walk in proptest::collection::vec(0usize..3, 0..16)) {
        let manifest = Manifest::from_path(demo("pipeline.yaml")).unwrap();
        let registry = manifest.registry().unwrap();
        let scopes = registry.scopes();
        let levels: Vec<ScopeId> = ["program", "type", "method"]
            .iter()
            .map(|name| scopes.names().get(name).unwrap())
            .collect();

        let mut stack = vec![scopes.root()];
        for step in walk {
            let target = levels[step];
            let resolution = scopes.resolve(&stack, target).unwrap();
            let keep = resolution.keep();
            let adapters = scopes.apply(&mut stack, resolution);

            prop_assert_eq!(stack.last(), Some(&target));
            prop_assert_eq!(stack[0], scopes.root());
            prop_assert_eq!(stack.len(), keep + adapters);
        }
    }
}
