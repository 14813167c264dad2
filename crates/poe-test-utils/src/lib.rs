//! Testing utilities for the pass ordering engine
//!
//! Shared fixtures (small hand-built registries) and proptest strategies
//! producing random registries and gene sequences.

#![allow(missing_docs)]

use poe_core::{DenseId, Registry, Request, UnitId, UnitSpec};
use std::sync::Arc;

pub mod fixtures {
    use super::*;

    /// `A` establishes `x`; anchor `B` needs it
    pub fn scenario_a() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.unit(UnitSpec::new("A", "program").adds(["x"]))
            .unit(
                UnitSpec::new("B", "program")
                    .needs(["x"])
                    .adds(["y"])
                    .produces(["b"]),
            );
        request(b.build().unwrap(), &["b"])
    }

    /// Anchor `C` runs on `method`, reachable from `program` through `V`
    pub fn scenario_b() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.scope("method")
            .adapter("V", "program", "method")
            .unit(UnitSpec::new("C", "method").produces(["c"]));
        request(b.build().unwrap(), &["c"])
    }

    /// `type` and `method` both hang off `program`; neither reaches the other
    pub fn sibling_scopes() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.scope("type")
            .scope("method")
            .adapter("types", "program", "type")
            .adapter("methods", "program", "method")
            .unit(UnitSpec::new("walk-methods", "method").adds(["m"]))
            .unit(UnitSpec::new("walk-types", "type").adds(["t"]))
            .unit(UnitSpec::new("finish", "program").produces(["done"]));
        request(b.build().unwrap(), &["done"])
    }

    /// Three-level front-to-back pipeline with a single anchor (`emit`)
    pub fn compiler_pipeline() -> Arc<Request> {
        pipeline(&[])
    }

    /// [`compiler_pipeline`] with the `verify` feature enabled
    pub fn verified_pipeline() -> Arc<Request> {
        pipeline(&["verify"])
    }

    fn pipeline(features: &[&str]) -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.scope("type")
            .scope("method")
            .adapter("types", "program", "type")
            .adapter("methods", "type", "method")
            .gated_tag("verified", "verify")
            .unit(UnitSpec::new("parse", "program").adds(["ast"]))
            .unit(UnitSpec::new("resolve-types", "type").needs(["ast"]).adds(["typed"]))
            .unit(UnitSpec::new("build-cfg", "method").needs(["typed"]).adds(["cfg"]))
            .unit(UnitSpec::new("ssa", "method").needs(["cfg"]).adds(["ssa"]))
            .unit(
                UnitSpec::new("optimize", "method")
                    .needs(["ssa"])
                    .forbids(["lowered"])
                    .adds(["optimized"]),
            )
            .unit(
                UnitSpec::new("lower", "method")
                    .needs(["ssa"])
                    .retracts(["ssa"])
                    .adds(["lowered"]),
            )
            .unit(UnitSpec::new("verify", "program").needs(["lowered"]).adds(["verified"]))
            .unit(
                UnitSpec::new("emit", "program")
                    .needs(["lowered", "verified"])
                    .produces(["il"]),
            );
        let registry = Arc::new(b.build().unwrap());
        Arc::new(
            Request::builder(registry)
                .features(features.iter().copied())
                .target("il")
                .build()
                .unwrap(),
        )
    }

    /// Anchor needing a tag nothing establishes
    pub fn unsolvable() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.tag("never")
            .unit(UnitSpec::new("noop", "program"))
            .unit(UnitSpec::new("sink", "program").needs(["never"]).produces(["out"]));
        request(b.build().unwrap(), &["out"])
    }

    /// No targets and no fillers: every candidate stays empty
    pub fn stalled() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.unit(UnitSpec::new("idle", "program").produces(["unused"]));
        request(b.build().unwrap(), &[])
    }

    /// `island` is declared but no adapter reaches it
    pub fn orphan_scope() -> Arc<Request> {
        let mut b = Registry::builder("program");
        b.scope("island")
            .unit(UnitSpec::new("island", "island"))
            .unit(UnitSpec::new("main", "program").produces(["main"]));
        request(b.build().unwrap(), &["main"])
    }

    fn request(registry: Registry, targets: &[&str]) -> Arc<Request> {
        Arc::new(
            Request::builder(Arc::new(registry))
                .targets(targets.iter().copied())
                .build()
                .unwrap(),
        )
    }
}

/// Resolve unit names to ids, panicking on unknown names
pub fn genes(request: &Request, names: &[&str]) -> Vec<UnitId> {
    names
        .iter()
        .map(|name| {
            request
                .registry()
                .unit_by_name(name)
                .unwrap_or_else(|| panic!("unknown unit {name}"))
                .id
        })
        .collect()
}

/// Unit names of a gene sequence
pub fn names(request: &Request, genes: &[UnitId]) -> Vec<String> {
    genes
        .iter()
        .map(|id| request.registry().unit_name(*id).to_string())
        .collect()
}

pub mod strategies {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    const TAGS: usize = 6;

    #[derive(Debug, Clone)]
    struct UnitShape {
        scope: usize,
        needs: Vec<usize>,
        forbids: Vec<usize>,
        adds: Vec<usize>,
        retracts: Vec<usize>,
        anchor: bool,
    }

    fn unit_shape() -> impl Strategy<Value = UnitShape> {
        (
            0usize..4,
            vec(0..TAGS, 0..3),
            vec(0..TAGS, 0..2),
            vec(0..TAGS, 0..3),
            vec(0..TAGS, 0..2),
            proptest::bool::weighted(0.3),
        )
            .prop_map(|(scope, needs, forbids, adds, retracts, anchor)| UnitShape {
                scope,
                needs,
                forbids,
                adds,
                retracts,
                anchor,
            })
    }

    fn tag_names(indices: &[usize]) -> Vec<String> {
        indices.iter().map(|i| format!("t{i}")).collect()
    }

    fn build(depth: usize, shapes: &[UnitShape], initial: &[usize]) -> Arc<Request> {
        let mut b = Registry::builder("s0");
        for level in 1..depth {
            b.scope(format!("s{level}"))
                .adapter(format!("a{level}"), format!("s{}", level - 1), format!("s{level}"));
        }
        b.scope("island");
        for tag in 0..TAGS {
            b.tag(format!("t{tag}"));
        }

        let mut targets = Vec::new();
        for (index, shape) in shapes.iter().enumerate() {
            let scope = if shape.scope == 3 {
                "island".to_string()
            } else {
                format!("s{}", shape.scope % depth)
            };
            let mut spec = UnitSpec::new(format!("u{index}"), scope)
                .needs(tag_names(&shape.needs))
                .forbids(tag_names(&shape.forbids))
                .adds(tag_names(&shape.adds))
                .retracts(tag_names(&shape.retracts));
            if shape.anchor {
                targets.push(format!("p{index}"));
                spec = spec.produces([format!("p{index}")]);
            }
            b.unit(spec);
        }

        let registry = Arc::new(b.build().unwrap());
        Arc::new(
            Request::builder(registry)
                .initial_tags(tag_names(initial))
                .targets(targets)
                .build()
                .unwrap(),
        )
    }

    /// Random registry of up to three chained scope levels (plus one
    /// unreachable level) with a request targeting every anchor
    pub fn arb_request() -> impl Strategy<Value = Arc<Request>> {
        (1usize..=3, vec(unit_shape(), 1..8), vec(0..TAGS, 0..2))
            .prop_map(|(depth, shapes, initial)| build(depth, &shapes, &initial))
    }

    /// Random request with a random gene sequence over its units
    pub fn arb_request_and_genes() -> impl Strategy<Value = (Arc<Request>, Vec<UnitId>)> {
        arb_request().prop_flat_map(|request| {
            let units = request.registry().units().len();
            (Just(request), vec((0..units).prop_map(UnitId::from_index), 0..12))
        })
    }
}
