//! Unit and adapter registry
//!
//! The registry is the read-only catalogue supplied by the hosting compiler:
//! scope levels, adapters between them, capability tags (optionally gated on
//! a feature), target productions and schedulable units.

use crate::error::RegistryError;
use crate::names::{
    AdapterId, DenseId, FeatureId, NameTable, ProductionId, ScopeId, TagId, UnitId,
};
use crate::scope::{Adapter, ScopeGraph};
use crate::tags::{TagEffect, TagSet, TagSetBuilder};
use crate::unit::{UnitDescriptor, UnitSpec};
use std::collections::HashSet;

/// Immutable registry of scope levels, adapters, tags and units
#[derive(Debug, Clone)]
pub struct Registry {
    scopes: ScopeGraph,
    tags: NameTable<TagId>,
    tag_gates: Vec<Option<FeatureId>>,
    features: NameTable<FeatureId>,
    productions: NameTable<ProductionId>,
    units: Vec<UnitDescriptor>,
}

impl Registry {
    /// Start building a registry rooted at the named scope level
    #[inline]
    #[must_use]
    pub fn builder(root: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder::new(root)
    }

    /// Scope graph with adapter chains
    #[inline]
    #[must_use]
    pub fn scopes(&self) -> &ScopeGraph {
        &self.scopes
    }

    /// All units in registration order
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[UnitDescriptor] {
        &self.units
    }

    /// Look up a unit
    #[inline]
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitDescriptor> {
        self.units.get(id.index())
    }

    /// Look up a unit by name
    #[must_use]
    pub fn unit_by_name(&self, name: &str) -> Option<&UnitDescriptor> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Name of a unit, `"?"` when unknown
    #[must_use]
    pub fn unit_name(&self, id: UnitId) -> &str {
        self.unit(id).map_or("?", |u| u.name.as_str())
    }

    /// Tag name table
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &NameTable<TagId> {
        &self.tags
    }

    /// Name of a tag, `"?"` when unknown
    #[must_use]
    pub fn tag_name(&self, tag: TagId) -> &str {
        self.tags.name(tag).unwrap_or("?")
    }

    /// Names of every tag in a set, in id order
    #[must_use]
    pub fn tag_names(&self, tags: &TagSet) -> Vec<String> {
        tags.iter().map(|t| self.tag_name(t).to_string()).collect()
    }

    /// Feature a tag is gated on, if any
    #[inline]
    #[must_use]
    pub fn tag_gate(&self, tag: TagId) -> Option<FeatureId> {
        self.tag_gates.get(tag.index()).copied().flatten()
    }

    /// Feature name table
    #[inline]
    #[must_use]
    pub fn features(&self) -> &NameTable<FeatureId> {
        &self.features
    }

    /// Production name table
    #[inline]
    #[must_use]
    pub fn productions(&self) -> &NameTable<ProductionId> {
        &self.productions
    }

    /// Units declaring a production
    pub fn producers_of(&self, production: ProductionId) -> impl Iterator<Item = &UnitDescriptor> {
        self.units
            .iter()
            .filter(move |u| u.productions.contains(&production))
    }
}

/// Builder for [`Registry`]
///
/// Names are resolved when [`build`](Self::build) runs; tags and productions
/// referenced by units are registered implicitly.
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    root: String,
    scopes: Vec<String>,
    adapters: Vec<(String, String, String)>,
    tags: Vec<String>,
    gates: Vec<(String, String)>,
    features: Vec<String>,
    productions: Vec<String>,
    units: Vec<UnitSpec>,
}

impl RegistryBuilder {
    /// Create a builder rooted at the named scope level
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            scopes: Vec::new(),
            adapters: Vec::new(),
            tags: Vec::new(),
            gates: Vec::new(),
            features: Vec::new(),
            productions: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Declare a scope level
    pub fn scope(&mut self, name: impl Into<String>) -> &mut Self {
        self.scopes.push(name.into());
        self
    }

    /// Declare an adapter from `source` into the deeper level `target`
    pub fn adapter(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.adapters
            .push((name.into(), source.into(), target.into()));
        self
    }

    /// Declare a tag explicitly (fixes its id ahead of unit references)
    pub fn tag(&mut self, name: impl Into<String>) -> &mut Self {
        self.tags.push(name.into());
        self
    }

    /// Declare a tag whose constraints are live only with `feature` enabled
    pub fn gated_tag(&mut self, name: impl Into<String>, feature: impl Into<String>) -> &mut Self {
        let name = name.into();
        let feature = feature.into();
        self.tags.push(name.clone());
        self.features.push(feature.clone());
        self.gates.push((name, feature));
        self
    }

    /// Declare a feature
    pub fn feature(&mut self, name: impl Into<String>) -> &mut Self {
        self.features.push(name.into());
        self
    }

    /// Declare a production without necessarily having a producer
    pub fn production(&mut self, name: impl Into<String>) -> &mut Self {
        self.productions.push(name.into());
        self
    }

    /// Register a unit
    pub fn unit(&mut self, spec: UnitSpec) -> &mut Self {
        self.units.push(spec);
        self
    }

    /// Resolve every name and freeze the registry
    ///
    /// # Errors
    /// Returns error on duplicate names, unknown scope references,
    /// conflicting tag gates or an ill-formed adapter graph
    pub fn build(&self) -> Result<Registry, RegistryError> {
        let mut scope_names = NameTable::<ScopeId>::new();
        let (root, _) = scope_names.intern(&self.root);
        for scope in &self.scopes {
            let (_, fresh) = scope_names.intern(scope);
            if !fresh && *scope != self.root {
                return Err(RegistryError::DuplicateScope(scope.clone()));
            }
        }

        let mut adapter_names = HashSet::new();
        let mut adapters = Vec::with_capacity(self.adapters.len());
        for (index, (name, source, target)) in self.adapters.iter().enumerate() {
            if !adapter_names.insert(name.as_str()) {
                return Err(RegistryError::DuplicateAdapter(name.clone()));
            }
            let lookup = |scope: &String| {
                scope_names
                    .get(scope)
                    .ok_or_else(|| RegistryError::UnknownScope {
                        scope: scope.clone(),
                        referrer: name.clone(),
                    })
            };
            adapters.push(Adapter {
                id: AdapterId::from_index(index),
                name: name.clone(),
                source: lookup(source)?,
                target: lookup(target)?,
            });
        }
        let scopes = ScopeGraph::new(scope_names, root, adapters)?;

        let mut features = NameTable::<FeatureId>::new();
        for feature in &self.features {
            features.intern(feature);
        }

        let mut tags = NameTable::<TagId>::new();
        for tag in &self.tags {
            tags.intern(tag);
        }

        let mut productions = NameTable::<ProductionId>::new();
        for production in &self.productions {
            productions.intern(production);
        }

        let mut unit_names = HashSet::new();
        let mut units = Vec::with_capacity(self.units.len());
        for (index, spec) in self.units.iter().enumerate() {
            if !unit_names.insert(spec.name.as_str()) {
                return Err(RegistryError::DuplicateUnit(spec.name.clone()));
            }
            let scope = scopes
                .names()
                .get(&spec.scope)
                .ok_or_else(|| RegistryError::UnknownScope {
                    scope: spec.scope.clone(),
                    referrer: spec.name.clone(),
                })?;

            let needs = intern_tags(&mut tags, &spec.needs);
            let forbids = intern_tags(&mut tags, &spec.forbids);
            let adds = intern_tags(&mut tags, &spec.adds);
            let retracts = intern_tags(&mut tags, &spec.retracts);

            let mut produced = Vec::with_capacity(spec.produces.len());
            for name in &spec.produces {
                let (id, _) = productions.intern(name);
                if !produced.contains(&id) {
                    produced.push(id);
                }
            }

            units.push(UnitDescriptor {
                id: UnitId::from_index(index),
                name: spec.name.clone(),
                scope,
                needs,
                forbids,
                effect: TagEffect::new(adds, retracts),
                productions: produced,
                constraints: spec.constraints,
            });
        }

        let mut tag_gates: Vec<Option<FeatureId>> = vec![None; tags.len()];
        for (tag, feature) in &self.gates {
            let (Some(tag_id), Some(feature_id)) = (tags.get(tag), features.get(feature)) else {
                continue;
            };
            match tag_gates[tag_id.index()] {
                Some(existing) if existing != feature_id => {
                    return Err(RegistryError::ConflictingTagGate {
                        tag: tag.clone(),
                        first: features.name(existing).unwrap_or("?").to_string(),
                        second: feature.clone(),
                    });
                }
                _ => tag_gates[tag_id.index()] = Some(feature_id),
            }
        }

        Ok(Registry {
            scopes,
            tags,
            tag_gates,
            features,
            productions,
            units,
        })
    }
}

fn intern_tags(tags: &mut NameTable<TagId>, names: &[String]) -> TagSet {
    let mut set = TagSetBuilder::new();
    for name in names {
        set.insert(tags.intern(name).0);
    }
    set.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compiler_registry() -> RegistryBuilder {
        let mut b = Registry::builder("program");
        b.scope("type")
            .scope("method")
            .adapter("types", "program", "type")
            .adapter("methods", "type", "method")
            .unit(UnitSpec::new("parse", "program").adds(["ast"]))
            .unit(
                UnitSpec::new("cfg", "method")
                    .needs(["ast"])
                    .adds(["cfg"])
                    .produces(["il"]),
            );
        b
    }

    #[test]
    fn build_resolves_names() {
        let registry = compiler_registry().build().unwrap();

        assert_eq!(registry.units().len(), 2);
        assert_eq!(registry.scopes().names().len(), 3);
        assert_eq!(registry.scopes().adapters().len(), 2);

        let cfg = registry.unit_by_name("cfg").unwrap();
        assert!(cfg.is_anchor());
        assert_eq!(registry.tag_names(&cfg.needs), vec!["ast".to_string()]);
        assert_eq!(registry.scopes().scope_name(cfg.scope), "method");
    }

    #[test]
    fn producers_are_listed() {
        let registry = compiler_registry().build().unwrap();
        let il = registry.productions().get("il").unwrap();
        let names: Vec<_> = registry.producers_of(il).map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["cfg"]);
    }

    #[test]
    fn duplicate_unit_rejected() {
        let mut b = compiler_registry();
        b.unit(UnitSpec::new("parse", "program"));
        assert_eq!(b.build().unwrap_err(), RegistryError::DuplicateUnit("parse".into()));
    }

    #[test]
    fn unknown_scope_rejected() {
        let mut b = compiler_registry();
        b.unit(UnitSpec::new("lower", "block"));
        assert!(matches!(
            b.build(),
            Err(RegistryError::UnknownScope { ref scope, .. }) if scope == "block"
        ));
    }

    #[test]
    fn root_may_be_listed_among_scopes() {
        let mut b = Registry::builder("program");
        b.scope("program").scope("method");
        assert!(b.build().is_ok());

        b.scope("method");
        assert_eq!(b.build().unwrap_err(), RegistryError::DuplicateScope("method".into()));
    }

    #[test]
    fn tag_gates_are_recorded() {
        let mut b = compiler_registry();
        b.gated_tag("debug-info", "debug");
        let registry = b.build().unwrap();

        let tag = registry.tags().get("debug-info").unwrap();
        let feature = registry.features().get("debug").unwrap();
        assert_eq!(registry.tag_gate(tag), Some(feature));

        let ast = registry.tags().get("ast").unwrap();
        assert_eq!(registry.tag_gate(ast), None);
    }

    #[test]
    fn conflicting_gates_rejected() {
        let mut b = compiler_registry();
        b.gated_tag("x", "one").gated_tag("x", "two");
        assert!(matches!(
            b.build(),
            Err(RegistryError::ConflictingTagGate { .. })
        ));
    }
}
