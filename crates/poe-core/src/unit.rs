//! Schedulable unit descriptors
//!
//! A [`UnitSpec`] is the name-based declaration a hosting compiler hands to
//! the [`RegistryBuilder`](crate::RegistryBuilder). Registration resolves it
//! into a [`UnitDescriptor`] whose tags, scope and productions are dense ids.

use crate::names::{ProductionId, ScopeId, UnitId};
use crate::tags::{TagEffect, TagSet};

/// Name-based declaration of a schedulable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub(crate) name: String,
    pub(crate) scope: String,
    pub(crate) needs: Vec<String>,
    pub(crate) forbids: Vec<String>,
    pub(crate) adds: Vec<String>,
    pub(crate) retracts: Vec<String>,
    pub(crate) produces: Vec<String>,
    pub(crate) constraints: Option<u32>,
}

impl UnitSpec {
    /// Declare a unit running on the named scope level
    #[must_use]
    pub fn new(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            needs: Vec::new(),
            forbids: Vec::new(),
            adds: Vec::new(),
            retracts: Vec::new(),
            produces: Vec::new(),
            constraints: None,
        }
    }

    /// Tags that must be present before the unit runs
    #[must_use]
    pub fn needs<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.needs.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Tags that must be absent before the unit runs
    #[must_use]
    pub fn forbids<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.forbids.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Tags the unit establishes
    #[must_use]
    pub fn adds<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.adds.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Tags the unit invalidates
    #[must_use]
    pub fn retracts<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.retracts.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Target productions this unit delivers (makes it an anchor)
    #[must_use]
    pub fn produces<S: Into<String>>(mut self, productions: impl IntoIterator<Item = S>) -> Self {
        self.produces.extend(productions.into_iter().map(Into::into));
        self
    }

    /// Override the constraint weight
    #[must_use]
    pub fn constraints(mut self, count: u32) -> Self {
        self.constraints = Some(count);
        self
    }

    /// Unit name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registered unit with resolved identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    /// Unit identifier
    pub id: UnitId,
    /// Unit name
    pub name: String,
    /// Scope level the unit runs on
    pub scope: ScopeId,
    /// Required tags
    pub needs: TagSet,
    /// Forbidden tags
    pub forbids: TagSet,
    /// Produced-tag transform
    pub effect: TagEffect,
    /// Declared productions
    pub productions: Vec<ProductionId>,
    /// Declared constraint weight, if overridden
    pub constraints: Option<u32>,
}

impl UnitDescriptor {
    /// Units with declared productions are anchors and never removed by mutation
    #[inline]
    #[must_use]
    pub fn is_anchor(&self) -> bool {
        !self.productions.is_empty()
    }

    /// Check if the unit delivers any of `targets`
    #[must_use]
    pub fn produces_any(&self, targets: &[ProductionId]) -> bool {
        self.productions.iter().any(|p| targets.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::DenseId;

    #[test]
    fn spec_builder_accumulates() {
        let spec = UnitSpec::new("inline", "method")
            .needs(["ssa"])
            .needs(["cfg"])
            .forbids(["lowered"])
            .adds(["inlined"])
            .constraints(4);

        assert_eq!(spec.name(), "inline");
        assert_eq!(spec.needs, vec!["ssa", "cfg"]);
        assert_eq!(spec.constraints, Some(4));
    }

    #[test]
    fn anchor_classification() {
        let mut unit = UnitDescriptor {
            id: UnitId::from_index(0),
            name: "emit".into(),
            scope: ScopeId::from_index(0),
            needs: TagSet::new(),
            forbids: TagSet::new(),
            effect: TagEffect::default(),
            productions: vec![],
            constraints: None,
        };
        assert!(!unit.is_anchor());

        unit.productions.push(ProductionId::from_index(1));
        assert!(unit.is_anchor());
        assert!(unit.produces_any(&[ProductionId::from_index(1)]));
        assert!(!unit.produces_any(&[ProductionId::from_index(0)]));
    }
}
