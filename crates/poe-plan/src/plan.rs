//! Materialized plans
//!
//! A [`Plan`] is a tree of scopes. The root scope is the root level; every
//! nested scope was entered through one adapter and holds the units that
//! run on it, in order.

use poe_core::{AdapterId, Registry, ScopeId, UnitId};
use serde::Serialize;
use std::fmt::{self, Display, Formatter, Write as _};

/// Entry of a plan scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanItem {
    /// Run a unit
    Unit(UnitId),
    /// Enter a nested scope
    Scope(PlanScope),
}

/// One scope level of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanScope {
    /// Scope level
    pub scope: ScopeId,
    /// Adapter that entered this level (`None` for the root)
    pub via: Option<AdapterId>,
    /// Ordered contents
    pub items: Vec<PlanItem>,
}

impl PlanScope {
    pub(crate) fn new(scope: ScopeId, via: Option<AdapterId>) -> Self {
        Self {
            scope,
            via,
            items: Vec::new(),
        }
    }

    fn collect_units(&self, out: &mut Vec<UnitId>) {
        for item in &self.items {
            match item {
                PlanItem::Unit(id) => out.push(*id),
                PlanItem::Scope(scope) => scope.collect_units(out),
            }
        }
    }

    fn depth(&self) -> usize {
        1 + self
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Scope(scope) => Some(scope.depth()),
                PlanItem::Unit(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    fn adapter_count(&self) -> usize {
        usize::from(self.via.is_some())
            + self
                .items
                .iter()
                .map(|item| match item {
                    PlanItem::Scope(scope) => scope.adapter_count(),
                    PlanItem::Unit(_) => 0,
                })
                .sum::<usize>()
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hasher.update(b"S");
        hasher.update(&self.scope.raw().to_le_bytes());
        hasher.update(&self.via.map_or(u32::MAX, AdapterId::raw).to_le_bytes());
        hasher.update(&(self.items.len() as u64).to_le_bytes());
        for item in &self.items {
            match item {
                PlanItem::Unit(id) => {
                    hasher.update(b"U");
                    hasher.update(&id.raw().to_le_bytes());
                }
                PlanItem::Scope(scope) => scope.hash_into(hasher),
            }
        }
    }

    fn render_into(&self, registry: &Registry, indent: usize, out: &mut String) {
        let scopes = registry.scopes();
        let pad = "  ".repeat(indent);
        let _ = match self.via.and_then(|id| scopes.adapter(id)) {
            Some(adapter) => writeln!(
                out,
                "{pad}{} (via {})",
                scopes.scope_name(self.scope),
                adapter.name
            ),
            None => writeln!(out, "{pad}{}", scopes.scope_name(self.scope)),
        };
        for item in &self.items {
            match item {
                PlanItem::Unit(id) => {
                    let _ = writeln!(out, "{pad}  - {}", registry.unit_name(*id));
                }
                PlanItem::Scope(scope) => scope.render_into(registry, indent + 1, out),
            }
        }
    }

    fn describe(&self, registry: &Registry) -> PlanNode {
        let scopes = registry.scopes();
        PlanNode::Scope {
            scope: scopes.scope_name(self.scope).to_string(),
            via: self
                .via
                .and_then(|id| scopes.adapter(id))
                .map(|adapter| adapter.name.clone()),
            items: self
                .items
                .iter()
                .map(|item| match item {
                    PlanItem::Unit(id) => PlanNode::Unit {
                        name: registry.unit_name(*id).to_string(),
                    },
                    PlanItem::Scope(scope) => scope.describe(registry),
                })
                .collect(),
        }
    }
}

/// Executable plan, nested by scope level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    root: PlanScope,
}

impl Plan {
    pub(crate) fn new(root: PlanScope) -> Self {
        Self { root }
    }

    /// Root scope
    #[inline]
    #[must_use]
    pub fn root(&self) -> &PlanScope {
        &self.root
    }

    /// Units in execution order
    #[must_use]
    pub fn units(&self) -> Vec<UnitId> {
        let mut units = Vec::new();
        self.root.collect_units(&mut units);
        units
    }

    /// Number of unit executions
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units().len()
    }

    /// Deepest scope nesting (the root alone is depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Adapter traversals in the plan
    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.root.adapter_count()
    }

    /// Indented human-readable tree
    #[must_use]
    pub fn render(&self, registry: &Registry) -> String {
        let mut out = String::new();
        self.root.render_into(registry, 0, &mut out);
        out
    }

    /// Serializable named tree
    #[must_use]
    pub fn describe(&self, registry: &Registry) -> PlanNode {
        self.root.describe(registry)
    }

    /// Content hash of the plan structure
    #[must_use]
    pub fn digest(&self) -> PlanDigest {
        let mut hasher = blake3::Hasher::new();
        self.root.hash_into(&mut hasher);
        PlanDigest(*hasher.finalize().as_bytes())
    }
}

/// Serializable plan tree with names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlanNode {
    /// Unit execution
    Unit {
        /// Unit name
        name: String,
    },
    /// Scope level
    Scope {
        /// Scope level name
        scope: String,
        /// Adapter name, absent for the root
        #[serde(skip_serializing_if = "Option::is_none")]
        via: Option<String>,
        /// Ordered contents
        items: Vec<PlanNode>,
    },
}

/// Blake3 digest of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanDigest([u8; 32]);

impl PlanDigest {
    /// Raw bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for PlanDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PlanDigest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
