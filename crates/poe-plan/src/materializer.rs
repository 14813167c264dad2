//! Candidate to plan materialization

use crate::plan::{Plan, PlanItem, PlanScope};
use poe_core::{Request, UnitId};

/// Scope resolution failed while materializing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    /// Gene refers to no registered unit
    #[error("position {index}: unknown unit {unit}")]
    UnknownUnit {
        /// Position in the sequence
        index: usize,
        /// Offending identifier
        unit: UnitId,
    },

    /// Unit's scope level is not reachable from the current scope stack
    #[error("position {index}: scope `{scope}` of unit `{unit}` is unreachable")]
    UnresolvedScope {
        /// Position in the sequence
        index: usize,
        /// Unit name
        unit: String,
        /// Scope level name
        scope: String,
    },
}

/// Builds nested plans from gene sequences
///
/// Resolution goes through the same [`ScopeGraph::resolve`] the evaluator
/// uses, with a stack of open plan scopes mirroring the scope stack.
///
/// [`ScopeGraph::resolve`]: poe_core::ScopeGraph::resolve
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'r> {
    request: &'r Request,
}

impl<'r> Materializer<'r> {
    /// Create a materializer for `request`
    #[inline]
    #[must_use]
    pub fn new(request: &'r Request) -> Self {
        Self { request }
    }

    /// Build the plan for `genes`
    ///
    /// # Errors
    /// Returns error if a unit is unknown or its scope level is unreachable
    pub fn materialize(&self, genes: &[UnitId]) -> Result<Plan, MaterializeError> {
        let registry = self.request.registry();
        let scopes = registry.scopes();
        let mut frames = vec![PlanScope::new(scopes.root(), None)];
        let mut stack = vec![scopes.root()];

        for (index, &id) in genes.iter().enumerate() {
            let unit = registry
                .unit(id)
                .ok_or(MaterializeError::UnknownUnit { index, unit: id })?;
            let resolution = scopes.resolve(&stack, unit.scope).ok_or_else(|| {
                MaterializeError::UnresolvedScope {
                    index,
                    unit: unit.name.clone(),
                    scope: scopes.scope_name(unit.scope).to_string(),
                }
            })?;

            close_to(&mut frames, resolution.keep());
            for &adapter in resolution.chain() {
                if let Some(adapter) = scopes.adapter(adapter) {
                    frames.push(PlanScope::new(adapter.target, Some(adapter.id)));
                }
            }
            scopes.apply(&mut stack, resolution);

            if let Some(frame) = frames.last_mut() {
                frame.items.push(PlanItem::Unit(id));
            }
        }

        close_to(&mut frames, 1);
        let root = frames
            .pop()
            .unwrap_or_else(|| PlanScope::new(scopes.root(), None));
        Ok(Plan::new(root))
    }
}

/// Pop open scopes until `keep` remain, attaching each to its parent
fn close_to(frames: &mut Vec<PlanScope>, keep: usize) {
    while frames.len() > keep.max(1) {
        let Some(frame) = frames.pop() else { break };
        if let Some(parent) = frames.last_mut() {
            parent.items.push(PlanItem::Scope(frame));
        }
    }
}
