//! Scope levels and adapter resolution
//!
//! Scope levels form a directed graph whose only edges are declared
//! adapters. [`ScopeGraph::resolve`] is the single routine that decides how a
//! scope stack reaches the level a unit runs on. The candidate evaluator, the
//! mutation operators and the plan materializer all go through it, so they
//! can never disagree about a path.

use crate::error::RegistryError;
use crate::names::{AdapterId, DenseId, NameTable, ScopeId};
use petgraph::algo::{astar, is_cyclic_directed};
use petgraph::graphmap::DiGraphMap;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Adapter chain between two scope levels
pub type AdapterChain = SmallVec<[AdapterId; 4]>;

/// Declared bridge from one scope level into a deeper one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    /// Adapter identifier
    pub id: AdapterId,
    /// Adapter name
    pub name: String,
    /// Level the adapter is entered from
    pub source: ScopeId,
    /// Level the adapter establishes
    pub target: ScopeId,
}

/// How a scope stack reaches a requested level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'g> {
    /// The level is already on the stack; keep the first `keep` entries
    OnStack {
        /// Stack length after popping
        keep: usize,
    },
    /// Pop to `keep` entries, then push the target of every adapter in `chain`
    Adapted {
        /// Stack length after popping
        keep: usize,
        /// Adapters to traverse, outermost first
        chain: &'g [AdapterId],
    },
}

impl<'g> Resolution<'g> {
    /// Stack length to truncate to before pushing
    #[inline]
    #[must_use]
    pub fn keep(&self) -> usize {
        match self {
            Self::OnStack { keep } | Self::Adapted { keep, .. } => *keep,
        }
    }

    /// Adapters traversed (empty when the level was already on the stack)
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &'g [AdapterId] {
        match self {
            Self::OnStack { .. } => &[],
            Self::Adapted { chain, .. } => chain,
        }
    }
}

/// Registry-defined graph of scope levels and adapters
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    names: NameTable<ScopeId>,
    root: ScopeId,
    adapters: Vec<Adapter>,
    /// Shortest adapter chain for every reachable ordered pair
    chains: HashMap<(ScopeId, ScopeId), AdapterChain>,
}

impl ScopeGraph {
    /// Build the graph and precompute adapter chains
    ///
    /// # Errors
    /// Returns error on self-adapters, duplicate edges or adapter cycles
    pub(crate) fn new(
        names: NameTable<ScopeId>,
        root: ScopeId,
        adapters: Vec<Adapter>,
    ) -> Result<Self, RegistryError> {
        let mut graph: DiGraphMap<ScopeId, AdapterId> = DiGraphMap::new();
        for (scope, _) in names.iter() {
            graph.add_node(scope);
        }

        for adapter in &adapters {
            if adapter.source == adapter.target {
                return Err(RegistryError::SelfAdapter(adapter.name.clone()));
            }
            if graph.contains_edge(adapter.source, adapter.target) {
                return Err(RegistryError::ParallelAdapter(adapter.name.clone()));
            }
            graph.add_edge(adapter.source, adapter.target, adapter.id);
        }

        if is_cyclic_directed(&graph) {
            return Err(RegistryError::AdapterCycle);
        }

        let mut chains = HashMap::new();
        for (from, _) in names.iter() {
            for (to, _) in names.iter() {
                if from == to {
                    continue;
                }
                let Some((_, path)) = astar(&graph, from, |n| n == to, |_| 1u32, |_| 0u32)
                else {
                    continue;
                };
                let chain: AdapterChain = path
                    .windows(2)
                    .filter_map(|pair| graph.edge_weight(pair[0], pair[1]).copied())
                    .collect();
                chains.insert((from, to), chain);
            }
        }

        Ok(Self {
            names,
            root,
            adapters,
            chains,
        })
    }

    /// Root scope level (base of every stack)
    #[inline]
    #[must_use]
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Scope level name table
    #[inline]
    #[must_use]
    pub fn names(&self) -> &NameTable<ScopeId> {
        &self.names
    }

    /// Name of a scope level, `"?"` when unknown
    #[must_use]
    pub fn scope_name(&self, scope: ScopeId) -> &str {
        self.names.name(scope).unwrap_or("?")
    }

    /// Look up an adapter
    #[inline]
    #[must_use]
    pub fn adapter(&self, id: AdapterId) -> Option<&Adapter> {
        self.adapters.get(id.index())
    }

    /// All declared adapters
    #[inline]
    #[must_use]
    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    /// Shortest adapter chain between two levels
    #[inline]
    #[must_use]
    pub fn chain(&self, from: ScopeId, to: ScopeId) -> Option<&[AdapterId]> {
        self.chains.get(&(from, to)).map(SmallVec::as_slice)
    }

    /// Resolve `target` against a scope stack (base first)
    ///
    /// Searches the stack top-down for `target`. Failing that, looks for an
    /// adapter chain from the top of the stack. Deeper entries are never
    /// used as chain sources. An empty stack is treated as `[root]`.
    #[must_use]
    pub fn resolve(&self, stack: &[ScopeId], target: ScopeId) -> Option<Resolution<'_>> {
        let root = [self.root];
        let stack = if stack.is_empty() { &root[..] } else { stack };

        if let Some(pos) = stack.iter().rposition(|&s| s == target) {
            return Some(Resolution::OnStack { keep: pos + 1 });
        }

        let top = *stack.last()?;
        self.chain(top, target).map(|chain| Resolution::Adapted {
            keep: stack.len(),
            chain,
        })
    }

    /// Apply a resolution to a plain scope stack
    ///
    /// An empty stack is seeded with the root first. Returns the number of
    /// adapters traversed.
    pub fn apply(&self, stack: &mut Vec<ScopeId>, resolution: Resolution<'_>) -> usize {
        if stack.is_empty() {
            stack.push(self.root);
        }
        stack.truncate(resolution.keep());
        let chain = resolution.chain();
        for id in chain {
            if let Some(adapter) = self.adapter(*id) {
                stack.push(adapter.target);
            }
        }
        chain.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(scopes: &[&str], edges: &[(&str, usize, usize)]) -> Result<ScopeGraph, RegistryError> {
        let mut names = NameTable::new();
        for s in scopes {
            names.intern(s);
        }
        let adapters = edges
            .iter()
            .enumerate()
            .map(|(i, (name, from, to))| Adapter {
                id: AdapterId::from_index(i),
                name: (*name).to_string(),
                source: ScopeId::from_index(*from),
                target: ScopeId::from_index(*to),
            })
            .collect();
        ScopeGraph::new(names, ScopeId::from_index(0), adapters)
    }

    fn s(i: usize) -> ScopeId {
        ScopeId::from_index(i)
    }

    #[test]
    fn resolves_level_on_stack() {
        let g = graph(&["program", "type", "method"], &[("t", 0, 1), ("m", 1, 2)]).unwrap();
        let res = g.resolve(&[s(0), s(1), s(2)], s(1)).unwrap();
        assert_eq!(res, Resolution::OnStack { keep: 2 });
        assert!(res.chain().is_empty());
    }

    #[test]
    fn resolves_chain_from_top() {
        let g = graph(&["program", "type", "method"], &[("t", 0, 1), ("m", 1, 2)]).unwrap();
        let res = g.resolve(&[s(0)], s(2)).unwrap();
        assert_eq!(res.keep(), 1);
        assert_eq!(res.chain(), &[AdapterId::from_index(0), AdapterId::from_index(1)]);

        let mut stack = vec![s(0)];
        let traversed = g.apply(&mut stack, res);
        assert_eq!(traversed, 2);
        assert_eq!(stack, vec![s(0), s(1), s(2)]);
    }

    #[test]
    fn deeper_entries_are_not_chain_sources() {
        // program -> method directly, program -> type separately
        let g = graph(&["program", "type", "method"], &[("t", 0, 1), ("m", 0, 2)]).unwrap();
        assert!(g.resolve(&[s(0), s(2)], s(1)).is_none());
        assert_eq!(g.resolve(&[s(0)], s(1)).map(|r| r.keep()), Some(1));
    }

    #[test]
    fn unreachable_level_is_none() {
        let g = graph(&["program", "type", "method"], &[("t", 0, 1)]).unwrap();
        assert!(g.resolve(&[s(0), s(1)], s(2)).is_none());
    }

    #[test]
    fn empty_stack_behaves_as_root() {
        let g = graph(&["program", "method"], &[("m", 0, 1)]).unwrap();
        assert_eq!(g.resolve(&[], s(0)), Some(Resolution::OnStack { keep: 1 }));
        assert_eq!(g.resolve(&[], s(1)).map(|r| r.chain().len()), Some(1));
    }

    #[test]
    fn apply_on_empty_stack_keeps_root() {
        let g = graph(&["program", "method"], &[("m", 0, 1)]).unwrap();

        let mut stack = Vec::new();
        let res = g.resolve(&stack, s(1)).unwrap();
        assert_eq!(g.apply(&mut stack, res), 1);
        assert_eq!(stack, vec![s(0), s(1)]);

        let mut stack = Vec::new();
        let res = g.resolve(&stack, s(0)).unwrap();
        assert_eq!(g.apply(&mut stack, res), 0);
        assert_eq!(stack, vec![s(0)]);
    }

    #[test]
    fn rejects_cycles_and_self_adapters() {
        let cyclic = graph(&["a", "b"], &[("ab", 0, 1), ("ba", 1, 0)]);
        assert!(matches!(cyclic, Err(RegistryError::AdapterCycle)));

        let selfish = graph(&["a"], &[("aa", 0, 0)]);
        assert!(matches!(selfish, Err(RegistryError::SelfAdapter(_))));
    }

    #[test]
    fn rejects_parallel_adapters() {
        let parallel = graph(&["a", "b"], &[("x", 0, 1), ("y", 0, 1)]);
        assert!(matches!(parallel, Err(RegistryError::ParallelAdapter(_))));
    }
}
