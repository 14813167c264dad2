//! Candidate evaluation
//!
//! Walks an ordered unit list, resolving each unit's scope level through
//! [`ScopeGraph::resolve`](poe_core::ScopeGraph::resolve) and tracking the
//! tag state, then scores the result.

use poe_core::{AdapterChain, Request, ScopeId, TagSet, UnitId};

/// Outcome of placing one unit on top of a walk state
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The unit's scope level was reachable
    pub scope_resolved: bool,
    /// Adapters pushed to reach the unit's scope level
    pub adapters: AdapterChain,
    /// Scope and tag constraints all hold
    pub satisfied: bool,
    /// Constraint weight of the unit
    pub weight: u32,
}

/// Incremental walk over a unit sequence
///
/// Holds the scope stack and tag state between units. Used by the evaluator
/// and by operators that need to test a placement without evaluating a
/// whole candidate.
#[derive(Debug, Clone)]
pub struct Walker<'r> {
    request: &'r Request,
    stack: Vec<ScopeId>,
    tags: TagSet,
}

impl<'r> Walker<'r> {
    /// Start at the root scope with the request's initial tags
    #[must_use]
    pub fn new(request: &'r Request) -> Self {
        Self {
            stack: vec![request.registry().scopes().root()],
            tags: request.initial_tags().snapshot(),
            request,
        }
    }

    /// Resume from a recorded state
    #[must_use]
    pub fn resume(request: &'r Request, stack: Vec<ScopeId>, tags: TagSet) -> Self {
        Self {
            request,
            stack,
            tags,
        }
    }

    /// Current scope stack, root first
    #[inline]
    #[must_use]
    pub fn stack(&self) -> &[ScopeId] {
        &self.stack
    }

    /// Current tag state
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Place `unit` next and advance the state past it
    pub fn step(&mut self, unit: UnitId) -> Step {
        let registry = self.request.registry();
        let scopes = registry.scopes();
        let (Some(descriptor), Some(live)) = (registry.unit(unit), self.request.live(unit)) else {
            return Step {
                scope_resolved: false,
                adapters: AdapterChain::new(),
                satisfied: false,
                weight: 1,
            };
        };

        let mut adapters = AdapterChain::new();
        let scope_resolved = match scopes.resolve(&self.stack, descriptor.scope) {
            Some(resolution) => {
                adapters.extend_from_slice(resolution.chain());
                scopes.apply(&mut self.stack, resolution);
                true
            }
            None => {
                self.stack.clear();
                self.stack.push(scopes.root());
                false
            }
        };

        let satisfied = scope_resolved && live.is_satisfied_by(&self.tags);
        self.tags = descriptor.effect.apply(&self.tags);

        Step {
            scope_resolved,
            adapters,
            satisfied,
            weight: live.weight,
        }
    }
}

/// Per-position evaluation detail
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Unit at this position
    pub unit: UnitId,
    /// All constraints hold
    pub satisfied: bool,
    /// Scope level was reachable
    pub scope_resolved: bool,
    /// Adapters traversed right before this unit
    pub adapters: AdapterChain,
    /// Live required tags that were absent
    pub missing: TagSet,
    /// Live forbidden tags that were present
    pub conflicting: TagSet,
    /// Constraint weight
    pub weight: u32,
}

/// Maximal run of positions sharing one classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    /// First position
    pub start: usize,
    /// Number of positions
    pub len: usize,
    /// Classification of every position in the run
    pub satisfied: bool,
}

/// Full evaluation of one gene sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    fitness: f64,
    satisfied_total: u64,
    unsatisfied_total: u64,
    adapter_count: usize,
    satisfied: Vec<usize>,
    unsatisfied: Vec<usize>,
    groups: Vec<Group>,
    before_tags: Vec<TagSet>,
    before_stacks: Vec<Vec<ScopeId>>,
    positions: Vec<PositionReport>,
}

impl Evaluation {
    /// Evaluate `genes` against `request`
    #[must_use]
    pub fn of(request: &Request, genes: &[UnitId]) -> Self {
        let mut walker = Walker::new(request);
        let mut eval = Self {
            fitness: 0.0,
            satisfied_total: 0,
            unsatisfied_total: 0,
            adapter_count: 0,
            satisfied: Vec::new(),
            unsatisfied: Vec::new(),
            groups: Vec::new(),
            before_tags: Vec::with_capacity(genes.len() + 1),
            before_stacks: Vec::with_capacity(genes.len() + 1),
            positions: Vec::with_capacity(genes.len()),
        };

        for (index, &unit) in genes.iter().enumerate() {
            eval.before_tags.push(walker.tags().snapshot());
            eval.before_stacks.push(walker.stack().to_vec());

            let step = walker.step(unit);
            let before = &eval.before_tags[index];
            let (missing, conflicting) = match request.live(unit) {
                Some(live) if !step.satisfied => (live.missing(before), live.conflicting(before)),
                _ => (TagSet::new(), TagSet::new()),
            };

            eval.adapter_count += step.adapters.len();
            if step.satisfied {
                eval.satisfied_total += u64::from(step.weight);
                eval.satisfied.push(index);
            } else {
                eval.unsatisfied_total += u64::from(step.weight);
                eval.unsatisfied.push(index);
            }

            match eval.groups.last_mut() {
                Some(group) if group.satisfied == step.satisfied => group.len += 1,
                _ => eval.groups.push(Group {
                    start: index,
                    len: 1,
                    satisfied: step.satisfied,
                }),
            }

            eval.positions.push(PositionReport {
                unit,
                satisfied: step.satisfied,
                scope_resolved: step.scope_resolved,
                adapters: step.adapters,
                missing,
                conflicting,
                weight: step.weight,
            });
        }
        eval.before_tags.push(walker.tags().snapshot());
        eval.before_stacks.push(walker.stack().to_vec());

        eval.fitness = fitness(
            eval.satisfied_total,
            eval.unsatisfied_total,
            eval.adapter_count,
            genes.len(),
        );
        eval
    }

    /// Fitness score; higher is better
    #[inline]
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Zero unsatisfied constraints
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.unsatisfied_total == 0
    }

    /// Total weight of satisfied units
    #[inline]
    #[must_use]
    pub fn satisfied_total(&self) -> u64 {
        self.satisfied_total
    }

    /// Total weight of unsatisfied units
    #[inline]
    #[must_use]
    pub fn unsatisfied_total(&self) -> u64 {
        self.unsatisfied_total
    }

    /// Adapters traversed over the whole walk
    #[inline]
    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.adapter_count
    }

    /// Satisfied positions, ascending
    #[inline]
    #[must_use]
    pub fn satisfied(&self) -> &[usize] {
        &self.satisfied
    }

    /// Unsatisfied positions, ascending
    #[inline]
    #[must_use]
    pub fn unsatisfied(&self) -> &[usize] {
        &self.unsatisfied
    }

    /// Runs of equal classification
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Group containing `index`
    #[must_use]
    pub fn group_of(&self, index: usize) -> Option<&Group> {
        let pos = self.groups.partition_point(|group| group.start + group.len <= index);
        self.groups.get(pos).filter(|group| group.start <= index)
    }

    /// Tag state before each position; the last entry is the final state
    #[inline]
    #[must_use]
    pub fn before_tags(&self) -> &[TagSet] {
        &self.before_tags
    }

    /// Scope stack before each position; the last entry is the final stack
    #[inline]
    #[must_use]
    pub fn before_stacks(&self) -> &[Vec<ScopeId>] {
        &self.before_stacks
    }

    /// Per-position detail
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[PositionReport] {
        &self.positions
    }
}

/// Score a walk
///
/// Partial candidates score their satisfied share. Valid candidates score
/// above 1.0, higher for fewer adapters and shorter plans.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fitness(satisfied: u64, unsatisfied: u64, adapters: usize, len: usize) -> f64 {
    if satisfied == 0 && unsatisfied == 0 {
        1.0
    } else if unsatisfied > 0 {
        satisfied as f64 / (satisfied + unsatisfied) as f64
    } else {
        1.0 + 1.0 / (10.0 * adapters as f64 + len as f64)
    }
}
