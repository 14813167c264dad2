//! Satisfaction statistics
//!
//! Advisory per-unit and per-tag counters, shareable across concurrent
//! planning sessions. Counters never feed back into the search.

use crate::evaluator::Evaluation;
use dashmap::DashMap;
use poe_core::Request;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counter {
    first: AtomicU64,
    second: AtomicU64,
}

impl Counter {
    fn load(&self) -> (u64, u64) {
        (
            self.first.load(Ordering::Relaxed),
            self.second.load(Ordering::Relaxed),
        )
    }
}

/// Unit row of a statistics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRow {
    /// Unit name
    pub name: String,
    /// Evaluated positions where the unit was satisfied
    pub satisfied: u64,
    /// Evaluated positions where the unit was not
    pub unsatisfied: u64,
}

/// Tag row of a statistics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    /// Tag name
    pub name: String,
    /// Times the tag was required but absent
    pub missing: u64,
    /// Times the tag was present while forbidden
    pub forbidden: u64,
}

/// Point-in-time copy of all counters, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Per-unit rows
    pub units: Vec<UnitRow>,
    /// Per-tag rows
    pub tags: Vec<TagRow>,
}

/// Concurrent satisfaction counters
#[derive(Debug, Default)]
pub struct SatisfactionStats {
    units: DashMap<String, Counter>,
    tags: DashMap<String, Counter>,
}

impl SatisfactionStats {
    /// Create empty statistics
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every position of one evaluation
    pub fn record(&self, request: &Request, evaluation: &Evaluation) {
        let registry = request.registry();
        for position in evaluation.positions() {
            let name = registry.unit_name(position.unit);
            bump(&self.units, name, |c| {
                let slot = if position.satisfied { &c.first } else { &c.second };
                slot.fetch_add(1, Ordering::Relaxed);
            });
            for tag in position.missing.iter() {
                bump(&self.tags, registry.tag_name(tag), |c| {
                    c.first.fetch_add(1, Ordering::Relaxed);
                });
            }
            for tag in position.conflicting.iter() {
                bump(&self.tags, registry.tag_name(tag), |c| {
                    c.second.fetch_add(1, Ordering::Relaxed);
                });
            }
        }
    }

    /// Copy out all counters
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut units: Vec<UnitRow> = self
            .units
            .iter()
            .map(|entry| {
                let (satisfied, unsatisfied) = entry.value().load();
                UnitRow {
                    name: entry.key().clone(),
                    satisfied,
                    unsatisfied,
                }
            })
            .collect();
        units.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tags: Vec<TagRow> = self
            .tags
            .iter()
            .map(|entry| {
                let (missing, forbidden) = entry.value().load();
                TagRow {
                    name: entry.key().clone(),
                    missing,
                    forbidden,
                }
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        StatsSnapshot { units, tags }
    }

    /// Drop all counters
    pub fn reset(&self) {
        self.units.clear();
        self.tags.clear();
    }
}

fn bump(map: &DashMap<String, Counter>, name: &str, apply: impl FnOnce(&Counter)) {
    if let Some(counter) = map.get(name) {
        apply(&*counter);
        return;
    }
    let counter = map.entry(name.to_string()).or_default();
    apply(&*counter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_test_utils::{fixtures, genes};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn records_units_and_missing_tags() {
        let request = fixtures::scenario_a();
        let stats = SatisfactionStats::new();
        let order = genes(&request, &["B", "A", "B"]);
        stats.record(&request, &Evaluation::of(&request, &order));

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot.units,
            vec![
                UnitRow { name: "A".into(), satisfied: 1, unsatisfied: 0 },
                UnitRow { name: "B".into(), satisfied: 1, unsatisfied: 1 },
            ]
        );
        assert_eq!(
            snapshot.tags,
            vec![TagRow { name: "x".into(), missing: 1, forbidden: 0 }]
        );
    }

    #[test]
    fn concurrent_recording_is_lossless() {
        let request = fixtures::scenario_a();
        let stats = Arc::new(SatisfactionStats::new());
        let order = genes(&request, &["A", "B"]);
        let evaluation = Arc::new(Evaluation::of(&request, &order));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                let request = Arc::clone(&request);
                let evaluation = Arc::clone(&evaluation);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record(&request, &evaluation);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert!(snapshot.units.iter().all(|row| row.satisfied == 400));
    }

    #[test]
    fn reset_clears_counters() {
        let request = fixtures::scenario_a();
        let stats = SatisfactionStats::new();
        stats.record(&request, &Evaluation::of(&request, &genes(&request, &["B"])));
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
