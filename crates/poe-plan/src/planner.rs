//! Planning facade
//!
//! Runs the search for one request, then either materializes the winner or
//! reports why no valid ordering was found.

use crate::diagnostics::DiagnosticReport;
use crate::error::PlanError;
use crate::materializer::Materializer;
use crate::plan::Plan;
use poe_core::{Manifest, Request};
use poe_search::{EvolutionEngine, SatisfactionStats, SearchConfig, SearchOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

/// Successful planning result
#[derive(Debug, Clone)]
pub struct Planned {
    /// Materialized plan
    pub plan: Plan,
    /// Search that produced it
    pub outcome: SearchOutcome,
}

/// Plans requests with one search configuration
#[derive(Debug, Clone)]
pub struct Planner {
    config: SearchConfig,
    stats: Option<Arc<SatisfactionStats>>,
}

impl Planner {
    /// Create a planner
    ///
    /// # Errors
    /// Returns error if `config` is invalid
    pub fn new(config: SearchConfig) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self {
            config,
            stats: None,
        })
    }

    /// Share satisfaction statistics across every search this planner runs
    #[must_use]
    pub fn with_statistics(mut self, stats: Arc<SatisfactionStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Search configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the request a manifest describes and plan it
    ///
    /// # Errors
    /// See [`plan`](Self::plan); manifest problems are reported as
    /// [`PlanError::Manifest`] or [`PlanError::IllegalRequest`]
    pub fn plan_manifest(&self, manifest: &Manifest, seed: Option<u64>) -> Result<Planned, PlanError> {
        let (_, request) = manifest.build()?;
        self.plan(Arc::new(request), seed)
    }

    /// Search for a valid ordering and materialize it
    ///
    /// `seed` fixes the session's random source; `None` seeds from the OS.
    ///
    /// # Errors
    /// - [`PlanError::PlanNotFound`] with a diagnostic report if no valid
    ///   candidate was found before termination
    /// - [`PlanError::InvariantViolation`] if a valid candidate fails to
    ///   materialize into a plan covering the targets
    pub fn plan(&self, request: Arc<Request>, seed: Option<u64>) -> Result<Planned, PlanError> {
        let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let mut engine = EvolutionEngine::new(Arc::clone(&request), self.config.clone())?;
        if let Some(stats) = &self.stats {
            engine = engine.with_statistics(Arc::clone(stats));
        }
        let outcome = engine.run(&mut rng);

        if !outcome.best.is_valid() {
            let report = DiagnosticReport::from_candidate(&request, &outcome.best);
            warn!(
                unsatisfied = report.entries.len(),
                fitness = report.fitness,
                "no valid plan found"
            );
            return Err(PlanError::PlanNotFound {
                report: Box::new(report),
            });
        }

        let genes = outcome.best.genes();
        let plan = Materializer::new(&request)
            .materialize(genes)
            .map_err(|err| PlanError::InvariantViolation(format!("valid candidate failed to materialize: {err}")))?;

        if plan.units() != genes {
            return Err(PlanError::InvariantViolation(
                "materialized plan reorders the candidate".into(),
            ));
        }
        let registry = request.registry();
        for &target in request.targets() {
            let covered = genes
                .iter()
                .filter_map(|id| registry.unit(*id))
                .any(|unit| unit.productions.contains(&target));
            if !covered {
                return Err(PlanError::InvariantViolation(format!(
                    "target `{}` has no anchor in the plan",
                    registry.productions().name(target).unwrap_or("?")
                )));
            }
        }

        info!(
            units = plan.unit_count(),
            adapters = plan.adapter_count(),
            generations = outcome.generations,
            digest = %plan.digest(),
            "plan materialized"
        );
        Ok(Planned { plan, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_test_utils::{fixtures, genes};

    fn planner() -> Planner {
        Planner::new(SearchConfig::default().with_stagnation_limit(60)).unwrap()
    }

    #[test]
    fn plans_scenario_a() {
        let request = fixtures::scenario_a();
        let planned = planner().plan(Arc::clone(&request), Some(1)).unwrap();
        assert_eq!(planned.plan.units(), genes(&request, &["A", "B"]));
    }

    #[test]
    fn unsolvable_request_reports_diagnostics() {
        let request = fixtures::unsolvable();
        let err = planner().plan(request, Some(1)).unwrap_err();

        assert!(err.is_recoverable());
        let report = err.report().unwrap();
        let sink = report.entries.iter().find(|e| e.unit == "sink").unwrap();
        assert_eq!(sink.missing, vec!["never"]);
        assert!(report.candidate.iter().any(|name| name == "sink"));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = Planner::new(SearchConfig::default().with_elite_count(10)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidConfig(_)));
    }

    #[test]
    fn same_seed_same_digest() {
        let request = fixtures::compiler_pipeline();
        let first = planner().plan(Arc::clone(&request), Some(42)).unwrap();
        let second = planner().plan(request, Some(42)).unwrap();
        assert_eq!(first.plan.digest(), second.plan.digest());
    }
}
