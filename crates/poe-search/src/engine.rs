//! Evolutionary search engine
//!
//! Generational loop: elites are carried over unchanged, the rest of each
//! generation is bred by tournament selection followed by the mutation
//! pipeline. The loop ends when the best fitness has not improved for
//! `stagnation-limit` generations or when the time budget runs out; either
//! way the best candidate seen is returned.

use crate::candidate::{Candidate, EvaluationCache};
use crate::config::{ConfigError, SearchConfig};
use crate::factory::CandidateFactory;
use crate::operators::MutationPipeline;
use crate::selection::TournamentSelector;
use crate::stats::SatisfactionStats;
use poe_core::{Request, UnitId};
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Best fitness unchanged for the configured number of generations
    Stagnation,
    /// Wall-clock budget exhausted
    Timeout,
}

/// Result of one search run
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best candidate found
    pub best: Candidate,
    /// Generations completed
    pub generations: u64,
    /// Distinct sequences evaluated
    pub evaluations: u64,
    /// Evaluations served from the cache
    pub cache_hits: u64,
    /// Wall-clock time spent
    pub elapsed: Duration,
    /// Stop reason
    pub termination: Termination,
}

/// Genetic search over unit orderings for one request
#[derive(Debug)]
pub struct EvolutionEngine {
    request: Arc<Request>,
    config: SearchConfig,
    pipeline: MutationPipeline,
    selector: TournamentSelector,
    stats: Option<Arc<SatisfactionStats>>,
}

impl EvolutionEngine {
    /// Create an engine with the standard mutation pipeline
    ///
    /// # Errors
    /// Returns error if `config` is invalid
    pub fn new(request: Arc<Request>, config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pipeline: MutationPipeline::from_config(&config),
            selector: TournamentSelector::new(config.selection_pressure),
            request,
            config,
            stats: None,
        })
    }

    /// Replace the mutation pipeline
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: MutationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Feed fresh evaluations into shared statistics
    #[must_use]
    pub fn with_statistics(mut self, stats: Arc<SatisfactionStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Request being planned
    #[inline]
    #[must_use]
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search from the factory's seed population
    pub fn run(&self, rng: &mut StdRng) -> SearchOutcome {
        self.run_from(Vec::new(), rng)
    }

    /// Search from explicit seed sequences
    ///
    /// Seeds are cycled to fill the population; an empty list falls back to
    /// the factory's seed.
    pub fn run_from(&self, seeds: Vec<Vec<UnitId>>, rng: &mut StdRng) -> SearchOutcome {
        let mut cache = EvaluationCache::new(self.config.cache_capacity);
        if let Some(stats) = &self.stats {
            cache = cache.with_statistics(Arc::clone(stats));
        }

        let size = self.config.population_size;
        let population = if seeds.is_empty() {
            CandidateFactory::new(&self.request).population(size, &mut cache)
        } else {
            let seeded: Vec<Candidate> = seeds
                .into_iter()
                .map(|genes| cache.candidate(&self.request, genes))
                .collect();
            seeded.iter().cycle().take(size).cloned().collect()
        };

        self.evolve(population, cache, rng)
    }

    fn evolve(
        &self,
        mut population: Vec<Candidate>,
        mut cache: EvaluationCache,
        rng: &mut StdRng,
    ) -> SearchOutcome {
        let start = Instant::now();
        let budget = self.config.max_duration();
        let size = self.config.population_size;
        let elites = self.config.elite_count;

        info!(
            population = size,
            elites,
            stagnation_limit = self.config.stagnation_limit,
            budget_ms = self.config.max_duration_ms,
            "search started"
        );

        rank(&mut population);
        let mut best = population[0].clone();
        let mut generations = 0u64;
        let mut stagnant = 0u64;

        let termination = loop {
            if stagnant >= self.config.stagnation_limit {
                break Termination::Stagnation;
            }
            if start.elapsed() >= budget {
                break Termination::Timeout;
            }

            let mut next: Vec<Candidate> = population.iter().take(elites).cloned().collect();
            let mut timed_out = false;
            while next.len() < size {
                if start.elapsed() >= budget {
                    timed_out = true;
                    break;
                }
                let Some(parent) = self.selector.select(&population, rng) else {
                    break;
                };
                let child = self.pipeline.apply(parent.clone(), &self.request, &mut cache, rng);
                next.push(child);
            }

            if !next.is_empty() {
                rank(&mut next);
                population = next;
            }
            generations += 1;

            if population[0].fitness() > best.fitness() {
                best = population[0].clone();
                stagnant = 0;
                debug!(
                    generation = generations,
                    fitness = best.fitness(),
                    len = best.len(),
                    valid = best.is_valid(),
                    "improved"
                );
            } else {
                stagnant += 1;
            }

            if timed_out {
                break Termination::Timeout;
            }
        };

        let elapsed = start.elapsed();
        if termination == Termination::Timeout {
            warn!(
                generations,
                elapsed_ms = elapsed.as_millis(),
                "search budget exhausted"
            );
        }
        info!(
            generations,
            evaluations = cache.misses(),
            fitness = best.fitness(),
            valid = best.is_valid(),
            ?termination,
            "search finished"
        );

        SearchOutcome {
            best,
            generations,
            evaluations: cache.misses(),
            cache_hits: cache.hits(),
            elapsed,
            termination,
        }
    }
}

/// Sort by descending fitness, keeping insertion order among ties
fn rank(population: &mut [Candidate]) {
    population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_test_utils::{fixtures, genes};
    use rand::SeedableRng;

    fn config() -> SearchConfig {
        SearchConfig::default().with_stagnation_limit(50)
    }

    #[test]
    fn rejects_invalid_config() {
        let request = fixtures::scenario_a();
        let err = EvolutionEngine::new(request, config().with_population_size(0)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPopulation));
    }

    #[test]
    fn solves_scenario_a() {
        let request = fixtures::scenario_a();
        let engine = EvolutionEngine::new(Arc::clone(&request), config()).unwrap();
        let outcome = engine.run(&mut StdRng::seed_from_u64(1));

        assert!(outcome.best.is_valid());
        assert_eq!(outcome.best.genes(), genes(&request, &["A", "B"]).as_slice());
        assert_eq!(outcome.termination, Termination::Stagnation);
    }

    #[test]
    fn zero_budget_returns_seed() {
        let request = fixtures::scenario_a();
        let engine = EvolutionEngine::new(
            Arc::clone(&request),
            config().with_max_duration(Duration::ZERO),
        )
        .unwrap();
        let outcome = engine.run(&mut StdRng::seed_from_u64(1));

        assert_eq!(outcome.termination, Termination::Timeout);
        assert_eq!(outcome.generations, 0);
        assert_eq!(outcome.best.genes(), genes(&request, &["B"]).as_slice());
    }

    #[test]
    fn records_statistics_when_attached() {
        let request = fixtures::scenario_a();
        let stats = Arc::new(SatisfactionStats::new());
        let engine = EvolutionEngine::new(request, config())
            .unwrap()
            .with_statistics(Arc::clone(&stats));
        engine.run(&mut StdRng::seed_from_u64(3));

        assert!(!stats.snapshot().units.is_empty());
    }
}
