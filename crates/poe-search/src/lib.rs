//! POE Search
//!
//! Evolutionary search for valid unit orderings.
//!
//! # Components
//!
//! - [`Evaluation`] / [`Walker`]: scope and tag walk over a gene sequence,
//!   producing satisfaction totals and a fitness score
//! - [`Candidate`] / [`EvaluationCache`]: immutable gene sequences with
//!   memoized evaluations
//! - [`MutationOperator`] implementations and the [`MutationPipeline`]
//! - [`CandidateFactory`] and [`TournamentSelector`]
//! - [`EvolutionEngine`]: the generational loop
//! - [`SatisfactionStats`]: optional shared counters
//!
//! # Example
//!
//! ```rust
//! use poe_core::{Registry, Request, UnitSpec};
//! use poe_search::{EvolutionEngine, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::sync::Arc;
//!
//! let mut builder = Registry::builder("program");
//! builder
//!     .unit(UnitSpec::new("parse", "program").adds(["ast"]))
//!     .unit(UnitSpec::new("emit", "program").needs(["ast"]).produces(["il"]));
//! let registry = Arc::new(builder.build().unwrap());
//! let request = Arc::new(Request::builder(registry).target("il").build().unwrap());
//!
//! let config = SearchConfig::default().with_stagnation_limit(50);
//! let engine = EvolutionEngine::new(request, config).unwrap();
//! let outcome = engine.run(&mut StdRng::seed_from_u64(7));
//! assert!(outcome.best.is_valid());
//! ```

#![warn(unreachable_pub)]

mod candidate;
mod config;
mod engine;
mod evaluator;
mod factory;
mod operators;
mod selection;
mod stats;

pub use candidate::{Candidate, EvaluationCache};
pub use config::{ConfigError, SearchConfig};
pub use engine::{EvolutionEngine, SearchOutcome, Termination};
pub use evaluator::{fitness, Evaluation, Group, PositionReport, Step, Walker};
pub use factory::CandidateFactory;
pub use operators::{
    AddPostRunner, AddPreRunner, AddRunner, MoveRunner, MutationOperator, MutationPipeline,
    RemoveRunner, RemoveUnsatisfiedRunner,
};
pub use selection::TournamentSelector;
pub use stats::{SatisfactionStats, StatsSnapshot, TagRow, UnitRow};
