//! POE Plan
//!
//! Turns the winning candidate of a search into an executable, nested
//! [`Plan`], or into a [`DiagnosticReport`] when no valid ordering exists.
//!
//! # Example
//!
//! ```rust
//! use poe_core::{Registry, Request, UnitSpec};
//! use poe_plan::Planner;
//! use poe_search::SearchConfig;
//! use std::sync::Arc;
//!
//! let mut builder = Registry::builder("program");
//! builder
//!     .scope("method")
//!     .adapter("methods", "program", "method")
//!     .unit(UnitSpec::new("build-cfg", "method").adds(["cfg"]))
//!     .unit(UnitSpec::new("emit", "method").needs(["cfg"]).produces(["il"]));
//! let registry = Arc::new(builder.build().unwrap());
//! let request = Arc::new(Request::builder(Arc::clone(&registry)).target("il").build().unwrap());
//!
//! let planner = Planner::new(SearchConfig::default().with_stagnation_limit(50)).unwrap();
//! let planned = planner.plan(request, Some(7)).unwrap();
//! assert_eq!(planned.plan.adapter_count(), 1);
//! print!("{}", planned.plan.render(&registry));
//! ```

#![warn(unreachable_pub)]

mod diagnostics;
mod error;
mod materializer;
mod plan;
mod planner;

pub use diagnostics::{DiagnosticReport, UnsatisfiedEntry};
pub use error::PlanError;
pub use materializer::{MaterializeError, Materializer};
pub use plan::{Plan, PlanDigest, PlanItem, PlanNode, PlanScope};
pub use planner::{Planned, Planner};
