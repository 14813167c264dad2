//! POE Core
//!
//! Foundation types for the pass ordering engine.
//!
//! # Core Concepts
//!
//! - [`TagSet`]: bitset of capability tags describing program state
//! - [`ScopeGraph`]: scope levels joined by declared adapters, with the one
//!   resolution routine every consumer shares
//! - [`UnitSpec`] / [`UnitDescriptor`]: schedulable units and their constraints
//! - [`Registry`]: the read-only catalogue supplied by the hosting compiler
//! - [`Request`]: one validated planning problem over a registry
//! - [`Manifest`]: declarative YAML/JSON/TOML form of both
//!
//! # Example
//!
//! ```rust
//! use poe_core::{Registry, Request, UnitSpec};
//! use std::sync::Arc;
//!
//! let mut builder = Registry::builder("program");
//! builder
//!     .scope("method")
//!     .adapter("methods", "program", "method")
//!     .unit(UnitSpec::new("build-cfg", "method").adds(["cfg"]))
//!     .unit(UnitSpec::new("emit", "method").needs(["cfg"]).produces(["il"]));
//! let registry = Arc::new(builder.build().unwrap());
//!
//! let request = Request::builder(registry).target("il").build().unwrap();
//! assert_eq!(request.anchors().len(), 1);
//! ```

#![warn(unreachable_pub)]

mod error;
mod manifest;
mod names;
mod registry;
mod request;
mod scope;
mod tags;
mod unit;

pub use error::{ManifestError, RegistryError, RequestError};
pub use manifest::{AdapterEntry, Manifest, RequestEntry, TagEntry, UnitEntry};
pub use names::{
    AdapterId, DenseId, FeatureId, NameTable, ProductionId, ScopeId, TagId, UnitId,
};
pub use registry::{Registry, RegistryBuilder};
pub use request::{LiveConstraints, Request, RequestBuilder};
pub use scope::{Adapter, AdapterChain, Resolution, ScopeGraph};
pub use tags::{TagEffect, TagSet, TagSetBuilder};
pub use unit::{UnitDescriptor, UnitSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
