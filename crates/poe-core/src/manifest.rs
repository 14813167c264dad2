//! Declarative registry manifests
//!
//! A manifest describes a registry and one planning request in YAML, JSON
//! or TOML. The hosting compiler normally builds registries in code; the
//! manifest form exists for tooling and reproducible test inputs.
//!
//! ```yaml
//! root_scope: program
//! scopes: [type, method]
//! adapters:
//!   - { name: types, from: program, to: type }
//! units:
//!   - { name: parse, scope: program, adds: [ast] }
//! request:
//!   targets: [il]
//! ```

use crate::error::ManifestError;
use crate::registry::Registry;
use crate::request::Request;
use crate::unit::UnitSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Whole manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Root scope level
    pub root_scope: String,
    /// Additional scope levels
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Adapter declarations
    #[serde(default)]
    pub adapters: Vec<AdapterEntry>,
    /// Explicit tag declarations (optional unless feature-gated)
    #[serde(default)]
    pub tags: Vec<TagEntry>,
    /// Explicit production declarations
    #[serde(default)]
    pub productions: Vec<String>,
    /// Unit declarations
    #[serde(default)]
    pub units: Vec<UnitEntry>,
    /// Planning request
    #[serde(default)]
    pub request: RequestEntry,
}

/// Adapter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterEntry {
    /// Adapter name
    pub name: String,
    /// Source scope level
    pub from: String,
    /// Resulting scope level
    pub to: String,
}

/// Tag declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagEntry {
    /// Tag name
    pub name: String,
    /// Feature gating the tag's constraints
    #[serde(default)]
    pub feature: Option<String>,
}

/// Unit declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    /// Unit name
    pub name: String,
    /// Scope level the unit runs on
    pub scope: String,
    /// Required tags
    #[serde(default)]
    pub needs: Vec<String>,
    /// Forbidden tags
    #[serde(default)]
    pub forbids: Vec<String>,
    /// Tags established
    #[serde(default)]
    pub adds: Vec<String>,
    /// Tags invalidated
    #[serde(default)]
    pub retracts: Vec<String>,
    /// Productions delivered
    #[serde(default)]
    pub produces: Vec<String>,
    /// Constraint weight override
    #[serde(default)]
    pub constraints: Option<u32>,
}

/// Request declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestEntry {
    /// Enabled features
    #[serde(default)]
    pub features: Vec<String>,
    /// Initial tags
    #[serde(default)]
    pub initial_tags: Vec<String>,
    /// Target productions
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Manifest {
    /// Parse a YAML manifest
    ///
    /// # Errors
    /// Returns error on malformed YAML
    pub fn from_yaml_str(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON manifest
    ///
    /// # Errors
    /// Returns error on malformed JSON
    pub fn from_json_str(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a TOML manifest
    ///
    /// # Errors
    /// Returns error on malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a manifest, choosing the format from the file extension
    ///
    /// # Errors
    /// Returns error if the file is unreadable, has an unknown extension or
    /// does not parse
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text),
            "json" => Self::from_json_str(&text),
            "toml" => Self::from_toml_str(&text),
            _ => Err(ManifestError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Build the registry section
    ///
    /// # Errors
    /// Returns error if the registry is inconsistent
    pub fn registry(&self) -> Result<Registry, ManifestError> {
        let mut builder = Registry::builder(self.root_scope.clone());
        for scope in &self.scopes {
            builder.scope(scope.clone());
        }
        for adapter in &self.adapters {
            builder.adapter(adapter.name.clone(), adapter.from.clone(), adapter.to.clone());
        }
        for tag in &self.tags {
            match &tag.feature {
                Some(feature) => builder.gated_tag(tag.name.clone(), feature.clone()),
                None => builder.tag(tag.name.clone()),
            };
        }
        for production in &self.productions {
            builder.production(production.clone());
        }
        for unit in &self.units {
            let mut spec = UnitSpec::new(unit.name.clone(), unit.scope.clone())
                .needs(unit.needs.iter().cloned())
                .forbids(unit.forbids.iter().cloned())
                .adds(unit.adds.iter().cloned())
                .retracts(unit.retracts.iter().cloned())
                .produces(unit.produces.iter().cloned());
            if let Some(count) = unit.constraints {
                spec = spec.constraints(count);
            }
            builder.unit(spec);
        }
        Ok(builder.build()?)
    }

    /// Build the registry and the request it describes
    ///
    /// # Errors
    /// Returns error if either section is inconsistent
    pub fn build(&self) -> Result<(Arc<Registry>, Request), ManifestError> {
        let registry = Arc::new(self.registry()?);
        let request = Request::builder(Arc::clone(&registry))
            .features(self.request.features.iter().cloned())
            .initial_tags(self.request.initial_tags.iter().cloned())
            .targets(self.request.targets.iter().cloned())
            .build()?;
        Ok((registry, request))
    }
}
