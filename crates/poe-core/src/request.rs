//! Planning requests
//!
//! A [`Request`] binds a registry to one planning problem: which features
//! are enabled, which tags hold initially and which productions must be
//! delivered. Building it validates the problem up front and precomputes the
//! live (feature-filtered) constraints of every unit so the search never has
//! to look at feature gates.

use crate::error::RequestError;
use crate::names::{DenseId, FeatureId, ProductionId, UnitId};
use crate::registry::Registry;
use crate::tags::{TagSet, TagSetBuilder};
use crate::unit::UnitDescriptor;
use std::sync::Arc;

/// Feature-filtered constraints of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConstraints {
    /// Live required tags
    pub needs: TagSet,
    /// Live forbidden tags
    pub forbids: TagSet,
    /// Constraint weight (always at least 1)
    pub weight: u32,
}

impl LiveConstraints {
    /// All live constraints hold against `tags`
    #[inline]
    #[must_use]
    pub fn is_satisfied_by(&self, tags: &TagSet) -> bool {
        self.needs.is_subset(tags) && self.forbids.is_disjoint(tags)
    }

    /// Missing required tags
    #[must_use]
    pub fn missing(&self, tags: &TagSet) -> TagSet {
        self.needs.difference(tags)
    }

    /// Forbidden tags that are present
    #[must_use]
    pub fn conflicting(&self, tags: &TagSet) -> TagSet {
        self.forbids.intersection(tags)
    }

    /// Number of individual tag constraints violated by `tags`
    #[must_use]
    pub fn deficit(&self, tags: &TagSet) -> usize {
        self.missing(tags).len() + self.conflicting(tags).len()
    }
}

/// Immutable planning request
#[derive(Debug, Clone)]
pub struct Request {
    registry: Arc<Registry>,
    features: Vec<FeatureId>,
    live_tags: TagSet,
    initial_tags: TagSet,
    targets: Vec<ProductionId>,
    live: Vec<LiveConstraints>,
    anchors: Vec<UnitId>,
    fillers: Vec<UnitId>,
}

impl Request {
    /// Start building a request over a registry
    #[inline]
    #[must_use]
    pub fn builder(registry: Arc<Registry>) -> RequestBuilder {
        RequestBuilder::new(registry)
    }

    /// Underlying registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Look up a unit
    #[inline]
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitDescriptor> {
        self.registry.unit(id)
    }

    /// Live constraints of a unit
    #[inline]
    #[must_use]
    pub fn live(&self, id: UnitId) -> Option<&LiveConstraints> {
        self.live.get(id.index())
    }

    /// Enabled features
    #[inline]
    #[must_use]
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    /// Check if a feature is enabled
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, feature: FeatureId) -> bool {
        self.features.contains(&feature)
    }

    /// Tags whose constraints are live under the enabled features
    #[inline]
    #[must_use]
    pub fn live_tags(&self) -> &TagSet {
        &self.live_tags
    }

    /// Tag state before the first unit
    #[inline]
    #[must_use]
    pub fn initial_tags(&self) -> &TagSet {
        &self.initial_tags
    }

    /// Productions the plan must deliver
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &[ProductionId] {
        &self.targets
    }

    /// Units delivering at least one target, in registry order
    #[inline]
    #[must_use]
    pub fn anchors(&self) -> &[UnitId] {
        &self.anchors
    }

    /// Producer-less units available for insertion by mutation
    #[inline]
    #[must_use]
    pub fn fillers(&self) -> &[UnitId] {
        &self.fillers
    }

    /// Check if a unit declares productions (and so may never be removed)
    #[inline]
    #[must_use]
    pub fn is_anchor(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(UnitDescriptor::is_anchor)
    }
}

/// Builder for [`Request`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    registry: Arc<Registry>,
    features: Vec<String>,
    initial_tags: Vec<String>,
    targets: Vec<String>,
}

impl RequestBuilder {
    /// Create a builder over a registry
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            features: Vec::new(),
            initial_tags: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Enable a feature
    #[must_use]
    pub fn feature(mut self, name: impl Into<String>) -> Self {
        self.features.push(name.into());
        self
    }

    /// Enable several features
    #[must_use]
    pub fn features<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.features.extend(names.into_iter().map(Into::into));
        self
    }

    /// Tags holding before the first unit
    #[must_use]
    pub fn initial_tags<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.initial_tags.extend(names.into_iter().map(Into::into));
        self
    }

    /// Require a production
    #[must_use]
    pub fn target(mut self, name: impl Into<String>) -> Self {
        self.targets.push(name.into());
        self
    }

    /// Require several productions
    #[must_use]
    pub fn targets<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.targets.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate and freeze the request
    ///
    /// # Errors
    /// Returns error on unknown names or a target with no producer
    pub fn build(self) -> Result<Request, RequestError> {
        let registry = self.registry;

        let mut features = Vec::with_capacity(self.features.len());
        for name in &self.features {
            let id = registry
                .features()
                .get(name)
                .ok_or_else(|| RequestError::UnknownFeature(name.clone()))?;
            if !features.contains(&id) {
                features.push(id);
            }
        }

        let mut initial = TagSetBuilder::new();
        for name in &self.initial_tags {
            let id = registry
                .tags()
                .get(name)
                .ok_or_else(|| RequestError::UnknownTag(name.clone()))?;
            initial.insert(id);
        }

        let mut targets = Vec::with_capacity(self.targets.len());
        for name in &self.targets {
            let id = registry
                .productions()
                .get(name)
                .ok_or_else(|| RequestError::UnknownProduction(name.clone()))?;
            if registry.producers_of(id).next().is_none() {
                return Err(RequestError::NoProducer(name.clone()));
            }
            if !targets.contains(&id) {
                targets.push(id);
            }
        }

        let live_tags: TagSet = registry
            .tags()
            .iter()
            .filter(|(tag, _)| registry.tag_gate(*tag).map_or(true, |f| features.contains(&f)))
            .map(|(tag, _)| tag)
            .collect();

        let live = registry
            .units()
            .iter()
            .map(|unit| {
                let needs = unit.needs.intersection(&live_tags);
                let forbids = unit.forbids.intersection(&live_tags);
                let derived = 1 + needs.len() + forbids.len();
                let weight = unit
                    .constraints
                    .unwrap_or_else(|| u32::try_from(derived).unwrap_or(u32::MAX))
                    .max(1);
                LiveConstraints {
                    needs,
                    forbids,
                    weight,
                }
            })
            .collect();

        let anchors = registry
            .units()
            .iter()
            .filter(|u| u.produces_any(&targets))
            .map(|u| u.id)
            .collect();
        let fillers = registry
            .units()
            .iter()
            .filter(|u| !u.is_anchor())
            .map(|u| u.id)
            .collect();

        Ok(Request {
            features,
            live_tags,
            initial_tags: initial.build(),
            targets,
            live,
            anchors,
            fillers,
            registry,
        })
    }
}
