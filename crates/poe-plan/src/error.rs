//! Planning errors

use crate::diagnostics::DiagnosticReport;
use poe_core::{ManifestError, RequestError};
use poe_search::ConfigError;

/// Failure of one planning request
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Structurally invalid request; rejected before any search
    #[error("illegal request: {0}")]
    IllegalRequest(#[from] RequestError),

    /// Registry or request manifest could not be loaded
    #[error("manifest error: {0}")]
    Manifest(ManifestError),

    /// Search configuration rejected
    #[error("invalid search configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Search ended without a valid candidate
    #[error("no valid plan found\n{report}")]
    PlanNotFound {
        /// Unsatisfied positions of the best candidate
        report: Box<DiagnosticReport>,
    },

    /// The evaluator and the materializer disagree
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl PlanError {
    /// Check if the caller can act on the error (e.g. by fixing the registry)
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PlanNotFound { .. })
    }

    /// Check if the error indicates an engine defect
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// Diagnostic report of a failed search
    #[must_use]
    pub fn report(&self) -> Option<&DiagnosticReport> {
        match self {
            Self::PlanNotFound { report } => Some(report.as_ref()),
            _ => None,
        }
    }
}

impl From<ManifestError> for PlanError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Request(err) => Self::IllegalRequest(err),
            other => Self::Manifest(other),
        }
    }
}
