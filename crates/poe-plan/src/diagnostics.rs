//! Diagnostics for failed searches

use poe_core::Request;
use poe_search::Candidate;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// One unsatisfied position of the best candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsatisfiedEntry {
    /// Position in the candidate
    pub index: usize,
    /// Unit name
    pub unit: String,
    /// Required tags that were absent
    pub missing: Vec<String>,
    /// Forbidden tags that were present
    pub forbidden_present: Vec<String>,
    /// Scope level that could not be reached, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_scope: Option<String>,
}

/// Why the best candidate is not a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    /// Fitness of the best candidate
    pub fitness: f64,
    /// Every unsatisfied position, ascending
    pub entries: Vec<UnsatisfiedEntry>,
    /// Full ordered unit list of the best candidate
    pub candidate: Vec<String>,
}

impl DiagnosticReport {
    /// Describe every unsatisfied position of `candidate`
    #[must_use]
    pub fn from_candidate(request: &Request, candidate: &Candidate) -> Self {
        let registry = request.registry();
        let scopes = registry.scopes();
        let positions = candidate.evaluation().positions();

        let entries = candidate
            .evaluation()
            .unsatisfied()
            .iter()
            .filter_map(|&index| positions.get(index).map(|p| (index, p)))
            .map(|(index, position)| UnsatisfiedEntry {
                index,
                unit: registry.unit_name(position.unit).to_string(),
                missing: registry.tag_names(&position.missing),
                forbidden_present: registry.tag_names(&position.conflicting),
                unresolved_scope: (!position.scope_resolved).then(|| {
                    registry
                        .unit(position.unit)
                        .map_or("?", |unit| scopes.scope_name(unit.scope))
                        .to_string()
                }),
            })
            .collect();

        Self {
            fitness: candidate.fitness(),
            entries,
            candidate: candidate.describe(registry),
        }
    }
}

impl Display for DiagnosticReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "best candidate (fitness {:.4}): {}",
            self.fitness,
            self.candidate.join(", ")
        )?;
        for entry in &self.entries {
            write!(f, "  #{} {}:", entry.index, entry.unit)?;
            if let Some(scope) = &entry.unresolved_scope {
                write!(f, " scope `{scope}` unreachable;")?;
            }
            if !entry.missing.is_empty() {
                write!(f, " missing [{}];", entry.missing.join(", "))?;
            }
            if !entry.forbidden_present.is_empty() {
                write!(f, " forbidden present [{}];", entry.forbidden_present.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
