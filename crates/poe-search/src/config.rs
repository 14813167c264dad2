//! Search configuration
//!
//! Every knob of the evolutionary search is named and independently
//! tunable. Files use the kebab-case option names:
//!
//! ```toml
//! add-pre-probability = 0.8
//! population-size = 16
//! stagnation-limit = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of one planning search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Chance `AddRunner` fires per candidate per generation
    pub add_probability: f64,
    /// Chance `AddPreRunner` fires
    pub add_pre_probability: f64,
    /// Chance `AddPostRunner` fires
    pub add_post_probability: f64,
    /// Chance `RemoveRunner` fires
    pub remove_probability: f64,
    /// Chance `RemoveUnsatisfiedRunner` fires
    pub remove_unsatisfied_probability: f64,
    /// Chance `MoveRunner` fires
    pub move_probability: f64,
    /// Probability the fitter of two tournament entrants wins, in `[0.5, 1.0]`
    pub selection_pressure: f64,
    /// Individuals per generation
    pub population_size: usize,
    /// Individuals carried unchanged into the next generation
    pub elite_count: usize,
    /// Generations without improvement before stopping
    pub stagnation_limit: u64,
    /// Wall-clock search budget in milliseconds
    pub max_duration_ms: u64,
    /// Distinct gene sequences kept in the evaluation cache
    pub cache_capacity: usize,
}

impl SearchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With population size
    #[inline]
    #[must_use]
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// With elite count
    #[inline]
    #[must_use]
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// With stagnation limit
    #[inline]
    #[must_use]
    pub fn with_stagnation_limit(mut self, generations: u64) -> Self {
        self.stagnation_limit = generations;
        self
    }

    /// With wall-clock budget
    #[inline]
    #[must_use]
    pub fn with_max_duration(mut self, budget: Duration) -> Self {
        self.max_duration_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With selection pressure
    #[inline]
    #[must_use]
    pub fn with_selection_pressure(mut self, pressure: f64) -> Self {
        self.selection_pressure = pressure;
        self
    }

    /// Wall-clock budget as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    /// Parse from TOML, filling unspecified options with defaults
    ///
    /// # Errors
    /// Returns error on malformed TOML or invalid values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file is unreadable, malformed or invalid
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every option lies in its legal range
    ///
    /// # Errors
    /// Returns the first offending option
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("add-probability", self.add_probability),
            ("add-pre-probability", self.add_pre_probability),
            ("add-post-probability", self.add_post_probability),
            ("remove-probability", self.remove_probability),
            ("remove-unsatisfied-probability", self.remove_unsatisfied_probability),
            ("move-probability", self.move_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        if !(0.5..=1.0).contains(&self.selection_pressure) {
            return Err(ConfigError::SelectionPressure(self.selection_pressure));
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_count >= self.population_size {
            return Err(ConfigError::EliteCount {
                elite: self.elite_count,
                population: self.population_size,
            });
        }
        if self.stagnation_limit == 0 {
            return Err(ConfigError::ZeroStagnationLimit);
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            add_probability: 0.15,
            add_pre_probability: 0.90,
            add_post_probability: 0.30,
            remove_probability: 0.50,
            remove_unsatisfied_probability: 0.60,
            move_probability: 0.60,
            selection_pressure: 0.50,
            population_size: 10,
            elite_count: 2,
            stagnation_limit: 1000,
            max_duration_ms: 60_000,
            cache_capacity: 65_536,
        }
    }
}

/// Invalid search configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Operator probability outside `[0, 1]`
    #[error("{name} must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Option name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Selection pressure outside `[0.5, 1.0]`
    #[error("selection-pressure must lie in [0.5, 1.0], got {0}")]
    SelectionPressure(f64),

    /// Zero-sized population
    #[error("population-size must be at least 1")]
    EmptyPopulation,

    /// Elite carryover leaves no room for offspring
    #[error("elite-count ({elite}) must be smaller than population-size ({population})")]
    EliteCount {
        /// Configured elite count
        elite: usize,
        /// Configured population size
        population: usize,
    },

    /// Stagnation limit of zero would stop before the first generation
    #[error("stagnation-limit must be at least 1")]
    ZeroStagnationLimit,

    /// Configuration file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = SearchConfig::default();
        assert_eq!(config.add_probability, 0.15);
        assert_eq!(config.add_pre_probability, 0.90);
        assert_eq!(config.add_post_probability, 0.30);
        assert_eq!(config.remove_probability, 0.50);
        assert_eq!(config.remove_unsatisfied_probability, 0.60);
        assert_eq!(config.move_probability, 0.60);
        assert_eq!(config.selection_pressure, 0.50);
        assert_eq!(config.population_size, 10);
        assert_eq!(config.elite_count, 2);
        assert_eq!(config.stagnation_limit, 1000);
        assert_eq!(config.max_duration(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_options() {
        let config = SearchConfig::from_toml_str(
            "population-size = 24\nmove-probability = 0.1\nmax-duration-ms = 500\n",
        )
        .unwrap();
        assert_eq!(config.population_size, 24);
        assert_eq!(config.move_probability, 0.1);
        assert_eq!(config.max_duration(), Duration::from_millis(500));
        assert_eq!(config.elite_count, 2);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            SearchConfig::from_toml_str("mutation-rate = 0.5\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = SearchConfig {
            remove_probability: 1.5,
            ..SearchConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::ProbabilityOutOfRange { name: "remove-probability", .. })
        ));

        let bad = SearchConfig::default().with_selection_pressure(0.2);
        assert!(matches!(bad.validate(), Err(ConfigError::SelectionPressure(_))));

        let bad = SearchConfig::default().with_population_size(2);
        assert!(matches!(bad.validate(), Err(ConfigError::EliteCount { .. })));

        let bad = SearchConfig::default().with_population_size(0);
        assert!(matches!(bad.validate(), Err(ConfigError::EmptyPopulation)));

        let bad = SearchConfig::default().with_stagnation_limit(0);
        assert!(matches!(bad.validate(), Err(ConfigError::ZeroStagnationLimit)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stagnation-limit = 42").unwrap();
        let config = SearchConfig::from_path(file.path()).unwrap();
        assert_eq!(config.stagnation_limit, 42);
    }
}
