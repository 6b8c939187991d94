//! Engine configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MutationStatus;
use crate::operators::Operator;

/// Logging verbosity of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Normal progress output.
    #[default]
    Default,
    /// Debug-level output.
    Verbose,
    /// Errors only.
    Silent,
}

impl Verbosity {
    /// Canonical string form, used on the minion command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Verbosity::Default => "default",
            Verbosity::Verbose => "verbose",
            Verbosity::Silent => "silent",
        }
    }

    /// Parse the canonical string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Verbosity::Default),
            "verbose" => Some(Verbosity::Verbose),
            "silent" => Some(Verbosity::Silent),
            _ => None,
        }
    }
}

/// Configuration rejected before the run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `threads` must be at least 1.
    #[error("threads must be >= 1")]
    Threads,
    /// `mutation_unit_size` must be at least 1.
    #[error("mutation_unit_size must be >= 1")]
    UnitSize,
    /// `timeout_factor` must be a positive finite number.
    #[error("timeout_factor must be positive and finite")]
    TimeoutFactor,
    /// No sub-operators selected.
    #[error("operator selection is empty")]
    NoOperators,
}

/// Configuration for one mutation-analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Report directory; all artifacts land beneath it.
    pub report_dir: PathBuf,
    /// Worker-pool size.
    pub threads: usize,
    /// Maximum mutants per analysis unit.
    pub mutation_unit_size: usize,
    /// Flat addition to every per-test timeout, in milliseconds.
    pub timeout_constant_ms: u64,
    /// Multiplier applied to a test's baseline duration.
    pub timeout_factor: f64,
    /// Selected sub-operators.
    pub operators: Vec<Operator>,
    /// Classes whose tests drive the run; never mutated.
    pub test_classes: Vec<String>,
    /// Test-plugin identifier understood by the executor.
    pub engine_id: String,
    /// Opaque test-plugin configuration shipped in the startup message.
    pub test_plugin_config: String,
    /// Research mode: run all tests with an explicit baseline.
    pub research_mode: bool,
    /// Emit `full_mutation_matrix.csv`.
    pub full_mutation_matrix: bool,
    /// Keep only mutants on lines covered by failing tests.
    pub failing_tests_only: bool,
    /// Known verdicts from earlier runs, keyed by stable mutation key.
    #[serde(default)]
    pub history: Option<BTreeMap<String, MutationStatus>>,
    /// Discover and group only; spawn no executors.
    pub measure_expected_time: bool,
    /// Abort the run when discovery yields zero mutants.
    pub fail_when_no_mutations: bool,
    /// Logging verbosity.
    pub verbosity: Verbosity,
    /// Executor memory limit in MiB; the watchdog trips at 90%.
    pub memory_limit_mb: u64,
    /// Minion executable; defaults to `mutmatrix-minion` next to the
    /// current executable.
    #[serde(default)]
    pub minion_bin: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let report_dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("mutmatrix-report");
        Self {
            report_dir,
            threads: 1,
            mutation_unit_size: 50,
            timeout_constant_ms: 4000,
            timeout_factor: 1.25,
            operators: crate::operators::parse_selection(&["DEFAULTS"])
                .expect("DEFAULTS is a known group"),
            test_classes: Vec::new(),
            engine_id: "fixture".to_string(),
            test_plugin_config: "{}".to_string(),
            research_mode: false,
            full_mutation_matrix: true,
            failing_tests_only: false,
            history: None,
            measure_expected_time: false,
            fail_when_no_mutations: false,
            verbosity: Verbosity::Default,
            memory_limit_mb: 4096,
            minion_bin: None,
        }
    }
}

impl EngineConfig {
    /// Set the report directory.
    pub fn with_report_dir(mut self, report_dir: impl Into<PathBuf>) -> Self {
        self.report_dir = report_dir.into();
        self
    }

    /// Set the worker-pool size.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the analysis-unit size cap.
    pub fn with_mutation_unit_size(mut self, size: usize) -> Self {
        self.mutation_unit_size = size;
        self
    }

    /// Set the timeout strategy parameters.
    pub fn with_timeouts(mut self, factor: f64, constant_ms: u64) -> Self {
        self.timeout_factor = factor;
        self.timeout_constant_ms = constant_ms;
        self
    }

    /// Set the operator selection.
    pub fn with_operators(mut self, operators: Vec<Operator>) -> Self {
        self.operators = operators;
        self
    }

    /// Set the test classes.
    pub fn with_test_classes<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
        self.test_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the test-plugin configuration.
    pub fn with_test_plugin_config(mut self, config: impl Into<String>) -> Self {
        self.test_plugin_config = config.into();
        self
    }

    /// Enable or disable research mode.
    pub fn with_research_mode(mut self, on: bool) -> Self {
        self.research_mode = on;
        self
    }

    /// Enable or disable matrix emission.
    pub fn with_full_mutation_matrix(mut self, on: bool) -> Self {
        self.full_mutation_matrix = on;
        self
    }

    /// Keep only mutants on failing-covered lines.
    pub fn with_failing_tests_only(mut self, on: bool) -> Self {
        self.failing_tests_only = on;
        self
    }

    /// Supply known verdicts from an earlier run.
    pub fn with_history(mut self, history: BTreeMap<String, MutationStatus>) -> Self {
        self.history = Some(history);
        self
    }

    /// Set the executor memory limit.
    pub fn with_memory_limit_mb(mut self, limit: u64) -> Self {
        self.memory_limit_mb = limit;
        self
    }

    /// Set the minion executable path.
    pub fn with_minion_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.minion_bin = Some(bin.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::Threads);
        }
        if self.mutation_unit_size < 1 {
            return Err(ConfigError::UnitSize);
        }
        if !(self.timeout_factor.is_finite() && self.timeout_factor > 0.0) {
            return Err(ConfigError::TimeoutFactor);
        }
        if self.operators.is_empty() {
            return Err(ConfigError::NoOperators);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_builders_override() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.report_dir.ends_with("mutmatrix-report"));

        let config = EngineConfig::default()
            .with_report_dir("/tmp/report")
            .with_threads(4)
            .with_mutation_unit_size(10)
            .with_timeouts(2.0, 500)
            .with_test_classes(["demo.CalcTest"])
            .with_research_mode(true)
            .with_memory_limit_mb(1024);
        assert_eq!(config.report_dir, PathBuf::from("/tmp/report"));
        assert_eq!(config.threads, 4);
        assert_eq!(config.mutation_unit_size, 10);
        assert_eq!(config.timeout_constant_ms, 500);
        assert!(config.research_mode);
        assert_eq!(config.test_classes, vec!["demo.CalcTest".to_string()]);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert_eq!(
            EngineConfig::default().with_threads(0).validate(),
            Err(ConfigError::Threads)
        );
        assert_eq!(
            EngineConfig::default().with_mutation_unit_size(0).validate(),
            Err(ConfigError::UnitSize)
        );
        assert_eq!(
            EngineConfig::default().with_timeouts(0.0, 100).validate(),
            Err(ConfigError::TimeoutFactor)
        );
        assert_eq!(
            EngineConfig::default().with_operators(Vec::new()).validate(),
            Err(ConfigError::NoOperators)
        );
    }
}
