//! Baseline table: per-test outcomes, tcID assignment, and per-class
//! failing/passing line sets.
//!
//! Computed once by the coordinator from the coverage database and published
//! read-only for the rest of the run; the executor receives it through the
//! startup message (research mode) or rebuilds it from one pass over the
//! original bytes (classical mode).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::coverage::CoverageDb;
use crate::model::{DetailedTestResult, ExceptionDetail, TestCaseMetadata};

/// Immutable baseline for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineContext {
    tests: BTreeMap<String, TestCaseMetadata>,
    order: Vec<String>,
    failing_lines: BTreeMap<String, BTreeSet<u32>>,
    passing_lines: BTreeMap<String, BTreeSet<u32>>,
}

impl BaselineContext {
    /// Build the baseline from the coverage database.
    ///
    /// Tests are enumerated from block coverage; tcIDs are dense integers
    /// assigned by lexicographic sort of test names; failing tests carry
    /// their exception descriptions. Line partitions are computed for each
    /// class in `mutated_classes`.
    pub fn compute<S: AsRef<str>>(coverage: &CoverageDb, mutated_classes: &[S]) -> Self {
        let mut tests = BTreeMap::new();
        let mut order = Vec::new();
        for (tc_id, name) in coverage.all_tests().into_iter().enumerate() {
            let failing = coverage.failing_tests().get(&name);
            tests.insert(
                name.clone(),
                TestCaseMetadata {
                    tc_id: tc_id as u32,
                    test_name: name.clone(),
                    passed: failing.is_none(),
                    exception: failing.cloned().unwrap_or_else(ExceptionDetail::none),
                    duration_ms: coverage.duration_ms(&name),
                },
            );
            order.push(name);
        }

        let mut failing_lines = BTreeMap::new();
        let mut passing_lines = BTreeMap::new();
        for class in mutated_classes {
            let class = class.as_ref();
            failing_lines.insert(class.to_string(), coverage.failing_lines(class));
            passing_lines.insert(class.to_string(), coverage.passing_lines(class));
        }

        Self {
            tests,
            order,
            failing_lines,
            passing_lines,
        }
    }

    /// Rebuild a baseline from a metadata table (executor side, research
    /// mode). The order is recovered from the tcIDs.
    pub fn from_metadata(metadata: BTreeMap<String, TestCaseMetadata>) -> Self {
        let mut order: Vec<(u32, String)> = metadata
            .values()
            .map(|m| (m.tc_id, m.test_name.clone()))
            .collect();
        order.sort();
        Self {
            tests: metadata,
            order: order.into_iter().map(|(_, name)| name).collect(),
            failing_lines: BTreeMap::new(),
            passing_lines: BTreeMap::new(),
        }
    }

    /// Build a baseline from one executed pass over the original bytes
    /// (executor side, classical mode). tcIDs follow the lexicographic rule.
    pub fn from_results(results: &[DetailedTestResult]) -> Self {
        let mut sorted: Vec<&DetailedTestResult> = results.iter().collect();
        sorted.sort_by(|a, b| a.test_name.cmp(&b.test_name));

        let mut tests = BTreeMap::new();
        let mut order = Vec::new();
        for (tc_id, result) in sorted.into_iter().enumerate() {
            tests.insert(
                result.test_name.clone(),
                TestCaseMetadata {
                    tc_id: tc_id as u32,
                    test_name: result.test_name.clone(),
                    passed: result.passed,
                    exception: result.exception.clone(),
                    duration_ms: result.duration_ms,
                },
            );
            order.push(result.test_name.clone());
        }
        Self {
            tests,
            order,
            failing_lines: BTreeMap::new(),
            passing_lines: BTreeMap::new(),
        }
    }

    /// Number of baseline tests; the width of every bit sequence.
    pub fn num_tests(&self) -> usize {
        self.order.len()
    }

    /// Test names in tcID order.
    pub fn test_order(&self) -> &[String] {
        &self.order
    }

    /// Metadata for one test.
    pub fn get(&self, test_name: &str) -> Option<&TestCaseMetadata> {
        self.tests.get(test_name)
    }

    /// The full metadata table, keyed by test name.
    pub fn metadata(&self) -> &BTreeMap<String, TestCaseMetadata> {
        &self.tests
    }

    /// Lines of `class` covered by failing tests.
    pub fn failing_lines(&self, class: &str) -> Option<&BTreeSet<u32>> {
        self.failing_lines.get(class)
    }

    /// Lines of `class` covered by passing tests.
    pub fn passing_lines(&self, class: &str) -> Option<&BTreeSet<u32>> {
        self.passing_lines.get(class)
    }
}
