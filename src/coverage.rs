//! Coverage database consumed by discovery and the baseline engine.
//!
//! Block coverage is a first-class index: each recorded block knows its
//! source lines and the tests that exercised it. Failing-test descriptions
//! carry the exception details needed for exception-change detection.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{ExceptionDetail, MethodLocation};

/// Address of one basic block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    /// Class name.
    pub class: String,
    /// Method name.
    pub method: String,
    /// Method descriptor.
    pub descriptor: String,
    /// Basic-block index within the method.
    pub block: u32,
}

impl BlockLocation {
    /// Block addressed by a mutation's method location.
    pub fn of_mutation(location: &MethodLocation) -> Self {
        Self {
            class: location.class.clone(),
            method: location.method.clone(),
            descriptor: location.descriptor.clone(),
            block: location.block,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BlockRecord {
    lines: BTreeSet<u32>,
    tests: BTreeSet<String>,
}

/// Per-run coverage data: block index, per-test timings, and failing-test
/// descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageDb {
    blocks: BTreeMap<BlockLocation, BlockRecord>,
    failing: BTreeMap<String, ExceptionDetail>,
    durations: BTreeMap<String, u64>,
}

impl CoverageDb {
    /// Empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one block with its lines and covering tests. Repeated calls
    /// for the same block merge.
    pub fn record_block<L, T>(&mut self, location: BlockLocation, lines: L, tests: T)
    where
        L: IntoIterator<Item = u32>,
        T: IntoIterator<Item = String>,
    {
        let record = self.blocks.entry(location).or_default();
        record.lines.extend(lines);
        record.tests.extend(tests);
    }

    /// Record a failing test with its baseline exception details.
    pub fn record_failing(&mut self, test: impl Into<String>, exception: ExceptionDetail) {
        self.failing.insert(test.into(), exception);
    }

    /// Record a test's baseline duration in milliseconds.
    pub fn record_duration(&mut self, test: impl Into<String>, duration_ms: u64) {
        self.durations.insert(test.into(), duration_ms);
    }

    /// Distinct tests, collected from per-block test sets.
    pub fn all_tests(&self) -> BTreeSet<String> {
        self.blocks
            .values()
            .flat_map(|r| r.tests.iter().cloned())
            .collect()
    }

    /// Tests covering a block, in coverage (sorted) order.
    pub fn tests_covering_block(&self, block: &BlockLocation) -> Vec<String> {
        self.blocks
            .get(block)
            .map(|r| r.tests.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Failing-test descriptions.
    pub fn failing_tests(&self) -> &BTreeMap<String, ExceptionDetail> {
        &self.failing
    }

    /// True when the named test failed in baseline.
    pub fn is_failing(&self, test: &str) -> bool {
        self.failing.contains_key(test)
    }

    /// Baseline duration of a test; 0 when unrecorded.
    pub fn duration_ms(&self, test: &str) -> u64 {
        self.durations.get(test).copied().unwrap_or(0)
    }

    /// Lines of `class` covered by at least one test matching `pred`.
    fn lines_where(&self, class: &str, pred: impl Fn(&str) -> bool) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        for (loc, record) in &self.blocks {
            if loc.class != class {
                continue;
            }
            if record.tests.iter().any(|t| pred(t)) {
                out.extend(record.lines.iter().copied());
            }
        }
        out
    }

    /// Lines of `class` exercised by at least one failing test.
    pub fn failing_lines(&self, class: &str) -> BTreeSet<u32> {
        self.lines_where(class, |t| self.is_failing(t))
    }

    /// Lines of `class` exercised by at least one passing test.
    pub fn passing_lines(&self, class: &str) -> BTreeSet<u32> {
        self.lines_where(class, |t| !self.is_failing(t))
    }

    /// Global ordered list of covered line positions, one per
    /// (block, line) source line, deduplicated. This fixes the bit layout
    /// of per-test line-coverage sequences.
    pub fn line_positions(&self) -> Vec<LinePosition> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (loc, record) in &self.blocks {
            for &line in &record.lines {
                let key = (loc.class.clone(), loc.method.clone(), loc.descriptor.clone(), line);
                if seen.insert(key) {
                    out.push(LinePosition {
                        class: loc.class.clone(),
                        method: loc.method.clone(),
                        descriptor: loc.descriptor.clone(),
                        line,
                    });
                }
            }
        }
        out
    }

    /// Line-coverage bits for one test over [`CoverageDb::line_positions`].
    pub fn line_bits_for_test(&self, test: &str) -> Vec<bool> {
        let positions = self.line_positions();
        let mut covered: BTreeSet<(String, String, String, u32)> = BTreeSet::new();
        for (loc, record) in &self.blocks {
            if record.tests.contains(test) {
                for &line in &record.lines {
                    covered.insert((
                        loc.class.clone(),
                        loc.method.clone(),
                        loc.descriptor.clone(),
                        line,
                    ));
                }
            }
        }
        positions
            .iter()
            .map(|p| {
                covered.contains(&(p.class.clone(), p.method.clone(), p.descriptor.clone(), p.line))
            })
            .collect()
    }
}

/// One position of the line-coverage bit layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePosition {
    /// Class name.
    pub class: String,
    /// Method name.
    pub method: String,
    /// Method descriptor.
    pub descriptor: String,
    /// Source line.
    pub line: u32,
}
