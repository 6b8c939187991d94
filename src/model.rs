//! Core data model: mutation identities, per-test results, and statuses.

use serde::{Deserialize, Serialize};

/// Address of an instruction region eligible for mutation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodLocation {
    /// Fully-qualified dotted class name.
    pub class: String,
    /// Method name.
    pub method: String,
    /// Method descriptor, e.g. `(II)I`.
    pub descriptor: String,
    /// First source line of the method.
    pub first_line: u32,
    /// Basic-block index of the mutated instruction.
    pub block: u32,
}

/// Reproducible identity of one candidate mutation.
///
/// Stable across runs for the same class set and operator selection: the
/// candidate index is the per-(method, operator) counter in instruction
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MutationId {
    /// Mutated instruction region.
    pub location: MethodLocation,
    /// Canonical sub-operator name, e.g. `AOR_2`.
    pub operator: String,
    /// Candidate index within (method, operator).
    pub index: u32,
    /// Human-readable description of the change.
    pub description: String,
}

impl MutationId {
    /// Stable string key, used by the history filter.
    pub fn key(&self) -> String {
        format!(
            "{}::{}{}::{}::{}",
            self.location.class, self.location.method, self.location.descriptor, self.operator, self.index
        )
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}{}: {}",
            self.location.class, self.location.method, self.location.descriptor, self.description
        )
    }
}

/// A discovered mutation with its source position and covering tests.
///
/// Immutable after discovery; the dense integer mutant id is attached after
/// filtering via [`IndexedMutation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDetails {
    /// Identity.
    pub id: MutationId,
    /// Source file of the mutated class.
    pub source_file: String,
    /// Mutated source line.
    pub line: u32,
    /// Tests covering the mutated block, in coverage order.
    pub covering_tests: Vec<String>,
}

/// A mutation with its run-scoped dense mutant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedMutation {
    /// Dense id, assigned exactly once after all filtering.
    pub mutant_id: u64,
    /// The mutation.
    pub details: MutationDetails,
}

/// A materialized mutant: details plus the mutated class bytes.
///
/// Produced just in time before execution and discarded after results are
/// captured, unless artifact emission keeps the bytes on disk.
#[derive(Debug, Clone)]
pub struct Mutant {
    /// The mutation.
    pub details: MutationDetails,
    /// Mutated class bytes.
    pub bytes: Vec<u8>,
}

/// Final outcome label attached to a mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Queued, no executor has picked it up.
    NotStarted,
    /// Handed to an executor, no result yet.
    Started,
    /// At least one detecting transition.
    Killed,
    /// Ran to completion undetected.
    Survived,
    /// No covering tests; never executed.
    NoCoverage,
    /// Class redefinition rejected.
    NonViable,
    /// Executor exceeded the test timeout.
    TimedOut,
    /// Executor exceeded the memory threshold.
    MemoryError,
    /// Executor or protocol fault.
    RunError,
}

impl MutationStatus {
    /// True for statuses that end a mutant's lifecycle.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MutationStatus::NotStarted | MutationStatus::Started)
    }

    /// True for the executor/protocol fault statuses.
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            MutationStatus::NonViable
                | MutationStatus::TimedOut
                | MutationStatus::MemoryError
                | MutationStatus::RunError
        )
    }
}

impl std::fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationStatus::NotStarted => "not_started",
            MutationStatus::Started => "started",
            MutationStatus::Killed => "killed",
            MutationStatus::Survived => "survived",
            MutationStatus::NoCoverage => "no_coverage",
            MutationStatus::NonViable => "non_viable",
            MutationStatus::TimedOut => "timed_out",
            MutationStatus::MemoryError => "memory_error",
            MutationStatus::RunError => "run_error",
        };
        write!(f, "{s}")
    }
}

/// Exception observed during one test execution.
///
/// The stack is already in filtered canonical form: harness frames removed
/// and the leading type/message line dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDetail {
    /// Exception class name.
    #[serde(default)]
    pub type_name: Option<String>,
    /// Exception message; may be empty.
    #[serde(default)]
    pub message: Option<String>,
    /// Filtered stack trace.
    #[serde(default)]
    pub stack: Option<String>,
}

impl ExceptionDetail {
    /// No exception.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Outcome of one (test, mutant) execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedTestResult {
    /// Qualified test name.
    pub test_name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Exception details when the test failed.
    #[serde(default)]
    pub exception: ExceptionDetail,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Baseline record for one test.
///
/// tcIDs are dense integers assigned by lexicographic sort of baseline test
/// names; they fix the column order of every emitted bit sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseMetadata {
    /// Dense test-case id.
    pub tc_id: u32,
    /// Qualified test name.
    pub test_name: String,
    /// Baseline verdict.
    pub passed: bool,
    /// Baseline exception details (failing tests only).
    #[serde(default)]
    pub exception: ExceptionDetail,
    /// Baseline duration in milliseconds.
    pub duration_ms: u64,
}

/// Per-mutant result streamed from the executor to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTestPair {
    /// Final status.
    pub status: MutationStatus,
    /// Tests whose transition detected the mutant.
    pub killing_tests: Vec<String>,
    /// Tests that ran without detecting the mutant.
    pub surviving_tests: Vec<String>,
    /// Tests covering the mutant (run or not).
    pub covered_tests: Vec<String>,
    /// Per-test detail, in execution order.
    pub detailed: Vec<DetailedTestResult>,
}

impl StatusTestPair {
    /// Result for a mutant whose redefinition was rejected: covered tests
    /// are listed as covered-but-not-run and no detail is recorded.
    pub fn non_viable(covered_tests: Vec<String>) -> Self {
        Self {
            status: MutationStatus::NonViable,
            killing_tests: Vec::new(),
            surviving_tests: Vec::new(),
            covered_tests,
            detailed: Vec::new(),
        }
    }

    /// Number of tests actually run against the mutant.
    pub fn num_tests_run(&self) -> usize {
        self.detailed.len()
    }
}

/// All results for one mutated class, with the transitive per-test detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMutationResults {
    /// Class name.
    pub class: String,
    /// Per-mutant results in mutant-id order.
    pub results: Vec<(IndexedMutation, StatusTestPair)>,
}
