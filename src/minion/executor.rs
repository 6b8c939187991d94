//! One-shot minion executor.
//!
//! Driven entirely by the blocking control stream: read the arguments
//! record, capture or accept the baseline, then for each mutant produce its
//! bytes, hot-swap the class, run the relevant tests under the timeout
//! decorator, and stream the result. The function never terminates the
//! process itself; it returns the exit kind and the binary maps it to a
//! process exit code.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::baseline::BaselineContext;
use crate::bytecode::image::{ByteSource, ProgramImage};
use crate::matrix::artifacts;
use crate::minion::plugin::{TestPlugin, TestUnit, plugin_for};
use crate::minion::trace::filter_stack_trace;
use crate::minion::watchdog::MemoryWatchdog;
use crate::model::{
    DetailedTestResult, ExceptionDetail, IndexedMutation, MutationStatus, StatusTestPair,
};
use crate::operators::{OperatorCatalog, parse_selection};
use crate::protocol::{ExitKind, MinionArguments, MinionEvent, read_frame, write_frame};
use crate::transitions::Transition;

/// Exit-on-first-exception collector over a concurrent result buffer.
///
/// In classical mode the first failing test settles the mutant and the
/// remaining tests are skipped; research mode records every outcome.
pub struct ExitingResultCollector {
    results: Mutex<Vec<DetailedTestResult>>,
    failure_seen: AtomicBool,
    exit_on_failure: bool,
}

impl ExitingResultCollector {
    /// Collector; `exit_on_failure` enables the early-exit behavior.
    pub fn new(exit_on_failure: bool) -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            failure_seen: AtomicBool::new(false),
            exit_on_failure,
        }
    }

    /// Record one result.
    pub fn record(&self, result: DetailedTestResult) {
        if !result.passed {
            self.failure_seen.store(true, Ordering::SeqCst);
        }
        if let Ok(mut results) = self.results.lock() {
            results.push(result);
        }
    }

    /// True when no further tests should run for this mutant.
    pub fn should_stop(&self) -> bool {
        self.exit_on_failure && self.failure_seen.load(Ordering::SeqCst)
    }

    /// Drain the collected results, in execution order.
    pub fn take_results(&self) -> Vec<DetailedTestResult> {
        self.results
            .lock()
            .map(|mut r| std::mem::take(&mut *r))
            .unwrap_or_default()
    }
}

fn to_detailed(name: &str, outcome: crate::minion::plugin::TestOutcome, duration: Duration) -> DetailedTestResult {
    DetailedTestResult {
        test_name: name.to_string(),
        passed: outcome.passed,
        exception: ExceptionDetail {
            type_name: outcome.type_name,
            message: outcome.message,
            stack: outcome.raw_stack.as_deref().map(filter_stack_trace),
        },
        duration_ms: duration.as_millis() as u64,
    }
}

enum TestRun {
    Completed,
    TimedOut,
}

fn run_test_with_timeout(
    plugin: Arc<dyn TestPlugin>,
    image: Arc<ProgramImage>,
    test_name: String,
    timeout: Duration,
    collector: Arc<ExitingResultCollector>,
) -> TestRun {
    let (done_tx, done_rx) = mpsc::channel();
    let thread_collector = Arc::clone(&collector);
    std::thread::spawn(move || {
        let unit = TestUnit {
            name: test_name.clone(),
        };
        let started = Instant::now();
        let outcome = plugin.execute(&image, &unit);
        thread_collector.record(to_detailed(&test_name, outcome, started.elapsed()));
        let _ = done_tx.send(());
    });

    match done_rx.recv_timeout(timeout) {
        Ok(()) => TestRun::Completed,
        Err(mpsc::RecvTimeoutError::Timeout) => TestRun::TimedOut,
        // The test thread died without reporting; whatever reached the
        // buffer stands and the run moves on.
        Err(mpsc::RecvTimeoutError::Disconnected) => TestRun::Completed,
    }
}

fn run_baseline_pass(
    plugin: &Arc<dyn TestPlugin>,
    image: &ProgramImage,
    units: &[TestUnit],
) -> BaselineContext {
    let mut results = Vec::with_capacity(units.len());
    for unit in units {
        let started = Instant::now();
        let outcome = plugin.execute(image, unit);
        results.push(to_detailed(&unit.name, outcome, started.elapsed()));
    }
    BaselineContext::from_results(&results)
}

/// Order the tests to run against one mutant.
fn select_tests(
    mutation: &IndexedMutation,
    units_by_name: &BTreeMap<&str, &TestUnit>,
    baseline: &BaselineContext,
    research_mode: bool,
    metadata_provided: bool,
) -> Vec<String> {
    let names: Vec<String> = if research_mode {
        baseline.test_order().to_vec()
    } else if metadata_provided || baseline.num_tests() > 0 {
        let mut covering = mutation.details.covering_tests.clone();
        covering.sort_by_key(|name| baseline.get(name).map(|m| m.tc_id).unwrap_or(u32::MAX));
        covering
    } else {
        mutation.details.covering_tests.clone()
    };
    names
        .into_iter()
        .filter(|name| units_by_name.contains_key(name.as_str()))
        .collect()
}

fn classify_pair(
    mutation: &IndexedMutation,
    detailed: Vec<DetailedTestResult>,
    baseline: &BaselineContext,
    research_mode: bool,
) -> StatusTestPair {
    let mut killing_tests = Vec::new();
    let mut surviving_tests = Vec::new();
    for result in &detailed {
        let detected = if research_mode {
            baseline
                .get(&result.test_name)
                .map(|m| Transition::classify(m.passed, result.passed).is_detection())
                .unwrap_or(!result.passed)
        } else {
            !result.passed
        };
        if detected {
            killing_tests.push(result.test_name.clone());
        } else {
            surviving_tests.push(result.test_name.clone());
        }
    }
    let status = if killing_tests.is_empty() {
        MutationStatus::Survived
    } else {
        MutationStatus::Killed
    };
    StatusTestPair {
        status,
        killing_tests,
        surviving_tests,
        covered_tests: mutation.details.covering_tests.clone(),
        detailed,
    }
}

fn run_error_pair(mutation: &IndexedMutation) -> StatusTestPair {
    StatusTestPair {
        status: MutationStatus::RunError,
        killing_tests: Vec::new(),
        surviving_tests: Vec::new(),
        covered_tests: mutation.details.covering_tests.clone(),
        detailed: Vec::new(),
    }
}

/// Run the executor over an established control stream.
pub fn run_minion<S: Read + Write>(
    stream: &mut S,
    image: &ProgramImage,
    watchdog: Option<&MemoryWatchdog>,
) -> ExitKind {
    let args: MinionArguments = match read_frame(stream) {
        Ok(args) => args,
        Err(err) => {
            warn!(error = %err, "failed to read minion arguments");
            return ExitKind::UnknownError;
        }
    };

    let plugin = match plugin_for(&args.engine_id, &args.test_plugin_config) {
        Ok(plugin) => plugin,
        Err(err) => {
            warn!(error = %err, "test plugin construction failed");
            return ExitKind::UnknownError;
        }
    };

    let catalog = match parse_selection(&args.engine_args) {
        Ok(operators) => OperatorCatalog::new(operators),
        Err(err) => {
            warn!(error = %err, "bad operator selection");
            return ExitKind::UnknownError;
        }
    };

    // Classes are loaded once per executor start; mutants are applied to the
    // working copy and reverted from the pristine image.
    let mut working = image.clone();

    let mut units = plugin.discover(&args.test_classes);
    info!(tests = units.len(), mutants = args.mutations.len(), "minion ready");

    let metadata_provided = !args.test_case_metadata.is_empty();
    let baseline = if args.research_mode {
        BaselineContext::from_metadata(args.test_case_metadata.clone())
    } else {
        run_baseline_pass(&plugin, &working, &units)
    };
    units.sort_by_key(|u| baseline.get(&u.name).map(|m| m.tc_id).unwrap_or(u32::MAX));

    for mutation in &args.mutations {
        if watchdog.is_some_and(MemoryWatchdog::tripped) {
            return ExitKind::OutOfMemory;
        }

        if write_frame(stream, &MinionEvent::Describe { mutant_id: mutation.mutant_id }).is_err() {
            return ExitKind::UnknownError;
        }
        debug!(mutant_id = mutation.mutant_id, id = %mutation.details.id, "running mutant");

        let class = &mutation.details.id.location.class;
        let Some(original_bytes) = image.class_bytes(class) else {
            let report = MinionEvent::Report {
                mutant_id: mutation.mutant_id,
                pair: run_error_pair(mutation),
            };
            if write_frame(stream, &report).is_err() {
                return ExitKind::UnknownError;
            }
            continue;
        };

        let pair = match catalog.produce(&mutation.details.id, &original_bytes) {
            Err(err) => {
                warn!(mutant_id = mutation.mutant_id, error = %err, "mutant production failed");
                run_error_pair(mutation)
            }
            Ok(mutated_bytes) => {
                if args.research_mode {
                    artifacts::write_mutant_artifact(
                        &args.report_dir,
                        mutation,
                        &mutated_bytes,
                    );
                }
                match working.redefine(class, &mutated_bytes) {
                    Err(err) => {
                        debug!(mutant_id = mutation.mutant_id, error = %err, "redefinition rejected");
                        StatusTestPair::non_viable(mutation.details.covering_tests.clone())
                    }
                    Ok(()) => {
                        let units_by_name: BTreeMap<&str, &TestUnit> =
                            units.iter().map(|u| (u.name.as_str(), u)).collect();
                        let selected = select_tests(
                            mutation,
                            &units_by_name,
                            &baseline,
                            args.research_mode,
                            metadata_provided,
                        );

                        let shared = Arc::new(working.clone());
                        let collector =
                            Arc::new(ExitingResultCollector::new(!args.research_mode));
                        for test_name in selected {
                            if collector.should_stop() {
                                break;
                            }
                            if watchdog.is_some_and(MemoryWatchdog::tripped) {
                                return ExitKind::OutOfMemory;
                            }
                            let baseline_ms = baseline
                                .get(&test_name)
                                .map(|m| m.duration_ms)
                                .unwrap_or(0);
                            let timeout = args.timeout_strategy.timeout_for(baseline_ms);
                            match run_test_with_timeout(
                                Arc::clone(&plugin),
                                Arc::clone(&shared),
                                test_name,
                                timeout,
                                Arc::clone(&collector),
                            ) {
                                TestRun::Completed => {}
                                TestRun::TimedOut => return ExitKind::Timeout,
                            }
                        }

                        // Revert the hot swap before the next mutant.
                        if working.redefine(class, &original_bytes).is_err() {
                            return ExitKind::UnknownError;
                        }

                        classify_pair(
                            mutation,
                            collector.take_results(),
                            &baseline,
                            args.research_mode,
                        )
                    }
                }
            }
        };

        let report = MinionEvent::Report {
            mutant_id: mutation.mutant_id,
            pair,
        };
        if write_frame(stream, &report).is_err() {
            return ExitKind::UnknownError;
        }
    }

    let _ = write_frame(stream, &MinionEvent::Done { exit: ExitKind::Ok });
    ExitKind::Ok
}
