//! Analysis-unit scheduling and result reconciliation.
//!
//! Units run on a bounded pool of worker threads; each worker blocks on its
//! executor subprocess and streams unit results back to the coordinator
//! thread, which emits matrix rows in arrival order. A crashed executor
//! leaves its un-run mutants for the next round; the mutant flipped to
//! `started` before the round absorbs the fault, so every round makes
//! progress.

use std::collections::{BTreeMap, VecDeque};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock, mpsc};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::baseline::BaselineContext;
use crate::bytecode::image::ProgramImage;
use crate::config::{ConfigError, EngineConfig};
use crate::coordinator::launcher::{LaunchSpec, MinionLauncher, ProcessLauncher};
use crate::coverage::CoverageDb;
use crate::discovery::{
    AnalysisUnit, EquivalentMutantSuppressor, FailingLineFilter, HistoryFilter,
    InlinedCodeConsolidator, InterceptorContext, MutationInterceptor, discover_all,
    group_into_units, mutable_classes, research_batch_cap, run_pipeline,
};
use crate::matrix::{
    MatrixEmitter, write_baseline_artifacts, write_line_info, write_original_classes,
};
use crate::model::{ClassMutationResults, IndexedMutation, MutationStatus, StatusTestPair};
use crate::operators::OperatorCatalog;
use crate::protocol::{
    ExitKind, MinionArguments, MinionEvent, TimeoutStrategy, read_frame, write_frame,
};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

const ACCEPT_DEADLINE: Duration = Duration::from_secs(30);

fn install_signal_handler_once() -> Result<(), CoordinatorError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let result = INIT.get_or_init(|| {
        ctrlc::set_handler(|| {
            INTERRUPTED.store(true, Ordering::SeqCst);
        })
        .map_err(|e| e.to_string())
    });
    match result {
        Ok(()) => Ok(()),
        Err(msg) => Err(CoordinatorError::Signal(msg.clone())),
    }
}

/// Coordinator failure; per-mutant faults never surface here.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Discovery found nothing and `fail_when_no_mutations` is set.
    #[error("no mutations found")]
    NoMutationsFound,
    /// Report-directory or image-file setup failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Signal handler installation failed.
    #[error("signal handler installation failed: {0}")]
    Signal(String),
}

/// Aggregated per-status counts for one run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RunSummary {
    /// Total mutants with assigned ids.
    pub total: usize,
    /// Killed mutants.
    pub killed: usize,
    /// Survived mutants.
    pub survived: usize,
    /// Mutants with no covering tests.
    pub no_coverage: usize,
    /// Rejected redefinitions.
    pub non_viable: usize,
    /// Timed-out mutants.
    pub timed_out: usize,
    /// Memory-error mutants.
    pub memory_errors: usize,
    /// Run-error mutants.
    pub run_errors: usize,
    /// Mutants never started (interrupted runs).
    pub not_started: usize,
    /// Killed share of testable mutants, as a percentage.
    pub mutation_score: f64,
}

impl RunSummary {
    /// Summary over per-class results.
    pub fn from_results(classes: &[ClassMutationResults]) -> Self {
        let mut out = Self::default();
        for class in classes {
            for (_, pair) in &class.results {
                out.total += 1;
                match pair.status {
                    MutationStatus::Killed => out.killed += 1,
                    MutationStatus::Survived => out.survived += 1,
                    MutationStatus::NoCoverage => out.no_coverage += 1,
                    MutationStatus::NonViable => out.non_viable += 1,
                    MutationStatus::TimedOut => out.timed_out += 1,
                    MutationStatus::MemoryError => out.memory_errors += 1,
                    MutationStatus::RunError => out.run_errors += 1,
                    MutationStatus::NotStarted | MutationStatus::Started => out.not_started += 1,
                }
            }
        }
        let testable = out.total.saturating_sub(out.no_coverage + out.non_viable);
        out.mutation_score = if testable > 0 {
            out.killed as f64 * 100.0 / testable as f64
        } else {
            100.0
        };
        out
    }
}

/// Result of one coordinator run.
#[derive(Debug)]
pub struct RunReport {
    /// Per-status counts.
    pub summary: RunSummary,
    /// Per-class results with transitive detail, in class order.
    pub classes: Vec<ClassMutationResults>,
    /// Unit sizes; the only output of a `measure_expected_time` run.
    pub unit_sizes: Vec<usize>,
}

struct MutantState {
    mutation: IndexedMutation,
    status: MutationStatus,
    pair: Option<StatusTestPair>,
}

fn fault_pair(mutation: &IndexedMutation, status: MutationStatus) -> StatusTestPair {
    StatusTestPair {
        status,
        killing_tests: Vec::new(),
        surviving_tests: Vec::new(),
        covered_tests: mutation.details.covering_tests.clone(),
        detailed: Vec::new(),
    }
}

fn accept_with_deadline(listener: &TcpListener, deadline: Duration) -> Option<TcpStream> {
    listener.set_nonblocking(true).ok()?;
    let start = Instant::now();
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).ok()?;
                return Some(stream);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if start.elapsed() > deadline {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return None,
        }
    }
}

/// Owns the worker pool and the executor lifecycle for one run.
pub struct MutationCoordinator {
    config: EngineConfig,
    image: ProgramImage,
    coverage: CoverageDb,
    launcher: Box<dyn MinionLauncher>,
}

impl MutationCoordinator {
    /// Coordinator with the production process launcher.
    pub fn new(config: EngineConfig, image: ProgramImage, coverage: CoverageDb) -> Self {
        let bin = config
            .minion_bin
            .clone()
            .unwrap_or_else(ProcessLauncher::default_minion_bin);
        Self {
            config,
            image,
            coverage,
            launcher: Box::new(ProcessLauncher::new(bin)),
        }
    }

    /// Coordinator with an explicit launcher.
    pub fn with_launcher(
        config: EngineConfig,
        image: ProgramImage,
        coverage: CoverageDb,
        launcher: Box<dyn MinionLauncher>,
    ) -> Self {
        Self {
            config,
            image,
            coverage,
            launcher,
        }
    }

    fn build_filters(&self) -> Vec<Box<dyn MutationInterceptor>> {
        let mut filters: Vec<Box<dyn MutationInterceptor>> = vec![
            Box::new(InlinedCodeConsolidator),
            Box::new(EquivalentMutantSuppressor),
        ];
        if self.config.failing_tests_only {
            filters.push(Box::new(FailingLineFilter));
        }
        if let Some(history) = &self.config.history {
            filters.push(Box::new(HistoryFilter::new(history.clone())));
        }
        filters
    }

    /// Run the full analysis.
    pub fn run(&self) -> Result<RunReport, CoordinatorError> {
        self.config.validate()?;
        install_signal_handler_once()?;
        INTERRUPTED.store(false, Ordering::SeqCst);

        let catalog = OperatorCatalog::new(self.config.operators.to_vec());
        let classes = mutable_classes(&self.image, &self.config.test_classes);
        let baseline = BaselineContext::compute(&self.coverage, &classes);

        let filters = self.build_filters();
        let ctx = InterceptorContext {
            image: &self.image,
            catalog: &catalog,
            baseline: &baseline,
        };

        // Per-class filtering; a throwing filter poisons the class and its
        // mutants are reported run_error without execution.
        let mut indexed_ok: Vec<IndexedMutation> = Vec::new();
        let mut indexed_poisoned: Vec<IndexedMutation> = Vec::new();
        let mut next_id = 0u64;
        for (class, mutations) in
            discover_all(&self.image, &catalog, &self.coverage, &self.config.test_classes)
        {
            match run_pipeline(&filters, mutations.clone(), &ctx) {
                Ok(kept) => {
                    for details in kept {
                        indexed_ok.push(IndexedMutation {
                            mutant_id: next_id,
                            details,
                        });
                        next_id += 1;
                    }
                }
                Err(err) => {
                    warn!(class = %class, error = %err, "filter failed; unit becomes run_error");
                    for details in mutations {
                        indexed_poisoned.push(IndexedMutation {
                            mutant_id: next_id,
                            details,
                        });
                        next_id += 1;
                    }
                }
            }
        }

        let total = indexed_ok.len() + indexed_poisoned.len();
        if total == 0 && self.config.fail_when_no_mutations {
            return Err(CoordinatorError::NoMutationsFound);
        }
        info!(mutants = total, classes = classes.len(), "discovery complete");

        let units = group_into_units(&indexed_ok, self.config.mutation_unit_size);
        let unit_sizes: Vec<usize> = units.iter().map(AnalysisUnit::priority).collect();

        if self.config.measure_expected_time {
            let mut summary = RunSummary::default();
            summary.total = total;
            summary.not_started = total;
            return Ok(RunReport {
                summary,
                classes: Vec::new(),
                unit_sizes,
            });
        }

        std::fs::create_dir_all(&self.config.report_dir)?;
        if self.config.research_mode {
            write_original_classes(&self.config.report_dir, &self.image, &self.config.test_classes);
            write_baseline_artifacts(&self.config.report_dir, &baseline, &self.coverage);
            write_line_info(&self.config.report_dir, &self.coverage, &self.image);
        }

        let image_path = self.config.report_dir.join("minion-image.bin");
        std::fs::write(&image_path, self.image.to_bytes())?;

        let mut emitter = MatrixEmitter::create(
            &self.config.report_dir,
            self.config.full_mutation_matrix,
            self.config.research_mode,
        )?;

        let mut by_class: BTreeMap<String, Vec<(IndexedMutation, StatusTestPair)>> = BTreeMap::new();
        for mutation in indexed_poisoned {
            let pair = fault_pair(&mutation, MutationStatus::RunError);
            emitter.emit(&mutation, &pair, &baseline);
            by_class
                .entry(mutation.details.id.location.class.clone())
                .or_default()
                .push((mutation, pair));
        }

        let queue: Mutex<VecDeque<AnalysisUnit>> = Mutex::new(units.into());
        let (tx, rx) = mpsc::channel::<Vec<(IndexedMutation, StatusTestPair)>>();

        std::thread::scope(|scope| {
            for _ in 0..self.config.threads {
                let tx = tx.clone();
                let queue = &queue;
                let baseline = &baseline;
                let image_path = &image_path;
                scope.spawn(move || {
                    loop {
                        if INTERRUPTED.load(Ordering::SeqCst) {
                            break;
                        }
                        let unit = match queue.lock() {
                            Ok(mut q) => q.pop_front(),
                            Err(_) => break,
                        };
                        let Some(unit) = unit else { break };
                        let results = self.run_unit(&unit, baseline, image_path);
                        if tx.send(results).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            // Result interception on the coordinator thread, arrival order.
            for results in rx {
                for (mutation, pair) in results {
                    emitter.emit(&mutation, &pair, &baseline);
                    by_class
                        .entry(mutation.details.id.location.class.clone())
                        .or_default()
                        .push((mutation, pair));
                }
            }
        });

        emitter.finish();

        let mut class_results: Vec<ClassMutationResults> = by_class
            .into_iter()
            .map(|(class, mut results)| {
                results.sort_by_key(|(m, _)| m.mutant_id);
                ClassMutationResults { class, results }
            })
            .collect();
        class_results.sort_by(|a, b| a.class.cmp(&b.class));

        let summary = RunSummary::from_results(&class_results);
        info!(
            killed = summary.killed,
            survived = summary.survived,
            score = summary.mutation_score,
            "run complete"
        );
        Ok(RunReport {
            summary,
            classes: class_results,
            unit_sizes,
        })
    }

    /// Execute one analysis unit, respawning executors until every mutant
    /// has a terminal status.
    fn run_unit(
        &self,
        unit: &AnalysisUnit,
        baseline: &BaselineContext,
        image_path: &Path,
    ) -> Vec<(IndexedMutation, StatusTestPair)> {
        let mut states: Vec<MutantState> = unit
            .mutants
            .iter()
            .map(|m| MutantState {
                mutation: m.clone(),
                status: MutationStatus::NotStarted,
                pair: None,
            })
            .collect();

        // Without coverage a mutant can never be detected; skip it outright
        // in classical mode.
        if !self.config.research_mode {
            for state in &mut states {
                if state.mutation.details.covering_tests.is_empty() {
                    state.status = MutationStatus::NoCoverage;
                    state.pair = Some(fault_pair(&state.mutation, MutationStatus::NoCoverage));
                }
            }
        }

        let batch_cap = if self.config.research_mode {
            research_batch_cap(self.config.test_classes.len())
        } else {
            usize::MAX
        };

        loop {
            if INTERRUPTED.load(Ordering::SeqCst) {
                break;
            }
            let remaining: Vec<usize> = states
                .iter()
                .enumerate()
                .filter(|(_, s)| s.status == MutationStatus::NotStarted)
                .map(|(i, _)| i)
                .collect();
            if remaining.is_empty() {
                break;
            }
            let batch: Vec<usize> = remaining.into_iter().take(batch_cap.max(1)).collect();

            let exit = self.spawn_round(&batch, &mut states, baseline, image_path);
            debug!(unit_class = unit.class(), exit = ?exit, "executor round finished");

            let fault = match exit {
                ExitKind::Timeout => MutationStatus::TimedOut,
                ExitKind::OutOfMemory => MutationStatus::MemoryError,
                ExitKind::Ok | ExitKind::MinionDied | ExitKind::UnknownError => {
                    MutationStatus::RunError
                }
            };
            for state in &mut states {
                if state.status == MutationStatus::Started && state.pair.is_none() {
                    state.status = fault;
                    state.pair = Some(fault_pair(&state.mutation, fault));
                }
            }
        }

        states
            .into_iter()
            .map(|state| {
                let status = state.status;
                let pair = state
                    .pair
                    .unwrap_or_else(|| fault_pair(&state.mutation, status));
                (state.mutation, pair)
            })
            .collect()
    }

    /// One executor round over a batch of mutants.
    fn spawn_round(
        &self,
        batch: &[usize],
        states: &mut [MutantState],
        baseline: &BaselineContext,
        image_path: &Path,
    ) -> ExitKind {
        // Flipped before anything can fail so boot failures are
        // attributable and every round makes progress.
        states[batch[0]].status = MutationStatus::Started;

        let listener = match TcpListener::bind(("127.0.0.1", 0)) {
            Ok(l) => l,
            Err(err) => {
                warn!(error = %err, "control listener bind failed");
                return ExitKind::MinionDied;
            }
        };
        let port = match listener.local_addr() {
            Ok(addr) => addr.port(),
            Err(err) => {
                warn!(error = %err, "control listener address unavailable");
                return ExitKind::MinionDied;
            }
        };

        let spec = LaunchSpec {
            port,
            image_path: image_path.to_path_buf(),
            memory_limit_mb: self.config.memory_limit_mb,
            verbosity: self.config.verbosity,
        };
        let mut handle = match self.launcher.launch(&spec) {
            Ok(h) => h,
            Err(err) => {
                warn!(error = %err, "minion launch failed");
                return ExitKind::MinionDied;
            }
        };

        let Some(mut stream) = accept_with_deadline(&listener, ACCEPT_DEADLINE) else {
            warn!("minion never connected");
            let _ = handle.wait();
            return ExitKind::MinionDied;
        };

        let args = MinionArguments {
            mutations: batch.iter().map(|&i| states[i].mutation.clone()).collect(),
            test_classes: self.config.test_classes.to_vec(),
            engine_id: self.config.engine_id.to_string(),
            engine_args: self.config.operators.iter().map(|op| op.name()).collect(),
            timeout_strategy: TimeoutStrategy {
                factor: self.config.timeout_factor,
                constant_ms: self.config.timeout_constant_ms,
            },
            verbosity: self.config.verbosity,
            full_mutation_matrix: self.config.full_mutation_matrix,
            research_mode: self.config.research_mode,
            test_plugin_config: self.config.test_plugin_config.to_string(),
            report_dir: self.config.report_dir.to_path_buf(),
            test_case_metadata: if self.config.research_mode {
                baseline.metadata().clone()
            } else {
                BTreeMap::new()
            },
        };
        if write_frame(&mut stream, &args).is_err() {
            let _ = handle.wait();
            return ExitKind::MinionDied;
        }

        let mut done: Option<ExitKind> = None;
        loop {
            match read_frame::<_, MinionEvent>(&mut stream) {
                Ok(MinionEvent::Describe { mutant_id }) => {
                    if let Some(state) =
                        states.iter_mut().find(|s| s.mutation.mutant_id == mutant_id)
                    {
                        state.status = MutationStatus::Started;
                    }
                }
                Ok(MinionEvent::Report { mutant_id, pair }) => {
                    if let Some(state) =
                        states.iter_mut().find(|s| s.mutation.mutant_id == mutant_id)
                    {
                        state.status = pair.status;
                        state.pair = Some(pair);
                    }
                }
                Ok(MinionEvent::Done { exit }) => {
                    done = Some(exit);
                    break;
                }
                Err(err) => {
                    debug!(error = %err, "control stream ended");
                    break;
                }
            }
        }

        match done {
            Some(exit) => {
                let _ = handle.wait();
                exit
            }
            None => match handle.wait() {
                Ok(code) => ExitKind::from_code(code),
                Err(_) => ExitKind::MinionDied,
            },
        }
    }
}
