//! # mutmatrix
//!
//! `mutmatrix` is a mutation-testing engine for fault-localization research:
//! it transforms the bytecode of a program under test, runs the test suite
//! against each mutant in an isolated executor process, and emits a dense
//! test-by-mutant matrix of outcome transitions (P→F, F→P, P→P, F→F) with
//! exception-detail deltas.
//!
//! The crate is organized around the run pipeline:
//! - `bytecode`: instruction model, stack verifier, class bytes, and the
//!   redefinable program image
//! - `runtime`: the reference interpreter the hot-swap driver targets
//! - `operators`: the mutation operator catalog (AOR/ROR/CRCR/UOI/AOD/OBBN/
//!   ABS plus the classical families)
//! - `discovery`: candidate enumeration, interceptor filters, mutant-id
//!   assignment, and analysis-unit grouping
//! - `coordinator`: the bounded worker pool driving isolated executors
//! - `minion`: the executor run inside each spawned process
//! - `baseline` / `transitions`: baseline outcomes and transition bits
//! - `matrix`: the matrix CSV and research artifacts

#![warn(missing_docs)]

pub mod baseline;
pub mod bytecode;
pub mod config;
pub mod coordinator;
pub mod coverage;
pub mod discovery;
pub mod matrix;
pub mod minion;
pub mod model;
pub mod operators;
pub mod protocol;
pub mod runtime;
pub mod transitions;

pub use baseline::BaselineContext;
pub use bytecode::{ClassFile, ProgramImage};
pub use config::{EngineConfig, Verbosity};
pub use coordinator::{InProcessLauncher, MutationCoordinator, ProcessLauncher, RunReport, RunSummary};
pub use coverage::{BlockLocation, CoverageDb};
pub use minion::{Fixture, FixtureConfig, FixtureTestPlugin, run_minion};
pub use model::{MutationDetails, MutationId, MutationStatus, StatusTestPair};
pub use operators::{Operator, OperatorCatalog, parse_selection};
pub use protocol::{ExitKind, MinionArguments, TimeoutStrategy};
pub use transitions::{BitSeq, Transition, TransitionBits};
