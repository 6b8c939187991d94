//! Control protocol between the coordinator and the minion executor.
//!
//! A single host-local TCP stream per executor, half-duplex in effect:
//! the arguments record goes in once, results stream out. Records are
//! length-prefixed (u32 big-endian) bincode frames.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Verbosity;
use crate::model::{IndexedMutation, StatusTestPair, TestCaseMetadata};

/// Upper bound on a single frame; anything larger is a protocol fault.
pub const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// Terminal state of one executor run, also used as the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    /// Clean completion.
    Ok,
    /// A test exceeded its timeout.
    Timeout,
    /// The memory watchdog tripped.
    OutOfMemory,
    /// The control stream closed mid-run; synthesized by the coordinator.
    MinionDied,
    /// Any other executor fault.
    UnknownError,
}

impl ExitKind {
    /// Process exit code for this kind.
    pub fn code(self) -> i32 {
        match self {
            ExitKind::Ok => 0,
            ExitKind::Timeout => 3,
            ExitKind::OutOfMemory => 4,
            ExitKind::UnknownError => 5,
            ExitKind::MinionDied => 6,
        }
    }

    /// Interpret a process exit status; `None` (signal) and unknown codes
    /// mean the minion died.
    pub fn from_code(code: Option<i32>) -> ExitKind {
        match code {
            Some(0) => ExitKind::Ok,
            Some(3) => ExitKind::Timeout,
            Some(4) => ExitKind::OutOfMemory,
            Some(5) => ExitKind::UnknownError,
            _ => ExitKind::MinionDied,
        }
    }
}

/// Percent-of-baseline-plus-constant per-test timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutStrategy {
    /// Multiplier on the test's baseline duration.
    pub factor: f64,
    /// Flat addition in milliseconds.
    pub constant_ms: u64,
}

impl TimeoutStrategy {
    /// Timeout for a test with the given baseline duration.
    pub fn timeout_for(&self, baseline_ms: u64) -> Duration {
        let scaled = (baseline_ms as f64 * self.factor).ceil() as u64;
        Duration::from_millis(scaled.saturating_add(self.constant_ms))
    }
}

/// One-shot startup record sent to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinionArguments {
    /// The mutants of this batch, in execution order.
    pub mutations: Vec<IndexedMutation>,
    /// Test classes providing the suite.
    pub test_classes: Vec<String>,
    /// Test-plugin identifier, e.g. `fixture`.
    pub engine_id: String,
    /// Operator selection tokens for the executor-side catalog.
    pub engine_args: Vec<String>,
    /// Per-test timeout strategy.
    pub timeout_strategy: TimeoutStrategy,
    /// Logging verbosity.
    pub verbosity: Verbosity,
    /// Emit per-mutant matrix artifacts.
    pub full_mutation_matrix: bool,
    /// Research mode: all tests run, baseline arrives in this record.
    pub research_mode: bool,
    /// Opaque plugin configuration (JSON for the fixture plugin).
    pub test_plugin_config: String,
    /// Artifact root; the executor writes only beneath its mutant subtree.
    pub report_dir: PathBuf,
    /// Baseline table, keyed by test name; empty in classical mode.
    pub test_case_metadata: BTreeMap<String, TestCaseMetadata>,
}

/// Executor-to-coordinator stream records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MinionEvent {
    /// Sent before each mutant is run; boot and crash attribution.
    Describe {
        /// Dense mutant id.
        mutant_id: u64,
    },
    /// Result for one mutant.
    Report {
        /// Dense mutant id.
        mutant_id: u64,
        /// Status and per-test detail.
        pair: StatusTestPair,
    },
    /// Terminal record.
    Done {
        /// Final exit kind, mirrored by the process exit code.
        exit: ExitKind,
    },
}

/// Protocol failure.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying stream failure.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
    /// Stream closed cleanly between frames.
    #[error("stream closed")]
    Closed,
    /// Stream closed inside a frame.
    #[error("stream closed mid-frame")]
    ClosedMidFrame,
    /// Frame exceeded [`MAX_FRAME_BYTES`].
    #[error("oversized frame: {0} bytes")]
    FrameTooLarge(u32),
    /// Frame payload did not decode.
    #[error("malformed frame: {0}")]
    Decode(String),
}

/// Write one length-prefixed record.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), ProtocolError> {
    let payload = bincode::serialize(message).map_err(|e| ProtocolError::Decode(e.to_string()))?;
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge(u32::MAX))?;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

fn read_exact_or_closed<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    at_boundary: bool,
) -> Result<(), ProtocolError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(if at_boundary && filled == 0 {
                    ProtocolError::Closed
                } else {
                    ProtocolError::ClosedMidFrame
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(ProtocolError::Io(e)),
        }
    }
    Ok(())
}

/// Read one length-prefixed record.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, ProtocolError> {
    let mut header = [0u8; 4];
    read_exact_or_closed(reader, &mut header, true)?;
    let len = u32::from_be_bytes(header);
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut payload, false)?;
    bincode::deserialize(&payload).map_err(|e| ProtocolError::Decode(e.to_string()))
}
