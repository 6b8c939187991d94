//! The full-mutation-matrix CSV and per-mutant research artifacts.
//!
//! One row per mutant, flushed immediately after write; each transition
//! column is a bit string with one bit per baseline test in tcID order.
//! After a mutant's row and JSON are written its detailed results are
//! released — only compact summary records stay in memory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::baseline::BaselineContext;
use crate::matrix::artifacts::{self, csv_field};
use crate::model::{IndexedMutation, MutationStatus, StatusTestPair};
use crate::transitions::TransitionBits;

const MATRIX_HEADER: &str = "mutant_id,class,method,line,mutator,result_transition,\
exception_type_transition,exception_msg_transition,stacktrace_transition,status,num_tests_run";

/// Compact per-mutant record retained for the summary CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    /// Dense mutant id.
    pub mutation_id: u64,
    /// Mutation description.
    pub description: String,
    /// Tests run against the mutant.
    pub num_tests: usize,
    /// Final status.
    pub status: MutationStatus,
}

/// Serializes matrix rows and research artifacts from the coordinator
/// thread, in result-arrival order.
pub struct MatrixEmitter {
    matrix: Option<BufWriter<File>>,
    research_mode: bool,
    report_dir: PathBuf,
    summary: Vec<SummaryRecord>,
}

impl MatrixEmitter {
    /// Open the matrix file (when enabled) and write its header.
    pub fn create(
        report_dir: &Path,
        full_mutation_matrix: bool,
        research_mode: bool,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(report_dir)?;
        let matrix = if full_mutation_matrix {
            let file = File::create(report_dir.join("full_mutation_matrix.csv"))?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{MATRIX_HEADER}")?;
            writer.flush()?;
            Some(writer)
        } else {
            None
        };
        Ok(Self {
            matrix,
            research_mode,
            report_dir: report_dir.to_path_buf(),
            summary: Vec::new(),
        })
    }

    /// Emit one mutant's row and research artifacts.
    ///
    /// The caller drops the pair afterwards; the emitter retains only a
    /// [`SummaryRecord`].
    pub fn emit(
        &mut self,
        mutation: &IndexedMutation,
        pair: &StatusTestPair,
        baseline: &BaselineContext,
    ) {
        let bits = TransitionBits::compute(
            baseline.num_tests(),
            baseline.metadata(),
            &pair.detailed,
        );

        if let Some(writer) = self.matrix.as_mut() {
            let id = &mutation.details.id;
            let row = format!(
                "{},{},{},{},{},{},{},{},{},{},{}",
                mutation.mutant_id,
                csv_field(&id.location.class),
                csv_field(&id.location.method),
                mutation.details.line,
                csv_field(&id.operator),
                bits.result,
                bits.exc_type,
                bits.exc_msg,
                bits.stack,
                pair.status,
                pair.num_tests_run()
            );
            if let Err(err) = writeln!(writer, "{row}").and_then(|_| writer.flush()) {
                warn!(error = %err, "matrix row write failed");
            }
        }

        if self.research_mode {
            artifacts::write_mutant_results_json(&self.report_dir, mutation, &pair.detailed);
        }

        self.summary.push(SummaryRecord {
            mutation_id: mutation.mutant_id,
            description: mutation.details.id.description.clone(),
            num_tests: pair.num_tests_run(),
            status: pair.status,
        });
    }

    /// Retained summary records, in emission order.
    pub fn summary(&self) -> &[SummaryRecord] {
        &self.summary
    }

    /// Write `mutationResults/mutation_summary.csv` (research mode).
    pub fn finish(&mut self) {
        if !self.research_mode {
            return;
        }
        let dir = self.report_dir.join("mutationResults");
        if let Err(err) = std::fs::create_dir_all(&dir) {
            warn!(error = %err, "summary directory creation failed");
            return;
        }
        let mut csv = String::from("mutation_id,description,num_tests,status\n");
        for record in &self.summary {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                record.mutation_id,
                csv_field(&record.description),
                record.num_tests,
                record.status
            ));
        }
        if let Err(err) = std::fs::write(dir.join("mutation_summary.csv"), csv) {
            warn!(error = %err, "summary write failed");
        }
    }
}
