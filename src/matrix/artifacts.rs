//! Disk artifacts: baseline JSON/CSV, line-position map, and class bytes.
//!
//! Artifact writes are never fatal to the run; failures are logged and the
//! run continues.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::baseline::BaselineContext;
use crate::bytecode::image::ProgramImage;
use crate::coverage::CoverageDb;
use crate::model::{DetailedTestResult, ExceptionDetail, IndexedMutation, TestCaseMetadata};

/// Artifact schema version.
pub const FORMAT_VERSION: &str = "1.0";

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Quote a CSV field when needed.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn detail_or_none(value: Option<&str>) -> String {
    match value {
        None | Some("") => "None".to_string(),
        Some(other) => other.to_string(),
    }
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            warn!(path = %path.display(), error = %err, "artifact directory creation failed");
            return;
        }
    }
    if let Err(err) = std::fs::write(path, bytes) {
        warn!(path = %path.display(), error = %err, "artifact write failed");
    }
}

#[derive(Serialize)]
struct TestInfoJson {
    test_id: u32,
    test_name: String,
    result: String,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct ExceptionJson {
    #[serde(rename = "type")]
    type_name: String,
    message: String,
    stack_trace: String,
}

impl ExceptionJson {
    fn from_detail(detail: &ExceptionDetail) -> Self {
        Self {
            type_name: detail_or_none(detail.type_name.as_deref()),
            message: detail_or_none(detail.message.as_deref()),
            stack_trace: detail_or_none(detail.stack.as_deref()),
        }
    }
}

#[derive(Serialize)]
struct CoverageJson {
    line_coverage_bit_sequence: String,
    bit_sequence_length: usize,
}

#[derive(Serialize)]
struct MetadataJson {
    format_version: String,
    timestamp: i64,
}

impl MetadataJson {
    fn now() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            timestamp: now_millis(),
        }
    }
}

#[derive(Serialize)]
struct BaselineTestJson {
    test_info: TestInfoJson,
    exception: ExceptionJson,
    coverage: CoverageJson,
    metadata: MetadataJson,
}

fn result_label(passed: bool) -> &'static str {
    if passed { "pass" } else { "fail" }
}

fn baseline_test_json(meta: &TestCaseMetadata, coverage: &CoverageDb) -> BaselineTestJson {
    let bits: String = coverage
        .line_bits_for_test(&meta.test_name)
        .into_iter()
        .map(|b| if b { '1' } else { '0' })
        .collect();
    BaselineTestJson {
        test_info: TestInfoJson {
            test_id: meta.tc_id,
            test_name: meta.test_name.clone(),
            result: result_label(meta.passed).to_string(),
            execution_time_ms: meta.duration_ms,
        },
        exception: ExceptionJson::from_detail(&meta.exception),
        coverage: CoverageJson {
            bit_sequence_length: bits.len(),
            line_coverage_bit_sequence: bits,
        },
        metadata: MetadataJson::now(),
    }
}

/// Write `baselineTestResults/<tcID>_test_results.json` per test plus the
/// `tcs_outcome.csv` table.
pub fn write_baseline_artifacts(
    report_dir: &Path,
    baseline: &BaselineContext,
    coverage: &CoverageDb,
) {
    let dir = report_dir.join("baselineTestResults");
    let mut outcome_csv = String::from("tc_id,test_name,result,execution_time_ms\n");
    for name in baseline.test_order() {
        let Some(meta) = baseline.get(name) else { continue };
        let json = baseline_test_json(meta, coverage);
        let payload = serde_json::to_vec_pretty(&json).unwrap_or_default();
        write_file(&dir.join(format!("{}_test_results.json", meta.tc_id)), &payload);
        outcome_csv.push_str(&format!(
            "{},{},{},{}\n",
            meta.tc_id,
            csv_field(&meta.test_name),
            result_label(meta.passed),
            meta.duration_ms
        ));
    }
    write_file(&dir.join("tcs_outcome.csv"), outcome_csv.as_bytes());
}

/// Write `line_info.csv`: one row per line-coverage bit position.
pub fn write_line_info(report_dir: &Path, coverage: &CoverageDb, image: &ProgramImage) {
    let mut csv = String::from("bit_position,filename,method_line\n");
    for (position, line) in coverage.line_positions().iter().enumerate() {
        let filename = image
            .class(&line.class)
            .map(|c| c.source_file.clone())
            .unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{}\n",
            position,
            csv_field(&filename),
            csv_field(&format!("{}#{}:{}", line.method, line.descriptor, line.line))
        ));
    }
    write_file(&report_dir.join("line_info.csv"), csv.as_bytes());
}

fn package_path(class_name: &str) -> (PathBuf, String) {
    match class_name.rsplit_once('.') {
        Some((pkg, simple)) => (
            pkg.split('.').collect::<PathBuf>(),
            simple.to_string(),
        ),
        None => (PathBuf::new(), class_name.to_string()),
    }
}

/// Write `original/<pkg>/ORIGINAL_<Class>.class` + `.info` for every
/// mutable class. Called once, from the coordinator.
pub fn write_original_classes(report_dir: &Path, image: &ProgramImage, test_classes: &[String]) {
    use crate::bytecode::image::ByteSource;

    for name in crate::discovery::mutable_classes(image, test_classes) {
        let Some(bytes) = image.class_bytes(&name) else { continue };
        let (pkg, simple) = package_path(&name);
        let dir = report_dir.join("original").join(pkg);
        write_file(&dir.join(format!("ORIGINAL_{simple}.class")), &bytes);
        let source_file = image
            .class(&name)
            .map(|c| c.source_file.clone())
            .unwrap_or_default();
        let info = format!("class: {name}\nsource_file: {source_file}\nbytes: {}\n", bytes.len());
        write_file(&dir.join(format!("ORIGINAL_{simple}.info")), info.as_bytes());
    }
}

/// Path of one mutant's class artifact:
/// `mutants/<pkg>/<Class>/<method>/Line_<L>_Index_<I>_<mutator>.class`.
pub fn mutant_artifact_path(report_dir: &Path, mutation: &IndexedMutation) -> PathBuf {
    let id = &mutation.details.id;
    let (pkg, simple) = package_path(&id.location.class);
    report_dir
        .join("mutants")
        .join(pkg)
        .join(simple)
        .join(&id.location.method)
        .join(format!(
            "Line_{}_Index_{}_{}.class",
            mutation.details.line, id.index, id.operator
        ))
}

/// Write one mutant's class bytes plus its `.info` sidecar.
pub fn write_mutant_artifact(report_dir: &Path, mutation: &IndexedMutation, bytes: &[u8]) {
    let path = mutant_artifact_path(report_dir, mutation);
    write_file(&path, bytes);
    let id = &mutation.details.id;
    let info = format!(
        "mutant_id: {}\nclass: {}\nmethod: {}{}\nline: {}\nmutator: {}\ndescription: {}\n",
        mutation.mutant_id,
        id.location.class,
        id.location.method,
        id.location.descriptor,
        mutation.details.line,
        id.operator,
        id.description
    );
    write_file(&path.with_extension("info"), info.as_bytes());
}

#[derive(Serialize)]
struct MutationInfoJson {
    mutation_id: u64,
    description: String,
    num_tests_executed: usize,
}

#[derive(Serialize)]
struct TestResultJson {
    test_name: String,
    result: String,
    exception: ExceptionJson,
    execution_time_ms: u64,
}

#[derive(Serialize)]
struct MutationSummaryJson {
    total: usize,
    passed: usize,
    failed: usize,
    pass_rate: f64,
}

#[derive(Serialize)]
struct MutantResultJson {
    mutation_info: MutationInfoJson,
    test_results: Vec<TestResultJson>,
    summary: MutationSummaryJson,
    metadata: MetadataJson,
}

/// Write `mutationResults/<mutant_id>_mutation_test_results.json`.
pub fn write_mutant_results_json(
    report_dir: &Path,
    mutation: &IndexedMutation,
    detailed: &[DetailedTestResult],
) {
    let passed = detailed.iter().filter(|r| r.passed).count();
    let failed = detailed.len() - passed;
    let pass_rate = if detailed.is_empty() {
        0.0
    } else {
        passed as f64 * 100.0 / detailed.len() as f64
    };
    let json = MutantResultJson {
        mutation_info: MutationInfoJson {
            mutation_id: mutation.mutant_id,
            description: mutation.details.id.description.clone(),
            num_tests_executed: detailed.len(),
        },
        test_results: detailed
            .iter()
            .map(|r| TestResultJson {
                test_name: r.test_name.clone(),
                result: result_label(r.passed).to_string(),
                exception: ExceptionJson::from_detail(&r.exception),
                execution_time_ms: r.duration_ms,
            })
            .collect(),
        summary: MutationSummaryJson {
            total: detailed.len(),
            passed,
            failed,
            pass_rate,
        },
        metadata: MetadataJson::now(),
    };
    let payload = serde_json::to_vec_pretty(&json).unwrap_or_default();
    write_file(
        &report_dir
            .join("mutationResults")
            .join(format!("{}_mutation_test_results.json", mutation.mutant_id)),
        &payload,
    );
}
