//! Matrix and artifact emission.

pub mod artifacts;
pub mod emitter;

pub use artifacts::{
    mutant_artifact_path, write_baseline_artifacts, write_line_info, write_mutant_artifact,
    write_mutant_results_json, write_original_classes,
};
pub use emitter::{MatrixEmitter, SummaryRecord};
