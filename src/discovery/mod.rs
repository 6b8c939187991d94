//! Mutation discovery: catalog walk, covering-test attachment, filtering,
//! dense id assignment, and analysis-unit grouping.

pub mod interceptors;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

use crate::bytecode::image::{ByteSource, ProgramImage};
use crate::coverage::{BlockLocation, CoverageDb};
use crate::model::{IndexedMutation, MutationDetails};
use crate::operators::{CatalogError, OperatorCatalog};

pub use interceptors::{
    EquivalentMutantSuppressor, FailingLineFilter, FilterError, HistoryFilter,
    InlinedCodeConsolidator, InterceptorContext, MutationInterceptor, run_pipeline,
};

/// Discovery failure for one class.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Catalog failure on a loadable class.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Enumerate the mutations of one class, attaching source position and
/// covering tests from block coverage.
///
/// Pure with respect to its inputs: repeated calls return identical lists.
pub fn discover_class_mutations(
    class_name: &str,
    image: &ProgramImage,
    catalog: &OperatorCatalog,
    coverage: &CoverageDb,
) -> Result<Vec<MutationDetails>, DiscoveryError> {
    let Some(bytes) = image.class_bytes(class_name) else {
        return Ok(Vec::new());
    };
    let source_file = image
        .class(class_name)
        .map(|c| c.source_file.clone())
        .unwrap_or_default();

    let mut out = Vec::new();
    for id in catalog.discover(&bytes)? {
        let line = catalog.line_of(&id, &bytes)?;
        let covering_tests = coverage.tests_covering_block(&BlockLocation::of_mutation(&id.location));
        out.push(MutationDetails {
            id,
            source_file: source_file.clone(),
            line,
            covering_tests,
        });
    }
    Ok(out)
}

/// Classes of the image eligible for mutation: everything except the test
/// classes, in sorted order.
pub fn mutable_classes(image: &ProgramImage, test_classes: &[String]) -> Vec<String> {
    let excluded: BTreeSet<&str> = test_classes.iter().map(String::as_str).collect();
    image
        .class_names()
        .filter(|name| !excluded.contains(name))
        .map(str::to_string)
        .collect()
}

/// Enumerate mutations across all mutable classes. A class whose bytes
/// cannot be processed contributes no mutants and is logged.
pub fn discover_all(
    image: &ProgramImage,
    catalog: &OperatorCatalog,
    coverage: &CoverageDb,
    test_classes: &[String],
) -> Vec<(String, Vec<MutationDetails>)> {
    let mut out = Vec::new();
    for class in mutable_classes(image, test_classes) {
        match discover_class_mutations(&class, image, catalog, coverage) {
            Ok(mutations) => out.push((class, mutations)),
            Err(err) => {
                warn!(class = %class, error = %err, "discovery failed; class contributes no mutants");
            }
        }
    }
    out
}

/// Assign the dense mutant-id sequence. Called exactly once per run, after
/// all filtering; ids are never reused.
pub fn index_mutations(mutations: Vec<MutationDetails>) -> Vec<IndexedMutation> {
    mutations
        .into_iter()
        .enumerate()
        .map(|(i, details)| IndexedMutation {
            mutant_id: i as u64,
            details,
        })
        .collect()
}

/// A scheduling unit: a non-empty, contiguous, same-class run of mutants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisUnit {
    /// The mutants of this unit, in mutant-id order.
    pub mutants: Vec<IndexedMutation>,
}

impl AnalysisUnit {
    /// Class shared by every mutant of the unit.
    pub fn class(&self) -> &str {
        &self.mutants[0].details.id.location.class
    }

    /// Scheduling priority: the mutant count.
    pub fn priority(&self) -> usize {
        self.mutants.len()
    }
}

/// Group indexed mutations into per-class units capped at `unit_size`,
/// ordered largest-first for scheduling.
pub fn group_into_units(mutations: &[IndexedMutation], unit_size: usize) -> Vec<AnalysisUnit> {
    let mut units = Vec::new();
    let mut current: Vec<IndexedMutation> = Vec::new();

    for mutation in mutations {
        let same_class = current
            .first()
            .is_some_and(|head| head.details.id.location.class == mutation.details.id.location.class);
        if (!current.is_empty() && !same_class) || current.len() == unit_size {
            units.push(AnalysisUnit {
                mutants: std::mem::take(&mut current),
            });
        }
        current.push(mutation.clone());
    }
    if !current.is_empty() {
        units.push(AnalysisUnit { mutants: current });
    }

    units.sort_by_key(|u| std::cmp::Reverse(u.priority()));
    units
}

/// Research-mode batch cap by test-class count.
pub fn research_batch_cap(test_class_count: usize) -> usize {
    if test_class_count > 1000 {
        5
    } else if test_class_count > 500 {
        10
    } else if test_class_count > 100 {
        25
    } else {
        50
    }
}
