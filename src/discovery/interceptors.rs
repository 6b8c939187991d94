//! Mutation interceptor pipeline.
//!
//! Filters run over the immutable [`MutationDetails`] list of one class and
//! either accept, drop, or rewrite entries. A throwing filter fails the
//! unit: the coordinator reports its mutants as `run_error`.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::baseline::BaselineContext;
use crate::bytecode::image::{ByteSource, ProgramImage};
use crate::model::{MutationDetails, MutationStatus};
use crate::operators::OperatorCatalog;

/// A filter failed; the affected unit's mutants become `run_error`.
#[derive(Debug, Error)]
#[error("filter {name} failed: {message}")]
pub struct FilterError {
    /// Filter name.
    pub name: String,
    /// Failure description.
    pub message: String,
}

/// Shared read-only context handed to every filter.
pub struct InterceptorContext<'a> {
    /// The unmutated program image.
    pub image: &'a ProgramImage,
    /// The configured catalog.
    pub catalog: &'a OperatorCatalog,
    /// The published baseline.
    pub baseline: &'a BaselineContext,
}

/// One stage of the filter pipeline.
pub trait MutationInterceptor: Send + Sync {
    /// Filter name, used in error reporting.
    fn name(&self) -> &str;

    /// Accept, drop, or rewrite the mutations of one class.
    fn intercept(
        &self,
        mutations: Vec<MutationDetails>,
        ctx: &InterceptorContext<'_>,
    ) -> Result<Vec<MutationDetails>, FilterError>;
}

/// Run the pipeline stages in order.
pub fn run_pipeline(
    filters: &[Box<dyn MutationInterceptor>],
    mut mutations: Vec<MutationDetails>,
    ctx: &InterceptorContext<'_>,
) -> Result<Vec<MutationDetails>, FilterError> {
    for filter in filters {
        mutations = filter.intercept(mutations, ctx)?;
    }
    Ok(mutations)
}

/// Collapses compiler-inlined duplicates: candidates of the same operator
/// producing the same change on the same source line are kept once.
pub struct InlinedCodeConsolidator;

impl MutationInterceptor for InlinedCodeConsolidator {
    fn name(&self) -> &str {
        "inlined-code-consolidation"
    }

    fn intercept(
        &self,
        mutations: Vec<MutationDetails>,
        _ctx: &InterceptorContext<'_>,
    ) -> Result<Vec<MutationDetails>, FilterError> {
        let mut seen = BTreeSet::new();
        Ok(mutations
            .into_iter()
            .filter(|m| {
                seen.insert((
                    m.id.location.class.clone(),
                    m.line,
                    m.id.operator.clone(),
                    m.id.description.clone(),
                ))
            })
            .collect())
    }
}

/// Drops candidates whose produced bytes equal the original class bytes
/// (trivially equivalent mutants).
pub struct EquivalentMutantSuppressor;

impl MutationInterceptor for EquivalentMutantSuppressor {
    fn name(&self) -> &str {
        "equivalent-mutant-suppression"
    }

    fn intercept(
        &self,
        mutations: Vec<MutationDetails>,
        ctx: &InterceptorContext<'_>,
    ) -> Result<Vec<MutationDetails>, FilterError> {
        let mut kept = Vec::with_capacity(mutations.len());
        for m in mutations {
            let original = ctx.image.class_bytes(&m.id.location.class).ok_or_else(|| {
                FilterError {
                    name: self.name().to_string(),
                    message: format!("no bytes for {}", m.id.location.class),
                }
            })?;
            let mutated = ctx
                .catalog
                .produce(&m.id, &original)
                .map_err(|e| FilterError {
                    name: self.name().to_string(),
                    message: e.to_string(),
                })?;
            if mutated != original {
                kept.push(m);
            }
        }
        Ok(kept)
    }
}

/// Fault-localization filter: keeps only mutants whose line is covered by at
/// least one failing test.
pub struct FailingLineFilter;

impl MutationInterceptor for FailingLineFilter {
    fn name(&self) -> &str {
        "failing-line"
    }

    fn intercept(
        &self,
        mutations: Vec<MutationDetails>,
        ctx: &InterceptorContext<'_>,
    ) -> Result<Vec<MutationDetails>, FilterError> {
        Ok(mutations
            .into_iter()
            .filter(|m| {
                ctx.baseline
                    .failing_lines(&m.id.location.class)
                    .is_some_and(|lines| lines.contains(&m.line))
            })
            .collect())
    }
}

/// Skips mutants whose verdict is already known from an earlier run.
pub struct HistoryFilter {
    verdicts: BTreeMap<String, MutationStatus>,
}

impl HistoryFilter {
    /// Filter over a verdict map keyed by [`crate::model::MutationId::key`].
    pub fn new(verdicts: BTreeMap<String, MutationStatus>) -> Self {
        Self { verdicts }
    }
}

impl MutationInterceptor for HistoryFilter {
    fn name(&self) -> &str {
        "history"
    }

    fn intercept(
        &self,
        mutations: Vec<MutationDetails>,
        _ctx: &InterceptorContext<'_>,
    ) -> Result<Vec<MutationDetails>, FilterError> {
        Ok(mutations
            .into_iter()
            .filter(|m| {
                !self
                    .verdicts
                    .get(&m.id.key())
                    .is_some_and(|s| s.is_terminal() && !s.is_fault())
            })
            .collect())
    }
}
