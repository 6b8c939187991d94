//! Mutation operator catalog.
//!
//! Each sub-operator is a tagged enum variant that scans a method's
//! instruction stream and yields candidates; a candidate rewrites one site
//! either by replacing the instruction with a stack-balanced sequence or by
//! inserting a stack-balanced sequence after it. Candidate order follows
//! instruction order, so the per-(method, operator) candidate index is
//! stable across runs.
//!
//! The catalog's two operations are pure and deterministic:
//! [`OperatorCatalog::discover`] lists identities without producing bytes;
//! [`OperatorCatalog::produce`] materializes one mutant's class bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bytecode::image::{ClassBytesError, decode_class, encode_class};
use crate::bytecode::insn::{Insn, LineEntry, Method, Ty};
use crate::model::{MethodLocation, MutationId};

mod abs;
mod aod;
mod aor;
mod classic;
mod crcr;
mod obbn;
mod ror;
mod uoi;

/// Variant of the remove-conditionals family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoveMode {
    /// Equality checks, branch always taken.
    EqualIf,
    /// Equality checks, branch never taken.
    EqualElse,
    /// Order checks, branch always taken.
    OrderIf,
    /// Order checks, branch never taken.
    OrderElse,
}

impl RemoveMode {
    /// All four variants.
    pub const ALL: [RemoveMode; 4] = [
        RemoveMode::EqualIf,
        RemoveMode::EqualElse,
        RemoveMode::OrderIf,
        RemoveMode::OrderElse,
    ];
}

/// One sub-operator of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Arithmetic operator replacement, variants 1–4.
    Aor(u8),
    /// Relational operator replacement, variants 1–5.
    Ror(u8),
    /// Constant replacement, variants 1–6.
    Crcr(u8),
    /// Unary operator insertion, variants 1–4.
    Uoi(u8),
    /// Arithmetic operand deletion, variants 1–2.
    Aod(u8),
    /// Bitwise operator mutation, variants 1–3.
    Obbn(u8),
    /// Negate a numeric load.
    Abs,
    /// Conditional boundary: `<` ↔ `<=`, `>` ↔ `>=`.
    ConditionalsBoundary,
    /// Classical math operator swap.
    Math,
    /// Negate relational predicates.
    NegateConditionals,
    /// Remove a conditional branch.
    RemoveConditionals(RemoveMode),
    /// Remove calls to void methods.
    VoidMethodCalls,
    /// Replace non-void calls with the return type's zero.
    NonVoidMethodCalls,
    /// Replace returned values with the type's zero.
    ReturnValues,
}

impl Operator {
    /// Canonical external name, e.g. `AOR_2`.
    pub fn name(&self) -> String {
        match self {
            Operator::Aor(n) => format!("AOR_{n}"),
            Operator::Ror(n) => format!("ROR_{n}"),
            Operator::Crcr(n) => format!("CRCR_{n}"),
            Operator::Uoi(n) => format!("UOI_{n}"),
            Operator::Aod(n) => format!("AOD_{n}"),
            Operator::Obbn(n) => format!("OBBN_{n}"),
            Operator::Abs => "ABS".to_string(),
            Operator::ConditionalsBoundary => "CONDITIONALS_BOUNDARY".to_string(),
            Operator::Math => "MATH".to_string(),
            Operator::NegateConditionals => "NEGATE_CONDITIONALS".to_string(),
            Operator::RemoveConditionals(mode) => match mode {
                RemoveMode::EqualIf => "REMOVE_CONDITIONALS_EQUAL_IF".to_string(),
                RemoveMode::EqualElse => "REMOVE_CONDITIONALS_EQUAL_ELSE".to_string(),
                RemoveMode::OrderIf => "REMOVE_CONDITIONALS_ORDER_IF".to_string(),
                RemoveMode::OrderElse => "REMOVE_CONDITIONALS_ORDER_ELSE".to_string(),
            },
            Operator::VoidMethodCalls => "VOID_METHOD_CALLS".to_string(),
            Operator::NonVoidMethodCalls => "NON_VOID_METHOD_CALLS".to_string(),
            Operator::ReturnValues => "RETURN_VALS".to_string(),
        }
    }

    /// Parse a single sub-operator name (no groups).
    pub fn parse_single(name: &str) -> Option<Operator> {
        let numbered = |prefix: &str, max: u8, make: fn(u8) -> Operator| -> Option<Operator> {
            let rest = name.strip_prefix(prefix)?;
            let n: u8 = rest.parse().ok()?;
            (1..=max).contains(&n).then(|| make(n))
        };
        match name {
            "ABS" => Some(Operator::Abs),
            "CONDITIONALS_BOUNDARY" => Some(Operator::ConditionalsBoundary),
            "MATH" => Some(Operator::Math),
            "NEGATE_CONDITIONALS" => Some(Operator::NegateConditionals),
            "REMOVE_CONDITIONALS_EQUAL_IF" => {
                Some(Operator::RemoveConditionals(RemoveMode::EqualIf))
            }
            "REMOVE_CONDITIONALS_EQUAL_ELSE" => {
                Some(Operator::RemoveConditionals(RemoveMode::EqualElse))
            }
            "REMOVE_CONDITIONALS_ORDER_IF" => {
                Some(Operator::RemoveConditionals(RemoveMode::OrderIf))
            }
            "REMOVE_CONDITIONALS_ORDER_ELSE" => {
                Some(Operator::RemoveConditionals(RemoveMode::OrderElse))
            }
            "VOID_METHOD_CALLS" => Some(Operator::VoidMethodCalls),
            "NON_VOID_METHOD_CALLS" => Some(Operator::NonVoidMethodCalls),
            "RETURN_VALS" => Some(Operator::ReturnValues),
            _ => numbered("AOR_", 4, Operator::Aor)
                .or_else(|| numbered("ROR_", 5, Operator::Ror))
                .or_else(|| numbered("CRCR_", 6, Operator::Crcr))
                .or_else(|| numbered("UOI_", 4, Operator::Uoi))
                .or_else(|| numbered("AOD_", 2, Operator::Aod))
                .or_else(|| numbered("OBBN_", 3, Operator::Obbn)),
        }
    }

    fn family(prefix: &str) -> Option<Vec<Operator>> {
        let make: (fn(u8) -> Operator, u8) = match prefix {
            "AOR" => (Operator::Aor, 4),
            "ROR" => (Operator::Ror, 5),
            "CRCR" => (Operator::Crcr, 6),
            "UOI" => (Operator::Uoi, 4),
            "AOD" => (Operator::Aod, 2),
            "OBBN" => (Operator::Obbn, 3),
            _ => return None,
        };
        Some((1..=make.1).map(make.0).collect())
    }

    fn defaults() -> Vec<Operator> {
        vec![
            Operator::ConditionalsBoundary,
            Operator::Math,
            Operator::NegateConditionals,
            Operator::VoidMethodCalls,
            Operator::ReturnValues,
        ]
    }

    fn stronger() -> Vec<Operator> {
        let mut ops = Self::defaults();
        ops.push(Operator::RemoveConditionals(RemoveMode::EqualElse));
        ops.push(Operator::NonVoidMethodCalls);
        ops
    }

    fn comprehensive() -> Vec<Operator> {
        let mut ops = Vec::new();
        for prefix in ["AOR", "AOD", "UOI", "CRCR", "OBBN", "ROR"] {
            ops.extend(Self::family(prefix).expect("known family"));
        }
        ops.push(Operator::Abs);
        ops
    }

    fn all() -> Vec<Operator> {
        let mut ops = Self::defaults();
        ops.extend(
            RemoveMode::ALL
                .into_iter()
                .map(Operator::RemoveConditionals),
        );
        ops.push(Operator::NonVoidMethodCalls);
        ops.extend(Self::comprehensive());
        ops
    }

    /// Expand one selection token (single name or group) into sub-operators.
    pub fn expand(token: &str) -> Option<Vec<Operator>> {
        if let Some(op) = Self::parse_single(token) {
            return Some(vec![op]);
        }
        match token {
            "DEFAULTS" => Some(Self::defaults()),
            "STRONGER" => Some(Self::stronger()),
            "COMPREHENSIVE" => Some(Self::comprehensive()),
            "ALL" => Some(Self::all()),
            "REMOVE_CONDITIONALS" => Some(
                RemoveMode::ALL
                    .into_iter()
                    .map(Operator::RemoveConditionals)
                    .collect(),
            ),
            _ => token
                .strip_suffix("_ALL")
                .and_then(Self::family),
        }
    }

    pub(crate) fn scan(&self, method: &Method) -> Vec<Candidate> {
        match self {
            Operator::Aor(n) => aor::scan(*n, method),
            Operator::Ror(n) => ror::scan(*n, method),
            Operator::Crcr(n) => crcr::scan(*n, method),
            Operator::Uoi(n) => uoi::scan(*n, method),
            Operator::Aod(n) => aod::scan(*n, method),
            Operator::Obbn(n) => obbn::scan(*n, method),
            Operator::Abs => abs::scan(method),
            Operator::ConditionalsBoundary => classic::scan_conditionals_boundary(method),
            Operator::Math => classic::scan_math(method),
            Operator::NegateConditionals => classic::scan_negate_conditionals(method),
            Operator::RemoveConditionals(mode) => classic::scan_remove_conditionals(*mode, method),
            Operator::VoidMethodCalls => classic::scan_void_method_calls(method),
            Operator::NonVoidMethodCalls => classic::scan_non_void_method_calls(method),
            Operator::ReturnValues => classic::scan_return_values(method),
        }
    }
}

/// Unknown token in an operator selection.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown operator selection: {0}")]
pub struct UnknownOperatorError(pub String);

/// Expand a list of selection tokens, deduplicating while preserving the
/// first-occurrence order.
pub fn parse_selection<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Operator>, UnknownOperatorError> {
    let mut out = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        let ops = Operator::expand(token)
            .ok_or_else(|| UnknownOperatorError(token.to_string()))?;
        for op in ops {
            if !out.contains(&op) {
                out.push(op);
            }
        }
    }
    Ok(out)
}

/// How a candidate rewrites its site.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Rewrite {
    /// Replace the instruction with the sequence.
    Replace(Vec<Insn>),
    /// Insert the sequence after the instruction.
    InsertAfter(Vec<Insn>),
}

/// One mutation site found by a sub-operator scan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    /// Index of the mutated instruction.
    pub index: usize,
    /// Human-readable description of the change.
    pub description: String,
    /// The rewrite to apply.
    pub rewrite: Rewrite,
}

/// Pop instruction matching the width of `ty`.
pub(crate) fn pop_for(ty: Ty) -> Insn {
    if ty.is_wide() { Insn::Pop2 } else { Insn::Pop }
}

/// Duplicate instruction matching the width of `ty`.
pub(crate) fn dup_for(ty: Ty) -> Insn {
    if ty.is_wide() { Insn::Dup2 } else { Insn::Dup }
}

/// Operand-deletion sequence keeping the first operand of a `ty ⊕ ty` pair.
pub(crate) fn keep_first(ty: Ty) -> Vec<Insn> {
    vec![pop_for(ty)]
}

/// Operand-deletion sequence keeping the second operand of a `ty ⊕ ty` pair.
///
/// Category 1 swaps and pops; category 2 has no swap and uses the
/// dup2_x2/pop2/pop2 pattern.
pub(crate) fn keep_second(ty: Ty) -> Vec<Insn> {
    if ty.is_wide() {
        vec![Insn::Dup2X2, Insn::Pop2, Insn::Pop2]
    } else {
        vec![Insn::Swap, Insn::Pop]
    }
}

/// Apply a candidate's rewrite, remapping branch targets and the line table.
pub(crate) fn apply_candidate(method: &Method, candidate: &Candidate) -> Method {
    let (replace, seq) = match &candidate.rewrite {
        Rewrite::Replace(seq) => (true, seq),
        Rewrite::InsertAfter(seq) => (false, seq),
    };
    let at = candidate.index;
    let added = if replace { seq.len() - 1 } else { seq.len() };

    let remap = |t: u32| -> u32 {
        if (t as usize) <= at { t } else { t + added as u32 }
    };

    let mut insns: Vec<Insn> = Vec::with_capacity(method.insns.len() + added);
    for (i, insn) in method.insns.iter().enumerate() {
        if replace && i == at {
            for new_insn in seq {
                let mut new_insn = new_insn.clone();
                if let Some(t) = new_insn.target() {
                    new_insn.set_target(remap(t));
                }
                insns.push(new_insn);
            }
            continue;
        }
        let mut insn = insn.clone();
        if let Some(t) = insn.target() {
            insn.set_target(remap(t));
        }
        insns.push(insn);
        if !replace && i == at {
            for new_insn in seq {
                let mut new_insn = new_insn.clone();
                if let Some(t) = new_insn.target() {
                    new_insn.set_target(remap(t));
                }
                insns.push(new_insn);
            }
        }
    }

    let lines = method
        .lines
        .iter()
        .map(|e| LineEntry {
            start: remap(e.start),
            line: e.line,
        })
        .collect();

    Method {
        name: method.name.clone(),
        args: method.args.clone(),
        ret: method.ret,
        max_locals: method.max_locals,
        max_stack: method.max_stack,
        insns,
        lines,
    }
}

/// Catalog failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Class bytes did not decode.
    #[error(transparent)]
    Bytes(#[from] ClassBytesError),
    /// The identifier names an operator the catalog does not know.
    #[error("unknown operator in identifier: {0}")]
    UnknownOperator(String),
    /// The identifier names a method absent from the class.
    #[error("method {method}{descriptor} not found in {class}")]
    MissingMethod {
        /// Class name.
        class: String,
        /// Method name.
        method: String,
        /// Method descriptor.
        descriptor: String,
    },
    /// The identifier's candidate index does not exist in the current scan.
    #[error("stale mutation identifier: {0}")]
    StaleIdentifier(String),
}

/// The configured set of sub-operators, with the two catalog operations.
#[derive(Debug, Clone)]
pub struct OperatorCatalog {
    operators: Vec<Operator>,
}

impl OperatorCatalog {
    /// Catalog over an explicit operator list.
    pub fn new(operators: Vec<Operator>) -> Self {
        Self { operators }
    }

    /// The configured sub-operators, in selection order.
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Enumerate all mutation identities in a class. Pure: no bytecode is
    /// produced, and repeated calls return identical sequences.
    pub fn discover(&self, class_bytes: &[u8]) -> Result<Vec<MutationId>, CatalogError> {
        let class = decode_class(class_bytes)?;
        let mut out = Vec::new();
        for method in &class.methods {
            let descriptor = method.descriptor();
            for operator in &self.operators {
                for (k, candidate) in operator.scan(method).into_iter().enumerate() {
                    out.push(MutationId {
                        location: MethodLocation {
                            class: class.name.clone(),
                            method: method.name.clone(),
                            descriptor: descriptor.clone(),
                            first_line: method.first_line(),
                            block: method.block_of(candidate.index),
                        },
                        operator: operator.name(),
                        index: k as u32,
                        description: candidate.description,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Materialize one mutant's class bytes. Deterministic for a given
    /// identifier and class bytes.
    pub fn produce(&self, id: &MutationId, class_bytes: &[u8]) -> Result<Vec<u8>, CatalogError> {
        let mut class = decode_class(class_bytes)?;
        let operator = Operator::parse_single(&id.operator)
            .ok_or_else(|| CatalogError::UnknownOperator(id.operator.clone()))?;

        let slot = class
            .methods
            .iter()
            .position(|m| m.name == id.location.method && m.descriptor() == id.location.descriptor)
            .ok_or_else(|| CatalogError::MissingMethod {
                class: class.name.clone(),
                method: id.location.method.clone(),
                descriptor: id.location.descriptor.clone(),
            })?;

        let candidates = operator.scan(&class.methods[slot]);
        let candidate = candidates
            .get(id.index as usize)
            .ok_or_else(|| CatalogError::StaleIdentifier(id.key()))?;

        class.methods[slot] = apply_candidate(&class.methods[slot], candidate);
        Ok(encode_class(&class))
    }

    /// Mutated line of a candidate identifier in a class, for artifact
    /// naming and coverage attachment.
    pub fn line_of(&self, id: &MutationId, class_bytes: &[u8]) -> Result<u32, CatalogError> {
        let class = decode_class(class_bytes)?;
        let operator = Operator::parse_single(&id.operator)
            .ok_or_else(|| CatalogError::UnknownOperator(id.operator.clone()))?;
        let method = class
            .method(&id.location.method, &id.location.descriptor)
            .ok_or_else(|| CatalogError::MissingMethod {
                class: class.name.clone(),
                method: id.location.method.clone(),
                descriptor: id.location.descriptor.clone(),
            })?;
        let candidates = operator.scan(method);
        let candidate = candidates
            .get(id.index as usize)
            .ok_or_else(|| CatalogError::StaleIdentifier(id.key()))?;
        Ok(method.line_at(candidate.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::insn::{ArithOp, ClassFile, CmpOp, Value};

    fn sample_class() -> ClassFile {
        ClassFile {
            name: "demo.Calc".to_string(),
            source_file: "Calc.src".to_string(),
            methods: vec![Method {
                name: "clamp".to_string(),
                args: vec![Ty::Int, Ty::Int],
                ret: Some(Ty::Int),
                max_locals: 2,
                max_stack: 4,
                insns: vec![
                    Insn::Load { ty: Ty::Int, slot: 0 },
                    Insn::Load { ty: Ty::Int, slot: 1 },
                    Insn::IfCmp { op: CmpOp::Lt, target: 4 },
                    Insn::Goto { target: 6 },
                    Insn::Load { ty: Ty::Int, slot: 0 },
                    Insn::Return(Some(Ty::Int)),
                    Insn::Load { ty: Ty::Int, slot: 1 },
                    Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                    Insn::Return(Some(Ty::Int)),
                ],
                lines: vec![LineEntry { start: 0, line: 7 }],
            }],
        }
    }

    #[test]
    fn selection_parsing_expands_families_and_groups() {
        let ops = parse_selection(&["AOR_ALL"]).unwrap();
        assert_eq!(ops, vec![
            Operator::Aor(1),
            Operator::Aor(2),
            Operator::Aor(3),
            Operator::Aor(4)
        ]);

        let all = parse_selection(&["ALL"]).unwrap();
        assert!(all.contains(&Operator::Abs));
        assert!(all.contains(&Operator::Math));
        assert!(all.contains(&Operator::RemoveConditionals(RemoveMode::OrderIf)));

        let comprehensive = parse_selection(&["COMPREHENSIVE"]).unwrap();
        assert_eq!(comprehensive.len(), 4 + 2 + 4 + 6 + 3 + 5 + 1);

        assert!(parse_selection(&["AOR_9"]).is_err());
        assert!(parse_selection(&["NOPE"]).is_err());
    }

    #[test]
    fn selection_parsing_deduplicates_preserving_order() {
        let ops = parse_selection(&["AOR_2", "AOR_ALL"]).unwrap();
        assert_eq!(ops[0], Operator::Aor(2));
        assert_eq!(ops.len(), 4);
    }

    #[test]
    fn every_operator_name_roundtrips() {
        for op in Operator::all() {
            assert_eq!(Operator::parse_single(&op.name()), Some(op));
        }
    }

    #[test]
    fn discover_is_deterministic_and_produce_matches() {
        let bytes = encode_class(&sample_class());
        let catalog = OperatorCatalog::new(parse_selection(&["ALL"]).unwrap());

        let a = catalog.discover(&bytes).unwrap();
        let b = catalog.discover(&bytes).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());

        for id in &a {
            let first = catalog.produce(id, &bytes).unwrap();
            let second = catalog.produce(id, &bytes).unwrap();
            assert_eq!(first, second);
            assert_ne!(first, bytes, "{id} produced identical bytes");
        }
    }

    #[test]
    fn produce_rejects_stale_and_unknown_identifiers() {
        let bytes = encode_class(&sample_class());
        let catalog = OperatorCatalog::new(vec![Operator::Aor(1)]);
        let mut id = catalog.discover(&bytes).unwrap().remove(0);

        id.index = 99;
        assert!(matches!(
            catalog.produce(&id, &bytes),
            Err(CatalogError::StaleIdentifier(_))
        ));

        id.index = 0;
        id.operator = "XYZ_1".to_string();
        assert!(matches!(
            catalog.produce(&id, &bytes),
            Err(CatalogError::UnknownOperator(_))
        ));

        id.operator = "AOR_1".to_string();
        id.location.method = "missing".to_string();
        assert!(matches!(
            catalog.produce(&id, &bytes),
            Err(CatalogError::MissingMethod { .. })
        ));
    }

    #[test]
    fn insert_after_remaps_downstream_branch_targets() {
        let method = sample_class().methods.remove(0);
        let candidate = Candidate {
            index: 0,
            description: "test".to_string(),
            rewrite: Rewrite::InsertAfter(vec![Insn::Neg { ty: Ty::Int }]),
        };
        let mutated = apply_candidate(&method, &candidate);
        assert_eq!(mutated.insns.len(), method.insns.len() + 1);
        assert_eq!(mutated.insns[1], Insn::Neg { ty: Ty::Int });
        // Branch targets beyond the insertion shift by one.
        assert_eq!(mutated.insns[3], Insn::IfCmp { op: CmpOp::Lt, target: 5 });
        assert_eq!(mutated.insns[4], Insn::Goto { target: 7 });
    }

    #[test]
    fn replace_keeps_targets_at_the_site() {
        let method = sample_class().methods.remove(0);
        // Replace the IfCmp with a two-instruction sequence; the Goto past it
        // shifts, the branch into instruction 0 does not.
        let candidate = Candidate {
            index: 2,
            description: "test".to_string(),
            rewrite: Rewrite::Replace(vec![Insn::Pop, Insn::Pop]),
        };
        let mutated = apply_candidate(&method, &candidate);
        assert_eq!(mutated.insns.len(), method.insns.len() + 1);
        assert_eq!(mutated.insns[4], Insn::Goto { target: 7 });
    }

    #[test]
    fn sample_class_test_fixture_is_not_degenerate() {
        let bytes = encode_class(&sample_class());
        let catalog = OperatorCatalog::new(vec![Operator::Crcr(1)]);
        // No constants in the fixture: CRCR finds nothing, and that is fine.
        assert!(catalog.discover(&bytes).unwrap().is_empty());
    }
}
