//! ROR: relational operator replacement.
//!
//! Covers both the two-operand integer compares and the single-operand
//! compare-to-zero forms. Replacement table:
//!
//! | original | ROR_1 | ROR_2 | ROR_3 | ROR_4 | ROR_5 |
//! |---|---|---|---|---|---|
//! | `<`  | `<=` | `>`  | `>=` | `==` | `!=` |
//! | `<=` | `<`  | `>`  | `>=` | `==` | `!=` |
//! | `>`  | `<`  | `<=` | `>=` | `==` | `!=` |
//! | `>=` | `<`  | `<=` | `>`  | `==` | `!=` |
//! | `==` | `<`  | `<=` | `>`  | `>=` | `!=` |
//! | `!=` | `<`  | `<=` | `>`  | `>=` | `==` |

use crate::bytecode::insn::{CmpOp, Insn, Method};

use super::{Candidate, Rewrite};

/// Replacement for `op` under variant `n` (1-based).
pub(super) fn replacement(op: CmpOp, n: u8) -> CmpOp {
    let row = match op {
        CmpOp::Lt => [CmpOp::Le, CmpOp::Gt, CmpOp::Ge, CmpOp::Eq, CmpOp::Ne],
        CmpOp::Le => [CmpOp::Lt, CmpOp::Gt, CmpOp::Ge, CmpOp::Eq, CmpOp::Ne],
        CmpOp::Gt => [CmpOp::Lt, CmpOp::Le, CmpOp::Ge, CmpOp::Eq, CmpOp::Ne],
        CmpOp::Ge => [CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Eq, CmpOp::Ne],
        CmpOp::Eq => [CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge, CmpOp::Ne],
        CmpOp::Ne => [CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge, CmpOp::Eq],
    };
    row[(n - 1) as usize]
}

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        match insn {
            Insn::IfCmp { op, target } => {
                let new_op = replacement(*op, n);
                out.push(Candidate {
                    index: i,
                    description: format!(
                        "replaced conditional {} with {}",
                        op.glyph(),
                        new_op.glyph()
                    ),
                    rewrite: Rewrite::Replace(vec![Insn::IfCmp {
                        op: new_op,
                        target: *target,
                    }]),
                });
            }
            Insn::IfZero { op, target } => {
                let new_op = replacement(*op, n);
                out.push(Candidate {
                    index: i,
                    description: format!(
                        "replaced zero-compare {} with {}",
                        op.glyph(),
                        new_op.glyph()
                    ),
                    rewrite: Rewrite::Replace(vec![Insn::IfZero {
                        op: new_op,
                        target: *target,
                    }]),
                });
            }
            _ => {}
        }
    }
    out
}
