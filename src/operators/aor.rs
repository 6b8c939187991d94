//! AOR: arithmetic operator replacement.
//!
//! Replacement table, applied per numeric type:
//!
//! | original | AOR_1 | AOR_2 | AOR_3 | AOR_4 |
//! |---|---|---|---|---|
//! | `+` | `-` | `*` | `/` | `%` |
//! | `-` | `+` | `*` | `/` | `%` |
//! | `*` | `/` | `%` | `+` | `-` |
//! | `/` | `*` | `%` | `+` | `-` |
//! | `%` | `*` | `/` | `+` | `-` |

use crate::bytecode::insn::{ArithOp, Insn, Method};

use super::{Candidate, Rewrite};

/// Replacement for `op` under variant `n` (1-based).
pub(super) fn replacement(op: ArithOp, n: u8) -> ArithOp {
    let row = match op {
        ArithOp::Add => [ArithOp::Sub, ArithOp::Mul, ArithOp::Div, ArithOp::Rem],
        ArithOp::Sub => [ArithOp::Add, ArithOp::Mul, ArithOp::Div, ArithOp::Rem],
        ArithOp::Mul => [ArithOp::Div, ArithOp::Rem, ArithOp::Add, ArithOp::Sub],
        ArithOp::Div => [ArithOp::Mul, ArithOp::Rem, ArithOp::Add, ArithOp::Sub],
        ArithOp::Rem => [ArithOp::Mul, ArithOp::Div, ArithOp::Add, ArithOp::Sub],
    };
    row[(n - 1) as usize]
}

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        if let Insn::Arith { ty, op } = insn {
            let new_op = replacement(*op, n);
            out.push(Candidate {
                index: i,
                description: format!(
                    "replaced {ty} {} with {}",
                    op.glyph(),
                    new_op.glyph()
                ),
                rewrite: Rewrite::Replace(vec![Insn::Arith { ty: *ty, op: new_op }]),
            });
        }
    }
    out
}
