//! OBBN: bitwise operator mutation.
//!
//! OBBN_1 reverses the operator (`&` ↔ `|`, `^` → `&`); OBBN_2 drops the
//! second operand; OBBN_3 drops the first. The deletion forms reuse the
//! category-aware operand-deletion patterns.

use crate::bytecode::insn::{BitOp, Insn, Method};

use super::{Candidate, Rewrite, keep_first, keep_second};

fn reversed(op: BitOp) -> BitOp {
    match op {
        BitOp::And => BitOp::Or,
        BitOp::Or => BitOp::And,
        BitOp::Xor => BitOp::And,
    }
}

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Bit { ty, op } = insn else { continue };
        let candidate = match n {
            1 => {
                let new_op = reversed(*op);
                Candidate {
                    index: i,
                    description: format!("replaced {} with {}", op.glyph(), new_op.glyph()),
                    rewrite: Rewrite::Replace(vec![Insn::Bit { ty: *ty, op: new_op }]),
                }
            }
            2 => Candidate {
                index: i,
                description: format!("removed second operand of {}", op.glyph()),
                rewrite: Rewrite::Replace(keep_first(*ty)),
            },
            _ => Candidate {
                index: i,
                description: format!("removed first operand of {}", op.glyph()),
                rewrite: Rewrite::Replace(keep_second(*ty)),
            },
        };
        out.push(candidate);
    }
    out
}
