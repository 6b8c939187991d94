//! AOD: arithmetic operand deletion.
//!
//! Deletes one operand of a binary arithmetic operation while preserving
//! stack balance. AOD_1 keeps the first operand (pops the second); AOD_2
//! keeps the second (swap-and-pop for category 1, dup2_x2/pop2/pop2 for
//! category 2, which has no swap).

use crate::bytecode::insn::{Insn, Method};

use super::{Candidate, Rewrite, keep_first, keep_second};

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Arith { ty, op } = insn else { continue };
        let (seq, removed) = if n == 1 {
            (keep_first(*ty), "second")
        } else {
            (keep_second(*ty), "first")
        };
        out.push(Candidate {
            index: i,
            description: format!("removed {removed} operand of {ty} {}", op.glyph()),
            rewrite: Rewrite::Replace(seq),
        });
    }
    out
}
