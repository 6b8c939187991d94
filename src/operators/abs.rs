//! ABS: negate a numeric load.

use crate::bytecode::insn::{Insn, Method};

use super::{Candidate, Rewrite};

pub(super) fn scan(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Load { ty, slot } = insn else { continue };
        out.push(Candidate {
            index: i,
            description: format!("negated {ty} value of local {slot}"),
            rewrite: Rewrite::InsertAfter(vec![Insn::Neg { ty: *ty }]),
        });
    }
    out
}
