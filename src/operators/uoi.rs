//! UOI: unary operator insertion on local-variable loads.
//!
//! UOI_1 post-increment, UOI_2 post-decrement, UOI_3 pre-increment,
//! UOI_4 pre-decrement. Post forms leave the original value on the stack
//! (load, dup, one, op, store); pre forms leave the updated value
//! (load, one, op, dup, store). Wide types use the two-slot dup.

use crate::bytecode::insn::{ArithOp, Insn, Method};

use super::{Candidate, Rewrite, dup_for};

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let (pre, op, verb) = match n {
        1 => (false, ArithOp::Add, "post-increment"),
        2 => (false, ArithOp::Sub, "post-decrement"),
        3 => (true, ArithOp::Add, "pre-increment"),
        _ => (true, ArithOp::Sub, "pre-decrement"),
    };

    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Load { ty, slot } = insn else { continue };
        let seq = if pre {
            vec![
                Insn::Const(ty.one()),
                Insn::Arith { ty: *ty, op },
                dup_for(*ty),
                Insn::Store { ty: *ty, slot: *slot },
            ]
        } else {
            vec![
                dup_for(*ty),
                Insn::Const(ty.one()),
                Insn::Arith { ty: *ty, op },
                Insn::Store { ty: *ty, slot: *slot },
            ]
        };
        out.push(Candidate {
            index: i,
            description: format!("inserted {verb} of local {slot}"),
            rewrite: Rewrite::InsertAfter(seq),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::insn::{Ty, Value};
    use crate::bytecode::stack::verify_method;
    use crate::operators::apply_candidate;

    fn load_return(ty: Ty) -> Method {
        Method {
            name: "id".to_string(),
            args: vec![ty],
            ret: Some(ty),
            max_locals: ty.slots(),
            max_stack: 3 * ty.slots(),
            insns: vec![
                Insn::Load { ty, slot: 0 },
                Insn::Return(Some(ty)),
            ],
            lines: Vec::new(),
        }
    }

    #[test]
    fn post_increment_follows_the_dup_then_store_pattern() {
        let m = load_return(Ty::Int);
        let found = scan(1, &m);
        assert_eq!(
            found[0].rewrite,
            Rewrite::InsertAfter(vec![
                Insn::Dup,
                Insn::Const(Value::Int(1)),
                Insn::Arith { ty: Ty::Int, op: ArithOp::Add },
                Insn::Store { ty: Ty::Int, slot: 0 },
            ])
        );
    }

    #[test]
    fn pre_decrement_duplicates_after_the_subtraction() {
        let m = load_return(Ty::Long);
        let found = scan(4, &m);
        assert_eq!(
            found[0].rewrite,
            Rewrite::InsertAfter(vec![
                Insn::Const(Value::Long(1)),
                Insn::Arith { ty: Ty::Long, op: ArithOp::Sub },
                Insn::Dup2,
                Insn::Store { ty: Ty::Long, slot: 0 },
            ])
        );
    }

    #[test]
    fn all_variants_verify_on_all_types_given_headroom() {
        for ty in [Ty::Int, Ty::Long, Ty::Float, Ty::Double] {
            let m = load_return(ty);
            for n in 1..=4 {
                let found = scan(n, &m);
                assert_eq!(found.len(), 1);
                let mutated = apply_candidate(&m, &found[0]);
                assert_eq!(verify_method(&mutated), Ok(()), "UOI_{n} on {ty}");
            }
        }
    }
}
