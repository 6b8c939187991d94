//! Classical operator families: conditional boundary, math, negated
//! conditionals, removed conditionals, removed method calls, and zeroed
//! return values.

use crate::bytecode::insn::{ArithOp, BitOp, CmpOp, Insn, Method, ShiftOp};

use super::{Candidate, Rewrite, RemoveMode, pop_for};

fn boundary(op: CmpOp) -> Option<CmpOp> {
    match op {
        CmpOp::Lt => Some(CmpOp::Le),
        CmpOp::Le => Some(CmpOp::Lt),
        CmpOp::Gt => Some(CmpOp::Ge),
        CmpOp::Ge => Some(CmpOp::Gt),
        CmpOp::Eq | CmpOp::Ne => None,
    }
}

pub(super) fn scan_conditionals_boundary(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        match insn {
            Insn::IfCmp { op, target } => {
                if let Some(new_op) = boundary(*op) {
                    out.push(Candidate {
                        index: i,
                        description: format!(
                            "changed conditional boundary {} to {}",
                            op.glyph(),
                            new_op.glyph()
                        ),
                        rewrite: Rewrite::Replace(vec![Insn::IfCmp {
                            op: new_op,
                            target: *target,
                        }]),
                    });
                }
            }
            Insn::IfZero { op, target } => {
                if let Some(new_op) = boundary(*op) {
                    out.push(Candidate {
                        index: i,
                        description: format!(
                            "changed conditional boundary {} to {}",
                            op.glyph(),
                            new_op.glyph()
                        ),
                        rewrite: Rewrite::Replace(vec![Insn::IfZero {
                            op: new_op,
                            target: *target,
                        }]),
                    });
                }
            }
            _ => {}
        }
    }
    out
}

fn math_arith(op: ArithOp) -> ArithOp {
    match op {
        ArithOp::Add => ArithOp::Sub,
        ArithOp::Sub => ArithOp::Add,
        ArithOp::Mul => ArithOp::Div,
        ArithOp::Div => ArithOp::Mul,
        ArithOp::Rem => ArithOp::Mul,
    }
}

fn math_bit(op: BitOp) -> BitOp {
    match op {
        BitOp::And => BitOp::Or,
        BitOp::Or => BitOp::And,
        BitOp::Xor => BitOp::And,
    }
}

fn math_shift(op: ShiftOp) -> ShiftOp {
    match op {
        ShiftOp::Shl => ShiftOp::Shr,
        ShiftOp::Shr => ShiftOp::Shl,
        ShiftOp::Ushr => ShiftOp::Shl,
    }
}

pub(super) fn scan_math(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        match insn {
            Insn::Arith { ty, op } => {
                let new_op = math_arith(*op);
                out.push(Candidate {
                    index: i,
                    description: format!("replaced {ty} {} with {}", op.glyph(), new_op.glyph()),
                    rewrite: Rewrite::Replace(vec![Insn::Arith { ty: *ty, op: new_op }]),
                });
            }
            Insn::Bit { ty, op } => {
                let new_op = math_bit(*op);
                out.push(Candidate {
                    index: i,
                    description: format!("replaced {} with {}", op.glyph(), new_op.glyph()),
                    rewrite: Rewrite::Replace(vec![Insn::Bit { ty: *ty, op: new_op }]),
                });
            }
            Insn::Shift { ty, op } => {
                let new_op = math_shift(*op);
                out.push(Candidate {
                    index: i,
                    description: format!("replaced {} with {}", op.glyph(), new_op.glyph()),
                    rewrite: Rewrite::Replace(vec![Insn::Shift { ty: *ty, op: new_op }]),
                });
            }
            _ => {}
        }
    }
    out
}

pub(super) fn scan_negate_conditionals(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        match insn {
            Insn::IfCmp { op, target } => {
                let new_op = op.negate();
                out.push(Candidate {
                    index: i,
                    description: format!("negated conditional {} to {}", op.glyph(), new_op.glyph()),
                    rewrite: Rewrite::Replace(vec![Insn::IfCmp {
                        op: new_op,
                        target: *target,
                    }]),
                });
            }
            Insn::IfZero { op, target } => {
                let new_op = op.negate();
                out.push(Candidate {
                    index: i,
                    description: format!("negated conditional {} to {}", op.glyph(), new_op.glyph()),
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

pub(super) fn scan_remove_conditionals(mode: RemoveMode, method: &Method) -> Vec<Candidate> {
    let (wants_equality, force_branch) = match mode {
        RemoveMode::EqualIf => (true, true),
        RemoveMode::EqualElse => (true, false),
        RemoveMode::OrderIf => (false, true),
        RemoveMode::OrderElse => (false, false),
    };
    let label = if force_branch { "always" } else { "never" };

    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let (op, target, operand_pops) = match insn {
            Insn::IfCmp { op, target } => (*op, *target, 2usize),
            Insn::IfZero { op, target } => (*op, *target, 1usize),
            _ => continue,
        };
        if op.is_equality() != wants_equality {
            continue;
        }
        let mut seq = vec![Insn::Pop; operand_pops];
        if force_branch {
            seq.push(Insn::Goto { target });
        }
        out.push(Candidate {
            index: i,
            description: format!("removed conditional ({label} branch)"),
            rewrite: Rewrite::Replace(seq),
        });
    }
    out
}

pub(super) fn scan_void_method_calls(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Call { class, method: callee, args, ret: None } = insn else {
            continue;
        };
        let seq: Vec<Insn> = args.iter().rev().map(|ty| pop_for(*ty)).collect();
        out.push(Candidate {
            index: i,
            description: format!("removed call to {class}.{callee}"),
            rewrite: Rewrite::Replace(seq),
        });
    }
    out
}

pub(super) fn scan_non_void_method_calls(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Call { class, method: callee, args, ret: Some(ret) } = insn else {
            continue;
        };
        let mut seq: Vec<Insn> = args.iter().rev().map(|ty| pop_for(*ty)).collect();
        seq.push(Insn::Const(ret.zero()));
        out.push(Candidate {
            index: i,
            description: format!("removed call to {class}.{callee}, replaced result with 0"),
            rewrite: Rewrite::Replace(seq),
        });
    }
    out
}

pub(super) fn scan_return_values(method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Return(Some(ty)) = insn else { continue };
        out.push(Candidate {
            index: i,
            description: format!("replaced {ty} return value with 0"),
            rewrite: Rewrite::Replace(vec![
                pop_for(*ty),
                Insn::Const(ty.zero()),
                Insn::Return(Some(*ty)),
            ]),
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

    fn branchy() -> Method {
        Method {
            name: "m".to_string(),
            args: vec![Ty::Int, Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 2,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Int, slot: 1 },
                Insn::IfCmp { op: CmpOp::Lt, target: 5 },
                Insn::Const(Value::Int(0)),
                Insn::Return(Some(Ty::Int)),
                Insn::Const(Value::Int(1)),
                Insn::Return(Some(Ty::Int)),
            ],
            lines: Vec::new(),
        }
    }

    #[test]
    fn boundary_skips_equality_predicates() {
        let mut m = branchy();
        assert_eq!(scan_conditionals_boundary(&m).len(), 1);
        m.insns[2] = Insn::IfCmp { op: CmpOp::Eq, target: 5 };
        assert!(scan_conditionals_boundary(&m).is_empty());
    }

    #[test]
    fn negate_conditionals_uses_logical_negation() {
        let m = branchy();
        let found = scan_negate_conditionals(&m);
        assert_eq!(
            found[0].rewrite,
            Rewrite::Replace(vec![Insn::IfCmp { op: CmpOp::Ge, target: 5 }])
        );
    }

    #[test]
    fn remove_conditionals_selects_by_predicate_kind() {
        let m = branchy();
        assert!(scan_remove_conditionals(RemoveMode::EqualIf, &m).is_empty());

        let found = scan_remove_conditionals(RemoveMode::OrderIf, &m);
        assert_eq!(
            found[0].rewrite,
            Rewrite::Replace(vec![Insn::Pop, Insn::Pop, Insn::Goto { target: 5 }])
        );
        let mutated = apply_candidate(&m, &found[0]);
        assert_eq!(verify_method(&mutated), Ok(()));

        let found = scan_remove_conditionals(RemoveMode::OrderElse, &m);
        assert_eq!(found[0].rewrite, Rewrite::Replace(vec![Insn::Pop, Insn::Pop]));
        let mutated = apply_candidate(&m, &found[0]);
        assert_eq!(verify_method(&mutated), Ok(()));
    }

    #[test]
    fn zero_compare_removal_pops_one_operand() {
        let m = Method {
            name: "z".to_string(),
            args: vec![Ty::Int],
            ret: Some(Ty::Int),
            max_locals: 1,
            max_stack: 1,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::IfZero { op: CmpOp::Eq, target: 4 },
                Insn::Const(Value::Int(7)),
                Insn::Return(Some(Ty::Int)),
                Insn::Const(Value::Int(0)),
                Insn::Return(Some(Ty::Int)),
            ],
            lines: Vec::new(),
        };
        let found = scan_remove_conditionals(RemoveMode::EqualElse, &m);
        assert_eq!(found[0].rewrite, Rewrite::Replace(vec![Insn::Pop]));
    }

    #[test]
    fn call_removal_pops_arguments_in_reverse_width_order() {
        let m = Method {
            name: "c".to_string(),
            args: vec![Ty::Int, Ty::Long],
            ret: None,
            max_locals: 3,
            max_stack: 3,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Load { ty: Ty::Long, slot: 1 },
                Insn::Call {
                    class: "demo.Log".to_string(),
                    method: "write".to_string(),
                    args: vec![Ty::Int, Ty::Long],
                    ret: None,
                },
                Insn::Return(None),
            ],
            lines: Vec::new(),
        };
        let found = scan_void_method_calls(&m);
        assert_eq!(found[0].rewrite, Rewrite::Replace(vec![Insn::Pop2, Insn::Pop]));
        assert_eq!(found[0].description, "removed call to demo.Log.write");
        let mutated = apply_candidate(&m, &found[0]);
        assert_eq!(verify_method(&mutated), Ok(()));
    }

    #[test]
    fn non_void_call_removal_pushes_the_return_types_zero() {
        let m = Method {
            name: "c".to_string(),
            args: vec![Ty::Int],
            ret: Some(Ty::Double),
            max_locals: 1,
            max_stack: 2,
            insns: vec![
                Insn::Load { ty: Ty::Int, slot: 0 },
                Insn::Call {
                    class: "demo.Calc".to_string(),
                    method: "conv".to_string(),
                    args: vec![Ty::Int],
                    ret: Some(Ty::Double),
                },
                Insn::Return(Some(Ty::Double)),
            ],
            lines: Vec::new(),
        };
        let found = scan_non_void_method_calls(&m);
        assert_eq!(
            found[0].rewrite,
            Rewrite::Replace(vec![Insn::Pop, Insn::Const(Value::Double(0.0))])
        );
        let mutated = apply_candidate(&m, &found[0]);
        assert_eq!(verify_method(&mutated), Ok(()));
    }

    #[test]
    fn return_values_zeroes_each_value_return() {
        let m = branchy();
        let found = scan_return_values(&m);
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[0].rewrite,
            Rewrite::Replace(vec![
                Insn::Pop,
                Insn::Const(Value::Int(0)),
                Insn::Return(Some(Ty::Int)),
            ])
        );
        for c in &found {
            let mutated = apply_candidate(&m, c);
            assert_eq!(verify_method(&mutated), Ok(()), "site {}", c.index);
        }
    }
}
