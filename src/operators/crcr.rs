//! CRCR: constant replacement.
//!
//! For a constant `c`: CRCR_1 → `1`, CRCR_2 → `0`, CRCR_3 → `-1`,
//! CRCR_4 → `-c`, CRCR_5 → `c+1`, CRCR_6 → `c-1`, preserving the constant's
//! type. `-1` for long/float/double is produced by loading the integer `-1`
//! and applying the widening conversion.

use crate::bytecode::insn::{Insn, Method, Ty, Value};

use super::{Candidate, Rewrite};

fn negated(v: Value) -> Value {
    match v {
        Value::Int(x) => Value::Int(x.wrapping_neg()),
        Value::Long(x) => Value::Long(x.wrapping_neg()),
        Value::Float(x) => Value::Float(-x),
        Value::Double(x) => Value::Double(-x),
    }
}

fn offset(v: Value, delta: i64) -> Value {
    match v {
        Value::Int(x) => Value::Int(x.wrapping_add(delta as i32)),
        Value::Long(x) => Value::Long(x.wrapping_add(delta)),
        Value::Float(x) => Value::Float(x + delta as f32),
        Value::Double(x) => Value::Double(x + delta as f64),
    }
}

fn minus_one_sequence(ty: Ty) -> Vec<Insn> {
    if ty == Ty::Int {
        vec![Insn::Const(Value::Int(-1))]
    } else {
        vec![Insn::Const(Value::Int(-1)), Insn::Conv { from: Ty::Int, to: ty }]
    }
}

pub(super) fn scan(n: u8, method: &Method) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, insn) in method.insns.iter().enumerate() {
        let Insn::Const(v) = insn else { continue };
        let ty = v.ty();
        let (label, seq) = match n {
            1 => ("1".to_string(), vec![Insn::Const(ty.one())]),
            2 => ("0".to_string(), vec![Insn::Const(ty.zero())]),
            3 => ("-1".to_string(), minus_one_sequence(ty)),
            4 => {
                let nv = negated(*v);
                (nv.to_string(), vec![Insn::Const(nv)])
            }
            5 => {
                let nv = offset(*v, 1);
                (nv.to_string(), vec![Insn::Const(nv)])
            }
            _ => {
                let nv = offset(*v, -1);
                (nv.to_string(), vec![Insn::Const(nv)])
            }
        };
        out.push(Candidate {
            index: i,
            description: format!("replaced constant {v} with {label}"),
            rewrite: Rewrite::Replace(seq),
        });
    }
    out
}
