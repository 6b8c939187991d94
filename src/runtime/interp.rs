//! Stack-machine interpreter.
//!
//! Faults carry an exception type, message, and raw stack trace in the
//! conventional `Type: message` + `\tat Class.method(File:line)` layout; the
//! executor's stack filter reduces that to the canonical compared form.
//! Integer arithmetic wraps; shift amounts are masked; the three-way compare
//! orders NaN low.

use crate::bytecode::image::ProgramImage;
use crate::bytecode::insn::{ArithOp, BitOp, CmpOp, Insn, Method, ShiftOp, Ty, Value};

/// Instruction budget for one top-level invocation. Runaway mutants burn
/// through it and surface as an `InternalError` fault if the wall-clock
/// timeout has not fired first.
pub const DEFAULT_FUEL: u64 = 50_000_000;

const MAX_CALL_DEPTH: usize = 128;

/// A runtime fault: the interpreter's analogue of a thrown exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFault {
    /// Exception class name.
    pub type_name: String,
    /// Exception message; may be empty.
    pub message: String,
    /// Call-stack frames, innermost first, in `\tat ...` form.
    pub frames: Vec<String>,
}

impl RuntimeFault {
    /// Raw trace: leading `Type: message` line followed by the frames.
    pub fn raw_trace(&self) -> String {
        let mut out = if self.message.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, self.message)
        };
        for frame in &self.frames {
            out.push('\n');
            out.push_str(frame);
        }
        out
    }
}

#[derive(Debug, Clone)]
struct FrameInfo {
    class: String,
    method: String,
    source_file: String,
    line: u32,
}

impl FrameInfo {
    fn render(&self) -> String {
        format!(
            "\tat {}.{}({}:{})",
            self.class, self.method, self.source_file, self.line
        )
    }
}

/// Executes methods of an image until completion, fault, or fuel exhaustion.
#[derive(Debug)]
pub struct Interpreter<'a> {
    image: &'a ProgramImage,
    fuel_left: u64,
    frames: Vec<FrameInfo>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter with the default instruction budget.
    pub fn new(image: &'a ProgramImage) -> Self {
        Self::with_fuel(image, DEFAULT_FUEL)
    }

    /// Interpreter with an explicit instruction budget.
    pub fn with_fuel(image: &'a ProgramImage, fuel: u64) -> Self {
        Self {
            image,
            fuel_left: fuel,
            frames: Vec::new(),
        }
    }

    /// Invoke `class.method` with the given arguments.
    pub fn invoke(
        &mut self,
        class: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Option<Value>, RuntimeFault> {
        self.frames.clear();
        self.call(class, method, args)
    }

    fn fault(&self, type_name: &str, message: impl Into<String>) -> RuntimeFault {
        RuntimeFault {
            type_name: type_name.to_string(),
            message: message.into(),
            frames: self.frames.iter().rev().map(FrameInfo::render).collect(),
        }
    }

    fn call(
        &mut self,
        class_name: &str,
        method_name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, RuntimeFault> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(self.fault("StackOverflowError", ""));
        }
        let class = self
            .image
            .class(class_name)
            .ok_or_else(|| self.fault("NoClassDefFoundError", class_name))?;
        let method = class
            .methods
            .iter()
            .find(|m| m.name == method_name && signature_matches(m, args))
            .ok_or_else(|| {
                self.fault("NoSuchMethodError", format!("{class_name}.{method_name}"))
            })?
            .clone();

        self.frames.push(FrameInfo {
            class: class_name.to_string(),
            method: method_name.to_string(),
            source_file: class.source_file.clone(),
            line: method.first_line(),
        });
        let result = self.exec(&method, args);
        if result.is_ok() {
            self.frames.pop();
        }
        result
    }

    fn exec(&mut self, method: &Method, args: &[Value]) -> Result<Option<Value>, RuntimeFault> {
        let mut locals: Vec<Option<Value>> = vec![None; method.max_locals as usize];
        let mut slot = 0usize;
        for arg in args {
            locals[slot] = Some(*arg);
            slot += arg.ty().slots() as usize;
        }

        let mut stack: Vec<Value> = Vec::with_capacity(method.max_stack as usize);
        let mut pc = 0usize;

        macro_rules! pop {
            () => {
                match stack.pop() {
                    Some(v) => v,
                    None => return Err(self.fault("VerifyError", "operand stack underflow")),
                }
            };
        }

        loop {
            if pc >= method.insns.len() {
                return Err(self.fault("VerifyError", "fell off method end"));
            }
            if self.fuel_left == 0 {
                return Err(self.fault("InternalError", "instruction budget exhausted"));
            }
            self.fuel_left -= 1;
            if let Some(frame) = self.frames.last_mut() {
                frame.line = method.line_at(pc);
            }

            match &method.insns[pc] {
                Insn::Const(v) => stack.push(*v),
                Insn::Load { slot, .. } => {
                    let v = locals[*slot as usize]
                        .ok_or_else(|| self.fault("VerifyError", "read of undefined local"))?;
                    stack.push(v);
                }
                Insn::Store { slot, .. } => {
                    let v = pop!();
                    locals[*slot as usize] = Some(v);
                }
                Insn::Arith { ty, op } => {
                    let b = pop!();
                    let a = pop!();
                    stack.push(self.arith(*ty, *op, a, b)?);
                }
                Insn::Bit { ty, op } => {
                    let b = pop!();
                    let a = pop!();
                    let v = match ty {
                        Ty::Int => Value::Int(bit_i32(*op, int(a), int(b))),
                        Ty::Long => Value::Long(bit_i64(*op, long(a), long(b))),
                        _ => return Err(self.fault("VerifyError", "bitwise op on float")),
                    };
                    stack.push(v);
                }
                Insn::Shift { ty, op } => {
                    let amount = int(pop!());
                    let v = pop!();
                    let out = match ty {
                        Ty::Int => Value::Int(shift_i32(*op, int(v), amount)),
                        Ty::Long => Value::Long(shift_i64(*op, long(v), amount)),
                        _ => return Err(self.fault("VerifyError", "shift on float")),
                    };
                    stack.push(out);
                }
                Insn::Neg { .. } => {
                    let v = pop!();
                    stack.push(match v {
                        Value::Int(x) => Value::Int(x.wrapping_neg()),
                        Value::Long(x) => Value::Long(x.wrapping_neg()),
                        Value::Float(x) => Value::Float(-x),
                        Value::Double(x) => Value::Double(-x),
                    });
                }
                Insn::Conv { to, .. } => {
                    let v = pop!();
                    stack.push(convert(v, *to));
                }
                Insn::Cmp { .. } => {
                    let b = pop!();
                    let a = pop!();
                    stack.push(Value::Int(three_way(a, b)));
                }
                Insn::IfCmp { op, target } => {
                    let b = int(pop!());
                    let a = int(pop!());
                    if compare(*op, a, b) {
                        pc = *target as usize;
                        continue;
                    }
                }
                Insn::IfZero { op, target } => {
                    let v = int(pop!());
                    if compare(*op, v, 0) {
                        pc = *target as usize;
                        continue;
                    }
                }
                Insn::Goto { target } => {
                    pc = *target as usize;
                    continue;
                }
                Insn::Dup => {
                    let v = pop!();
                    stack.push(v);
                    stack.push(v);
                }
                Insn::Dup2 => {
                    let top = pop!();
                    if top.ty().is_wide() {
                        stack.push(top);
                        stack.push(top);
                    } else {
                        let under = pop!();
                        stack.push(under);
                        stack.push(top);
                        stack.push(under);
                        stack.push(top);
                    }
                }
                Insn::Dup2X2 => {
                    let top = take_two_slots(&mut stack);
                    let under = take_two_slots(&mut stack);
                    stack.extend_from_slice(&top);
                    stack.extend_from_slice(&under);
                    stack.extend_from_slice(&top);
                }
                Insn::Pop => {
                    pop!();
                }
                Insn::Pop2 => {
                    let top = pop!();
                    if !top.ty().is_wide() {
                        pop!();
                    }
                }
                Insn::Swap => {
                    let a = pop!();
                    let b = pop!();
                    stack.push(a);
                    stack.push(b);
                }
                Insn::Call {
                    class,
                    method: callee,
                    args: arg_tys,
                    ret,
                } => {
                    let mut call_args = Vec::with_capacity(arg_tys.len());
                    for _ in arg_tys {
                        call_args.push(pop!());
                    }
                    call_args.reverse();
                    let class = class.clone();
                    let callee = callee.clone();
                    let result = self.call(&class, &callee, &call_args)?;
                    match (ret, result) {
                        (Some(_), Some(v)) => stack.push(v),
                        (None, _) => {}
                        (Some(_), None) => {
                            return Err(self.fault("VerifyError", "void result for value call"));
                        }
                    }
                }
                Insn::Return(ty) => {
                    return Ok(match ty {
                        Some(_) => Some(pop!()),
                        None => None,
                    });
                }
            }
            pc += 1;
        }
    }

    fn arith(&self, ty: Ty, op: ArithOp, a: Value, b: Value) -> Result<Value, RuntimeFault> {
        let v = match ty {
            Ty::Int => {
                let (a, b) = (int(a), int(b));
                if b == 0 && matches!(op, ArithOp::Div | ArithOp::Rem) {
                    return Err(self.fault("ArithmeticException", "/ by zero"));
                }
                Value::Int(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                    ArithOp::Div => a.wrapping_div(b),
                    ArithOp::Rem => a.wrapping_rem(b),
                })
            }
            Ty::Long => {
                let (a, b) = (long(a), long(b));
                if b == 0 && matches!(op, ArithOp::Div | ArithOp::Rem) {
                    return Err(self.fault("ArithmeticException", "/ by zero"));
                }
                Value::Long(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                    ArithOp::Div => a.wrapping_div(b),
                    ArithOp::Rem => a.wrapping_rem(b),
                })
            }
            Ty::Float => {
                let (a, b) = (float(a), float(b));
                Value::Float(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Rem => a % b,
                })
            }
            Ty::Double => {
                let (a, b) = (double(a), double(b));
                Value::Double(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Rem => a % b,
                })
            }
        };
        Ok(v)
    }
}

fn signature_matches(method: &Method, args: &[Value]) -> bool {
    method.args.len() == args.len()
        && method.args.iter().zip(args).all(|(ty, v)| *ty == v.ty())
}

fn take_two_slots(stack: &mut Vec<Value>) -> Vec<Value> {
    let top = stack.pop().expect("verified code cannot underflow");
    if top.ty().is_wide() {
        vec![top]
    } else {
        let under = stack.pop().expect("verified code cannot underflow");
        vec![under, top]
    }
}

fn int(v: Value) -> i32 {
    match v {
        Value::Int(x) => x,
        _ => 0,
    }
}

fn long(v: Value) -> i64 {
    match v {
        Value::Long(x) => x,
        _ => 0,
    }
}

fn float(v: Value) -> f32 {
    match v {
        Value::Float(x) => x,
        _ => 0.0,
    }
}

fn double(v: Value) -> f64 {
    match v {
        Value::Double(x) => x,
        _ => 0.0,
    }
}

fn bit_i32(op: BitOp, a: i32, b: i32) -> i32 {
    match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
    }
}

fn bit_i64(op: BitOp, a: i64, b: i64) -> i64 {
    match op {
        BitOp::And => a & b,
        BitOp::Or => a | b,
        BitOp::Xor => a ^ b,
    }
}

fn shift_i32(op: ShiftOp, v: i32, amount: i32) -> i32 {
    let s = (amount & 0x1f) as u32;
    match op {
        ShiftOp::Shl => v.wrapping_shl(s),
        ShiftOp::Shr => v.wrapping_shr(s),
        ShiftOp::Ushr => ((v as u32).wrapping_shr(s)) as i32,
    }
}

fn shift_i64(op: ShiftOp, v: i64, amount: i32) -> i64 {
    let s = (amount & 0x3f) as u32;
    match op {
        ShiftOp::Shl => v.wrapping_shl(s),
        ShiftOp::Shr => v.wrapping_shr(s),
        ShiftOp::Ushr => ((v as u64).wrapping_shr(s)) as i64,
    }
}

fn convert(v: Value, to: Ty) -> Value {
    let as_f64 = match v {
        Value::Int(x) => x as f64,
        Value::Long(x) => x as f64,
        Value::Float(x) => x as f64,
        Value::Double(x) => x,
    };
    match (v, to) {
        (Value::Int(x), Ty::Long) => Value::Long(x as i64),
        (Value::Long(x), Ty::Int) => Value::Int(x as i32),
        (Value::Int(x), Ty::Int) => Value::Int(x),
        (Value::Long(x), Ty::Long) => Value::Long(x),
        (Value::Float(x), Ty::Int) => Value::Int(x as i32),
        (Value::Float(x), Ty::Long) => Value::Long(x as i64),
        (Value::Double(x), Ty::Int) => Value::Int(x as i32),
        (Value::Double(x), Ty::Long) => Value::Long(x as i64),
        (Value::Int(x), Ty::Float) => Value::Float(x as f32),
        (Value::Long(x), Ty::Float) => Value::Float(x as f32),
        (_, Ty::Float) => Value::Float(as_f64 as f32),
        (_, Ty::Double) => Value::Double(as_f64),
    }
}

fn three_way(a: Value, b: Value) -> i32 {
    let ord = match (a, b) {
        (Value::Long(x), Value::Long(y)) => x.cmp(&y),
        (Value::Float(x), Value::Float(y)) => {
            return x.partial_cmp(&y).map(|o| o as i32).unwrap_or(-1);
        }
        (Value::Double(x), Value::Double(y)) => {
            return x.partial_cmp(&y).map(|o| o as i32).unwrap_or(-1);
        }
        (Value::Int(x), Value::Int(y)) => x.cmp(&y),
        _ => std::cmp::Ordering::Equal,
    };
    ord as i32
}

fn compare(op: CmpOp, a: i32, b: i32) -> bool {
    match op {
        CmpOp::Lt => a < b,
        CmpOp::Le => a <= b,
        CmpOp::Gt => a > b,
        CmpOp::Ge => a >= b,
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
    }
}
