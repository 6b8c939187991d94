//! Typed instruction model for the program under test.
//!
//! Classes are carried as immutable byte sequences (a deterministic bincode
//! encoding of [`ClassFile`]); the operator catalog and the hot-swap driver
//! work on the decoded form. Branch targets are instruction indices, and a
//! separate line table maps index ranges to source lines.

use serde::{Deserialize, Serialize};

/// Primitive value type of an operand-stack entry or local slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ty {
    /// 32-bit integer, category 1.
    Int,
    /// 64-bit integer, category 2.
    Long,
    /// 32-bit float, category 1.
    Float,
    /// 64-bit float, category 2.
    Double,
}

impl Ty {
    /// Stack slots occupied by a value of this type.
    pub fn slots(self) -> u16 {
        match self {
            Ty::Int | Ty::Float => 1,
            Ty::Long | Ty::Double => 2,
        }
    }

    /// True for category-2 (two-slot) types.
    pub fn is_wide(self) -> bool {
        self.slots() == 2
    }

    /// Single-character descriptor code.
    pub fn code(self) -> char {
        match self {
            Ty::Int => 'I',
            Ty::Long => 'J',
            Ty::Float => 'F',
            Ty::Double => 'D',
        }
    }

    /// The constant `1` of this type.
    pub fn one(self) -> Value {
        match self {
            Ty::Int => Value::Int(1),
            Ty::Long => Value::Long(1),
            Ty::Float => Value::Float(1.0),
            Ty::Double => Value::Double(1.0),
        }
    }

    /// The constant `0` of this type.
    pub fn zero(self) -> Value {
        match self {
            Ty::Int => Value::Int(0),
            Ty::Long => Value::Long(0),
            Ty::Float => Value::Float(0.0),
            Ty::Double => Value::Double(0.0),
        }
    }
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Long => write!(f, "long"),
            Ty::Float => write!(f, "float"),
            Ty::Double => write!(f, "double"),
        }
    }
}

/// A typed constant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Value {
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
}

impl Value {
    /// Type of this constant.
    pub fn ty(self) -> Ty {
        match self {
            Value::Int(_) => Ty::Int,
            Value::Long(_) => Ty::Long,
            Value::Float(_) => Ty::Float,
            Value::Double(_) => Ty::Double,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // Bit-level float comparison keeps constant rewrites deterministic.
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Float(v) => write!(f, "{v}F"),
            Value::Double(v) => write!(f, "{v}D"),
        }
    }
}

/// Binary arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
}

impl ArithOp {
    /// Operator glyph for descriptions.
    pub fn glyph(self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
            ArithOp::Rem => '%',
        }
    }
}

/// Bitwise binary operation on `Int`/`Long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitOp {
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive-or.
    Xor,
}

impl BitOp {
    /// Operator glyph for descriptions.
    pub fn glyph(self) -> char {
        match self {
            BitOp::And => '&',
            BitOp::Or => '|',
            BitOp::Xor => '^',
        }
    }
}

/// Shift operation on `Int`/`Long`; the shift amount is always an `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftOp {
    /// Left shift.
    Shl,
    /// Arithmetic right shift.
    Shr,
    /// Logical right shift.
    Ushr,
}

impl ShiftOp {
    /// Operator glyph for descriptions.
    pub fn glyph(self) -> &'static str {
        match self {
            ShiftOp::Shl => "<<",
            ShiftOp::Shr => ">>",
            ShiftOp::Ushr => ">>>",
        }
    }
}

/// Comparison predicate used by conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
}

impl CmpOp {
    /// Logical negation of the predicate.
    pub fn negate(self) -> CmpOp {
        match self {
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Ge => CmpOp::Lt,
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
        }
    }

    /// True for `==`/`!=`.
    pub fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }

    /// Predicate glyph for descriptions.
    pub fn glyph(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

/// One instruction of the stack machine.
///
/// The instruction set is the minimal surface the operator catalog needs:
/// typed arithmetic, bitwise and shift operations, relational branches in
/// both two-operand and compare-to-zero forms, explicit stack-manipulation
/// instructions with category-1 and category-2 variants, constant pushes,
/// local load/store, conversions, calls, and returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insn {
    /// Push a constant.
    Const(Value),
    /// Push local `slot` of type `ty`.
    Load {
        /// Value type.
        ty: Ty,
        /// Local slot index (wide values occupy `slot` and `slot + 1`).
        slot: u16,
    },
    /// Pop into local `slot`.
    Store {
        /// Value type.
        ty: Ty,
        /// Local slot index.
        slot: u16,
    },
    /// Binary arithmetic: pops two `ty` operands, pushes one.
    Arith {
        /// Operand type.
        ty: Ty,
        /// Operation.
        op: ArithOp,
    },
    /// Bitwise binary operation; `ty` must be `Int` or `Long`.
    Bit {
        /// Operand type.
        ty: Ty,
        /// Operation.
        op: BitOp,
    },
    /// Shift; pops an `Int` amount then a `ty` value.
    Shift {
        /// Value type (`Int` or `Long`).
        ty: Ty,
        /// Operation.
        op: ShiftOp,
    },
    /// Arithmetic negation.
    Neg {
        /// Operand type.
        ty: Ty,
    },
    /// Numeric conversion.
    Conv {
        /// Source type.
        from: Ty,
        /// Target type.
        to: Ty,
    },
    /// Three-way compare: pops two `ty` operands, pushes `Int` -1/0/1.
    Cmp {
        /// Operand type.
        ty: Ty,
    },
    /// Two-operand integer compare-and-branch.
    IfCmp {
        /// Predicate; branch taken when `a op b` holds.
        op: CmpOp,
        /// Branch target (instruction index).
        target: u32,
    },
    /// Single-operand compare-to-zero branch.
    IfZero {
        /// Predicate; branch taken when `v op 0` holds.
        op: CmpOp,
        /// Branch target (instruction index).
        target: u32,
    },
    /// Unconditional jump.
    Goto {
        /// Branch target (instruction index).
        target: u32,
    },
    /// Duplicate the top category-1 value.
    Dup,
    /// Duplicate the top two stack slots.
    Dup2,
    /// Duplicate the top two slots beneath the next two slots.
    Dup2X2,
    /// Drop the top category-1 value.
    Pop,
    /// Drop the top two stack slots.
    Pop2,
    /// Swap the top two category-1 values.
    Swap,
    /// Invoke a method of the image; pops arguments, pushes the result.
    Call {
        /// Target class (dotted name).
        class: String,
        /// Target method name.
        method: String,
        /// Argument types, left to right.
        args: Vec<Ty>,
        /// Return type; `None` for void.
        ret: Option<Ty>,
    },
    /// Return from the method; `None` for void.
    Return(Option<Ty>),
}

impl Insn {
    /// Branch target carried by this instruction, if any.
    pub fn target(&self) -> Option<u32> {
        match self {
            Insn::IfCmp { target, .. } | Insn::IfZero { target, .. } | Insn::Goto { target } => {
                Some(*target)
            }
            _ => None,
        }
    }

    /// Rewrite the branch target in place.
    pub fn set_target(&mut self, new_target: u32) {
        match self {
            Insn::IfCmp { target, .. } | Insn::IfZero { target, .. } | Insn::Goto { target } => {
                *target = new_target
            }
            _ => {}
        }
    }

    /// True when control never falls through to the next instruction.
    pub fn ends_flow(&self) -> bool {
        matches!(self, Insn::Goto { .. } | Insn::Return(_))
    }
}

/// Line-table entry: instructions from `start` until the next entry map to
/// `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEntry {
    /// First instruction index covered by this entry.
    pub start: u32,
    /// Source line number (1-based).
    pub line: u32,
}

/// One method of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Argument types, left to right, occupying local slots from 0.
    pub args: Vec<Ty>,
    /// Return type; `None` for void.
    pub ret: Option<Ty>,
    /// Number of local slots available.
    pub max_locals: u16,
    /// Declared operand-stack capacity in slots. The verifier rejects code
    /// exceeding it; the catalog never recomputes it for mutants.
    pub max_stack: u16,
    /// Instruction stream.
    pub insns: Vec<Insn>,
    /// Line table, sorted by `start`.
    pub lines: Vec<LineEntry>,
}

impl Method {
    /// Method descriptor string, e.g. `(IJ)I` or `(DD)V`.
    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for a in &self.args {
            out.push(a.code());
        }
        out.push(')');
        out.push(self.ret.map(Ty::code).unwrap_or('V'));
        out
    }

    /// Source line of the instruction at `index`, or 0 when unknown.
    pub fn line_at(&self, index: usize) -> u32 {
        let mut line = 0;
        for entry in &self.lines {
            if entry.start as usize > index {
                break;
            }
            line = entry.line;
        }
        line
    }

    /// First line of the method, or 0 when the table is empty.
    pub fn first_line(&self) -> u32 {
        self.lines.first().map(|e| e.line).unwrap_or(0)
    }

    /// Indices that start a basic block: entry, branch targets, and the
    /// successors of control-transfer instructions.
    pub fn block_starts(&self) -> Vec<u32> {
        let mut starts = vec![0u32];
        for (i, insn) in self.insns.iter().enumerate() {
            if let Some(t) = insn.target() {
                starts.push(t);
            }
            match insn {
                Insn::IfCmp { .. } | Insn::IfZero { .. } | Insn::Goto { .. } | Insn::Return(_) => {
                    let next = (i + 1) as u32;
                    if (next as usize) < self.insns.len() {
                        starts.push(next);
                    }
                }
                _ => {}
            }
        }
        starts.sort_unstable();
        starts.dedup();
        starts
    }

    /// Basic-block index containing the instruction at `index`.
    pub fn block_of(&self, index: usize) -> u32 {
        let starts = self.block_starts();
        match starts.binary_search(&(index as u32)) {
            Ok(b) => b as u32,
            Err(b) => (b - 1) as u32,
        }
    }

    /// All source lines of one basic block.
    pub fn block_lines(&self, block: u32) -> Vec<u32> {
        let starts = self.block_starts();
        let Some(&start) = starts.get(block as usize) else {
            return Vec::new();
        };
        let end = starts
            .get(block as usize + 1)
            .map(|&s| s as usize)
            .unwrap_or(self.insns.len());
        let mut lines: Vec<u32> = (start as usize..end)
            .map(|i| self.line_at(i))
            .filter(|&l| l != 0)
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

/// A class: a named, immutable collection of methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFile {
    /// Fully-qualified dotted name, e.g. `demo.Calc`.
    pub name: String,
    /// Source file name, e.g. `Calc.src`.
    pub source_file: String,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
}

impl ClassFile {
    /// Package part of the dotted name, empty for the default package.
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
    }

    /// Simple (unqualified) class name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, s)| s).unwrap_or(&self.name)
    }

    /// Find a method by name and descriptor.
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor() == descriptor)
    }
}
