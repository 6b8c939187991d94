//! Bytecode substrate: instruction model, stack verification, class bytes,
//! and the redefinable program image.

pub mod image;
pub mod insn;
pub mod stack;

pub use image::{ByteSource, ClassBytesError, ProgramImage, RedefineError, decode_class, encode_class};
pub use insn::{ArithOp, BitOp, ClassFile, CmpOp, Insn, LineEntry, Method, ShiftOp, Ty, Value};
pub use stack::{StackShape, VerifyError, step, verify_method};
