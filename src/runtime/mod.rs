//! Reference runtime executing methods of a [`crate::bytecode::ProgramImage`].

pub mod interp;

pub use interp::{DEFAULT_FUEL, Interpreter, RuntimeFault};
