//! Code generation module
//!
//! Symbolic instructions and the helpers that emit them, descriptor utilities,
//! and the class-file model with its writer.

pub mod attribute;
pub mod bytecode;
pub mod class;
pub mod class_writer;
pub mod code;
pub mod constpool;
pub mod defs;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod flag;
pub mod insn;
pub mod method;
pub mod opcodes;
pub mod writer;

// Re-export commonly used types
pub use bytecode::CodeBuilder;
pub use class::ClassFile;
pub use class_writer::ClassFileWriter;
pub use constpool::{Constant, ConstantPool};
pub use error::{ClassGenerationError, CodeGenResult};
pub use insn::{ConstantValue, Insn};
pub use writer::ClassfileWritable;
