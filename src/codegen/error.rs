//! Specific error types for code generation operations

use thiserror::Error;

/// Errors that can occur during constant pool operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConstPoolError {
    #[error("Constant pool is out of space")]
    OutOfSpace,
    #[error("Constant too long for a Utf8 entry: {len} bytes")]
    Utf8TooLong { len: usize },
}

/// Errors that can occur during class file generation
#[derive(Error, Debug)]
pub enum ClassGenerationError {
    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),
    #[error("Bytecode generation error: {0}")]
    Bytecode(#[from] BytecodeError),
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
    #[error("Class header has not been visited")]
    MissingHeader,
    #[error("Method '{name}' is still open")]
    UnfinishedMethod { name: String },
    #[error("Instruction outside of a method body")]
    InsnOutsideMethod,
}

/// Errors that can occur while assembling a method body
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("Stack underflow at instruction {index}")]
    StackUnderflow { index: usize },
    #[error("Invalid opcode 0x{opcode:02x} for {kind} instruction")]
    InvalidOpcode { opcode: u8, kind: &'static str },
    #[error("Operand {operand} out of range for opcode 0x{opcode:02x}")]
    OperandOutOfRange { opcode: u8, operand: i32 },
    #[error("Code too large: {size} bytes")]
    CodeTooLarge { size: usize },
}

/// Errors that can occur while reading descriptors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Invalid type descriptor: {descriptor}")]
    InvalidTypeDescriptor { descriptor: String },
    #[error("Invalid method descriptor: {descriptor}")]
    InvalidMethodDescriptor { descriptor: String },
}

/// Generic result type for code generation operations
pub type CodeGenResult<T> = Result<T, ClassGenerationError>;

/// Generic result type for constant pool operations
pub type ConstPoolResult<T> = Result<T, ConstPoolError>;

/// Generic result type for bytecode operations
pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// Generic result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;
