//! Class stub generator (classstub)
//!
//! Turns a fully implemented JVM class into an API-only stub that keeps its
//! binary shape. Static fields get default values, enum constants are still
//! constructed, and constructors are reduced to their delegation call plus a
//! thrown "not implemented" error. A record's canonical constructor keeps its
//! plain field-copying body.
//!
//! ## Architecture
//!
//! - **visitor**: streaming class-structure events, the in-memory `ClassModel`
//!   and the instruction capture helper
//! - **eraser**: the `FieldValueEraser` visitor that classifies declarations and
//!   synthesizes the replacement bodies
//! - **codegen**: symbolic instructions, emission helpers, descriptors and the
//!   class-file writer
//! - **verify**: straight-line type checking for synthesized bodies
//!
//! ## Flow
//!
//! ```text
//! ClassModel::accept → FieldValueEraser → ClassRecorder   (erase)
//!                                       → ClassFileWriter (erase_to_bytes)
//! ```

pub mod codegen;
pub mod config;
pub mod consts;
pub mod eraser;
pub mod error;
pub mod verify;
pub mod visitor;

pub use config::StubConfig;
pub use eraser::{FieldValueEraser, StubError};
pub use error::{Error, Result};
pub use visitor::{ClassModel, ClassVisitor};

use codegen::class_writer::ClassFileWriter;
use visitor::ClassRecorder;

/// Erase a class held in memory, returning the stub as a new model
pub fn erase(model: &ClassModel, config: &StubConfig) -> Result<ClassModel> {
    let mut eraser = FieldValueEraser::new(ClassRecorder::new(), config.clone());
    model.accept(&mut eraser)?;
    eraser.into_inner().finish()
}

/// Erase a class and serialize the stub to class-file bytes
pub fn erase_to_bytes(model: &ClassModel, config: &StubConfig) -> Result<Vec<u8>> {
    let mut eraser = FieldValueEraser::new(ClassFileWriter::new(), config.clone());
    model.accept(&mut eraser)?;
    let bytes = eraser.into_inner().to_bytes()?;
    log::debug!("serialized stub of {} ({} bytes)", model.header.name, bytes.len());
    Ok(bytes)
}
