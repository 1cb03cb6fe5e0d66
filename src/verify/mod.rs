//! Verification of synthesized method bodies
//!
//! Stub bodies are straight-line code, so verification by type-checking reduces
//! to a single forward walk: every instruction must find the operand types it
//! needs on the stack and in the locals, constructors must run exactly one
//! delegation call before returning, and the body must end in `return` or `athrow`.

mod stub_body;
mod types;

pub use stub_body::{verify_body, BodyContext, VerifyError, VerifyResult};
pub use types::VType;
