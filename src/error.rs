use thiserror::Error;

use crate::codegen::error::{BytecodeError, ClassGenerationError, ConstPoolError, DescriptorError};
use crate::eraser::StubError;
use crate::verify::VerifyError;

/// Result type for classstub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the stub transformation pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Stub synthesis error: {0}")]
    Stub(#[from] StubError),

    #[error("Class generation error: {0}")]
    ClassGeneration(#[from] ClassGenerationError),

    #[error("Verification failed in {method}: {source}")]
    Verify {
        method: String,
        #[source]
        source: VerifyError,
    },

    #[error("Visitor protocol violation: {message}")]
    Protocol { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a protocol error for out-of-order visitor events
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol { message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Attach the method being verified to a verifier error
    pub fn verify(method: impl Into<String>, source: VerifyError) -> Self {
        Self::Verify { method: method.into(), source }
    }
}

impl From<ConstPoolError> for Error {
    fn from(err: ConstPoolError) -> Self {
        Self::ClassGeneration(err.into())
    }
}

impl From<BytecodeError> for Error {
    fn from(err: BytecodeError) -> Self {
        Self::ClassGeneration(err.into())
    }
}
