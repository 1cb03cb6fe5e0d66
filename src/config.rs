//! Stub transformation configuration

use crate::consts::{
    DEFAULT_NOT_IMPLEMENTED_CLASS, ENV_NOT_IMPLEMENTED_CLASS, ENV_PRIVATIZE_RECORD_FIELDS,
    ENV_VERIFY_OUTPUT,
};
use crate::error::{Error, Result};

/// Options controlling how classes are erased into stubs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubConfig {
    /// Internal name of the class thrown from erased constructors.
    /// Must have an accessible no-argument constructor.
    pub not_implemented_class: String,
    /// Force instance fields of record classes to private visibility
    pub privatize_record_fields: bool,
    /// Run the stub-body verifier over every synthesized method
    pub verify_output: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            not_implemented_class: DEFAULT_NOT_IMPLEMENTED_CLASS.to_string(),
            privatize_record_fields: true,
            verify_output: true,
        }
    }
}

impl StubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `CLASSSTUB_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(class) = std::env::var(ENV_NOT_IMPLEMENTED_CLASS) {
            config = config.with_not_implemented_class(class)?;
        }
        if let Ok(value) = std::env::var(ENV_PRIVATIZE_RECORD_FIELDS) {
            config.privatize_record_fields = parse_bool(ENV_PRIVATIZE_RECORD_FIELDS, &value)?;
        }
        if let Ok(value) = std::env::var(ENV_VERIFY_OUTPUT) {
            config.verify_output = parse_bool(ENV_VERIFY_OUTPUT, &value)?;
        }
        Ok(config)
    }

    /// Use a different throwable for erased constructors. Accepts dotted or internal names.
    pub fn with_not_implemented_class(mut self, class: impl Into<String>) -> Result<Self> {
        let class = class.into().trim().replace('.', "/");
        if class.is_empty() || class.starts_with('/') || class.ends_with('/') || class.contains(';') {
            return Err(Error::config(format!("invalid not-implemented class name '{}'", class)));
        }
        self.not_implemented_class = class;
        Ok(self)
    }

    pub fn with_privatize_record_fields(mut self, enabled: bool) -> Self {
        self.privatize_record_fields = enabled;
        self
    }

    pub fn with_verify_output(mut self, enabled: bool) -> Self {
        self.verify_output = enabled;
        self
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(format!("{} expects a boolean, got '{}'", var, other))),
    }
}
