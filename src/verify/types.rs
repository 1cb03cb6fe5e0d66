//! Verification types for straight-line type checking

use std::fmt;

/// Type of one operand-stack entry or local variable.
///
/// Category-2 values (`Long`, `Double`) are a single entry here; slot widths are
/// accounted for separately when locals are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VType {
    Int,
    Float,
    Long,
    Double,
    Null,
    /// Initialized reference of the named class (array descriptors keep their `[` form)
    Reference(String),
    /// Result of `new` at the given instruction index, before its constructor ran
    Uninitialized { class: String, at: usize },
    /// The receiver of a constructor before the delegation call
    UninitializedThis,
}

impl VType {
    /// Verification type of a value of the given field descriptor
    pub fn of_descriptor(desc: &str) -> VType {
        match desc.as_bytes().first() {
            Some(b'Z' | b'B' | b'C' | b'S' | b'I') => VType::Int,
            Some(b'J') => VType::Long,
            Some(b'F') => VType::Float,
            Some(b'D') => VType::Double,
            _ => VType::Reference(crate::codegen::descriptor::class_name_of(desc).unwrap_or(desc).to_string()),
        }
    }

    pub fn is_category2(&self) -> bool {
        matches!(self, VType::Long | VType::Double)
    }

    /// Whether a value of this type may be stored where `expected` is required.
    /// Reference compatibility is not checked against the class hierarchy.
    pub fn is_assignable_to(&self, expected: &VType) -> bool {
        match (self, expected) {
            (VType::Null | VType::Reference(_), VType::Reference(_)) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for VType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VType::Int => write!(f, "int"),
            VType::Float => write!(f, "float"),
            VType::Long => write!(f, "long"),
            VType::Double => write!(f, "double"),
            VType::Null => write!(f, "null"),
            VType::Reference(class) => write!(f, "{}", class),
            VType::Uninitialized { class, at } => write!(f, "uninitialized({} @{})", class, at),
            VType::UninitializedThis => write!(f, "uninitializedThis"),
        }
    }
}
