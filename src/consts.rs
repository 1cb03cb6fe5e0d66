// Well-known internal names and descriptors referenced by synthesized code

/// Superclass of every record class
pub const RECORD_SUPER_CLASS: &str = "java/lang/Record";

/// Root of the class hierarchy
pub const OBJECT_CLASS: &str = "java/lang/Object";

/// Default "not implemented" signal thrown from erased constructors
pub const DEFAULT_NOT_IMPLEMENTED_CLASS: &str = "java/lang/AbstractMethodError";

/// Descriptor of a no-argument, void method
pub const VOID_NO_ARGS_DESCRIPTOR: &str = "()V";

/// Number of leading constructor parameters every enum constructor receives (name, ordinal)
pub const ENUM_IMPLICIT_PARAMS: usize = 2;

// Environment variables read by StubConfig::from_env
pub const ENV_NOT_IMPLEMENTED_CLASS: &str = "CLASSSTUB_NOT_IMPLEMENTED_CLASS";
pub const ENV_PRIVATIZE_RECORD_FIELDS: &str = "CLASSSTUB_PRIVATIZE_RECORD_FIELDS";
pub const ENV_VERIFY_OUTPUT: &str = "CLASSSTUB_VERIFY_OUTPUT";
