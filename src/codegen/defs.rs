//! Generic classfile-specific definitions

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Name of a constructor
pub const CONSTRUCTOR_METHOD_NAME: &str = "<init>";

/// Name of a static initializer
pub const STATIC_INITIALIZER_METHOD_NAME: &str = "<clinit>";

/// JVM version constants
pub mod major_versions {
    pub const JAVA_8: u16 = 52;
    pub const JAVA_11: u16 = 55;
    pub const JAVA_16: u16 = 60;
    pub const JAVA_17: u16 = 61;
    pub const JAVA_21: u16 = 65;
}

// Attribute names emitted by the class writer
pub const ATTR_CODE: &str = "Code";
pub const ATTR_CONSTANT_VALUE: &str = "ConstantValue";
pub const ATTR_EXCEPTIONS: &str = "Exceptions";
pub const ATTR_SIGNATURE: &str = "Signature";
pub const ATTR_RECORD: &str = "Record";
