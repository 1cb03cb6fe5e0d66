//! Access flags for classes, fields, and methods

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ENUM: u16 = 0x4000;

    /// All visibility bits
    pub const VISIBILITY_MASK: u16 = ACC_PUBLIC | ACC_PRIVATE | ACC_PROTECTED;
}

use access_flags::*;

pub fn is_static(flags: u16) -> bool {
    flags & ACC_STATIC != 0
}

pub fn is_enum(flags: u16) -> bool {
    flags & ACC_ENUM != 0
}

/// Replace whatever visibility the flags carry with `private`
pub fn make_private(flags: u16) -> u16 {
    (flags & !VISIBILITY_MASK) | ACC_PRIVATE
}
