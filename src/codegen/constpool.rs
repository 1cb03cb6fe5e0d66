//! Constant pool and constants for Java class files
//!
//! Indices are 1-based as in the class file; `Long` and `Double` entries take two
//! indices. Identical entries are stored once.

use std::collections::HashMap;

use super::error::{ConstPoolError, ConstPoolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
}

/// Hashable identity of a constant; floats are keyed by their bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Ref(u8, u16, u16),
}

impl Constant {
    fn key(&self) -> ConstantKey {
        use constant_tags::*;
        match self {
            Constant::Utf8(s) => ConstantKey::Utf8(s.clone()),
            Constant::Integer(v) => ConstantKey::Integer(*v),
            Constant::Float(v) => ConstantKey::Float(v.to_bits()),
            Constant::Long(v) => ConstantKey::Long(*v),
            Constant::Double(v) => ConstantKey::Double(v.to_bits()),
            Constant::Class(i) => ConstantKey::Ref(CONSTANT_CLASS, *i, 0),
            Constant::String(i) => ConstantKey::Ref(CONSTANT_STRING, *i, 0),
            Constant::FieldRef(a, b) => ConstantKey::Ref(CONSTANT_FIELDREF, *a, *b),
            Constant::MethodRef(a, b) => ConstantKey::Ref(CONSTANT_METHODREF, *a, *b),
            Constant::InterfaceMethodRef(a, b) => ConstantKey::Ref(CONSTANT_INTERFACEMETHODREF, *a, *b),
            Constant::NameAndType(a, b) => ConstantKey::Ref(CONSTANT_NAMEANDTYPE, *a, *b),
        }
    }

    /// Number of pool indices the entry occupies
    pub fn width(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        use constant_tags::*;
        let mut bytes = Vec::new();
        match self {
            Constant::Utf8(value) => {
                bytes.push(CONSTANT_UTF8);
                let encoded = encode_modified_utf8(value);
                bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
                bytes.extend_from_slice(&encoded);
            }
            Constant::Integer(value) => {
                bytes.push(CONSTANT_INTEGER);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Float(value) => {
                bytes.push(CONSTANT_FLOAT);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Long(value) => {
                bytes.push(CONSTANT_LONG);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Double(value) => {
                bytes.push(CONSTANT_DOUBLE);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Class(name_index) => {
                bytes.push(CONSTANT_CLASS);
                bytes.extend_from_slice(&name_index.to_be_bytes());
            }
            Constant::String(string_index) => {
                bytes.push(CONSTANT_STRING);
                bytes.extend_from_slice(&string_index.to_be_bytes());
            }
            Constant::FieldRef(class_index, name_and_type_index) => {
                bytes.push(CONSTANT_FIELDREF);
                bytes.extend_from_slice(&class_index.to_be_bytes());
                bytes.extend_from_slice(&name_and_type_index.to_be_bytes());
            }
            Constant::MethodRef(class_index, name_and_type_index) => {
                bytes.push(CONSTANT_METHODREF);
                bytes.extend_from_slice(&class_index.to_be_bytes());
                bytes.extend_from_slice(&name_and_type_index.to_be_bytes());
            }
            Constant::InterfaceMethodRef(class_index, name_and_type_index) => {
                bytes.push(CONSTANT_INTERFACEMETHODREF);
                bytes.extend_from_slice(&class_index.to_be_bytes());
                bytes.extend_from_slice(&name_and_type_index.to_be_bytes());
            }
            Constant::NameAndType(name_index, descriptor_index) => {
                bytes.push(CONSTANT_NAMEANDTYPE);
                bytes.extend_from_slice(&name_index.to_be_bytes());
                bytes.extend_from_slice(&descriptor_index.to_be_bytes());
            }
        }
        bytes
    }
}

/// Java's "modified UTF-8": NUL and supplementary characters are encoded specially
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | ((unit >> 6) as u8 & 0x1f));
                out.push(0x80 | (unit as u8 & 0x3f));
            }
            _ => {
                out.push(0xe0 | ((unit >> 12) as u8 & 0x0f));
                out.push(0x80 | ((unit >> 6) as u8 & 0x3f));
                out.push(0x80 | (unit as u8 & 0x3f));
            }
        }
    }
    out
}

#[derive(Debug)]
pub struct ConstantPool {
    pub(crate) constants: Vec<Constant>,
    index: HashMap<ConstantKey, u16>,
    next_index: u16,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self { constants: Vec::new(), index: HashMap::new(), next_index: 1 }
    }

    /// Add an entry (or find the existing one) and return its pool index
    pub fn add(&mut self, constant: Constant) -> ConstPoolResult<u16> {
        let key = constant.key();
        if let Some(&existing) = self.index.get(&key) {
            return Ok(existing);
        }
        if let Constant::Utf8(value) = &constant {
            let len = encode_modified_utf8(value).len();
            if len > u16::MAX as usize {
                return Err(ConstPoolError::Utf8TooLong { len });
            }
        }
        let at = self.next_index;
        let next = u32::from(at) + u32::from(constant.width());
        if next > u32::from(u16::MAX) {
            return Err(ConstPoolError::OutOfSpace);
        }
        self.next_index = next as u16;
        self.constants.push(constant);
        self.index.insert(key, at);
        Ok(at)
    }

    pub fn add_utf8(&mut self, value: &str) -> ConstPoolResult<u16> {
        self.add(Constant::Utf8(value.to_string()))
    }

    pub fn add_class(&mut self, name: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(name)?;
        self.add(Constant::Class(name_index))
    }

    pub fn add_string(&mut self, value: &str) -> ConstPoolResult<u16> {
        let utf8_index = self.add_utf8(value)?;
        self.add(Constant::String(utf8_index))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str, interface: bool) -> ConstPoolResult<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        if interface {
            self.add(Constant::InterfaceMethodRef(class_index, name_and_type_index))
        } else {
            self.add(Constant::MethodRef(class_index, name_and_type_index))
        }
    }

    /// Number of indices in use, i.e. the `constant_pool_count` minus one
    pub fn len(&self) -> u16 {
        self.next_index - 1
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Look up an entry by its 1-based index
    pub fn get(&self, index: u16) -> Option<&Constant> {
        let mut at = 1u16;
        for constant in &self.constants {
            if at == index {
                return Some(constant);
            }
            at += constant.width();
        }
        None
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.next_index.to_be_bytes());
        for constant in &self.constants {
            bytes.extend_from_slice(&constant.to_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_one_based_and_deduplicated() {
        let mut pool = ConstantPool::new();
        let a = pool.add_utf8("a").unwrap();
        let b = pool.add_utf8("b").unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(pool.add_utf8("a").unwrap(), 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn wide_entries_take_two_indices() {
        let mut pool = ConstantPool::new();
        let long = pool.add(Constant::Long(5)).unwrap();
        let next = pool.add_utf8("x").unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert_eq!(pool.get(3), Some(&Constant::Utf8("x".into())));
        assert_eq!(pool.get(2), None);
        // count field = highest index + 1
        assert_eq!(&pool.to_bytes()[..2], &[0, 4]);
    }

    #[test]
    fn method_refs_share_class_and_name_entries() {
        let mut pool = ConstantPool::new();
        let m = pool.add_method_ref("java/lang/Object", "<init>", "()V", false).unwrap();
        let again = pool.add_method_ref("java/lang/Object", "<init>", "()V", false).unwrap();
        let itf = pool.add_method_ref("java/lang/Object", "<init>", "()V", true).unwrap();
        assert_eq!(m, again);
        assert_ne!(m, itf);
    }

    #[test]
    fn modified_utf8_encodes_nul_as_two_bytes() {
        assert_eq!(encode_modified_utf8("\0"), vec![0xc0, 0x80]);
        assert_eq!(encode_modified_utf8("A"), vec![0x41]);
        assert_eq!(encode_modified_utf8("\u{1F600}").len(), 6);
    }
}
