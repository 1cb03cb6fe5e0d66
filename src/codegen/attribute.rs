//! Attribute payloads for Java class files

use super::code::AssembledCode;
use super::constpool::ConstantPool;
use super::defs::*;
use super::error::ConstPoolResult;

/// A named attribute with its already-encoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
        bytes
    }
}

/// Code attribute without exception handlers or nested attributes
pub fn make_code_attribute(pool: &mut ConstantPool, code: &AssembledCode) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(ATTR_CODE)?;
    let mut info = Vec::new();
    info.extend_from_slice(&code.max_stack.to_be_bytes());
    info.extend_from_slice(&code.max_locals.to_be_bytes());
    info.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
    info.extend_from_slice(&code.code);
    // exception_table_length, attributes_count
    info.extend_from_slice(&0u16.to_be_bytes());
    info.extend_from_slice(&0u16.to_be_bytes());
    Ok(AttributeInfo::new(name_index, info))
}

/// ConstantValue attribute pointing at an already-pooled constant
pub fn make_constant_value_attribute(pool: &mut ConstantPool, value_index: u16) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(ATTR_CONSTANT_VALUE)?;
    Ok(AttributeInfo::new(name_index, value_index.to_be_bytes().to_vec()))
}

pub fn make_signature_attribute(pool: &mut ConstantPool, signature: &str) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(ATTR_SIGNATURE)?;
    let signature_index = pool.add_utf8(signature)?;
    Ok(AttributeInfo::new(name_index, signature_index.to_be_bytes().to_vec()))
}

pub fn make_exceptions_attribute(pool: &mut ConstantPool, exceptions: &[String]) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(ATTR_EXCEPTIONS)?;
    let mut info = Vec::new();
    info.extend_from_slice(&(exceptions.len() as u16).to_be_bytes());
    for exception in exceptions {
        info.extend_from_slice(&pool.add_class(exception)?.to_be_bytes());
    }
    Ok(AttributeInfo::new(name_index, info))
}

/// One entry of the Record attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponentInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

pub fn make_record_attribute(pool: &mut ConstantPool, components: &[RecordComponentInfo]) -> ConstPoolResult<AttributeInfo> {
    let name_index = pool.add_utf8(ATTR_RECORD)?;
    let mut info = Vec::new();
    info.extend_from_slice(&(components.len() as u16).to_be_bytes());
    for component in components {
        info.extend_from_slice(&component.name_index.to_be_bytes());
        info.extend_from_slice(&component.descriptor_index.to_be_bytes());
        info.extend_from_slice(&(component.attributes.len() as u16).to_be_bytes());
        for attribute in &component.attributes {
            info.extend_from_slice(&attribute.to_bytes());
        }
    }
    Ok(AttributeInfo::new(name_index, info))
}
