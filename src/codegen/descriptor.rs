//! Utilities to read field and method descriptors

use super::error::{DescriptorError, DescriptorResult};

/// Length in bytes of the single field type starting at `desc[start..]`
fn field_type_len(desc: &str, start: usize) -> Option<usize> {
    let bytes = desc.as_bytes();
    let mut i = start;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match bytes.get(i)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(i + 1 - start),
        b'L' => {
            let end = desc[i..].find(';')?;
            if end == 1 {
                return None;
            }
            Some(i + end + 1 - start)
        }
        _ => None,
    }
}

/// Check that `desc` is exactly one field type
pub fn validate_field_descriptor(desc: &str) -> DescriptorResult<()> {
    match field_type_len(desc, 0) {
        Some(len) if len == desc.len() => Ok(()),
        _ => Err(DescriptorError::InvalidTypeDescriptor { descriptor: desc.to_string() }),
    }
}

/// The text between the parentheses of a method descriptor
pub fn parameter_section(method_desc: &str) -> DescriptorResult<&str> {
    let invalid = || DescriptorError::InvalidMethodDescriptor { descriptor: method_desc.to_string() };
    if !method_desc.starts_with('(') {
        return Err(invalid());
    }
    let close = method_desc.find(')').ok_or_else(invalid)?;
    Ok(&method_desc[1..close])
}

/// Split a method descriptor into its parameter type descriptors, in order
pub fn split_parameters(method_desc: &str) -> DescriptorResult<Vec<&str>> {
    let params = parameter_section(method_desc)?;
    let ret = &method_desc[params.len() + 2..];
    if ret != "V" && field_type_len(ret, 0) != Some(ret.len()) {
        return Err(DescriptorError::InvalidMethodDescriptor { descriptor: method_desc.to_string() });
    }
    let mut out = Vec::new();
    let mut i = 0;
    while i < params.len() {
        let len = field_type_len(params, i)
            .ok_or_else(|| DescriptorError::InvalidMethodDescriptor { descriptor: method_desc.to_string() })?;
        out.push(&params[i..i + len]);
        i += len;
    }
    Ok(out)
}

/// Return type descriptor of a method descriptor ("V" for void)
pub fn return_type(method_desc: &str) -> DescriptorResult<&str> {
    let params = parameter_section(method_desc)?;
    Ok(&method_desc[params.len() + 2..])
}

/// Local-variable slots occupied by a value of this type
pub fn slot_width(desc: &str) -> u16 {
    match desc {
        "J" | "D" => 2,
        _ => 1,
    }
}

/// Each parameter paired with the local slot it arrives in, starting at `first_slot`
pub fn parameter_slots(method_desc: &str, first_slot: u16) -> DescriptorResult<Vec<(&str, u16)>> {
    let mut slot = first_slot;
    let mut out = Vec::new();
    for param in split_parameters(method_desc)? {
        out.push((param, slot));
        slot += slot_width(param);
    }
    Ok(out)
}

/// Total local slots taken by the parameters of a method descriptor
pub fn parameter_slot_count(method_desc: &str) -> DescriptorResult<u16> {
    Ok(split_parameters(method_desc)?.into_iter().map(slot_width).sum())
}

/// Internal class name of an object descriptor, `None` for primitives.
/// Arrays keep their descriptor form, as constant pool Class entries expect.
pub fn class_name_of(desc: &str) -> Option<&str> {
    if desc.starts_with('[') {
        Some(desc)
    } else if desc.starts_with('L') && desc.ends_with(';') {
        Some(&desc[1..desc.len() - 1])
    } else {
        None
    }
}
