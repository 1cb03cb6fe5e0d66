//! Class file writer: the serializing end of a visitor chain
//!
//! `ClassFileWriter` turns visitor events into a [`ClassFile`] and from there
//! into class-file bytes. Method bodies are assembled when each method ends.

use std::path::Path;

use super::attribute::{
    make_code_attribute, make_constant_value_attribute, make_exceptions_attribute, make_record_attribute,
    make_signature_attribute, AttributeInfo, RecordComponentInfo,
};
use super::class::ClassFile;
use super::code::assemble;
use super::constpool::Constant;
use super::descriptor::{split_parameters, validate_field_descriptor};
use super::error::ClassGenerationError;
use super::field::FieldInfo;
use super::insn::{ConstantValue, Insn};
use super::method::MethodInfo;
use super::writer::ClassfileWritable;
use crate::error::Result;
use crate::visitor::{BodyHandling, ClassHeader, ClassVisitor, FieldDecl, MethodDecl, RecordComponentDecl};

#[derive(Debug)]
struct OpenMethod {
    decl: MethodDecl,
    insns: Vec<Insn>,
}

#[derive(Debug, Default)]
pub struct ClassFileWriter {
    class_file: ClassFile,
    header_seen: bool,
    is_record: bool,
    record_components: Vec<RecordComponentInfo>,
    open: Option<OpenMethod>,
}

impl ClassFileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_file(&self) -> &ClassFile {
        &self.class_file
    }

    pub fn into_class_file(self) -> ClassFile {
        self.class_file
    }

    /// Serialized class file bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.header_seen {
            return Err(ClassGenerationError::MissingHeader.into());
        }
        if let Some(open) = &self.open {
            return Err(ClassGenerationError::UnfinishedMethod { name: open.decl.name.clone() }.into());
        }
        Ok(self.class_file.to_classfile_bytes())
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn signature_attribute(&mut self, signature: Option<&str>) -> Result<Option<AttributeInfo>> {
        match signature {
            Some(signature) => Ok(Some(make_signature_attribute(&mut self.class_file.constant_pool, signature)?)),
            None => Ok(None),
        }
    }

    fn pool_constant(&mut self, value: &ConstantValue) -> Result<u16> {
        let pool = &mut self.class_file.constant_pool;
        let index = match value {
            ConstantValue::Int(v) => pool.add(Constant::Integer(*v))?,
            ConstantValue::Float(v) => pool.add(Constant::Float(*v))?,
            ConstantValue::Long(v) => pool.add(Constant::Long(*v))?,
            ConstantValue::Double(v) => pool.add(Constant::Double(*v))?,
            ConstantValue::String(s) => pool.add_string(s)?,
        };
        Ok(index)
    }
}

impl ClassVisitor for ClassFileWriter {
    fn visit_header(&mut self, header: &ClassHeader) -> Result<()> {
        let mut class_file = ClassFile::new();
        class_file.major_version = header.version;
        class_file.access_flags = header.access_flags;
        class_file.this_class = class_file.constant_pool.add_class(&header.name)?;
        class_file.super_class = match &header.super_name {
            Some(super_name) => class_file.constant_pool.add_class(super_name)?,
            None => 0,
        };
        for interface in &header.interfaces {
            let index = class_file.constant_pool.add_class(interface)?;
            class_file.interfaces.push(index);
        }
        self.class_file = class_file;
        self.header_seen = true;
        self.is_record = header.is_record();
        self.record_components.clear();
        self.open = None;

        if let Some(attribute) = self.signature_attribute(header.signature.as_deref())? {
            self.class_file.attributes.push(attribute);
        }
        Ok(())
    }

    fn visit_record_component(&mut self, component: &RecordComponentDecl) -> Result<()> {
        validate_field_descriptor(&component.descriptor)?;
        let pool = &mut self.class_file.constant_pool;
        let name_index = pool.add_utf8(&component.name)?;
        let descriptor_index = pool.add_utf8(&component.descriptor)?;
        let attributes = self.signature_attribute(component.signature.as_deref())?.into_iter().collect();
        self.record_components.push(RecordComponentInfo { name_index, descriptor_index, attributes });
        Ok(())
    }

    fn visit_field(&mut self, field: &FieldDecl) -> Result<()> {
        validate_field_descriptor(&field.descriptor)?;
        let name_index = self.class_file.constant_pool.add_utf8(&field.name)?;
        let descriptor_index = self.class_file.constant_pool.add_utf8(&field.descriptor)?;
        let mut info = FieldInfo::new(field.access_flags, name_index, descriptor_index);
        if let Some(value) = &field.value {
            let value_index = self.pool_constant(value)?;
            info.attributes.push(make_constant_value_attribute(&mut self.class_file.constant_pool, value_index)?);
        }
        if let Some(attribute) = self.signature_attribute(field.signature.as_deref())? {
            info.attributes.push(attribute);
        }
        self.class_file.fields.push(info);
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<BodyHandling> {
        if let Some(open) = &self.open {
            return Err(ClassGenerationError::UnfinishedMethod { name: open.decl.name.clone() }.into());
        }
        split_parameters(&method.descriptor)?;
        self.open = Some(OpenMethod { decl: method.clone(), insns: Vec::new() });
        Ok(BodyHandling::Forward)
    }

    fn visit_insn(&mut self, insn: &Insn) -> Result<()> {
        let open = self.open.as_mut().ok_or(ClassGenerationError::InsnOutsideMethod)?;
        open.insns.push(insn.clone());
        Ok(())
    }

    fn visit_method_end(&mut self) -> Result<()> {
        let OpenMethod { decl, insns } = self.open.take().ok_or(ClassGenerationError::InsnOutsideMethod)?;
        let pool = &mut self.class_file.constant_pool;
        let name_index = pool.add_utf8(&decl.name)?;
        let descriptor_index = pool.add_utf8(&decl.descriptor)?;
        let mut info = MethodInfo::new(decl.access_flags, name_index, descriptor_index);

        // abstract and native methods carry no Code attribute
        if !insns.is_empty() {
            let assembled = assemble(&insns, pool, &decl.descriptor, decl.is_static())?;
            info.attributes.push(make_code_attribute(pool, &assembled)?);
        }
        if !decl.exceptions.is_empty() {
            info.attributes.push(make_exceptions_attribute(pool, &decl.exceptions)?);
        }
        if let Some(attribute) = self.signature_attribute(decl.signature.as_deref())? {
            info.attributes.push(attribute);
        }
        log::trace!("wrote method {}{} ({} instructions)", decl.name, decl.descriptor, insns.len());
        self.class_file.methods.push(info);
        Ok(())
    }

    fn visit_end(&mut self) -> Result<()> {
        if !self.header_seen {
            return Err(ClassGenerationError::MissingHeader.into());
        }
        if let Some(open) = &self.open {
            return Err(ClassGenerationError::UnfinishedMethod { name: open.decl.name.clone() }.into());
        }
        if self.is_record {
            let attribute = make_record_attribute(&mut self.class_file.constant_pool, &self.record_components)?;
            self.class_file.attributes.push(attribute);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;
    use crate::codegen::opcodes::*;

    #[test]
    fn writes_magic_and_version() {
        let mut writer = ClassFileWriter::new();
        writer.visit_header(&ClassHeader::new(ACC_PUBLIC | ACC_SUPER, "p/A", "java/lang/Object")).unwrap();
        writer.visit_end().unwrap();
        let bytes = writer.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 61);
    }

    #[test]
    fn methods_without_instructions_have_no_code() {
        let mut writer = ClassFileWriter::new();
        writer.visit_header(&ClassHeader::new(ACC_PUBLIC | ACC_ABSTRACT, "p/A", "java/lang/Object")).unwrap();
        writer.visit_method(&MethodDecl::new(ACC_PUBLIC | ACC_ABSTRACT, "run", "()V")).unwrap();
        writer.visit_method_end().unwrap();
        writer.visit_end().unwrap();
        assert!(writer.class_file().methods[0].attributes.is_empty());
    }

    #[test]
    fn open_method_blocks_serialization() {
        let mut writer = ClassFileWriter::new();
        writer.visit_header(&ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object")).unwrap();
        writer.visit_method(&MethodDecl::new(ACC_STATIC, "<clinit>", "()V")).unwrap();
        writer.visit_insn(&Insn::Simple(RETURN)).unwrap();
        assert!(writer.to_bytes().is_err());
        writer.visit_method_end().unwrap();
        assert!(writer.to_bytes().is_ok());
    }

    #[test]
    fn bad_field_descriptor_is_rejected() {
        let mut writer = ClassFileWriter::new();
        writer.visit_header(&ClassHeader::new(ACC_PUBLIC, "p/A", "java/lang/Object")).unwrap();
        assert!(writer.visit_field(&FieldDecl::new(ACC_PUBLIC, "x", "int")).is_err());
    }
}
