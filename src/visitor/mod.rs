//! Streaming class-structure events
//!
//! A class is described to a [`ClassVisitor`] as a sequence of declarations in
//! file order: the header, record components, fields, then each method with its
//! instructions, then the end of the class. Visitors are chained by wrapping a
//! downstream visitor and forwarding (or replacing) the events they receive.

pub mod collector;
pub mod model;

pub use collector::InsnCollector;
pub use model::{ClassModel, ClassRecorder, MethodModel};

use crate::codegen::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::insn::{ConstantValue, Insn};
use crate::consts::RECORD_SUPER_CLASS;
use crate::error::Result;

/// The class header: version, flags, name and supertypes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub version: u16,
    pub access_flags: u16,
    pub name: String,
    pub signature: Option<String>,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
}

impl ClassHeader {
    pub fn new(access_flags: u16, name: &str, super_name: &str) -> Self {
        Self {
            version: crate::codegen::defs::major_versions::JAVA_17,
            access_flags,
            name: name.to_string(),
            signature: None,
            super_name: Some(super_name.to_string()),
            interfaces: Vec::new(),
        }
    }

    /// Records are exactly the classes whose direct superclass is `java/lang/Record`
    pub fn is_record(&self) -> bool {
        self.super_name.as_deref() == Some(RECORD_SUPER_CLASS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub value: Option<ConstantValue>,
}

impl FieldDecl {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            value: None,
        }
    }

    pub fn with_value(mut self, value: ConstantValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponentDecl {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

impl RecordComponentDecl {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self { name: name.to_string(), descriptor: descriptor.to_string(), signature: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
}

impl MethodDecl {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            exceptions: Vec::new(),
        }
    }

    pub fn constructor(access_flags: u16, descriptor: &str) -> Self {
        Self::new(access_flags, CONSTRUCTOR_METHOD_NAME, descriptor)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_METHOD_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_METHOD_NAME
    }

    pub fn is_static(&self) -> bool {
        crate::codegen::flag::is_static(self.access_flags)
    }
}

/// How a visitor wants the body of the method it was just shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyHandling {
    /// Stream every instruction
    Forward,
    /// Only instructions with this opcode are of interest
    Intercept(u8),
    /// The body is not wanted; only `visit_method_end` follows
    Skip,
}

impl BodyHandling {
    /// Whether an instruction should be streamed under this handling
    pub fn wants(&self, insn: &Insn) -> bool {
        match self {
            BodyHandling::Forward => true,
            BodyHandling::Intercept(opcode) => insn.opcode() == *opcode,
            BodyHandling::Skip => false,
        }
    }
}

/// Receiver of class-structure events.
///
/// Drivers call `visit_header` first and `visit_end` last. Every `visit_method`
/// is followed by the method's instructions (filtered according to the returned
/// [`BodyHandling`]) and exactly one `visit_method_end`.
pub trait ClassVisitor {
    fn visit_header(&mut self, header: &ClassHeader) -> Result<()>;

    fn visit_record_component(&mut self, component: &RecordComponentDecl) -> Result<()>;

    fn visit_field(&mut self, field: &FieldDecl) -> Result<()>;

    fn visit_method(&mut self, method: &MethodDecl) -> Result<BodyHandling>;

    fn visit_insn(&mut self, insn: &Insn) -> Result<()>;

    fn visit_method_end(&mut self) -> Result<()>;

    fn visit_end(&mut self) -> Result<()>;
}

impl<V: ClassVisitor + ?Sized> ClassVisitor for &mut V {
    fn visit_header(&mut self, header: &ClassHeader) -> Result<()> {
        (**self).visit_header(header)
    }

    fn visit_record_component(&mut self, component: &RecordComponentDecl) -> Result<()> {
        (**self).visit_record_component(component)
    }

    fn visit_field(&mut self, field: &FieldDecl) -> Result<()> {
        (**self).visit_field(field)
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<BodyHandling> {
        (**self).visit_method(method)
    }

    fn visit_insn(&mut self, insn: &Insn) -> Result<()> {
        (**self).visit_insn(insn)
    }

    fn visit_method_end(&mut self) -> Result<()> {
        (**self).visit_method_end()
    }

    fn visit_end(&mut self) -> Result<()> {
        (**self).visit_end()
    }
}

/// Stream a complete method body to `visitor`, honouring the handling it asks for
pub fn emit_method(visitor: &mut dyn ClassVisitor, method: &MethodDecl, insns: &[Insn]) -> Result<()> {
    let handling = visitor.visit_method(method)?;
    for insn in insns.iter().filter(|insn| handling.wants(insn)) {
        visitor.visit_insn(insn)?;
    }
    visitor.visit_method_end()
}
