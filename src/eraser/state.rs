//! Per-class accumulators filled while a class streams through the eraser

use super::StubError;
use crate::codegen::descriptor::parameter_section;
use crate::codegen::flag::{is_enum, is_static};
use crate::codegen::insn::Insn;
use crate::codegen::opcodes::INVOKESPECIAL;
use crate::visitor::{ClassHeader, FieldDecl, InsnCollector, MethodDecl, RecordComponentDecl};

/// Facts about the class fixed by its header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassContext {
    pub name: String,
    pub super_name: Option<String>,
    pub is_record: bool,
    /// Concatenated record component descriptors, i.e. the canonical constructor's parameters
    pub canonical_descriptor: String,
}

impl ClassContext {
    pub fn new(header: &ClassHeader) -> Self {
        Self {
            name: header.name.clone(),
            super_name: header.super_name.clone(),
            is_record: header.is_record(),
            canonical_descriptor: String::new(),
        }
    }
}

/// Where a field ends up after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBucket {
    /// Static field without a compile-time constant; defaulted in `<clinit>`
    NoValueStatic,
    /// Enum constant; constructed in `<clinit>`
    EnumConstant,
    /// Instance field; initialized by super-delegating constructors
    Instance,
    /// Static field that carries its own constant value
    Constant,
}

impl FieldBucket {
    pub fn classify(field: &FieldDecl) -> Self {
        if !is_static(field.access_flags) {
            FieldBucket::Instance
        } else if is_enum(field.access_flags) {
            FieldBucket::EnumConstant
        } else if field.value.is_none() {
            FieldBucket::NoValueStatic
        } else {
            FieldBucket::Constant
        }
    }
}

/// The constructor call an original constructor body starts with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationCall {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub interface: bool,
}

impl DelegationCall {
    pub fn from_insn(insn: &Insn) -> Option<Self> {
        match insn {
            Insn::Method { op: INVOKESPECIAL, owner, name, descriptor, interface } => Some(Self {
                owner: owner.clone(),
                name: name.clone(),
                descriptor: descriptor.clone(),
                interface: *interface,
            }),
            _ => None,
        }
    }

    /// Whether this is a `this(...)` call to a constructor of `class_name`
    pub fn targets_class(&self, class_name: &str) -> bool {
        self.owner == class_name
    }

    pub fn to_insn(&self) -> Insn {
        Insn::method(INVOKESPECIAL, &self.owner, &self.name, &self.descriptor, self.interface)
    }
}

/// A constructor declaration plus every `invokespecial` seen in its original body
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorRecord {
    pub decl: MethodDecl,
    pub invoke_specials: InsnCollector,
}

impl ConstructorRecord {
    pub fn new(decl: MethodDecl) -> Self {
        Self { decl, invoke_specials: InsnCollector::new(INVOKESPECIAL) }
    }

    /// The first captured `invokespecial`; a valid constructor always starts with it
    pub fn delegation(&self) -> Result<DelegationCall, StubError> {
        self.invoke_specials
            .first()
            .and_then(DelegationCall::from_insn)
            .ok_or_else(|| StubError::MissingDelegationCall { descriptor: self.decl.descriptor.clone() })
    }
}

/// Everything gathered about one class, consumed once at the end of the class
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub context: ClassContext,
    pub record_components: Vec<RecordComponentDecl>,
    pub no_value_statics: Vec<FieldDecl>,
    pub enum_constants: Vec<FieldDecl>,
    pub instance_fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorRecord>,
}

impl TransformState {
    pub fn new(header: &ClassHeader) -> Self {
        Self {
            context: ClassContext::new(header),
            record_components: Vec::new(),
            no_value_statics: Vec::new(),
            enum_constants: Vec::new(),
            instance_fields: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Put the field in its bucket and report which one it went to
    pub fn classify_field(&mut self, field: &FieldDecl) -> FieldBucket {
        let bucket = FieldBucket::classify(field);
        match bucket {
            FieldBucket::NoValueStatic => self.no_value_statics.push(field.clone()),
            FieldBucket::EnumConstant => self.enum_constants.push(field.clone()),
            FieldBucket::Instance => self.instance_fields.push(field.clone()),
            FieldBucket::Constant => {}
        }
        bucket
    }

    pub fn add_record_component(&mut self, component: &RecordComponentDecl) {
        self.context.canonical_descriptor.push_str(&component.descriptor);
        self.record_components.push(component.clone());
    }

    /// Register a constructor and hand back its capture slot
    pub fn add_constructor(&mut self, decl: &MethodDecl) -> &mut ConstructorRecord {
        self.constructors.push(ConstructorRecord::new(decl.clone()));
        let last = self.constructors.len() - 1;
        &mut self.constructors[last]
    }

    /// A record's canonical constructor takes exactly the component types, in order
    pub fn is_canonical_constructor(&self, decl: &MethodDecl) -> bool {
        self.context.is_record
            && parameter_section(&decl.descriptor).map_or(false, |params| params == self.context.canonical_descriptor)
    }
}
