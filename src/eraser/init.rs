//! Constructor body synthesis

use super::state::{ConstructorRecord, TransformState};
use super::StubError;
use crate::codegen::bytecode::CodeBuilder;
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::descriptor::split_parameters;
use crate::codegen::opcodes::*;
use crate::consts::VOID_NO_ARGS_DESCRIPTOR;
use crate::visitor::MethodModel;

/// Which terminal state a synthesized constructor reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorShape {
    /// Record canonical constructor: copies its parameters into the fields and returns
    CanonicalRecord,
    /// Delegates to the superclass: defaults every instance field, then throws
    SuperDelegating,
    /// Delegates to `this(...)`: no field stores, then throws
    SiblingDelegating,
}

impl ConstructorShape {
    pub fn throws(&self) -> bool {
        !matches!(self, ConstructorShape::CanonicalRecord)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedConstructor {
    pub shape: ConstructorShape,
    pub method: MethodModel,
}

pub fn synthesize_constructor(
    state: &TransformState,
    ctor: &ConstructorRecord,
    not_implemented_class: &str,
) -> Result<SynthesizedConstructor, StubError> {
    let class = state.context.name.as_str();
    let delegation = ctor.delegation()?;
    let mut code = CodeBuilder::new();

    code.var(ALOAD, 0);
    for param in split_parameters(&delegation.descriptor)? {
        code.push_type_default(param);
    }
    code.emit(delegation.to_insn());

    let shape = if state.is_canonical_constructor(&ctor.decl) {
        ConstructorShape::CanonicalRecord
    } else if delegation.targets_class(class) {
        ConstructorShape::SiblingDelegating
    } else {
        ConstructorShape::SuperDelegating
    };

    match shape {
        ConstructorShape::CanonicalRecord => {
            let mut slot = 1;
            for component in &state.record_components {
                code.var(ALOAD, 0);
                slot = code.load_local(&component.descriptor, slot);
                code.field(PUTFIELD, class, &component.name, &component.descriptor);
            }
            code.simple(RETURN);
        }
        ConstructorShape::SuperDelegating => {
            for field in &state.instance_fields {
                code.var(ALOAD, 0)
                    .push_value_or_default(field.value.as_ref(), &field.descriptor)
                    .field(PUTFIELD, class, &field.name, &field.descriptor);
            }
        }
        ConstructorShape::SiblingDelegating => {}
    }

    if shape.throws() {
        code.type_insn(NEW, not_implemented_class)
            .simple(DUP)
            .invoke(INVOKESPECIAL, not_implemented_class, CONSTRUCTOR_METHOD_NAME, VOID_NO_ARGS_DESCRIPTOR, false)
            .simple(ATHROW);
    }

    log::debug!("{}: constructor {} -> {:?}", class, ctor.decl.descriptor, shape);
    Ok(SynthesizedConstructor { shape, method: MethodModel::new(ctor.decl.clone(), code.into_insns()) })
}
