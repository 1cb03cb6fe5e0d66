//! Static initializer synthesis

use super::state::TransformState;
use super::StubError;
use crate::codegen::bytecode::CodeBuilder;
use crate::codegen::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::descriptor::split_parameters;
use crate::codegen::flag::access_flags::ACC_STATIC;
use crate::codegen::insn::ConstantValue;
use crate::codegen::opcodes::*;
use crate::consts::{ENUM_IMPLICIT_PARAMS, VOID_NO_ARGS_DESCRIPTOR};
use crate::visitor::{MethodDecl, MethodModel};

/// Build `<clinit>`: construct every enum constant, default every constant-less
/// static field, return. Emitted even when there is nothing to initialize.
pub fn synthesize_static_initializer(state: &TransformState) -> Result<MethodModel, StubError> {
    let class = state.context.name.as_str();
    let mut code = CodeBuilder::new();

    if let Some(first) = state.enum_constants.first() {
        // every constant goes through the first declared constructor
        let ctor = state
            .constructors
            .first()
            .ok_or_else(|| StubError::MissingEnumConstructor { field: first.name.clone() })?;
        let params = split_parameters(&ctor.decl.descriptor)?;

        for (ordinal, field) in (0i32..).zip(&state.enum_constants) {
            code.type_insn(NEW, class)
                .simple(DUP)
                .ldc(ConstantValue::String(field.name.clone()))
                .push_int(ordinal);
            for param in params.iter().skip(ENUM_IMPLICIT_PARAMS) {
                code.push_type_default(param);
            }
            code.invoke(INVOKESPECIAL, class, CONSTRUCTOR_METHOD_NAME, &ctor.decl.descriptor, false)
                .field(PUTSTATIC, class, &field.name, &field.descriptor);
        }
        log::trace!("{}: {} enum constants via {}", class, state.enum_constants.len(), ctor.decl.descriptor);
    }

    for field in &state.no_value_statics {
        code.push_value_or_default(field.value.as_ref(), &field.descriptor)
            .field(PUTSTATIC, class, &field.name, &field.descriptor);
    }

    code.simple(RETURN);
    let decl = MethodDecl::new(ACC_STATIC, STATIC_INITIALIZER_METHOD_NAME, VOID_NO_ARGS_DESCRIPTOR);
    Ok(MethodModel::new(decl, code.into_insns()))
}
