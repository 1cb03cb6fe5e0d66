// Common test utilities
#![allow(dead_code)]

use classstub::codegen::flag::access_flags::*;
use classstub::codegen::insn::Insn;
use classstub::codegen::opcodes::*;
use classstub::visitor::{ClassHeader, ClassModel, MethodDecl, MethodModel};

pub const OBJECT: &str = "java/lang/Object";
pub const AME: &str = "java/lang/AbstractMethodError";

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn class(name: &str, super_name: &str) -> ClassModel {
    ClassModel::new(ClassHeader::new(ACC_PUBLIC | ACC_SUPER, name, super_name))
}

pub fn invoke_init(owner: &str, descriptor: &str) -> Insn {
    Insn::method(INVOKESPECIAL, owner, "<init>", descriptor, false)
}

/// Constructor whose original body calls `owner.<init>(delegate_desc)` and then
/// builds an unrelated object, which must not be mistaken for the delegation
pub fn constructor(descriptor: &str, owner: &str, delegate_desc: &str) -> MethodModel {
    let mut insns = vec![Insn::Var { op: ALOAD, slot: 0 }];
    insns.push(invoke_init(owner, delegate_desc));
    insns.push(Insn::type_insn(NEW, "java/util/ArrayList"));
    insns.push(Insn::Simple(DUP));
    insns.push(invoke_init("java/util/ArrayList", "()V"));
    insns.push(Insn::Simple(POP));
    insns.push(Insn::Simple(RETURN));
    MethodModel::new(MethodDecl::constructor(ACC_PUBLIC, descriptor), insns)
}

pub fn throw_tail(signal: &str) -> Vec<Insn> {
    vec![
        Insn::type_insn(NEW, signal),
        Insn::Simple(DUP),
        invoke_init(signal, "()V"),
        Insn::Simple(ATHROW),
    ]
}

pub fn body<'a>(model: &'a ClassModel, name: &str, descriptor: &str) -> &'a [Insn] {
    &model
        .method(name, descriptor)
        .unwrap_or_else(|| panic!("missing method {}{}", name, descriptor))
        .insns
}
