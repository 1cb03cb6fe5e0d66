use super::types::VType;
use crate::codegen::descriptor::{return_type, split_parameters, slot_width};
use crate::codegen::error::DescriptorError;
use crate::codegen::insn::{ConstantValue, Insn};
use crate::codegen::opcodes::{self, *};
use crate::visitor::{FieldDecl, MethodDecl};

pub type VerifyResult<T> = Result<T, VerifyError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Stack underflow at instruction {index}")]
    StackUnderflow { index: usize },
    #[error("Type mismatch at instruction {index}: expected {expected}, found {found}")]
    TypeMismatch { index: usize, expected: String, found: String },
    #[error("Local {slot} at instruction {index} does not hold a {expected}")]
    BadLocal { index: usize, slot: u16, expected: String },
    #[error("Constructor call at instruction {index} on an initialized receiver")]
    InitOnInitialized { index: usize },
    #[error("Constructor call at instruction {index} targets {owner}, which cannot initialize {receiver}")]
    InitOwnerMismatch { index: usize, owner: String, receiver: String },
    #[error("Field {field} stored at instruction {index} before the receiver was initialized")]
    UninitializedFieldStore { index: usize, field: String },
    #[error("Uninitialized value used at instruction {index}")]
    UninitializedUse { index: usize },
    #[error("Constructor returns at instruction {index} without a delegation call")]
    ReturnBeforeDelegation { index: usize },
    #[error("Return at instruction {index} does not match return type {expected}")]
    ReturnMismatch { index: usize, expected: String },
    #[error("Instruction {index} follows a terminating instruction")]
    CodeAfterTerminator { index: usize },
    #[error("Body does not end in return or athrow")]
    FallsOffEnd,
    #[error("Unsupported instruction {mnemonic} at {index}")]
    Unsupported { index: usize, mnemonic: &'static str },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// What the verifier needs to know about the method and its class
#[derive(Debug, Clone, Copy)]
pub struct BodyContext<'a> {
    pub class_name: &'a str,
    pub super_name: Option<&'a str>,
    pub method: &'a MethodDecl,
    /// Instance fields declared by the class; only these may be stored before delegation
    pub instance_fields: &'a [FieldDecl],
}

struct Frame<'a> {
    ctx: BodyContext<'a>,
    stack: Vec<VType>,
    locals: Vec<Option<VType>>,
    this_initialized: bool,
}

impl<'a> Frame<'a> {
    fn new(ctx: BodyContext<'a>) -> VerifyResult<Self> {
        let mut locals = Vec::new();
        let is_constructor = ctx.method.is_constructor();
        if !ctx.method.is_static() {
            locals.push(Some(if is_constructor {
                VType::UninitializedThis
            } else {
                VType::Reference(ctx.class_name.to_string())
            }));
        }
        for param in split_parameters(&ctx.method.descriptor)? {
            locals.push(Some(VType::of_descriptor(param)));
            if slot_width(param) == 2 {
                locals.push(None);
            }
        }
        Ok(Self { ctx, stack: Vec::new(), locals, this_initialized: !is_constructor })
    }

    fn pop(&mut self, index: usize) -> VerifyResult<VType> {
        self.stack.pop().ok_or(VerifyError::StackUnderflow { index })
    }

    fn pop_expecting(&mut self, index: usize, expected: &VType) -> VerifyResult<()> {
        let found = self.pop(index)?;
        if found.is_assignable_to(expected) {
            Ok(())
        } else {
            Err(VerifyError::TypeMismatch { index, expected: expected.to_string(), found: found.to_string() })
        }
    }

    /// Pop a value that must be an initialized reference or null
    fn pop_reference(&mut self, index: usize) -> VerifyResult<()> {
        match self.pop(index)? {
            VType::Null | VType::Reference(_) => Ok(()),
            VType::Uninitialized { .. } | VType::UninitializedThis => Err(VerifyError::UninitializedUse { index }),
            other => Err(VerifyError::TypeMismatch { index, expected: "reference".into(), found: other.to_string() }),
        }
    }

    fn pop_arguments(&mut self, index: usize, descriptor: &str) -> VerifyResult<()> {
        let params = split_parameters(descriptor)?;
        for param in params.iter().rev() {
            self.pop_expecting(index, &VType::of_descriptor(param))?;
        }
        Ok(())
    }

    fn push_return(&mut self, descriptor: &str) -> VerifyResult<()> {
        match return_type(descriptor)? {
            "V" => {}
            ret => self.stack.push(VType::of_descriptor(ret)),
        }
        Ok(())
    }

    /// Replace every occurrence of an uninitialized value once its constructor ran
    fn initialize(&mut self, from: &VType, to: VType) {
        for entry in self.stack.iter_mut().chain(self.locals.iter_mut().flatten()) {
            if entry == from {
                *entry = to.clone();
            }
        }
    }

    fn load(&mut self, index: usize, op: u8, slot: u16) -> VerifyResult<()> {
        let value = self.locals.get(slot as usize).cloned().flatten();
        let ok = match (op, &value) {
            (ILOAD, Some(VType::Int)) | (LLOAD, Some(VType::Long)) | (FLOAD, Some(VType::Float)) | (DLOAD, Some(VType::Double)) => true,
            (ALOAD, Some(VType::Null | VType::Reference(_) | VType::Uninitialized { .. } | VType::UninitializedThis)) => true,
            _ => false,
        };
        match value {
            Some(value) if ok => {
                self.stack.push(value);
                Ok(())
            }
            _ => Err(VerifyError::BadLocal { index, slot, expected: opcodes::mnemonic(op).to_string() }),
        }
    }

    fn step(&mut self, index: usize, insn: &Insn) -> VerifyResult<()> {
        match insn {
            Insn::Simple(op) => self.simple(index, *op),
            Insn::Int { op: BIPUSH | SIPUSH, .. } => {
                self.stack.push(VType::Int);
                Ok(())
            }
            Insn::Var { op, slot } => match *op {
                ILOAD..=ALOAD => self.load(index, *op, *slot),
                op => Err(VerifyError::Unsupported { index, mnemonic: opcodes::mnemonic(op) }),
            },
            Insn::Type { op: NEW, class } => {
                self.stack.push(VType::Uninitialized { class: class.clone(), at: index });
                Ok(())
            }
            Insn::Field { op, owner, name, descriptor } => self.field(index, *op, owner, name, descriptor),
            Insn::Method { op, owner, name, descriptor, .. } => self.invoke(index, *op, owner, name, descriptor),
            Insn::Ldc(value) => {
                self.stack.push(match value {
                    ConstantValue::Int(_) => VType::Int,
                    ConstantValue::Long(_) => VType::Long,
                    ConstantValue::Float(_) => VType::Float,
                    ConstantValue::Double(_) => VType::Double,
                    ConstantValue::String(_) => VType::Reference("java/lang/String".into()),
                });
                Ok(())
            }
            other => Err(VerifyError::Unsupported { index, mnemonic: opcodes::mnemonic(other.opcode()) }),
        }
    }

    fn simple(&mut self, index: usize, op: u8) -> VerifyResult<()> {
        let pushed = match op {
            ACONST_NULL => VType::Null,
            ICONST_M1..=ICONST_5 => VType::Int,
            LCONST_0 | LCONST_1 => VType::Long,
            FCONST_0..=FCONST_2 => VType::Float,
            DCONST_0 | DCONST_1 => VType::Double,
            DUP => {
                let top = self.stack.last().cloned().ok_or(VerifyError::StackUnderflow { index })?;
                if top.is_category2() {
                    return Err(VerifyError::TypeMismatch { index, expected: "category 1 value".into(), found: top.to_string() });
                }
                top
            }
            POP => {
                let top = self.pop(index)?;
                if top.is_category2() {
                    return Err(VerifyError::TypeMismatch { index, expected: "category 1 value".into(), found: top.to_string() });
                }
                return Ok(());
            }
            RETURN => {
                if return_type(&self.ctx.method.descriptor)? != "V" {
                    return Err(VerifyError::ReturnMismatch { index, expected: return_type(&self.ctx.method.descriptor)?.to_string() });
                }
                if !self.this_initialized {
                    return Err(VerifyError::ReturnBeforeDelegation { index });
                }
                return Ok(());
            }
            IRETURN..=ARETURN => {
                let ret = return_type(&self.ctx.method.descriptor)?.to_string();
                if ret == "V" {
                    return Err(VerifyError::ReturnMismatch { index, expected: ret });
                }
                return self.pop_expecting(index, &VType::of_descriptor(&ret));
            }
            ATHROW => return self.pop_reference(index),
            other => return Err(VerifyError::Unsupported { index, mnemonic: opcodes::mnemonic(other) }),
        };
        self.stack.push(pushed);
        Ok(())
    }

    fn field(&mut self, index: usize, op: u8, owner: &str, name: &str, descriptor: &str) -> VerifyResult<()> {
        let value = VType::of_descriptor(descriptor);
        match op {
            GETSTATIC => self.stack.push(value),
            PUTSTATIC => self.pop_expecting(index, &value)?,
            GETFIELD => {
                self.pop_reference(index)?;
                self.stack.push(value);
            }
            PUTFIELD => {
                self.pop_expecting(index, &value)?;
                match self.pop(index)? {
                    VType::UninitializedThis => {
                        let declared = owner == self.ctx.class_name
                            && self.ctx.instance_fields.iter().any(|f| f.name == name && f.descriptor == descriptor);
                        if !declared {
                            return Err(VerifyError::UninitializedFieldStore { index, field: name.to_string() });
                        }
                    }
                    VType::Null | VType::Reference(_) => {}
                    VType::Uninitialized { .. } => return Err(VerifyError::UninitializedUse { index }),
                    other => {
                        return Err(VerifyError::TypeMismatch { index, expected: owner.to_string(), found: other.to_string() })
                    }
                }
            }
            other => return Err(VerifyError::Unsupported { index, mnemonic: opcodes::mnemonic(other) }),
        }
        Ok(())
    }

    fn invoke(&mut self, index: usize, op: u8, owner: &str, name: &str, descriptor: &str) -> VerifyResult<()> {
        self.pop_arguments(index, descriptor)?;
        if op == INVOKESPECIAL && name == crate::codegen::defs::CONSTRUCTOR_METHOD_NAME {
            let receiver = self.pop(index)?;
            match &receiver {
                VType::UninitializedThis => {
                    if owner != self.ctx.class_name && Some(owner) != self.ctx.super_name {
                        return Err(VerifyError::InitOwnerMismatch {
                            index,
                            owner: owner.to_string(),
                            receiver: receiver.to_string(),
                        });
                    }
                    self.initialize(&receiver, VType::Reference(self.ctx.class_name.to_string()));
                    self.this_initialized = true;
                }
                VType::Uninitialized { class, .. } => {
                    if class != owner {
                        return Err(VerifyError::InitOwnerMismatch {
                            index,
                            owner: owner.to_string(),
                            receiver: receiver.to_string(),
                        });
                    }
                    let initialized = VType::Reference(class.clone());
                    self.initialize(&receiver, initialized);
                }
                _ => return Err(VerifyError::InitOnInitialized { index }),
            }
            return self.push_return(descriptor);
        }
        match op {
            INVOKESTATIC => {}
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKEINTERFACE => self.pop_reference(index)?,
            other => return Err(VerifyError::Unsupported { index, mnemonic: opcodes::mnemonic(other) }),
        }
        self.push_return(descriptor)
    }
}

/// Type-check a straight-line method body
pub fn verify_body(ctx: BodyContext<'_>, insns: &[Insn]) -> VerifyResult<()> {
    let mut frame = Frame::new(ctx)?;
    let mut terminated = false;
    for (index, insn) in insns.iter().enumerate() {
        if terminated {
            return Err(VerifyError::CodeAfterTerminator { index });
        }
        frame.step(index, insn)?;
        terminated = opcodes::is_terminator(insn.opcode());
    }
    if !terminated {
        return Err(VerifyError::FallsOffEnd);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;

    fn ctor(desc: &str) -> MethodDecl {
        MethodDecl::constructor(ACC_PUBLIC, desc)
    }

    fn check(method: &MethodDecl, fields: &[FieldDecl], insns: &[Insn]) -> VerifyResult<()> {
        let ctx = BodyContext { class_name: "p/A", super_name: Some("java/lang/Object"), method, instance_fields: fields };
        verify_body(ctx, insns)
    }

    fn super_call() -> Insn {
        Insn::method(INVOKESPECIAL, "java/lang/Object", "<init>", "()V", false)
    }

    #[test]
    fn accepts_erased_constructor() {
        let fields = [FieldDecl::new(ACC_PRIVATE, "x", "I")];
        let insns = vec![
            Insn::Var { op: ALOAD, slot: 0 },
            super_call(),
            Insn::Var { op: ALOAD, slot: 0 },
            Insn::Simple(ICONST_0),
            Insn::field(PUTFIELD, "p/A", "x", "I"),
            Insn::type_insn(NEW, "java/lang/AbstractMethodError"),
            Insn::Simple(DUP),
            Insn::method(INVOKESPECIAL, "java/lang/AbstractMethodError", "<init>", "()V", false),
            Insn::Simple(ATHROW),
        ];
        check(&ctor("()V"), &fields, &insns).unwrap();
    }

    #[test]
    fn return_without_delegation_is_rejected() {
        let insns = vec![Insn::Simple(RETURN)];
        assert_eq!(check(&ctor("()V"), &[], &insns), Err(VerifyError::ReturnBeforeDelegation { index: 0 }));
    }

    #[test]
    fn wrong_default_type_is_rejected() {
        let fields = [FieldDecl::new(ACC_PRIVATE, "x", "J")];
        let insns = vec![
            Insn::Var { op: ALOAD, slot: 0 },
            super_call(),
            Insn::Var { op: ALOAD, slot: 0 },
            Insn::Simple(ICONST_0),
            Insn::field(PUTFIELD, "p/A", "x", "J"),
            Insn::Simple(RETURN),
        ];
        assert!(matches!(check(&ctor("()V"), &fields, &insns), Err(VerifyError::TypeMismatch { index: 4, .. })));
    }

    #[test]
    fn wide_parameters_shift_slots() {
        let fields = [FieldDecl::new(ACC_PRIVATE, "a", "J"), FieldDecl::new(ACC_PRIVATE, "b", "Ljava/lang/String;")];
        let insns = vec![
            Insn::Var { op: ALOAD, slot: 0 },
            super_call(),
            Insn::Var { op: ALOAD, slot: 0 },
            Insn::Var { op: LLOAD, slot: 1 },
            Insn::field(PUTFIELD, "p/A", "a", "J"),
            Insn::Var { op: ALOAD, slot: 0 },
            Insn::Var { op: ALOAD, slot: 3 },
            Insn::field(PUTFIELD, "p/A", "b", "Ljava/lang/String;"),
            Insn::Simple(RETURN),
        ];
        check(&ctor("(JLjava/lang/String;)V"), &fields, &insns).unwrap();

        let mut misaligned = insns.clone();
        misaligned[6] = Insn::Var { op: ALOAD, slot: 2 };
        assert!(matches!(check(&ctor("(JLjava/lang/String;)V"), &fields, &misaligned), Err(VerifyError::BadLocal { slot: 2, .. })));
    }

    #[test]
    fn double_delegation_is_rejected() {
        let insns = vec![Insn::Var { op: ALOAD, slot: 0 }, super_call(), Insn::Var { op: ALOAD, slot: 0 }, super_call(), Insn::Simple(RETURN)];
        assert_eq!(check(&ctor("()V"), &[], &insns), Err(VerifyError::InitOnInitialized { index: 3 }));
    }

    #[test]
    fn delegation_to_unrelated_class_is_rejected() {
        let insns = vec![
            Insn::Var { op: ALOAD, slot: 0 },
            Insn::method(INVOKESPECIAL, "java/util/ArrayList", "<init>", "()V", false),
            Insn::Simple(RETURN),
        ];
        assert!(matches!(check(&ctor("()V"), &[], &insns), Err(VerifyError::InitOwnerMismatch { .. })));
    }

    #[test]
    fn static_initializer_must_terminate() {
        let clinit = MethodDecl::new(ACC_STATIC, "<clinit>", "()V");
        assert_eq!(check(&clinit, &[], &[]), Err(VerifyError::FallsOffEnd));
        let insns = vec![Insn::Simple(ICONST_0), Insn::field(PUTSTATIC, "p/A", "n", "I"), Insn::Simple(RETURN)];
        check(&clinit, &[], &insns).unwrap();
    }

    #[test]
    fn throwing_an_uninitialized_object_is_rejected() {
        let insns = vec![
            Insn::Var { op: ALOAD, slot: 0 },
            super_call(),
            Insn::type_insn(NEW, "java/lang/AbstractMethodError"),
            Insn::Simple(ATHROW),
        ];
        assert_eq!(check(&ctor("()V"), &[], &insns), Err(VerifyError::UninitializedUse { index: 3 }));
    }

    #[test]
    fn nothing_may_follow_a_throw() {
        let insns = vec![Insn::Simple(ACONST_NULL), Insn::Simple(ATHROW), Insn::Simple(RETURN)];
        let clinit = MethodDecl::new(ACC_STATIC, "<clinit>", "()V");
        assert_eq!(check(&clinit, &[], &insns), Err(VerifyError::CodeAfterTerminator { index: 2 }));
    }
}
