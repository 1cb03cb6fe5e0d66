//! Instruction emission primitives
//!
//! `CodeBuilder` collects symbolic instructions for one method body. The helpers
//! here are the small building blocks every synthesized body is made of: pushing
//! the zero value of a type, pushing an integer with the most compact encoding,
//! pushing a field constant and loading a parameter of a given type.

use super::descriptor::slot_width;
use super::insn::{ConstantValue, Insn};
use super::opcodes::*;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CodeBuilder {
    insns: Vec<Insn>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, insn: Insn) -> &mut Self {
        self.insns.push(insn);
        self
    }

    pub fn simple(&mut self, op: u8) -> &mut Self {
        self.emit(Insn::Simple(op))
    }

    pub fn var(&mut self, op: u8, slot: u16) -> &mut Self {
        self.emit(Insn::Var { op, slot })
    }

    pub fn type_insn(&mut self, op: u8, class: &str) -> &mut Self {
        self.emit(Insn::type_insn(op, class))
    }

    pub fn field(&mut self, op: u8, owner: &str, name: &str, descriptor: &str) -> &mut Self {
        self.emit(Insn::field(op, owner, name, descriptor))
    }

    pub fn invoke(&mut self, op: u8, owner: &str, name: &str, descriptor: &str, interface: bool) -> &mut Self {
        self.emit(Insn::method(op, owner, name, descriptor, interface))
    }

    pub fn ldc(&mut self, value: ConstantValue) -> &mut Self {
        self.emit(Insn::Ldc(value))
    }

    /// Push the canonical zero value for a field type: 0, 0L, 0.0F, 0.0D or null
    pub fn push_type_default(&mut self, descriptor: &str) -> &mut Self {
        let op = match descriptor.as_bytes().first() {
            Some(b'Z' | b'B' | b'C' | b'S' | b'I') => ICONST_0,
            Some(b'J') => LCONST_0,
            Some(b'F') => FCONST_0,
            Some(b'D') => DCONST_0,
            _ => ACONST_NULL,
        };
        self.simple(op)
    }

    /// Push an int constant with the shortest instruction that can hold it
    pub fn push_int(&mut self, value: i32) -> &mut Self {
        match value {
            -1..=5 => self.simple((ICONST_0 as i32 + value) as u8),
            v if i8::try_from(v).is_ok() => self.emit(Insn::Int { op: BIPUSH, operand: v }),
            v if i16::try_from(v).is_ok() => self.emit(Insn::Int { op: SIPUSH, operand: v }),
            v => self.ldc(ConstantValue::Int(v)),
        }
    }

    /// Push a field constant; integers use the compact push forms, everything else `ldc`
    pub fn push_constant(&mut self, value: &ConstantValue) -> &mut Self {
        match value {
            ConstantValue::Int(v) => self.push_int(*v),
            other => self.ldc(other.clone()),
        }
    }

    /// Push a field's constant if it has one, else the zero value of its type
    pub fn push_value_or_default(&mut self, value: Option<&ConstantValue>, descriptor: &str) -> &mut Self {
        match value {
            Some(value) => self.push_constant(value),
            None => self.push_type_default(descriptor),
        }
    }

    /// Load a local of the given type, returning the slot after it
    pub fn load_local(&mut self, descriptor: &str, slot: u16) -> u16 {
        let op = match descriptor.as_bytes().first() {
            Some(b'Z' | b'B' | b'C' | b'S' | b'I') => ILOAD,
            Some(b'J') => LLOAD,
            Some(b'F') => FLOAD,
            Some(b'D') => DLOAD,
            _ => ALOAD,
        };
        self.var(op, slot);
        slot + slot_width(descriptor)
    }

    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    pub fn into_insns(self) -> Vec<Insn> {
        self.insns
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pushed(value: i32) -> Insn {
        let mut code = CodeBuilder::new();
        code.push_int(value);
        code.into_insns().remove(0)
    }

    #[test]
    fn push_int_picks_compact_forms() {
        assert_eq!(pushed(-1), Insn::Simple(ICONST_M1));
        assert_eq!(pushed(0), Insn::Simple(ICONST_0));
        assert_eq!(pushed(5), Insn::Simple(ICONST_5));
        assert_eq!(pushed(6), Insn::Int { op: BIPUSH, operand: 6 });
        assert_eq!(pushed(-128), Insn::Int { op: BIPUSH, operand: -128 });
        assert_eq!(pushed(128), Insn::Int { op: SIPUSH, operand: 128 });
        assert_eq!(pushed(-32768), Insn::Int { op: SIPUSH, operand: -32768 });
        assert_eq!(pushed(32768), Insn::Ldc(ConstantValue::Int(32768)));
    }

    #[test]
    fn type_defaults() {
        let mut code = CodeBuilder::new();
        for desc in ["Z", "B", "C", "S", "I", "J", "F", "D", "Ljava/lang/String;", "[I"] {
            code.push_type_default(desc);
        }
        let ops: Vec<u8> = code.insns().iter().map(Insn::opcode).collect();
        assert_eq!(
            ops,
            vec![ICONST_0, ICONST_0, ICONST_0, ICONST_0, ICONST_0, LCONST_0, FCONST_0, DCONST_0, ACONST_NULL, ACONST_NULL]
        );
    }

    #[test]
    fn load_local_advances_by_slot_width() {
        let mut code = CodeBuilder::new();
        let next = code.load_local("J", 1);
        assert_eq!(next, 3);
        let next = code.load_local("Ljava/lang/String;", next);
        assert_eq!(next, 4);
        assert_eq!(code.insns(), &[Insn::Var { op: LLOAD, slot: 1 }, Insn::Var { op: ALOAD, slot: 3 }]);
    }

    #[test]
    fn non_int_constants_use_ldc() {
        let mut code = CodeBuilder::new();
        code.push_constant(&ConstantValue::String("x".into()));
        code.push_constant(&ConstantValue::Long(7));
        assert_eq!(code.insns()[0].opcode(), LDC);
        assert_eq!(code.insns()[1].opcode(), LDC2_W);
    }
}
