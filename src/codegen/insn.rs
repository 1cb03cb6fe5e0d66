//! Symbolic instructions, before constant pool resolution

use std::fmt;

use super::opcodes::{self, *};

/// Compile-time constant carried by a field or loaded with `ldc`
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

impl ConstantValue {
    /// True for constants that take two stack slots and need `ldc2_w`
    pub fn is_wide(&self) -> bool {
        matches!(self, ConstantValue::Long(_) | ConstantValue::Double(_))
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(v) => write!(f, "{}", v),
            ConstantValue::Long(v) => write!(f, "{}L", v),
            ConstantValue::Float(v) => write!(f, "{}F", v),
            ConstantValue::Double(v) => write!(f, "{}D", v),
            ConstantValue::String(v) => write!(f, "{:?}", v),
        }
    }
}

/// One JVM instruction with symbolic operands
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    /// Zero-operand instruction (`dup`, `return`, `athrow`, `iconst_0`, ...)
    Simple(u8),
    /// `bipush`, `sipush` or `newarray` with an immediate operand
    Int { op: u8, operand: i32 },
    /// Local variable load or store
    Var { op: u8, slot: u16 },
    /// `new`, `anewarray`, `checkcast` or `instanceof`
    Type { op: u8, class: String },
    /// Field access
    Field { op: u8, owner: String, name: String, descriptor: String },
    /// Method invocation
    Method { op: u8, owner: String, name: String, descriptor: String, interface: bool },
    /// Constant pool load; the encoder picks `ldc`, `ldc_w` or `ldc2_w`
    Ldc(ConstantValue),
}

impl Insn {
    pub fn opcode(&self) -> u8 {
        match self {
            Insn::Simple(op)
            | Insn::Int { op, .. }
            | Insn::Var { op, .. }
            | Insn::Type { op, .. }
            | Insn::Field { op, .. }
            | Insn::Method { op, .. } => *op,
            Insn::Ldc(value) if value.is_wide() => LDC2_W,
            Insn::Ldc(_) => LDC,
        }
    }

    pub fn field(op: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        Insn::Field { op, owner: owner.to_string(), name: name.to_string(), descriptor: descriptor.to_string() }
    }

    pub fn method(op: u8, owner: &str, name: &str, descriptor: &str, interface: bool) -> Self {
        Insn::Method {
            op,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            interface,
        }
    }

    pub fn type_insn(op: u8, class: &str) -> Self {
        Insn::Type { op, class: class.to_string() }
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = opcodes::mnemonic(self.opcode());
        match self {
            Insn::Simple(_) => write!(f, "{}", name),
            Insn::Int { operand, .. } => write!(f, "{} {}", name, operand),
            Insn::Var { slot, .. } => write!(f, "{} {}", name, slot),
            Insn::Type { class, .. } => write!(f, "{} {}", name, class),
            Insn::Field { owner, name: field, descriptor, .. } => {
                write!(f, "{} {}.{} : {}", name, owner, field, descriptor)
            }
            Insn::Method { owner, name: method, descriptor, .. } => {
                write!(f, "{} {}.{}{}", name, owner, method, descriptor)
            }
            Insn::Ldc(value) => write!(f, "{} {}", name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldc_opcode_depends_on_width() {
        assert_eq!(Insn::Ldc(ConstantValue::Int(70000)).opcode(), LDC);
        assert_eq!(Insn::Ldc(ConstantValue::Long(1)).opcode(), LDC2_W);
        assert_eq!(Insn::Ldc(ConstantValue::Double(0.5)).opcode(), LDC2_W);
    }

    #[test]
    fn display_reads_like_a_listing() {
        let insn = Insn::method(INVOKESPECIAL, "java/lang/Object", "<init>", "()V", false);
        assert_eq!(insn.to_string(), "invokespecial java/lang/Object.<init>()V");
        assert_eq!(Insn::Var { op: ALOAD, slot: 0 }.to_string(), "aload 0");
    }
}
