//! Assembles symbolic instructions into a Code attribute payload
//!
//! Operands are resolved against the class constant pool, local accesses use the
//! short `xload_n` forms where possible, and `max_stack`/`max_locals` are computed
//! by walking the straight-line instruction stream.

use super::constpool::{Constant, ConstantPool};
use super::descriptor::{parameter_slot_count, return_type, slot_width, split_parameters};
use super::error::{BytecodeError, ClassGenerationError, CodeGenResult};
use super::insn::{ConstantValue, Insn};
use super::opcodes::*;

/// Bytecode plus the frame sizes the verifier needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledCode {
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
}

/// Assemble a method body.
///
/// `method_descriptor` and `is_static` seed `max_locals` with the incoming
/// parameters even when the body never reads them.
pub fn assemble(
    insns: &[Insn],
    pool: &mut ConstantPool,
    method_descriptor: &str,
    is_static: bool,
) -> CodeGenResult<AssembledCode> {
    let mut code = Vec::new();
    let mut depth: i32 = 0;
    let mut max_stack: i32 = 0;
    let mut max_locals = parameter_slot_count(method_descriptor)? + u16::from(!is_static);

    for (index, insn) in insns.iter().enumerate() {
        encode(insn, pool, &mut code)?;

        depth += stack_delta(insn)?;
        if depth < 0 {
            return Err(BytecodeError::StackUnderflow { index }.into());
        }
        max_stack = max_stack.max(depth);
        if insn.opcode() == ATHROW {
            depth = 0;
        }

        if let Insn::Var { op, slot } = insn {
            let width = if matches!(*op, LLOAD | DLOAD | LSTORE | DSTORE) { 2 } else { 1 };
            max_locals = max_locals.max(slot.saturating_add(width));
        }
    }

    if code.len() >= 65536 {
        return Err(BytecodeError::CodeTooLarge { size: code.len() }.into());
    }

    Ok(AssembledCode { code, max_stack: max_stack as u16, max_locals })
}

fn invalid(opcode: u8, kind: &'static str) -> ClassGenerationError {
    BytecodeError::InvalidOpcode { opcode, kind }.into()
}

fn encode(insn: &Insn, pool: &mut ConstantPool, out: &mut Vec<u8>) -> CodeGenResult<()> {
    match insn {
        Insn::Simple(op) => {
            if simple_delta(*op).is_none() {
                return Err(invalid(*op, "zero-operand"));
            }
            out.push(*op);
        }
        Insn::Int { op, operand } => {
            let out_of_range = || ClassGenerationError::from(BytecodeError::OperandOutOfRange { opcode: *op, operand: *operand });
            match *op {
                BIPUSH => {
                    let v = i8::try_from(*operand).map_err(|_| out_of_range())?;
                    out.extend_from_slice(&[BIPUSH, v as u8]);
                }
                SIPUSH => {
                    let v = i16::try_from(*operand).map_err(|_| out_of_range())?;
                    out.push(SIPUSH);
                    out.extend_from_slice(&v.to_be_bytes());
                }
                NEWARRAY => {
                    if !(4..=11).contains(operand) {
                        return Err(out_of_range());
                    }
                    out.extend_from_slice(&[NEWARRAY, *operand as u8]);
                }
                other => return Err(invalid(other, "int-operand")),
            }
        }
        Insn::Var { op, slot } => {
            let short_base = match *op {
                ILOAD..=ALOAD => ILOAD_0 + (op - ILOAD) * 4,
                ISTORE..=ASTORE => ISTORE_0 + (op - ISTORE) * 4,
                other => return Err(invalid(other, "local variable")),
            };
            match *slot {
                0..=3 => out.push(short_base + *slot as u8),
                4..=255 => out.extend_from_slice(&[*op, *slot as u8]),
                _ => {
                    out.extend_from_slice(&[WIDE, *op]);
                    out.extend_from_slice(&slot.to_be_bytes());
                }
            }
        }
        Insn::Type { op, class } => {
            if !matches!(*op, NEW | ANEWARRAY | CHECKCAST | INSTANCEOF) {
                return Err(invalid(*op, "type"));
            }
            let index = pool.add_class(class)?;
            out.push(*op);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Insn::Field { op, owner, name, descriptor } => {
            if !matches!(*op, GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD) {
                return Err(invalid(*op, "field"));
            }
            let index = pool.add_field_ref(owner, name, descriptor)?;
            out.push(*op);
            out.extend_from_slice(&index.to_be_bytes());
        }
        Insn::Method { op, owner, name, descriptor, interface } => {
            let index = match *op {
                INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC => pool.add_method_ref(owner, name, descriptor, *interface)?,
                INVOKEINTERFACE => pool.add_method_ref(owner, name, descriptor, true)?,
                other => return Err(invalid(other, "method")),
            };
            out.push(*op);
            out.extend_from_slice(&index.to_be_bytes());
            if *op == INVOKEINTERFACE {
                let count = parameter_slot_count(descriptor)? + 1;
                out.extend_from_slice(&[count as u8, 0]);
            }
        }
        Insn::Ldc(value) => {
            let index = match value {
                ConstantValue::Int(v) => pool.add(Constant::Integer(*v))?,
                ConstantValue::Float(v) => pool.add(Constant::Float(*v))?,
                ConstantValue::Long(v) => pool.add(Constant::Long(*v))?,
                ConstantValue::Double(v) => pool.add(Constant::Double(*v))?,
                ConstantValue::String(s) => pool.add_string(s)?,
            };
            if value.is_wide() {
                out.push(LDC2_W);
                out.extend_from_slice(&index.to_be_bytes());
            } else if index <= 255 {
                out.extend_from_slice(&[LDC, index as u8]);
            } else {
                out.push(LDC_W);
                out.extend_from_slice(&index.to_be_bytes());
            }
        }
    }
    Ok(())
}

/// Net operand-stack change of one instruction, in slots
pub fn stack_delta(insn: &Insn) -> CodeGenResult<i32> {
    let delta = match insn {
        Insn::Simple(op) => simple_delta(*op).ok_or_else(|| invalid(*op, "zero-operand"))?,
        Insn::Int { op, .. } => match *op {
            BIPUSH | SIPUSH => 1,
            _ => 0,
        },
        Insn::Var { op, .. } => match *op {
            LLOAD | DLOAD => 2,
            ILOAD | FLOAD | ALOAD => 1,
            LSTORE | DSTORE => -2,
            _ => -1,
        },
        Insn::Type { op, .. } => i32::from(*op == NEW),
        Insn::Field { op, descriptor, .. } => {
            let width = i32::from(slot_width(descriptor));
            match *op {
                GETSTATIC => width,
                PUTSTATIC => -width,
                GETFIELD => width - 1,
                _ => -width - 1,
            }
        }
        Insn::Method { op, descriptor, .. } => {
            let args: i32 = split_parameters(descriptor)?.into_iter().map(|p| i32::from(slot_width(p))).sum();
            let receiver = i32::from(*op != INVOKESTATIC);
            let ret = match return_type(descriptor)? {
                "V" => 0,
                other => i32::from(slot_width(other)),
            };
            ret - args - receiver
        }
        Insn::Ldc(value) => {
            if value.is_wide() {
                2
            } else {
                1
            }
        }
    };
    Ok(delta)
}

/// Stack effect of zero-operand instructions; `None` if the opcode takes operands
/// or is outside the straight-line subset.
fn simple_delta(op: u8) -> Option<i32> {
    let delta = match op {
        NOP => 0,
        ACONST_NULL..=ICONST_5 | FCONST_0..=FCONST_2 => 1,
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 => 2,
        IALOAD | FALOAD | AALOAD | BALOAD | CALOAD | SALOAD => -1,
        LALOAD | DALOAD => 0,
        IASTORE | FASTORE | AASTORE | BASTORE | CASTORE | SASTORE => -3,
        LASTORE | DASTORE => -4,
        POP => -1,
        POP2 => -2,
        DUP | DUP_X1 | DUP_X2 => 1,
        DUP2 | DUP2_X1 | DUP2_X2 => 2,
        SWAP => 0,
        // add, sub, mul, div, rem: int/long/float/double in rotation
        IADD..=0x73 => {
            if (op - IADD) % 2 == 1 {
                -2
            } else {
                -1
            }
        }
        INEG..=DNEG => 0,
        ISHL..=LUSHR => -1,
        IAND..=LXOR => {
            if (op - IAND) % 2 == 1 {
                -2
            } else {
                -1
            }
        }
        I2L | I2D | F2L | F2D => 1,
        L2I | L2F | D2I | D2F => -1,
        I2F | L2D | F2I | D2L | I2B | I2C | I2S => 0,
        LCMP | DCMPL | DCMPG => -3,
        FCMPL | FCMPG => -1,
        IRETURN | FRETURN | ARETURN => -1,
        LRETURN | DRETURN => -2,
        RETURN => 0,
        ARRAYLENGTH => 0,
        ATHROW | MONITORENTER | MONITOREXIT => -1,
        _ => return None,
    };
    Some(delta)
}
