//! Capture of a filtered instruction sequence while a body streams past

use crate::codegen::insn::Insn;

/// Append-only list of every instruction with one particular opcode
#[derive(Debug, Clone, PartialEq)]
pub struct InsnCollector {
    opcode: u8,
    insns: Vec<Insn>,
}

impl InsnCollector {
    pub fn new(opcode: u8) -> Self {
        Self { opcode, insns: Vec::new() }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Record the instruction if it matches the filter; returns whether it did
    pub fn offer(&mut self, insn: &Insn) -> bool {
        if insn.opcode() != self.opcode {
            return false;
        }
        self.insns.push(insn.clone());
        true
    }

    pub fn insns(&self) -> &[Insn] {
        &self.insns
    }

    pub fn first(&self) -> Option<&Insn> {
        self.insns.first()
    }

    pub fn len(&self) -> usize {
        self.insns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }
}
