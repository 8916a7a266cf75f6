//! The immutable instruction record.
//!
//! An [`Instruction`] stores its opcode and every operand word that follows the opcode word in
//! the binary encoding. Result type and result id are not split out into separate fields; they
//! are simply operands `0` and `1` (or operand `0` for instructions that have only a result id),
//! and [`Instruction::result_id`] / [`Instruction::type_id`] read them from the word list.
//!
//! Use back-references are stored as `(user position, operand index)` pairs ([`Use`]) instead of
//! pointers to other instructions, so the whole module is a plain vector without shared ownership.

use bitflags::bitflags;

use crate::ir::{Id, Op};

bitflags! {
    /// Classification flags computed once when a module is built.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstructionFlags: u8 {
        /// Declares a type
        const TYPE_DECLARATION = 0x01;
        /// A constant of any kind, or `OpUndef`
        const CONSTANT_OR_UNDEF = 0x02;
        /// A composite type declaration
        const COMPOSITE_TYPE = 0x04;
        /// An extended instruction from a debug-info instruction set
        const DEBUG_INFO = 0x08;
        /// An extended instruction from a non-semantic instruction set
        const NON_SEMANTIC = 0x10;
    }
}

/// A single reference to a defined id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Use {
    /// Module position of the instruction holding the reference
    pub user: usize,
    /// Operand index of the reference inside the user
    pub operand: usize,
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) opcode: Op,
    pub(crate) raw_opcode: u16,
    pub(crate) words: Vec<u32>,
    pub(crate) position: usize,
    pub(crate) flags: InstructionFlags,
    pub(crate) uses: Vec<Use>,
}

impl Instruction {
    /// Creates a detached instruction; its position and use list are assigned when a module is
    /// built from it.
    #[must_use]
    pub fn new(opcode: Op, words: Vec<u32>) -> Self {
        let mut flags = InstructionFlags::empty();
        flags.set(
            InstructionFlags::TYPE_DECLARATION,
            opcode.is_type_declaration(),
        );
        flags.set(
            InstructionFlags::CONSTANT_OR_UNDEF,
            opcode.is_constant_or_undef(),
        );
        flags.set(InstructionFlags::COMPOSITE_TYPE, opcode.is_composite_type());

        Instruction {
            opcode,
            raw_opcode: opcode.value(),
            words,
            position: 0,
            flags,
            uses: Vec::new(),
        }
    }

    /// Creates a detached instruction from a numeric opcode.
    ///
    /// Opcodes without an [`Op`] variant become [`Op::Unknown`]; the number is kept and
    /// reported by [`Instruction::raw_opcode`].
    #[must_use]
    pub fn from_raw(opcode: u16, words: Vec<u32>) -> Self {
        let op = Op::from_repr(opcode).unwrap_or(Op::Unknown);
        let mut instruction = Instruction::new(op, words);
        instruction.raw_opcode = opcode;
        instruction
    }

    /// The opcode.
    #[must_use]
    pub fn opcode(&self) -> Op {
        self.opcode
    }

    /// The numeric opcode as it appeared in the input.
    #[must_use]
    pub fn raw_opcode(&self) -> u16 {
        self.raw_opcode
    }

    /// All operand words, result type and result id included.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Zero-based position in module order.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Classification flags.
    #[must_use]
    pub fn flags(&self) -> InstructionFlags {
        self.flags
    }

    /// Every recorded reference to this instruction's result id.
    #[must_use]
    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    /// The result id, if the opcode defines one.
    #[must_use]
    pub fn result_id(&self) -> Option<Id> {
        self.opcode
            .result_id_index()
            .and_then(|index| self.operand(index))
    }

    /// The result type id, if the opcode has one.
    #[must_use]
    pub fn type_id(&self) -> Option<Id> {
        if self.opcode.has_result_type() {
            self.operand(0)
        } else {
            None
        }
    }

    /// Operand word `index`, or `None` if the instruction is too short.
    #[must_use]
    pub fn operand(&self, index: usize) -> Option<u32> {
        self.words.get(index).copied()
    }

    /// Operand words starting at `start`; empty if `start` is past the end.
    #[must_use]
    pub fn operands_from(&self, start: usize) -> &[u32] {
        self.words.get(start..).unwrap_or(&[])
    }

    /// Number of operand words.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        self.words.len()
    }

    /// Word count as encoded in the binary form, opcode word included.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len() + 1
    }

    /// True for constants and `OpUndef`.
    #[must_use]
    pub fn is_constant_or_undef(&self) -> bool {
        self.flags.contains(InstructionFlags::CONSTANT_OR_UNDEF)
    }

    /// True for composite type declarations.
    #[must_use]
    pub fn is_composite_type(&self) -> bool {
        self.flags.contains(InstructionFlags::COMPOSITE_TYPE)
    }

    /// True for type declarations.
    #[must_use]
    pub fn is_type_declaration(&self) -> bool {
        self.flags.contains(InstructionFlags::TYPE_DECLARATION)
    }

    /// True for extended instructions of a debug-info set.
    #[must_use]
    pub fn is_debug_info(&self) -> bool {
        self.flags.contains(InstructionFlags::DEBUG_INFO)
    }

    /// True for extended instructions of a non-semantic set.
    #[must_use]
    pub fn is_non_semantic(&self) -> bool {
        self.flags.contains(InstructionFlags::NON_SEMANTIC)
    }

    /// True for a tensor type that carries explicit rank and shape operands.
    #[must_use]
    pub fn is_shaped_tensor(&self) -> bool {
        self.opcode == Op::TypeTensorARM && self.words.len() == 4
    }

    /// Ids referenced by this instruction, paired with their operand index.
    pub fn id_operands(&self) -> impl Iterator<Item = (usize, Id)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(index, _)| self.opcode.is_id_operand(*index, &self.words))
            .map(|(index, id)| (index, *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_accessors() {
        let call = Instruction::new(Op::FunctionCall, vec![1, 9, 4, 6, 7]);
        assert_eq!(call.type_id(), Some(1));
        assert_eq!(call.result_id(), Some(9));
        assert_eq!(call.operand(2), Some(4));
        assert_eq!(call.operand(5), None);
        assert_eq!(call.operand_count(), 5);
        assert_eq!(call.word_count(), 6);
        assert_eq!(call.operands_from(3), &[6, 7]);
        assert!(call.operands_from(9).is_empty());

        let ty = Instruction::new(Op::TypeInt, vec![3, 32, 0]);
        assert_eq!(ty.type_id(), None);
        assert_eq!(ty.result_id(), Some(3));

        let decorate = Instruction::new(Op::Decorate, vec![3, 6]);
        assert_eq!(decorate.result_id(), None);
    }

    #[test]
    fn test_flags() {
        assert!(Instruction::new(Op::Undef, vec![1, 2]).is_constant_or_undef());
        assert!(Instruction::new(Op::TypeStruct, vec![3, 1]).is_composite_type());
        assert!(Instruction::new(Op::TypeStruct, vec![3, 1]).is_type_declaration());
        assert!(!Instruction::new(Op::Load, vec![1, 2, 3]).is_constant_or_undef());
    }

    #[test]
    fn test_shaped_tensor() {
        assert!(Instruction::new(Op::TypeTensorARM, vec![5, 1, 2, 3]).is_shaped_tensor());
        assert!(!Instruction::new(Op::TypeTensorARM, vec![5, 1, 2]).is_shaped_tensor());
        assert!(!Instruction::new(Op::TypeTensorARM, vec![5, 1]).is_shaped_tensor());
    }

    #[test]
    fn test_id_operands() {
        let ptr = Instruction::new(Op::TypePointer, vec![4, 7, 2]);
        let ids: Vec<_> = ptr.id_operands().collect();
        assert_eq!(ids, vec![(2, 2)]);
    }

    #[test]
    fn test_raw_opcode() {
        let dot = Instruction::from_raw(148, vec![1, 2, 3, 4]);
        assert_eq!(dot.opcode(), Op::Dot);
        assert_eq!(dot.raw_opcode(), 148);

        // OpGroupNonUniformElect has no variant
        let unknown = Instruction::from_raw(333, vec![1, 2, 3]);
        assert_eq!(unknown.opcode(), Op::Unknown);
        assert_eq!(unknown.raw_opcode(), 333);
        assert_eq!(unknown.result_id(), None);
        assert_eq!(unknown.id_operands().count(), 0);
    }
}
