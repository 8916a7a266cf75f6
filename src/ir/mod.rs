//! Instruction and module model.
//!
//! This module holds the immutable, fully indexed representation the validators operate on:
//!
//! - [`Op`] / [`OpFamily`] - the opcode table and per-opcode classification
//! - [`Instruction`] - one opcode with its operand words, position, flags and use list
//! - [`Module`] - the instruction sequence plus definition, decoration, capability, feature,
//!   name and parameter-layout tables
//! - [`ModuleBuilder`] - incremental construction with id allocation
//! - operand enums: [`Capability`], [`StorageClass`], [`AddressingModel`], [`MemoryModel`]
//!
//! Decoding the binary word stream is left to the caller; [`Module::from_raw`] accepts
//! `(opcode, words)` pairs as any decoder would produce them.

mod builder;
mod enums;
mod instruction;
mod module;
pub(crate) mod opcode;

pub use builder::ModuleBuilder;
pub use enums::{
    AddressingModel, Capability, CapabilitySet, Features, MemoryModel, StorageClass, Version,
};
pub use instruction::{Instruction, InstructionFlags, Use};
pub use module::{Decoration, Module, ParameterSlot};
pub use opcode::{decode_literal_string, encode_literal_string, Op, OpFamily};

/// A result id. Id `0` is never valid.
pub type Id = u32;
