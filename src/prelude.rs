//! # spvscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the spvscope library. Import this module to get quick access to the essential
//! types for building and validating modules.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all spvscope operations
pub use crate::Error;

/// The result type used throughout spvscope
pub use crate::Result;

/// Configuration of a validation run
pub use crate::ValidationConfig;

// ================================================================================================
// Module Model
// ================================================================================================

/// Result id type
pub use crate::ir::Id;

/// Instructions, opcodes and the indexed module
pub use crate::ir::{Instruction, Module, ModuleBuilder, Op, OpFamily, ParameterSlot};

/// Operand enumerations and capability facts
pub use crate::ir::{
    AddressingModel, Capability, CapabilitySet, Features, MemoryModel, StorageClass, Version,
};

// ================================================================================================
// Validation
// ================================================================================================

/// Engine, diagnostics and the batch entry point
pub use crate::validation::{validate_modules, Diagnostic, ErrorKind, ValidationEngine};

/// Context and extension points for custom passes and id rendering
pub use crate::validation::{InstructionValidator, NameResolver, ValidationContext};
