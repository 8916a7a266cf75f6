//! Instruction validators.
//!
//! One validator per opcode family:
//!
//! - [`ConstantValidator`] - constant and specialization constant definitions
//! - [`FunctionValidator`] - function definitions, parameters, calls and per-element callbacks

mod constant;
mod function;

pub use constant::ConstantValidator;
pub use function::FunctionValidator;
