//! Semantic validation of constant and function instructions.
//!
//! The [`ValidationEngine`] walks a [`crate::ir::Module`] and routes each instruction to the
//! validator of its opcode family. Validators see the module only through a
//! [`ValidationContext`], which also renders ids for messages and builds the [`Diagnostic`]
//! returned on failure. Type comparisons live in [`TypeEquivalence`].
//!
//! # Key Components
//!
//! - [`ValidationConfig`] - relaxation options, pass switches and error policy
//! - [`ValidationContext`] - read-only queries over the module under validation
//! - [`InstructionValidator`] - the interface every pass implements
//! - [`ConstantValidator`] / [`FunctionValidator`] - the passes
//! - [`validate_modules`] - parallel validation of independent modules

mod config;
mod context;
mod diagnostic;
mod engine;
mod traits;
mod types;
mod validators;

pub use config::ValidationConfig;
pub use context::{FriendlyNames, NameResolver, ValidationContext};
pub use diagnostic::{Diagnostic, ErrorKind};
pub use engine::{validate_modules, ValidationEngine};
pub use traits::InstructionValidator;
pub use types::TypeEquivalence;
pub use validators::{ConstantValidator, FunctionValidator};
