//! Validator trait.
//!
//! Every pass implements [`InstructionValidator`]. The engine does not hold the passes as trait
//! objects; it owns one instance of each concrete validator and routes instructions to them by
//! [`crate::ir::OpFamily`], so the trait mainly fixes the shape every pass exposes.

use crate::{ir::Instruction, validation::ValidationContext, Result};

/// A pass that checks single instructions.
///
/// # Thread Safety
///
/// Validators are stateless; all module data is reached through the [`ValidationContext`], so a
/// validator can be shared freely between threads.
pub trait InstructionValidator: Send + Sync {
    /// Checks `instruction`, returning the first violated rule as an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] carrying the diagnostic of the violated rule.
    fn validate(&self, context: &ValidationContext, instruction: &Instruction) -> Result<()>;

    /// Name of the pass, used in log output.
    fn name(&self) -> &'static str;

    /// Whether the pass is enabled for this run.
    fn should_run(&self, context: &ValidationContext) -> bool;
}
