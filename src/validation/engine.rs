//! # Validation Engine
//!
//! The engine walks a [`Module`] in instruction order and hands every instruction to the pass
//! responsible for its [`OpFamily`]: constant-defining opcodes go to the [`ConstantValidator`],
//! function opcodes to the [`FunctionValidator`], and everything else is skipped. Passes disabled
//! by the [`ValidationConfig`] are never consulted.
//!
//! ## Error Policy
//!
//! [`ValidationEngine::validate`] stops at the first failing instruction. With
//! [`ValidationConfig::continue_after_error`] set, [`ValidationEngine::collect`] keeps walking
//! and returns one [`Diagnostic`] per failing instruction, in module order. Errors that do not
//! carry a diagnostic are only logged.
//!
//! ## Parallel Processing
//!
//! Modules are independent of each other. [`validate_modules`] validates a batch of modules
//! concurrently using [`rayon`] parallel iterators; every worker builds its own context, so no
//! state is shared between them.
//!
//! # Examples
//!
//! ```rust
//! use spvscope::{ir::ModuleBuilder, validation::ValidationEngine, ValidationConfig};
//!
//! let mut builder = ModuleBuilder::new();
//! let uint = builder.type_int(32, false);
//! let boolean = builder.type_bool();
//! builder.constant_true(uint);
//! builder.constant_null(boolean);
//! builder.constant_false(uint);
//! let module = builder.build()?;
//!
//! let config = ValidationConfig {
//!     continue_after_error: true,
//!     ..ValidationConfig::default()
//! };
//! let diagnostics = ValidationEngine::new(&module, &config).collect();
//! assert_eq!(diagnostics.len(), 2);
//! # Ok::<(), spvscope::Error>(())
//! ```

use rayon::prelude::*;

use crate::{
    ir::{Instruction, Module, OpFamily},
    validation::{
        ConstantValidator, Diagnostic, FunctionValidator, InstructionValidator,
        ValidationConfig, ValidationContext,
    },
    Error, Result,
};

/// Drives the validation passes over one module.
pub struct ValidationEngine<'a> {
    context: ValidationContext<'a>,
    constants: ConstantValidator,
    functions: FunctionValidator,
}

impl<'a> ValidationEngine<'a> {
    /// Creates an engine for `module`.
    #[must_use]
    pub fn new(module: &'a Module, config: &'a ValidationConfig) -> Self {
        Self::with_context(ValidationContext::new(module, config))
    }

    /// Creates an engine around a prepared context, e.g. one using a custom
    /// [`crate::validation::NameResolver`].
    #[must_use]
    pub fn with_context(context: ValidationContext<'a>) -> Self {
        ValidationEngine {
            context,
            constants: ConstantValidator::new(),
            functions: FunctionValidator::new(),
        }
    }

    /// The context the passes query.
    #[must_use]
    pub fn context(&self) -> &ValidationContext<'a> {
        &self.context
    }

    /// Validates every instruction in module order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the first instruction that breaks a rule.
    pub fn validate(&self) -> Result<()> {
        let module = self.context.module();
        log::debug!(
            "validating module with {} instructions, version {}",
            module.len(),
            module.version()
        );

        for instruction in module.instructions() {
            self.validate_instruction(instruction)?;
        }

        log::debug!("module is valid");
        Ok(())
    }

    /// Validates the whole module and returns the diagnostics found.
    ///
    /// Without [`ValidationConfig::continue_after_error`] at most one diagnostic is returned.
    #[must_use]
    pub fn collect(&self) -> Vec<Diagnostic> {
        let module = self.context.module();
        let keep_going = self.context.options().continue_after_error;
        let mut diagnostics = Vec::new();

        for instruction in module.instructions() {
            match self.validate_instruction(instruction) {
                Ok(()) => continue,
                Err(Error::Validation(diagnostic)) => diagnostics.push(*diagnostic),
                Err(error) => log::warn!(
                    "instruction {} ({}) could not be validated: {error}",
                    instruction.position(),
                    instruction.opcode()
                ),
            }

            if !keep_going {
                break;
            }
        }

        log::debug!("validation found {} issues", diagnostics.len());
        diagnostics
    }

    /// Runs the pass responsible for `instruction`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `instruction` breaks a rule of its pass.
    pub fn validate_instruction(&self, instruction: &Instruction) -> Result<()> {
        match instruction.opcode().family() {
            OpFamily::Constant => self.run(&self.constants, instruction),
            OpFamily::Function => self.run(&self.functions, instruction),
            OpFamily::Other => Ok(()),
        }
    }

    fn run<V: InstructionValidator>(&self, validator: &V, instruction: &Instruction) -> Result<()> {
        if !validator.should_run(&self.context) {
            return Ok(());
        }

        log::trace!(
            "{} checking instruction {} ({})",
            validator.name(),
            instruction.position(),
            instruction.opcode()
        );
        validator.validate(&self.context, instruction)
    }
}

/// Validates independent modules concurrently.
///
/// Returns one result per module, in input order.
#[must_use]
pub fn validate_modules(modules: &[Module], config: &ValidationConfig) -> Vec<Result<()>> {
    modules
        .par_iter()
        .map(|module| ValidationEngine::new(module, config).validate())
        .collect()
}
