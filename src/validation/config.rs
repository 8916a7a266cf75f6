//! Validation configuration
//!
//! This module provides the options that change how strictly the constant and function passes
//! judge a module, together with switches for the passes themselves and the error-collection
//! policy of the engine.

/// Configuration for a validation run
///
/// The two relaxation flags mirror options a shader toolchain sets while a module is still being
/// legalized; the remaining fields control which passes run and how the engine reacts to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationConfig {
    /// Skip the storage-class and memory-object-declaration checks on pointer arguments of
    /// function calls under logical addressing
    pub relax_logical_pointer: bool,

    /// The module has not been legalized yet: a call argument may pass a pointer whose pointee
    /// only logically matches the parameter's, and pointer arguments need not be memory object
    /// declarations
    pub before_hlsl_legalization: bool,

    /// Run the constant pass (boolean, composite, null, sampler and specialization constants)
    pub enable_constant_validation: bool,

    /// Run the function pass (definitions, parameters, calls, per-element matrix operations)
    pub enable_function_validation: bool,

    /// Keep walking after an instruction fails and collect one diagnostic per failing
    /// instruction instead of stopping at the first
    pub continue_after_error: bool,

    /// Maximum nesting depth followed by recursive type walks (default: 64)
    pub max_type_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            relax_logical_pointer: false,
            before_hlsl_legalization: false,
            enable_constant_validation: true,
            enable_function_validation: true,
            continue_after_error: false,
            max_type_depth: 64,
        }
    }
}

impl ValidationConfig {
    /// Creates a configuration that runs no pass at all
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enable_constant_validation: false,
            enable_function_validation: false,
            max_type_depth: 0,
            ..Self::default()
        }
    }

    /// Creates a configuration for modules that are still awaiting legalization
    ///
    /// Pointer arguments are compared by logical pointee match and need not be memory object
    /// declarations.
    #[must_use]
    pub fn before_legalization() -> Self {
        Self {
            before_hlsl_legalization: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that skips the logical-addressing pointer argument rules
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            relax_logical_pointer: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that reports every failing instruction instead of the first
    #[must_use]
    pub fn exhaustive() -> Self {
        Self {
            continue_after_error: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_config_presets() {
        let disabled = ValidationConfig::disabled();
        assert!(!disabled.enable_constant_validation);
        assert!(!disabled.enable_function_validation);
        assert!(!disabled.continue_after_error);
        assert_eq!(disabled.max_type_depth, 0);

        let before = ValidationConfig::before_legalization();
        assert!(before.before_hlsl_legalization);
        assert!(!before.relax_logical_pointer);
        assert!(before.enable_constant_validation);
        assert!(before.enable_function_validation);

        let relaxed = ValidationConfig::relaxed();
        assert!(relaxed.relax_logical_pointer);
        assert!(!relaxed.before_hlsl_legalization);

        let exhaustive = ValidationConfig::exhaustive();
        assert!(exhaustive.continue_after_error);
        assert_eq!(exhaustive.max_type_depth, 64);
    }

    #[test]
    fn test_default_config() {
        let default = ValidationConfig::default();
        assert!(!default.relax_logical_pointer);
        assert!(!default.before_hlsl_legalization);
        assert!(default.enable_constant_validation);
        assert!(default.enable_function_validation);
        assert!(!default.continue_after_error);
        assert_eq!(default.max_type_depth, 64);
    }
}
