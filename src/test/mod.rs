use crate::{
    ir::{Id, Module, ModuleBuilder},
    validation::{ErrorKind, ValidationConfig, ValidationEngine},
    Error, Result,
};

// Helper function to create a builder that already declares a 32-bit unsigned integer type
pub fn int_module() -> (ModuleBuilder, Id) {
    let mut builder = ModuleBuilder::new();
    let uint = builder.type_int(32, false);
    (builder, uint)
}

// Validates the single instruction defining `id`
pub fn validate_at(module: &Module, id: Id, config: &ValidationConfig) -> Result<()> {
    let position = module
        .instructions()
        .iter()
        .position(|instruction| instruction.result_id() == Some(id))
        .unwrap_or_else(|| panic!("no instruction defines id {id}"));
    validate_position(module, position, config)
}

// Validates the single instruction at `position`
pub fn validate_position(
    module: &Module,
    position: usize,
    config: &ValidationConfig,
) -> Result<()> {
    let instruction = module
        .instruction(position)
        .unwrap_or_else(|| panic!("no instruction at position {position}"));
    ValidationEngine::new(module, config).validate_instruction(instruction)
}

// Asserts a validation failure of `kind` whose message contains `needle`
#[track_caller]
pub fn assert_rejects(result: Result<()>, kind: ErrorKind, needle: &str) {
    match result {
        Err(Error::Validation(diagnostic)) => {
            assert_eq!(diagnostic.kind, kind, "unexpected kind for: {diagnostic}");
            assert!(
                diagnostic.message.contains(needle),
                "'{}' does not contain '{needle}'",
                diagnostic.message
            );
        }
        other => panic!("expected {kind} containing '{needle}', got {other:?}"),
    }
}
