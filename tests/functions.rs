//! Integration tests for the function pass.

use spvscope::prelude::*;

fn expect_diagnostic(result: Result<()>) -> Diagnostic {
    match result {
        Err(Error::Validation(diagnostic)) => *diagnostic,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

/// A callee with three integer parameters and a caller invoking it with `arguments` of them.
fn call_with_arguments(arguments: usize) -> (Module, Id) {
    let mut b = ModuleBuilder::new();
    let void = b.type_void();
    let uint = b.type_int(32, false);
    let callee_ty = b.type_function(void, &[uint, uint, uint]);
    let caller_ty = b.type_function(void, &[]);
    let one = b.constant(uint, 1);

    let callee = b.function(void, callee_ty);
    b.function_parameter(uint);
    b.function_parameter(uint);
    b.function_parameter(uint);
    b.label();
    b.ret();
    b.function_end();

    b.function(void, caller_ty);
    b.label();
    b.function_call(void, callee, &vec![one; arguments]);
    b.ret();
    b.function_end();
    (b.build().unwrap(), callee)
}

#[test]
fn call_argument_count_must_match() {
    let (module, _) = call_with_arguments(3);
    assert!(module.validate(ValidationConfig::default()).is_ok());

    let (module, callee) = call_with_arguments(2);
    let diagnostic = expect_diagnostic(module.validate(ValidationConfig::default()));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidId);
    assert_eq!(diagnostic.opcode, Op::FunctionCall);
    assert!(diagnostic.ids.contains(&callee));
    assert!(diagnostic
        .message
        .contains("parameter count does not match the argument count"));
}

/// A callee taking a StorageBuffer pointer and a caller passing a StorageBuffer variable.
fn storage_buffer_call(capabilities: &[Capability]) -> (Module, Id) {
    let mut b = ModuleBuilder::new();
    for &capability in capabilities {
        b.capability(capability);
    }
    b.memory_model(AddressingModel::Logical, MemoryModel::GLSL450);
    let void = b.type_void();
    let uint = b.type_int(32, false);
    let record = b.type_struct(&[uint]);
    let pointer = b.type_pointer(StorageClass::StorageBuffer, record);
    let callee_ty = b.type_function(void, &[pointer]);
    let caller_ty = b.type_function(void, &[]);
    let buffer = b.variable(pointer, StorageClass::StorageBuffer);

    let callee = b.function(void, callee_ty);
    b.function_parameter(pointer);
    b.label();
    b.ret();
    b.function_end();

    b.function(void, caller_ty);
    b.label();
    b.function_call(void, callee, &[buffer]);
    b.ret();
    b.function_end();
    (b.build().unwrap(), buffer)
}

#[test]
fn storage_buffer_arguments_need_variable_pointers() {
    let (module, buffer) = storage_buffer_call(&[Capability::Shader]);
    let diagnostic = expect_diagnostic(module.validate(ValidationConfig::default()));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidId);
    assert!(diagnostic.ids.contains(&buffer));
    assert!(diagnostic
        .message
        .contains(&format!("StorageBuffer pointer operand {buffer}")));

    let (module, _) = storage_buffer_call(&[
        Capability::Shader,
        Capability::VariablePointersStorageBuffer,
    ]);
    assert!(module.features().contains(Features::VARIABLE_POINTERS));
    assert!(module.validate(ValidationConfig::default()).is_ok());

    let (module, _) = storage_buffer_call(&[Capability::Shader]);
    assert!(module.validate(ValidationConfig::relaxed()).is_ok());
}

#[test]
fn physical_addressing_skips_pointer_rules() {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::Addresses).capability(Capability::Kernel);
    b.memory_model(AddressingModel::Physical64, MemoryModel::OpenCL);
    let void = b.type_void();
    let uint = b.type_int(32, false);
    let pointer = b.type_pointer(StorageClass::CrossWorkgroup, uint);
    let callee_ty = b.type_function(void, &[pointer]);
    let caller_ty = b.type_function(void, &[]);
    let buffer = b.variable(pointer, StorageClass::CrossWorkgroup);

    let callee = b.function(void, callee_ty);
    b.function_parameter(pointer);
    b.label();
    b.ret();
    b.function_end();

    b.function(void, caller_ty);
    b.label();
    let copy = b.copy_object(pointer, buffer);
    b.function_call(void, callee, &[copy]);
    b.ret();
    b.function_end();
    let module = b.build().unwrap();

    assert_eq!(module.addressing_model(), AddressingModel::Physical64);
    assert!(module.validate(ValidationConfig::default()).is_ok());
}

#[test]
fn parameter_as_first_instruction_is_a_layout_error() {
    let mut b = ModuleBuilder::new();
    let uint = b.fresh_id();
    let param = b.fresh_id();
    b.push(Op::FunctionParameter, vec![uint, param]);
    b.push(Op::TypeInt, vec![uint, 32, 0]);
    let module = b.build().unwrap();

    assert_eq!(module.parameter_slot(0), Some(ParameterSlot::FirstInstruction));
    let diagnostic = expect_diagnostic(module.validate(ValidationConfig::default()));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidLayout);
    assert_eq!(diagnostic.position, 0);
}

#[test]
fn parameter_slots_are_counted_from_the_function() {
    let mut b = ModuleBuilder::new();
    let void = b.type_void();
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let fn_ty = b.type_function(void, &[uint, float]);
    b.function(void, fn_ty);
    b.function_parameter(uint);
    b.function_parameter(float);
    b.label();
    b.ret();
    b.function_end();
    let module = b.build().unwrap();

    let function = module
        .instructions()
        .iter()
        .position(|instruction| instruction.opcode() == Op::Function)
        .unwrap();
    assert_eq!(
        module.parameter_slot(function + 2),
        Some(ParameterSlot::InFunction { function, index: 1 })
    );
    assert!(module.validate(ValidationConfig::default()).is_ok());
}

#[test]
fn function_id_used_as_value_is_rejected() {
    let mut b = ModuleBuilder::new();
    let void = b.type_void();
    let fn_ty = b.type_function(void, &[]);
    let function = b.function(void, fn_ty);
    b.name(function, "helper");
    b.label();
    let load = b.load(void, function);
    b.ret();
    b.function_end();
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(module.validate(ValidationConfig::default()));
    assert_eq!(diagnostic.opcode, Op::Load);
    assert_eq!(diagnostic.ids, vec![load, function]);
    assert!(diagnostic.message.contains(&format!("{function}[%helper]")));
}

#[test]
fn custom_name_resolver_renders_ids() {
    struct Percent;

    impl NameResolver for Percent {
        fn id_name(&self, _module: &Module, id: Id) -> String {
            format!("%{id}")
        }
    }

    let (module, callee) = call_with_arguments(1);
    let config = ValidationConfig::default();
    let context = ValidationContext::with_names(&module, &config, &Percent);
    let result = ValidationEngine::with_context(context).validate();

    let diagnostic = expect_diagnostic(result);
    assert!(diagnostic.message.contains(&format!("%{callee}")));
}

#[test]
fn per_element_callback_signature() {
    let build = |parameters: &dyn Fn(Id, Id) -> Vec<Id>| {
        let mut b = ModuleBuilder::new();
        b.capability(Capability::Shader);
        let uint = b.type_int(32, false);
        let float = b.type_float(32);
        let scope = b.constant(uint, 3);
        let size = b.constant(uint, 16);
        let usage = b.constant(uint, 0);
        let matrix_ty = b.type_cooperative_matrix_khr(float, scope, size, size, usage);
        let fn_ty = b.type_function(float, &parameters(uint, float));
        let callback = b.function(float, fn_ty);
        for &parameter in &parameters(uint, float) {
            b.function_parameter(parameter);
        }
        b.label();
        b.function_end();
        let zero = b.constant(float, 0);
        let matrix = b.constant_composite(matrix_ty, &[zero]);
        b.cooperative_matrix_per_element_op(matrix_ty, matrix, callback, &[]);
        b.build().unwrap()
    };

    let module = build(&|uint, float| vec![uint, uint, float]);
    assert!(module.validate(ValidationConfig::default()).is_ok());

    let module = build(&|uint, float| vec![uint, uint, float, uint]);
    assert!(module.validate(ValidationConfig::default()).is_ok());

    let module = build(&|uint, _| vec![uint, uint]);
    assert_eq!(
        expect_diagnostic(module.validate(ValidationConfig::default())).opcode,
        Op::CooperativeMatrixPerElementOpNV
    );

    let module = build(&|_, float| vec![float, float, float]);
    assert!(module.validate(ValidationConfig::default()).is_err());
}
