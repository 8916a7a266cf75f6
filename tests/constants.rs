//! Integration tests for the constant pass.
//!
//! Every module here is built through the public builder and validated end to end, so these
//! tests cover dispatch, configuration and diagnostics together with the constant rules.

use spvscope::prelude::*;

fn validate(module: &Module) -> Result<()> {
    module.validate(ValidationConfig::default())
}

fn expect_diagnostic(result: Result<()>) -> Diagnostic {
    match result {
        Err(Error::Validation(diagnostic)) => *diagnostic,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn short_vector_composite_cites_component_count() {
    let mut b = ModuleBuilder::new();
    let float = b.type_float(32);
    let vec3 = b.type_vector(float, 3);
    let zero = b.constant(float, 0);
    let composite = b.constant_composite(vec3, &[zero, zero]);
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(validate(&module));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidId);
    assert_eq!(diagnostic.opcode, Op::ConstantComposite);
    assert_eq!(diagnostic.ids.first(), Some(&composite));
    assert!(diagnostic.message.contains("vector component count"));
}

#[test]
fn array_with_spec_constant_length_accepts_any_count() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let length = b.spec_constant(uint, 4);
    let array = b.type_array(uint, length);
    let one = b.constant(uint, 1);
    b.constant_composite(array, &[one]);
    b.constant_composite(array, &[one, one, one, one, one, one]);
    b.spec_constant_composite(array, &[one, one]);
    let module = b.build().unwrap();

    assert!(validate(&module).is_ok());

    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let length = b.spec_constant(uint, 4);
    let array = b.type_array(uint, length);
    let one = b.constant(uint, 1);
    let half = b.constant(float, 0x3f00_0000);
    b.constant_composite(array, &[one, half]);
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(validate(&module));
    assert!(diagnostic.ids.contains(&half));
    assert!(diagnostic.message.contains("array element type"));
}

#[test]
fn struct_constant_requires_members_in_order() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let boolean = b.type_bool();
    let record = b.type_struct(&[uint, float, boolean]);
    let one = b.constant(uint, 1);
    let zero = b.constant(float, 0);
    let yes = b.constant_true(boolean);
    b.constant_composite(record, &[one, zero, yes]);
    let module = b.build().unwrap();
    assert!(validate(&module).is_ok());

    for constituents in [vec![one, zero], vec![one, yes, zero], vec![one, zero, yes, yes]] {
        let mut b = ModuleBuilder::new();
        let uint = b.type_int(32, false);
        let float = b.type_float(32);
        let boolean = b.type_bool();
        let record = b.type_struct(&[uint, float, boolean]);
        b.constant(uint, 1);
        b.constant(float, 0);
        b.constant_true(boolean);
        b.constant_composite(record, &constituents);
        let module = b.build().unwrap();

        assert_eq!(
            expect_diagnostic(validate(&module)).kind,
            ErrorKind::InvalidId,
            "constituents {constituents:?}"
        );
    }
}

#[test]
fn null_constants_follow_nullability() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let mat = b.type_matrix(vec4, 4);
    let four = b.constant(uint, 4);
    let array = b.type_array(mat, four);
    let record = b.type_struct(&[uint, array]);
    let private = b.type_pointer(StorageClass::Private, record);
    let event = b.type_event();
    let queue = b.type_queue();
    for ty in [uint, vec4, mat, array, record, private, event, queue] {
        b.constant_null(ty);
    }
    let module = b.build().unwrap();
    assert!(validate(&module).is_ok());

    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let sampler = b.type_sampler();
    let record = b.type_struct(&[uint, sampler]);
    let null = b.constant_null(record);
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(validate(&module));
    assert_eq!(diagnostic.ids.first(), Some(&null));
    assert!(diagnostic.message.contains("cannot have a null value"));
}

#[test]
fn physical_storage_buffer_pointers_are_never_null() {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::PhysicalStorageBufferAddresses);
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let record = b.type_struct(&[uint, float]);
    let void = b.type_void();
    let pointees = [uint, float, record, void];
    for pointee in pointees {
        let pointer = b.type_pointer(StorageClass::PhysicalStorageBuffer, pointee);
        b.constant_null(pointer);
    }
    let module = b.build().unwrap();

    let config = ValidationConfig {
        continue_after_error: true,
        ..ValidationConfig::default()
    };
    let diagnostics = ValidationEngine::new(&module, &config).collect();
    assert_eq!(diagnostics.len(), pointees.len());
    assert!(diagnostics
        .iter()
        .all(|diagnostic| diagnostic.opcode == Op::ConstantNull));
}

#[test]
fn spec_constant_must_be_numeric() {
    let mut b = ModuleBuilder::new();
    let boolean = b.type_bool();
    b.spec_constant(boolean, 0);
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(validate(&module));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidData);
}

#[test]
fn spec_constant_op_capability_gates() {
    let build = |version: Version, capabilities: &[Capability], opcode: Op| {
        let mut b = ModuleBuilder::new();
        b.version(version);
        for &capability in capabilities {
            b.capability(capability);
        }
        let uint = b.type_int(32, false);
        let one = b.constant(uint, 1);
        b.spec_constant_op(uint, opcode, &[one]);
        b.build().unwrap()
    };

    let cases = [
        (Version::V1_3, &[][..], Op::IAdd, true),
        (Version::V1_3, &[][..], Op::QuantizeToF16, false),
        (Version::V1_3, &[Capability::Shader][..], Op::QuantizeToF16, true),
        (Version::V1_3, &[][..], Op::UConvert, false),
        (Version::V1_4, &[][..], Op::UConvert, true),
        (Version::V1_3, &[Capability::Kernel][..], Op::UConvert, true),
        (Version::V1_6, &[][..], Op::Bitcast, false),
        (Version::V1_6, &[Capability::Kernel][..], Op::InBoundsPtrAccessChain, true),
        (Version::V1_6, &[Capability::Shader][..], Op::ConvertFToS, false),
    ];

    for (version, capabilities, opcode, valid) in cases {
        let module = build(version, capabilities, opcode);
        assert_eq!(
            validate(&module).is_ok(),
            valid,
            "{opcode} at {version} with {capabilities:?}"
        );
    }
}

#[test]
fn uconvert_feature_from_extension() {
    let mut b = ModuleBuilder::new();
    b.version(Version::V1_3);
    b.extension("SPV_AMD_gpu_shader_int16");
    let uint = b.type_int(32, false);
    let one = b.constant(uint, 1);
    b.spec_constant_op(uint, Op::UConvert, &[one]);
    let module = b.build().unwrap();

    assert!(module.features().contains(Features::UCONVERT_SPEC_CONSTANT_OP));
    assert!(validate(&module).is_ok());
}

#[test]
fn function_pointer_constant_to_later_function() {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::FunctionPointersINTEL);
    let void = b.type_void();
    let fn_ty = b.type_function(void, &[]);
    let fn_ptr = b.type_pointer(StorageClass::CodeSectionINTEL, fn_ty);
    let target = b.fresh_id();
    b.constant_function_pointer(fn_ptr, target);
    b.push(Op::Function, vec![void, target, 0, fn_ty]);
    b.label();
    b.ret();
    b.function_end();
    let module = b.build().unwrap();

    assert!(validate(&module).is_ok());
}

#[test]
fn function_pointer_constant_to_missing_function_is_deferred() {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::FunctionPointersINTEL);
    let void = b.type_void();
    let fn_ty = b.type_function(void, &[]);
    let fn_ptr = b.type_pointer(StorageClass::CodeSectionINTEL, fn_ty);
    let missing = b.fresh_id();
    b.constant_function_pointer(fn_ptr, missing);
    let module = b.build().unwrap();

    assert!(validate(&module).is_ok());
}

#[test]
fn narrow_constants_need_their_capability_under_shader() {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::Shader);
    let byte = b.type_int(8, true);
    let record = b.type_struct(&[byte]);
    let value = b.constant(byte, 1);
    b.constant_composite(record, &[value]);
    let module = b.build().unwrap();

    let diagnostic = expect_diagnostic(validate(&module));
    assert_eq!(diagnostic.kind, ErrorKind::InvalidId);
    assert!(diagnostic.message.contains("8- or 16-bit"));

    let mut b = ModuleBuilder::new();
    b.capability(Capability::Shader).capability(Capability::Int8);
    let byte = b.type_int(8, true);
    let record = b.type_struct(&[byte]);
    let value = b.constant(byte, 1);
    b.constant_composite(record, &[value]);
    let module = b.build().unwrap();

    assert!(validate(&module).is_ok());
}

#[test]
fn constant_pass_can_be_disabled() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    b.constant_true(uint);
    let module = b.build().unwrap();

    let config = ValidationConfig {
        enable_constant_validation: false,
        ..ValidationConfig::default()
    };
    assert!(module.validate(config).is_ok());
    assert!(validate(&module).is_err());
}
