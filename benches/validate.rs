//! Benchmarks for module validation.
//!
//! Measures the validation passes on synthetic modules:
//! - Many composite constants over nested struct and array types
//! - Null constants of deeply nested structs
//! - Call-heavy modules with pointer arguments
//! - Batch validation of independent modules

extern crate spvscope;

use criterion::{criterion_group, criterion_main, Criterion};
use spvscope::{
    ir::{Capability, Id, Module, ModuleBuilder, StorageClass},
    validation::{validate_modules, ValidationEngine},
    ValidationConfig,
};
use std::hint::black_box;

/// `count` struct constants, each holding a vec4 and an array of four integers.
fn composite_module(count: usize) -> Module {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::Shader);
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let vec4 = b.type_vector(float, 4);
    let four = b.constant(uint, 4);
    let array = b.type_array(uint, four);
    let record = b.type_struct(&[vec4, array, uint]);

    for index in 0..count {
        let value = b.constant(uint, index as u32);
        let component = b.constant(float, index as u32);
        let vector = b.constant_composite(vec4, &[component; 4]);
        let elements = b.constant_composite(array, &[value; 4]);
        b.constant_composite(record, &[vector, elements, value]);
    }
    b.build().unwrap()
}

/// Null constants of structs nested `depth` levels deep.
fn nested_null_module(depth: usize) -> Module {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let float = b.type_float(32);
    let mut inner = b.type_struct(&[uint, float]);
    for _ in 0..depth {
        inner = b.type_struct(&[inner, uint]);
        b.constant_null(inner);
    }
    b.build().unwrap()
}

/// One callee with pointer parameters called `calls` times.
fn call_module(calls: usize) -> Module {
    let mut b = ModuleBuilder::new();
    b.capability(Capability::Shader);
    let void = b.type_void();
    let uint = b.type_int(32, false);
    let pointer = b.type_pointer(StorageClass::Function, uint);
    let callee_ty = b.type_function(void, &[pointer, pointer, uint]);
    let caller_ty = b.type_function(void, &[]);
    let one = b.constant(uint, 1);

    let callee = b.function(void, callee_ty);
    b.function_parameter(pointer);
    b.function_parameter(pointer);
    b.function_parameter(uint);
    b.label();
    b.ret();
    b.function_end();

    b.function(void, caller_ty);
    b.label();
    let locals: Vec<Id> = (0..4)
        .map(|_| b.variable(pointer, StorageClass::Function))
        .collect();
    for index in 0..calls {
        let first = locals[index % locals.len()];
        let second = locals[(index + 1) % locals.len()];
        b.function_call(void, callee, &[first, second, one]);
    }
    b.ret();
    b.function_end();
    b.build().unwrap()
}

fn bench_composite_constants(c: &mut Criterion) {
    let module = composite_module(1_000);
    let config = ValidationConfig::default();

    c.bench_function("validate_composite_constants", |b| {
        b.iter(|| {
            let result = ValidationEngine::new(black_box(&module), &config).validate();
            black_box(result)
        });
    });
}

fn bench_nested_null(c: &mut Criterion) {
    let module = nested_null_module(48);
    let config = ValidationConfig::default();

    c.bench_function("validate_nested_null", |b| {
        b.iter(|| {
            let result = ValidationEngine::new(black_box(&module), &config).validate();
            black_box(result)
        });
    });
}

fn bench_calls(c: &mut Criterion) {
    let module = call_module(2_000);
    let config = ValidationConfig::default();

    c.bench_function("validate_calls", |b| {
        b.iter(|| {
            let result = ValidationEngine::new(black_box(&module), &config).validate();
            black_box(result)
        });
    });
}

fn bench_module_construction(c: &mut Criterion) {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    for index in 0..5_000 {
        b.constant(uint, index);
    }

    c.bench_function("build_module_5000", |bencher| {
        bencher.iter(|| black_box(b.build().unwrap()));
    });
}

fn bench_batch(c: &mut Criterion) {
    let modules: Vec<Module> = (0..64).map(|_| composite_module(200)).collect();
    let config = ValidationConfig::default();

    c.bench_function("validate_batch_64", |b| {
        b.iter(|| black_box(validate_modules(black_box(&modules), &config)));
    });
}

criterion_group!(
    benches,
    bench_composite_constants,
    bench_nested_null,
    bench_calls,
    bench_module_construction,
    bench_batch,
);
criterion_main!(benches);
