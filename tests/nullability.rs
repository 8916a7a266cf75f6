//! Randomized checks of the null-constant predicate over nested struct graphs.
//!
//! Each round builds a random tree of structs whose leaves are drawn from a mix of nullable and
//! non-nullable types, then compares the validator's verdict on `OpConstantNull` with a direct
//! recursive evaluation of the tree.

use spvscope::prelude::*;

/// Small linear congruential generator, so failures reproduce from the seed alone.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    fn below(&mut self, bound: u32) -> u32 {
        self.next() % bound
    }
}

enum Shape {
    Leaf { nullable: bool, pick: u32 },
    Struct(Vec<Shape>),
}

impl Shape {
    fn random(rng: &mut Lcg, depth: u32) -> Shape {
        if depth == 0 || rng.below(3) == 0 {
            // one in four leaves is not nullable
            return Shape::Leaf {
                nullable: rng.below(4) != 0,
                pick: rng.next(),
            };
        }

        let members = 1 + rng.below(4);
        Shape::Struct((0..members).map(|_| Shape::random(rng, depth - 1)).collect())
    }

    fn nullable(&self) -> bool {
        match self {
            Shape::Leaf { nullable, .. } => *nullable,
            Shape::Struct(members) => members.iter().all(Shape::nullable),
        }
    }

    fn emit(&self, b: &mut ModuleBuilder, leaves: &Leaves) -> Id {
        match self {
            Shape::Leaf { nullable: true, pick } => {
                leaves.nullable[*pick as usize % leaves.nullable.len()]
            }
            Shape::Leaf { nullable: false, pick } => {
                leaves.non_nullable[*pick as usize % leaves.non_nullable.len()]
            }
            Shape::Struct(members) => {
                let members: Vec<Id> =
                    members.iter().map(|member| member.emit(b, leaves)).collect();
                b.type_struct(&members)
            }
        }
    }
}

struct Leaves {
    nullable: Vec<Id>,
    non_nullable: Vec<Id>,
}

impl Leaves {
    fn declare(b: &mut ModuleBuilder) -> Leaves {
        let uint = b.type_int(32, false);
        let float = b.type_float(32);
        let boolean = b.type_bool();
        let vec4 = b.type_vector(float, 4);
        let four = b.constant(uint, 4);
        let array = b.type_array(uint, four);
        let private = b.type_pointer(StorageClass::Private, uint);
        let event = b.type_event();

        let sampler = b.type_sampler();
        let runtime = b.type_runtime_array(uint);
        let physical = b.type_pointer(StorageClass::PhysicalStorageBuffer, float);
        let opaque = b.type_opaque("handle");

        Leaves {
            nullable: vec![uint, float, boolean, vec4, array, private, event],
            non_nullable: vec![sampler, runtime, physical, opaque],
        }
    }
}

#[test]
fn struct_nullability_matches_recursive_definition() {
    let mut rng = Lcg(0x5eed_1234_abcd_0001);
    let mut seen = [0usize; 2];

    for round in 0..256 {
        let shape = Shape::Struct(vec![Shape::random(&mut rng, 4), Shape::random(&mut rng, 4)]);

        let mut b = ModuleBuilder::new();
        let leaves = Leaves::declare(&mut b);
        let root = shape.emit(&mut b, &leaves);
        b.constant_null(root);
        let module = b.build().unwrap();

        let expected = shape.nullable();
        seen[usize::from(expected)] += 1;
        assert_eq!(
            module.validate(ValidationConfig::default()).is_ok(),
            expected,
            "round {round}"
        );
    }

    assert!(seen[0] > 0 && seen[1] > 0, "both outcomes exercised: {seen:?}");
}

#[test]
fn deep_nesting_respects_depth_limit() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let mut inner = uint;
    for _ in 0..100 {
        inner = b.type_struct(&[inner]);
    }
    b.constant_null(inner);
    let module = b.build().unwrap();

    assert!(module
        .validate(ValidationConfig {
            max_type_depth: 200,
            ..ValidationConfig::default()
        })
        .is_ok());
    assert!(module.validate(ValidationConfig::default()).is_err());
}

#[test]
fn physical_storage_buffer_pointer_in_struct_is_not_nullable() {
    let mut b = ModuleBuilder::new();
    let uint = b.type_int(32, false);
    let physical = b.type_pointer(StorageClass::PhysicalStorageBuffer, uint);
    let record = b.type_struct(&[uint, physical]);
    b.constant_null(record);
    let module = b.build().unwrap();

    assert!(module.validate(ValidationConfig::default()).is_err());
}
