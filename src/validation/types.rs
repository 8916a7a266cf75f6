//! Structural type relations.
//!
//! Two notions of type equality are used by the passes. *Exact* match is plain id equality, since
//! every distinct type declaration has its own id. *Logical* match compares arrays and structs
//! structurally and is only consulted as a legalization fallback for pointer arguments of calls,
//! when the front end may have emitted the same aggregate twice with different ids.
//!
//! The engine also implements the null-constant predicate and a generic "does this type graph
//! contain a type matching X" walk. Every walk is bounded twice: by
//! [`crate::ValidationConfig::max_type_depth`] and, for the graph walk, by a visited set, because
//! nothing at this layer guarantees the type graph is acyclic. Hitting the depth bound yields
//! `false` and a warning in the log.

use rustc_hash::FxHashSet;

use crate::ir::{Id, Instruction, Module, Op, StorageClass};

/// Type relations over one module.
#[derive(Debug, Clone, Copy)]
pub struct TypeEquivalence<'a> {
    module: &'a Module,
    max_depth: usize,
}

impl<'a> TypeEquivalence<'a> {
    /// Creates the engine; walks deeper than `max_depth` give up.
    #[must_use]
    pub fn new(module: &'a Module, max_depth: usize) -> Self {
        TypeEquivalence { module, max_depth }
    }

    /// Exact type identity.
    #[must_use]
    pub fn exact_match(a: Id, b: Id) -> bool {
        a == b
    }

    /// Structural match of two type declarations.
    ///
    /// Both must have the same opcode. With `check_decorations`, every decoration on `b` must
    /// also be on `a`. Arrays match if they share the length id and their element types are
    /// equal or match; structs match if they have the same member count and every member pair
    /// is equal or matches. No other type kind matches logically.
    #[must_use]
    pub fn logically_match(&self, a: &Instruction, b: &Instruction, check_decorations: bool) -> bool {
        self.logically_match_at(a, b, check_decorations, 0)
    }

    fn logically_match_at(
        &self,
        a: &Instruction,
        b: &Instruction,
        check_decorations: bool,
        depth: usize,
    ) -> bool {
        if self.too_deep(depth, a) || a.opcode() != b.opcode() {
            return false;
        }

        if check_decorations {
            if let (Some(a_id), Some(b_id)) = (a.result_id(), b.result_id()) {
                if !self.decorations_subset(b_id, a_id) {
                    return false;
                }
            }
        }

        match a.opcode() {
            Op::TypeArray => {
                a.operand(2) == b.operand(2)
                    && self.ids_match(a.operand(1), b.operand(1), check_decorations, depth)
            }
            Op::TypeStruct => {
                a.operand_count() == b.operand_count()
                    && a.operands_from(1)
                        .iter()
                        .zip(b.operands_from(1))
                        .all(|(&x, &y)| self.ids_match(Some(x), Some(y), check_decorations, depth))
            }
            _ => false,
        }
    }

    fn ids_match(&self, a: Option<Id>, b: Option<Id>, check_decorations: bool, depth: usize) -> bool {
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        if a == b {
            return true;
        }

        match (self.module.find_def(a), self.module.find_def(b)) {
            (Some(a), Some(b)) => self.logically_match_at(a, b, check_decorations, depth + 1),
            _ => false,
        }
    }

    /// Legalization fallback for call arguments: `argument` and `parameter` are both
    /// `OpTypePointer`, every decoration of `parameter` is also on `argument`, and the pointees
    /// are the same id or logically match with decorations checked.
    #[must_use]
    pub fn pointees_logically_match(&self, argument: &Instruction, parameter: &Instruction) -> bool {
        if argument.opcode() != Op::TypePointer || parameter.opcode() != Op::TypePointer {
            return false;
        }

        if let (Some(arg_id), Some(param_id)) = (argument.result_id(), parameter.result_id()) {
            if !self.decorations_subset(param_id, arg_id) {
                return false;
            }
        }

        self.ids_match(argument.operand(2), parameter.operand(2), true, 0)
    }

    // Every decoration applied to `subset` is also applied to `superset`.
    fn decorations_subset(&self, subset: Id, superset: Id) -> bool {
        let available = self.module.decorations_of(superset);
        self.module
            .decorations_of(subset)
            .iter()
            .all(|decoration| available.contains(decoration))
    }

    /// Whether `OpConstantNull` may produce a value of type `ty`.
    #[must_use]
    pub fn is_nullable(&self, ty: &Instruction) -> bool {
        self.is_nullable_at(ty, 0)
    }

    fn is_nullable_at(&self, ty: &Instruction, depth: usize) -> bool {
        if self.too_deep(depth, ty) {
            return false;
        }

        let nested = |id: Id| {
            self.module
                .find_def(id)
                .is_some_and(|inner| self.is_nullable_at(inner, depth + 1))
        };

        match ty.opcode() {
            Op::TypeBool
            | Op::TypeInt
            | Op::TypeFloat
            | Op::TypeEvent
            | Op::TypeDeviceEvent
            | Op::TypeReserveId
            | Op::TypeQueue => true,
            Op::TypeArray
            | Op::TypeMatrix
            | Op::TypeVector
            | Op::TypeCooperativeMatrixNV
            | Op::TypeCooperativeMatrixKHR
            | Op::TypeCooperativeVectorNV => ty.operand(1).is_some_and(nested),
            Op::TypeStruct => ty.operands_from(1).iter().all(|&member| nested(member)),
            Op::TypePointer | Op::TypeUntypedPointerKHR => {
                ty.operand(1) != Some(StorageClass::PhysicalStorageBuffer as u32)
            }
            Op::TypeTensorARM => ty.is_shaped_tensor() && ty.operand(1).is_some_and(nested),
            _ => false,
        }
    }

    /// Walks the type graph rooted at `id` and reports whether any reachable type satisfies
    /// `predicate`.
    ///
    /// The walk descends into element and component types and struct members. Pointee types and
    /// function signatures are only followed with `traverse_all`. Each type is visited once.
    pub fn contains_type<F>(&self, id: Id, traverse_all: bool, predicate: F) -> bool
    where
        F: Fn(&Instruction) -> bool,
    {
        let mut visited = FxHashSet::default();
        self.contains_type_at(id, traverse_all, &predicate, &mut visited, 0)
    }

    fn contains_type_at(
        &self,
        id: Id,
        traverse_all: bool,
        predicate: &dyn Fn(&Instruction) -> bool,
        visited: &mut FxHashSet<Id>,
        depth: usize,
    ) -> bool {
        if !visited.insert(id) {
            return false;
        }
        let Some(ty) = self.module.find_def(id) else {
            return false;
        };
        if self.too_deep(depth, ty) {
            return false;
        }
        if predicate(ty) {
            return true;
        }

        let mut descend = |inner: Option<Id>| {
            inner.is_some_and(|inner| {
                self.contains_type_at(inner, traverse_all, predicate, visited, depth + 1)
            })
        };

        match ty.opcode() {
            Op::TypeArray
            | Op::TypeRuntimeArray
            | Op::TypeVector
            | Op::TypeMatrix
            | Op::TypeImage
            | Op::TypeSampledImage
            | Op::TypeCooperativeMatrixNV
            | Op::TypeCooperativeMatrixKHR
            | Op::TypeCooperativeVectorNV => descend(ty.operand(1)),
            Op::TypePointer if traverse_all => descend(ty.operand(2)),
            Op::TypeFunction if !traverse_all => false,
            Op::TypeStruct | Op::TypeFunction => ty
                .operands_from(1)
                .iter()
                .any(|&inner| descend(Some(inner))),
            _ => false,
        }
    }

    fn too_deep(&self, depth: usize, ty: &Instruction) -> bool {
        if depth > self.max_depth {
            log::warn!(
                "type walk exceeded depth {} at {} (position {})",
                self.max_depth,
                ty.opcode(),
                ty.position()
            );
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ModuleBuilder;

    #[test]
    fn test_struct_nullability() {
        let mut builder = ModuleBuilder::new();
        let float = builder.type_float(32);
        let sampler = builder.type_sampler();
        let plain = builder.type_struct(&[float, float]);
        let with_sampler = builder.type_struct(&[float, sampler]);
        let empty = builder.type_struct(&[]);
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);

        assert!(engine.is_nullable(module.find_def(plain).unwrap()));
        assert!(!engine.is_nullable(module.find_def(with_sampler).unwrap()));
        assert!(engine.is_nullable(module.find_def(empty).unwrap()));
        assert!(!engine.is_nullable(module.find_def(sampler).unwrap()));
    }

    #[test]
    fn test_pointer_nullability() {
        let mut builder = ModuleBuilder::new();
        let float = builder.type_float(32);
        let physical = builder.type_pointer(StorageClass::PhysicalStorageBuffer, float);
        let function = builder.type_pointer(StorageClass::Function, float);
        let untyped = builder.type_untyped_pointer(StorageClass::PhysicalStorageBuffer);
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);

        assert!(!engine.is_nullable(module.find_def(physical).unwrap()));
        assert!(engine.is_nullable(module.find_def(function).unwrap()));
        assert!(!engine.is_nullable(module.find_def(untyped).unwrap()));
    }

    #[test]
    fn test_depth_bound() {
        let mut builder = ModuleBuilder::new();
        let mut ty = builder.type_int(32, true);
        for _ in 0..10 {
            ty = builder.type_struct(&[ty]);
        }
        let module = builder.build().unwrap();

        let outer = module.find_def(ty).unwrap();
        assert!(TypeEquivalence::new(&module, 64).is_nullable(outer));
        assert!(!TypeEquivalence::new(&module, 4).is_nullable(outer));
    }

    #[test]
    fn test_logical_match_arrays_and_structs() {
        let mut builder = ModuleBuilder::new();
        let uint = builder.type_int(32, false);
        let four = builder.constant(uint, 4);
        let five = builder.constant(uint, 5);
        let s1 = builder.type_struct(&[uint]);
        let s2 = builder.type_struct(&[uint]);
        let a1 = builder.type_array(s1, four);
        let a2 = builder.type_array(s2, four);
        let a3 = builder.type_array(s2, five);
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);
        let def = |id| module.find_def(id).unwrap();

        assert!(engine.logically_match(def(s1), def(s2), true));
        assert!(engine.logically_match(def(a1), def(a2), true));
        assert!(!engine.logically_match(def(a1), def(a3), true));
        assert!(!engine.logically_match(def(uint), def(uint), false));
        assert!(TypeEquivalence::exact_match(a1, a1));
        assert!(!TypeEquivalence::exact_match(a1, a2));
    }

    #[test]
    fn test_logical_match_decoration_subset() {
        let mut builder = ModuleBuilder::new();
        let uint = builder.type_int(32, false);
        let s1 = builder.type_struct(&[uint]);
        let s2 = builder.type_struct(&[uint]);
        builder.decorate(s1, 2, &[]); // Block
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);
        let def = |id| module.find_def(id).unwrap();

        // decorations of the second operand must be present on the first
        assert!(engine.logically_match(def(s1), def(s2), true));
        assert!(!engine.logically_match(def(s2), def(s1), true));
        assert!(engine.logically_match(def(s2), def(s1), false));
    }

    #[test]
    fn test_pointees_logically_match() {
        let mut builder = ModuleBuilder::new();
        let uint = builder.type_int(32, false);
        let s1 = builder.type_struct(&[uint]);
        let s2 = builder.type_struct(&[uint]);
        let p1 = builder.type_pointer(StorageClass::Function, s1);
        let p2 = builder.type_pointer(StorageClass::Function, s2);
        let p3 = builder.type_pointer(StorageClass::Function, uint);
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);
        let def = |id| module.find_def(id).unwrap();

        assert!(engine.pointees_logically_match(def(p1), def(p2)));
        assert!(!engine.pointees_logically_match(def(p1), def(p3)));
        assert!(!engine.pointees_logically_match(def(s1), def(s2)));
    }

    #[test]
    fn test_contains_type_handles_cycles() {
        let mut builder = ModuleBuilder::new();
        // %s = OpTypeStruct %ptr ; %ptr = OpTypePointer PhysicalStorageBuffer %s
        let s = builder.fresh_id();
        let ptr = builder.fresh_id();
        let half = builder.type_float(16);
        builder.push(Op::TypeStruct, vec![s, ptr]);
        builder.push(
            Op::TypePointer,
            vec![ptr, StorageClass::PhysicalStorageBuffer as u32, s],
        );
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);

        assert!(!engine.contains_type(s, true, |ty| ty.opcode() == Op::TypeFloat));
        assert!(engine.contains_type(s, true, |ty| ty.opcode() == Op::TypePointer));
        assert!(engine.contains_type(half, false, |ty| ty.opcode() == Op::TypeFloat));
    }

    #[test]
    fn test_contains_type_stops_at_pointers() {
        let mut builder = ModuleBuilder::new();
        let half = builder.type_float(16);
        let ptr = builder.type_pointer(StorageClass::Function, half);
        let s = builder.type_struct(&[ptr]);
        let module = builder.build().unwrap();
        let engine = TypeEquivalence::new(&module, 64);
        let is_half = |ty: &Instruction| ty.opcode() == Op::TypeFloat;

        assert!(!engine.contains_type(s, false, is_half));
        assert!(engine.contains_type(s, true, is_half));
    }
}
