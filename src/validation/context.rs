//! The read-only query surface handed to validators.
//!
//! [`ValidationContext`] bundles a [`Module`], the active [`ValidationConfig`] and a
//! [`NameResolver`] for the duration of one validation run. Validators never touch the module
//! directly; everything they need (definitions, decorations, capabilities, derived facts about
//! types and constants, and diagnostic construction) goes through the context.
//!
//! # Thread Safety
//!
//! A context only holds shared references and is created per module, so validating several
//! modules on a thread pool gives every thread its own context.
//!
//! # Examples
//!
//! ```rust
//! use spvscope::{ir::ModuleBuilder, validation::ValidationContext, ValidationConfig};
//!
//! let mut builder = ModuleBuilder::new();
//! let uint = builder.type_int(32, false);
//! let four = builder.constant(uint, 4);
//! let spec = builder.spec_constant(uint, 4);
//! let module = builder.build()?;
//!
//! let config = ValidationConfig::default();
//! let context = ValidationContext::new(&module, &config);
//! assert_eq!(context.eval_int32_if_const(four), (true, true, 4));
//! assert_eq!(context.eval_int32_if_const(spec), (true, false, 0));
//! # Ok::<(), spvscope::Error>(())
//! ```

use crate::{
    ir::{
        AddressingModel, Capability, Decoration, Features, Id, Instruction, Module, Op,
        ParameterSlot, StorageClass,
    },
    validation::{Diagnostic, ErrorKind, TypeEquivalence, ValidationConfig},
    Error,
};

/// Renders ids for diagnostic messages.
pub trait NameResolver {
    /// Returns a human readable rendering of `id`.
    fn id_name(&self, module: &Module, id: Id) -> String;
}

/// Default resolver: `N[%name]` when the module names `N` with `OpName`, plain `N` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct FriendlyNames;

impl NameResolver for FriendlyNames {
    fn id_name(&self, module: &Module, id: Id) -> String {
        match module.name_of(id) {
            Some(name) => format!("{id}[%{name}]"),
            None => id.to_string(),
        }
    }
}

/// Everything a validator may ask about the module under validation.
pub struct ValidationContext<'a> {
    module: &'a Module,
    config: &'a ValidationConfig,
    names: &'a dyn NameResolver,
    types: TypeEquivalence<'a>,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context using [`FriendlyNames`].
    #[must_use]
    pub fn new(module: &'a Module, config: &'a ValidationConfig) -> Self {
        Self::with_names(module, config, &FriendlyNames)
    }

    /// Creates a context using a caller-supplied name resolver.
    #[must_use]
    pub fn with_names(
        module: &'a Module,
        config: &'a ValidationConfig,
        names: &'a dyn NameResolver,
    ) -> Self {
        ValidationContext {
            module,
            config,
            names,
            types: TypeEquivalence::new(module, config.max_type_depth),
        }
    }

    /// The module under validation.
    #[must_use]
    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// The active configuration.
    #[must_use]
    pub fn options(&self) -> &'a ValidationConfig {
        self.config
    }

    /// The type-equivalence engine bound to this module.
    #[must_use]
    pub fn types(&self) -> &TypeEquivalence<'a> {
        &self.types
    }

    /// Looks up the definition of `id`.
    #[must_use]
    pub fn find_def(&self, id: Id) -> Option<&'a Instruction> {
        self.module.find_def(id)
    }

    /// Looks up the definition of `instruction`'s result type.
    #[must_use]
    pub fn type_def(&self, instruction: &Instruction) -> Option<&'a Instruction> {
        instruction.type_id().and_then(|id| self.find_def(id))
    }

    /// Operand word `index` of `instruction`.
    #[must_use]
    pub fn get_operand(&self, instruction: &Instruction, index: usize) -> Option<u32> {
        instruction.operand(index)
    }

    /// Returns true if `capability` is declared or implied.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.module.has_capability(capability)
    }

    /// Derived feature flags.
    #[must_use]
    pub fn features(&self) -> Features {
        self.module.features()
    }

    /// The module's addressing model.
    #[must_use]
    pub fn addressing_model(&self) -> AddressingModel {
        self.module.addressing_model()
    }

    /// Decorations applied to `id`.
    #[must_use]
    pub fn decorations_of(&self, id: Id) -> &'a [Decoration] {
        self.module.decorations_of(id)
    }

    /// Owning function and index of the parameter at `position`.
    #[must_use]
    pub fn parameter_slot(&self, position: usize) -> Option<ParameterSlot> {
        self.module.parameter_slot(position)
    }

    fn opcode_of(&self, id: Id) -> Option<Op> {
        self.find_def(id).map(Instruction::opcode)
    }

    /// True if `type_id` is an `OpTypeInt`.
    #[must_use]
    pub fn is_int_scalar(&self, type_id: Id) -> bool {
        self.opcode_of(type_id) == Some(Op::TypeInt)
    }

    /// True if `type_id` is an `OpTypeFloat`.
    #[must_use]
    pub fn is_float_scalar(&self, type_id: Id) -> bool {
        self.opcode_of(type_id) == Some(Op::TypeFloat)
    }

    /// True if `type_id` is an `OpTypeBool`.
    #[must_use]
    pub fn is_bool_type(&self, type_id: Id) -> bool {
        self.opcode_of(type_id) == Some(Op::TypeBool)
    }

    /// True for typed and untyped pointer types.
    #[must_use]
    pub fn is_pointer_type(&self, type_id: Id) -> bool {
        self.opcode_of(type_id).is_some_and(Op::is_pointer_type)
    }

    /// True for both cooperative matrix type flavours.
    #[must_use]
    pub fn is_cooperative_matrix_type(&self, type_id: Id) -> bool {
        matches!(
            self.opcode_of(type_id),
            Some(Op::TypeCooperativeMatrixKHR | Op::TypeCooperativeMatrixNV)
        )
    }

    /// True for `OpTypeCooperativeMatrixKHR`.
    #[must_use]
    pub fn is_cooperative_matrix_khr_type(&self, type_id: Id) -> bool {
        self.opcode_of(type_id) == Some(Op::TypeCooperativeMatrixKHR)
    }

    /// Scalar component type of a scalar, vector, matrix, array or cooperative type, or of the
    /// type of a value.
    #[must_use]
    pub fn component_type(&self, id: Id) -> Option<Id> {
        let mut current = id;
        // value -> type -> matrix column -> scalar
        for _ in 0..4 {
            let definition = self.find_def(current)?;
            current = match definition.opcode() {
                Op::TypeBool | Op::TypeInt | Op::TypeFloat => return Some(current),
                Op::TypeArray
                | Op::TypeVector
                | Op::TypeCooperativeMatrixNV
                | Op::TypeCooperativeMatrixKHR
                | Op::TypeCooperativeVectorNV => return definition.operand(1),
                Op::TypeMatrix => definition.operand(1)?,
                _ => definition.type_id()?,
            };
        }
        None
    }

    /// Number of components: 1 for scalars, the literal count for vectors and matrices. Values
    /// report the dimension of their type; anything else reports 0.
    #[must_use]
    pub fn dimension_of(&self, id: Id) -> u32 {
        let Some(mut definition) = self.find_def(id) else {
            return 0;
        };
        if !definition.is_type_declaration() {
            match self.type_def(definition) {
                Some(ty) => definition = ty,
                None => return 0,
            }
        }

        match definition.opcode() {
            Op::TypeBool
            | Op::TypeInt
            | Op::TypeFloat
            | Op::TypeCooperativeMatrixNV
            | Op::TypeCooperativeMatrixKHR => 1,
            Op::TypeVector | Op::TypeMatrix => definition.operand(2).unwrap_or(0),
            _ => 0,
        }
    }

    /// Bit width of the scalar component of `id`; 1 for booleans, 0 if unknown.
    #[must_use]
    pub fn bit_width(&self, id: Id) -> u32 {
        let Some(component) = self.component_type(id).and_then(|ty| self.find_def(ty)) else {
            return 0;
        };
        match component.opcode() {
            Op::TypeInt | Op::TypeFloat => component.operand(1).unwrap_or(0),
            Op::TypeBool => 1,
            _ => 0,
        }
    }

    /// Raw storage class word of a pointer type.
    #[must_use]
    pub fn storage_class_word(&self, pointer_type: Id) -> Option<u32> {
        self.find_def(pointer_type)
            .filter(|ty| ty.opcode().is_pointer_type())
            .and_then(|ty| ty.operand(1))
    }

    /// Storage class of a pointer type.
    #[must_use]
    pub fn storage_class_of(&self, pointer_type: Id) -> Option<StorageClass> {
        self.storage_class_word(pointer_type)
            .and_then(StorageClass::from_repr)
    }

    /// Pointee of an `OpTypePointer`.
    #[must_use]
    pub fn pointee_of(&self, pointer_type: Id) -> Option<Id> {
        self.find_def(pointer_type)
            .filter(|ty| ty.opcode() == Op::TypePointer)
            .and_then(|ty| ty.operand(2))
    }

    /// The `OpTypeFunction` declared by an `OpFunction`.
    #[must_use]
    pub fn function_type_of(&self, function: &Instruction) -> Option<&'a Instruction> {
        function
            .operand(3)
            .and_then(|id| self.find_def(id))
            .filter(|ty| ty.opcode() == Op::TypeFunction)
    }

    /// Evaluates `id` as a 32-bit integer constant.
    ///
    /// Returns `(is_int32, is_const, value)`: `is_int32` is false unless `id` is a value of a
    /// 32-bit integer type; `is_const` is false for specialization constants and non-constants,
    /// whose value is then reported as 0. `OpConstantNull` evaluates to 0.
    #[must_use]
    pub fn eval_int32_if_const(&self, id: Id) -> (bool, bool, u32) {
        let Some(definition) = self.find_def(id) else {
            return (false, false, 0);
        };
        let is_int32 = definition
            .type_id()
            .is_some_and(|ty| self.is_int_scalar(ty) && self.bit_width(ty) == 32);
        if !is_int32 {
            return (false, false, 0);
        }

        let opcode = definition.opcode();
        if !opcode.is_constant() || opcode.is_spec_constant() {
            return (true, false, 0);
        }
        if opcode == Op::ConstantNull {
            return (true, true, 0);
        }

        match definition.operand(2) {
            Some(value) => (true, true, value),
            None => (true, false, 0),
        }
    }

    /// Evaluates `id` as an integer constant of up to 64 bits.
    ///
    /// Only `OpConstant` and `OpConstantNull` of integer scalar type have a value.
    #[must_use]
    pub fn eval_const_uint64(&self, id: Id) -> Option<u64> {
        let definition = self.find_def(id)?;
        if !definition.type_id().is_some_and(|ty| self.is_int_scalar(ty)) {
            return None;
        }

        match definition.opcode() {
            Op::ConstantNull => Some(0),
            Op::Constant => {
                let low = u64::from(definition.operand(2)?);
                let high = definition.operand(3).map_or(0, u64::from);
                Some(low | (high << 32))
            }
            _ => None,
        }
    }

    /// True if the type graph rooted at `type_id` contains a narrow numeric type the module has
    /// not declared the matching capability for: 16-bit integers without `Int16`, 8-bit integers
    /// without `Int8`, or 16-bit floats without `Float16`. Pointees are not followed.
    #[must_use]
    pub fn contains_limited_use_numeric(&self, type_id: Id) -> bool {
        let narrow = |opcode: Op, width: u32| {
            self.types.contains_type(type_id, false, |ty| {
                ty.opcode() == opcode && ty.operand(1) == Some(width)
            })
        };

        (!self.has_capability(Capability::Int16) && narrow(Op::TypeInt, 16))
            || (!self.has_capability(Capability::Int8) && narrow(Op::TypeInt, 8))
            || (!self.has_capability(Capability::Float16) && narrow(Op::TypeFloat, 16))
    }

    /// Structural match of two type ids; see [`TypeEquivalence::logically_match`].
    #[must_use]
    pub fn logically_match(&self, a: Id, b: Id, check_decorations: bool) -> bool {
        match (self.find_def(a), self.find_def(b)) {
            (Some(a), Some(b)) => self.types.logically_match(a, b, check_decorations),
            _ => false,
        }
    }

    /// Null-constant predicate for a type id; undefined ids are not nullable.
    #[must_use]
    pub fn is_nullable(&self, type_id: Id) -> bool {
        self.find_def(type_id)
            .is_some_and(|ty| self.types.is_nullable(ty))
    }

    /// Renders `id` through the configured [`NameResolver`].
    #[must_use]
    pub fn id_name(&self, id: Id) -> String {
        self.names.id_name(self.module, id)
    }

    /// Builds the error for a rule broken by `at`.
    #[must_use]
    pub fn diag(&self, kind: ErrorKind, at: &Instruction, message: impl Into<String>) -> Error {
        self.diag_with(kind, at, &[], message)
    }

    /// Builds the error for a rule broken by `at`, recording the offending `ids`.
    #[must_use]
    pub fn diag_with(
        &self,
        kind: ErrorKind,
        at: &Instruction,
        ids: &[Id],
        message: impl Into<String>,
    ) -> Error {
        let mut diagnostic = Diagnostic::new(kind, at.position(), at.opcode(), message);
        if let Some(result) = at.result_id() {
            diagnostic = diagnostic.with_ids(&[result]);
        }
        diagnostic.with_ids(ids).into()
    }
}
