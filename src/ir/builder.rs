//! Incremental construction of modules.
//!
//! [`ModuleBuilder`] appends instructions in order and hands out fresh result ids. Typed helpers
//! cover the instructions the validators care about; anything else can be appended verbatim with
//! [`ModuleBuilder::push`]. Building never consumes the builder, so a test can build a module,
//! append one more instruction and build again.
//!
//! # Examples
//!
//! ```rust
//! use spvscope::{ir::ModuleBuilder, ValidationConfig};
//!
//! let mut builder = ModuleBuilder::new();
//! let uint = builder.type_int(32, false);
//! let vec3 = builder.type_vector(uint, 3);
//! let one = builder.constant(uint, 1);
//! let two = builder.constant(uint, 2);
//! builder.constant_composite(vec3, &[one, two]);
//!
//! let module = builder.build()?;
//! let error = module.validate(ValidationConfig::default()).unwrap_err();
//! assert!(error.to_string().contains("component count"));
//! # Ok::<(), spvscope::Error>(())
//! ```

use crate::{
    ir::{
        opcode::encode_literal_string, AddressingModel, Capability, Id, Instruction, MemoryModel,
        Module, Op, StorageClass, Version,
    },
    Result,
};

/// Appends instructions in module order and allocates result ids.
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    version: Version,
    addressing_model: AddressingModel,
    instructions: Vec<Instruction>,
    next_id: Id,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    /// Creates an empty builder for a version 1.6 module with logical addressing.
    #[must_use]
    pub fn new() -> Self {
        ModuleBuilder {
            version: Version::default(),
            addressing_model: AddressingModel::Logical,
            instructions: Vec::new(),
            next_id: 1,
        }
    }

    /// Sets the header version.
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    /// Sets the addressing model used when no `OpMemoryModel` is appended.
    pub fn addressing_model(&mut self, model: AddressingModel) -> &mut Self {
        self.addressing_model = model;
        self
    }

    /// Reserves a fresh id without defining it.
    pub fn fresh_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of instructions appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Appends an instruction verbatim. `words` holds every operand word, result type and result
    /// id included.
    pub fn push(&mut self, op: Op, words: Vec<u32>) -> &mut Self {
        if let Some(id) = op.result_id_index().and_then(|index| words.get(index)) {
            self.next_id = self.next_id.max(id.saturating_add(1));
        }
        self.instructions.push(Instruction::new(op, words));
        self
    }

    // Appends `op` with a fresh result id placed after `ty` (if any) and returns the id.
    fn define(&mut self, op: Op, ty: Option<Id>, operands: &[u32]) -> Id {
        let id = self.fresh_id();
        let mut words = Vec::with_capacity(operands.len() + 2);
        words.extend(ty);
        words.push(id);
        words.extend_from_slice(operands);
        self.instructions.push(Instruction::new(op, words));
        id
    }

    /// Builds an immutable module from the instructions appended so far.
    ///
    /// # Errors
    ///
    /// Returns the construction errors of [`Module::new`].
    pub fn build(&self) -> Result<Module> {
        Module::with_addressing_model(
            self.version,
            self.addressing_model,
            self.instructions.clone(),
        )
    }

    /// `OpCapability`
    pub fn capability(&mut self, capability: Capability) -> &mut Self {
        self.push(Op::Capability, vec![capability as u32])
    }

    /// `OpExtension`
    pub fn extension(&mut self, name: &str) -> &mut Self {
        self.push(Op::Extension, encode_literal_string(name))
    }

    /// `OpExtInstImport`, returning the set id.
    pub fn ext_inst_import(&mut self, name: &str) -> Id {
        self.define(Op::ExtInstImport, None, &encode_literal_string(name))
    }

    /// `OpExtInst` of `set`, returning the result id.
    pub fn ext_inst(&mut self, ty: Id, set: Id, instruction: u32, operands: &[Id]) -> Id {
        let mut words = vec![set, instruction];
        words.extend_from_slice(operands);
        self.define(Op::ExtInst, Some(ty), &words)
    }

    /// `OpMemoryModel`
    pub fn memory_model(&mut self, addressing: AddressingModel, memory: MemoryModel) -> &mut Self {
        self.push(Op::MemoryModel, vec![addressing as u32, memory as u32])
    }

    /// `OpEntryPoint`
    pub fn entry_point(
        &mut self,
        execution_model: u32,
        function: Id,
        name: &str,
        interface: &[Id],
    ) -> &mut Self {
        let mut words = vec![execution_model, function];
        words.extend(encode_literal_string(name));
        words.extend_from_slice(interface);
        self.push(Op::EntryPoint, words)
    }

    /// `OpName`
    pub fn name(&mut self, target: Id, name: &str) -> &mut Self {
        let mut words = vec![target];
        words.extend(encode_literal_string(name));
        self.push(Op::Name, words)
    }

    /// `OpDecorate`
    pub fn decorate(&mut self, target: Id, decoration: u32, literals: &[u32]) -> &mut Self {
        let mut words = vec![target, decoration];
        words.extend_from_slice(literals);
        self.push(Op::Decorate, words)
    }

    /// `OpMemberDecorate`
    pub fn member_decorate(
        &mut self,
        target: Id,
        member: u32,
        decoration: u32,
        literals: &[u32],
    ) -> &mut Self {
        let mut words = vec![target, member, decoration];
        words.extend_from_slice(literals);
        self.push(Op::MemberDecorate, words)
    }

    /// `OpTypeVoid`
    pub fn type_void(&mut self) -> Id {
        self.define(Op::TypeVoid, None, &[])
    }

    /// `OpTypeBool`
    pub fn type_bool(&mut self) -> Id {
        self.define(Op::TypeBool, None, &[])
    }

    /// `OpTypeInt`
    pub fn type_int(&mut self, width: u32, signed: bool) -> Id {
        self.define(Op::TypeInt, None, &[width, u32::from(signed)])
    }

    /// `OpTypeFloat`
    pub fn type_float(&mut self, width: u32) -> Id {
        self.define(Op::TypeFloat, None, &[width])
    }

    /// `OpTypeVector`
    pub fn type_vector(&mut self, component: Id, count: u32) -> Id {
        self.define(Op::TypeVector, None, &[component, count])
    }

    /// `OpTypeMatrix`
    pub fn type_matrix(&mut self, column: Id, columns: u32) -> Id {
        self.define(Op::TypeMatrix, None, &[column, columns])
    }

    /// `OpTypeArray`; `length` is the id of a constant.
    pub fn type_array(&mut self, element: Id, length: Id) -> Id {
        self.define(Op::TypeArray, None, &[element, length])
    }

    /// `OpTypeRuntimeArray`
    pub fn type_runtime_array(&mut self, element: Id) -> Id {
        self.define(Op::TypeRuntimeArray, None, &[element])
    }

    /// `OpTypeStruct`
    pub fn type_struct(&mut self, members: &[Id]) -> Id {
        self.define(Op::TypeStruct, None, members)
    }

    /// `OpTypePointer`
    pub fn type_pointer(&mut self, storage: StorageClass, pointee: Id) -> Id {
        self.define(Op::TypePointer, None, &[storage as u32, pointee])
    }

    /// `OpTypeUntypedPointerKHR`
    pub fn type_untyped_pointer(&mut self, storage: StorageClass) -> Id {
        self.define(Op::TypeUntypedPointerKHR, None, &[storage as u32])
    }

    /// `OpTypeFunction`
    pub fn type_function(&mut self, return_type: Id, parameters: &[Id]) -> Id {
        let mut words = vec![return_type];
        words.extend_from_slice(parameters);
        self.define(Op::TypeFunction, None, &words)
    }

    /// `OpTypeSampler`
    pub fn type_sampler(&mut self) -> Id {
        self.define(Op::TypeSampler, None, &[])
    }

    /// `OpTypeEvent`
    pub fn type_event(&mut self) -> Id {
        self.define(Op::TypeEvent, None, &[])
    }

    /// `OpTypeQueue`
    pub fn type_queue(&mut self) -> Id {
        self.define(Op::TypeQueue, None, &[])
    }

    /// `OpTypeOpaque`
    pub fn type_opaque(&mut self, name: &str) -> Id {
        self.define(Op::TypeOpaque, None, &encode_literal_string(name))
    }

    /// `OpTypeCooperativeMatrixKHR`; scope, rows, columns and use are constant ids.
    pub fn type_cooperative_matrix_khr(
        &mut self,
        component: Id,
        scope: Id,
        rows: Id,
        columns: Id,
        usage: Id,
    ) -> Id {
        self.define(
            Op::TypeCooperativeMatrixKHR,
            None,
            &[component, scope, rows, columns, usage],
        )
    }

    /// `OpTypeCooperativeMatrixNV`; scope, rows and columns are constant ids.
    pub fn type_cooperative_matrix_nv(
        &mut self,
        component: Id,
        scope: Id,
        rows: Id,
        columns: Id,
    ) -> Id {
        self.define(
            Op::TypeCooperativeMatrixNV,
            None,
            &[component, scope, rows, columns],
        )
    }

    /// `OpTypeCooperativeVectorNV`; `count` is a constant id.
    pub fn type_cooperative_vector_nv(&mut self, component: Id, count: Id) -> Id {
        self.define(Op::TypeCooperativeVectorNV, None, &[component, count])
    }

    /// `OpTypeTensorARM`; a tensor is shaped only when both `rank` and `shape` are given.
    pub fn type_tensor(&mut self, element: Id, rank: Option<Id>, shape: Option<Id>) -> Id {
        let mut words = vec![element];
        words.extend(rank);
        words.extend(rank.and(shape));
        self.define(Op::TypeTensorARM, None, &words)
    }

    /// `OpConstant` with a single value word.
    pub fn constant(&mut self, ty: Id, value: u32) -> Id {
        self.define(Op::Constant, Some(ty), &[value])
    }

    /// `OpConstant` with a two-word value, low word first.
    pub fn constant_wide(&mut self, ty: Id, value: u64) -> Id {
        let low = (value & 0xffff_ffff) as u32;
        let high = (value >> 32) as u32;
        self.define(Op::Constant, Some(ty), &[low, high])
    }

    /// `OpConstantTrue`
    pub fn constant_true(&mut self, ty: Id) -> Id {
        self.define(Op::ConstantTrue, Some(ty), &[])
    }

    /// `OpConstantFalse`
    pub fn constant_false(&mut self, ty: Id) -> Id {
        self.define(Op::ConstantFalse, Some(ty), &[])
    }

    /// `OpConstantNull`
    pub fn constant_null(&mut self, ty: Id) -> Id {
        self.define(Op::ConstantNull, Some(ty), &[])
    }

    /// `OpConstantComposite`
    pub fn constant_composite(&mut self, ty: Id, constituents: &[Id]) -> Id {
        self.define(Op::ConstantComposite, Some(ty), constituents)
    }

    /// `OpConstantSampler`
    pub fn constant_sampler(
        &mut self,
        ty: Id,
        addressing_mode: u32,
        normalized: bool,
        filter_mode: u32,
    ) -> Id {
        self.define(
            Op::ConstantSampler,
            Some(ty),
            &[addressing_mode, u32::from(normalized), filter_mode],
        )
    }

    /// `OpSpecConstantTrue`
    pub fn spec_constant_true(&mut self, ty: Id) -> Id {
        self.define(Op::SpecConstantTrue, Some(ty), &[])
    }

    /// `OpSpecConstant` with a single default value word.
    pub fn spec_constant(&mut self, ty: Id, value: u32) -> Id {
        self.define(Op::SpecConstant, Some(ty), &[value])
    }

    /// `OpSpecConstantComposite`
    pub fn spec_constant_composite(&mut self, ty: Id, constituents: &[Id]) -> Id {
        self.define(Op::SpecConstantComposite, Some(ty), constituents)
    }

    /// `OpSpecConstantOp` embedding `opcode`.
    pub fn spec_constant_op(&mut self, ty: Id, opcode: Op, operands: &[Id]) -> Id {
        let mut words = vec![u32::from(opcode.value())];
        words.extend_from_slice(operands);
        self.define(Op::SpecConstantOp, Some(ty), &words)
    }

    /// `OpConstantFunctionPointerINTEL`
    pub fn constant_function_pointer(&mut self, ty: Id, function: Id) -> Id {
        self.define(Op::ConstantFunctionPointerINTEL, Some(ty), &[function])
    }

    /// `OpUndef`
    pub fn undef(&mut self, ty: Id) -> Id {
        self.define(Op::Undef, Some(ty), &[])
    }

    /// `OpVariable`
    pub fn variable(&mut self, pointer_type: Id, storage: StorageClass) -> Id {
        self.define(Op::Variable, Some(pointer_type), &[storage as u32])
    }

    /// `OpUntypedVariableKHR`
    pub fn untyped_variable(&mut self, pointer_type: Id, storage: StorageClass) -> Id {
        self.define(Op::UntypedVariableKHR, Some(pointer_type), &[storage as u32])
    }

    /// `OpFunction` with no function control bits.
    pub fn function(&mut self, return_type: Id, function_type: Id) -> Id {
        self.define(Op::Function, Some(return_type), &[0, function_type])
    }

    /// `OpFunctionParameter`
    pub fn function_parameter(&mut self, ty: Id) -> Id {
        self.define(Op::FunctionParameter, Some(ty), &[])
    }

    /// `OpLabel`
    pub fn label(&mut self) -> Id {
        self.define(Op::Label, None, &[])
    }

    /// `OpReturn`
    pub fn ret(&mut self) -> &mut Self {
        self.push(Op::Return, Vec::new())
    }

    /// `OpFunctionEnd`
    pub fn function_end(&mut self) -> &mut Self {
        self.push(Op::FunctionEnd, Vec::new())
    }

    /// `OpFunctionCall`
    pub fn function_call(&mut self, return_type: Id, callee: Id, arguments: &[Id]) -> Id {
        let mut words = vec![callee];
        words.extend_from_slice(arguments);
        self.define(Op::FunctionCall, Some(return_type), &words)
    }

    /// `OpLoad`
    pub fn load(&mut self, ty: Id, pointer: Id) -> Id {
        self.define(Op::Load, Some(ty), &[pointer])
    }

    /// `OpCopyObject`
    pub fn copy_object(&mut self, ty: Id, operand: Id) -> Id {
        self.define(Op::CopyObject, Some(ty), &[operand])
    }

    /// `OpCooperativeMatrixPerElementOpNV`
    pub fn cooperative_matrix_per_element_op(
        &mut self,
        result_type: Id,
        matrix: Id,
        function: Id,
        extra: &[Id],
    ) -> Id {
        let mut words = vec![matrix, function];
        words.extend_from_slice(extra);
        self.define(Op::CooperativeMatrixPerElementOpNV, Some(result_type), &words)
    }
}
