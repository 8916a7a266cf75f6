//! # Constant Validation
//!
//! Rules for every constant-defining instruction. The validator is reached for all opcodes of the
//! [`crate::ir::OpFamily::Constant`] family; opcodes without a dedicated rule still go through
//! the narrow-numeric check at the end.
//!
//! ## Rules
//!
//! - **Boolean constants** (`OpConstantTrue`, `OpConstantFalse` and their specialization
//!   counterparts): the result type must be `OpTypeBool`.
//! - **Composite constants** (`OpConstantComposite`, `OpSpecConstantComposite`): the result type
//!   must be a composite type or a shaped tensor, and the constituents (operands `2..`) must fit
//!   its shape:
//!
//!   | Result type | Count | Constituents |
//!   |---|---|---|
//!   | vector, cooperative vector | component count, skipped when unresolved | constant or undef of the component type |
//!   | matrix | column count | constant or undef vectors matching the column type |
//!   | array | length, skipped when not a constant | element type |
//!   | struct | member count | member type at the same position |
//!   | cooperative matrix | exactly one | component type |
//!   | shaped tensor | outermost dimension, skipped when unresolved | by rank, see below |
//!
//!   For tensors of rank 1 every constituent has the element type. For higher ranks every
//!   constituent is a tensor with the same element type, a rank one lower, and a shape equal to
//!   the remaining dimensions. Dimensions that do not evaluate to constants are not compared.
//! - **`OpConstantSampler`**: the result type must be `OpTypeSampler`.
//! - **`OpConstantNull`**: the result type must be nullable, see
//!   [`crate::validation::TypeEquivalence::is_nullable`].
//! - **`OpSpecConstant`**: the result type must be an integer or floating-point type.
//! - **`OpSpecConstantOp`**: the embedded opcode may need `Shader` (`OpQuantizeToF16`), `Kernel`
//!   or the spec-constant `UConvert` feature (`OpUConvert`), or `Kernel` (conversions, bitcasts,
//!   float arithmetic and access chains). Operands of the embedded operation are not checked.
//! - **`OpConstantFunctionPointerINTEL`**: needs `FunctionPointersINTEL`, a result type that
//!   points to a function type, and, once the referenced function is defined, an `OpFunction` of
//!   exactly that function type. Functions defined later in the module are not checked here.
//!
//! Every constant whose result type is not a pointer is finally rejected under `Shader` if its
//! type contains an 8- or 16-bit component the module has no capability for.

use crate::{
    ir::{Capability, Features, Id, Instruction, Op},
    validation::{ErrorKind, InstructionValidator, ValidationContext},
    Result,
};

/// Validator for constant-defining instructions.
pub struct ConstantValidator;

impl ConstantValidator {
    /// Creates a new constant validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate_bool(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let type_id = inst.type_id().unwrap_or_default();
        if !ctx.is_bool_type(type_id) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} is not a boolean type.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_composite(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let type_id = inst.type_id().unwrap_or_default();
        let result_type = ctx
            .find_def(type_id)
            .filter(|ty| ty.is_composite_type() || ty.is_shaped_tensor());
        let Some(result_type) = result_type else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} is not a composite type.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        };

        let composite = Composite {
            ctx,
            inst,
            type_id,
            result_type,
            constituents: inst.operands_from(2),
        };

        match result_type.opcode() {
            Op::TypeVector | Op::TypeCooperativeVectorNV => composite.check_vector(),
            Op::TypeMatrix => composite.check_matrix(),
            Op::TypeArray => composite.check_array(),
            Op::TypeStruct => composite.check_struct(),
            Op::TypeCooperativeMatrixNV | Op::TypeCooperativeMatrixKHR => {
                composite.check_cooperative_matrix()
            }
            Op::TypeTensorARM => composite.check_tensor(),
            _ => Ok(()),
        }
    }

    fn validate_sampler(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let type_id = inst.type_id().unwrap_or_default();
        if ctx.find_def(type_id).map(Instruction::opcode) != Some(Op::TypeSampler) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} must be OpTypeSampler.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_null(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let type_id = inst.type_id().unwrap_or_default();
        if !ctx.is_nullable(type_id) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} cannot have a null value.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_spec_constant(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let type_id = inst.type_id().unwrap_or_default();
        let Some(ty) = ctx.find_def(type_id) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} is not defined.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        };

        if !matches!(ty.opcode(), Op::TypeInt | Op::TypeFloat) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidData,
                inst,
                &[type_id],
                "Specialization constant must be an integer or floating-point number.",
            ));
        }
        Ok(())
    }

    fn validate_spec_constant_op(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let embedded = inst
            .operand(2)
            .and_then(|word| u16::try_from(word).ok())
            .and_then(Op::from_repr);
        let Some(embedded) = embedded else {
            return Ok(());
        };

        match embedded {
            Op::QuantizeToF16 => {
                if !ctx.has_capability(Capability::Shader) {
                    return Err(ctx.diag(
                        ErrorKind::InvalidId,
                        inst,
                        format!(
                            "Specialization constant operation {embedded} requires Shader \
                             capability"
                        ),
                    ));
                }
            }
            Op::UConvert => {
                if !ctx.features().contains(Features::UCONVERT_SPEC_CONSTANT_OP)
                    && !ctx.has_capability(Capability::Kernel)
                {
                    return Err(ctx.diag(
                        ErrorKind::InvalidId,
                        inst,
                        "Prior to SPIR-V 1.4, specialization constant operation UConvert \
                         requires Kernel capability or extension SPV_AMD_gpu_shader_int16",
                    ));
                }
            }
            Op::ConvertFToS
            | Op::ConvertSToF
            | Op::ConvertFToU
            | Op::ConvertUToF
            | Op::ConvertPtrToU
            | Op::ConvertUToPtr
            | Op::GenericCastToPtr
            | Op::PtrCastToGeneric
            | Op::Bitcast
            | Op::FNegate
            | Op::FAdd
            | Op::FSub
            | Op::FMul
            | Op::FDiv
            | Op::FRem
            | Op::FMod
            | Op::AccessChain
            | Op::InBoundsAccessChain
            | Op::PtrAccessChain
            | Op::InBoundsPtrAccessChain => {
                if !ctx.has_capability(Capability::Kernel) {
                    return Err(ctx.diag(
                        ErrorKind::InvalidId,
                        inst,
                        format!(
                            "Specialization constant operation {embedded} requires Kernel \
                             capability"
                        ),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn validate_function_pointer(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        if !ctx.has_capability(Capability::FunctionPointersINTEL) {
            return Err(ctx.diag(
                ErrorKind::InvalidCapability,
                inst,
                format!(
                    "{} requires the FunctionPointersINTEL capability.",
                    inst.opcode()
                ),
            ));
        }

        let type_id = inst.type_id().unwrap_or_default();
        let pointee = ctx.pointee_of(type_id).filter(|&pointee| {
            ctx.find_def(pointee).map(Instruction::opcode) == Some(Op::TypeFunction)
        });
        let Some(pointee) = pointee else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                format!(
                    "{} Result Type {} must be a pointer to a function type.",
                    inst.opcode(),
                    ctx.id_name(type_id)
                ),
            ));
        };

        let function_id = inst.operand(2).unwrap_or_default();
        let Some(function) = ctx.find_def(function_id) else {
            log::debug!(
                "deferring function pointer {} to function {} defined later",
                ctx.id_name(inst.result_id().unwrap_or_default()),
                ctx.id_name(function_id)
            );
            return Ok(());
        };

        if function.opcode() != Op::Function {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                format!(
                    "{} Function {} is not an OpFunction.",
                    inst.opcode(),
                    ctx.id_name(function_id)
                ),
            ));
        }

        if function.operand(3) != Some(pointee) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id, pointee],
                format!(
                    "{} Function {}'s type does not match the pointee {} of Result Type {}.",
                    inst.opcode(),
                    ctx.id_name(function_id),
                    ctx.id_name(pointee),
                    ctx.id_name(type_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_narrow_numeric(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let Some(type_id) = inst.type_id() else {
            return Ok(());
        };

        if ctx.has_capability(Capability::Shader)
            && !ctx.is_pointer_type(type_id)
            && ctx.contains_limited_use_numeric(type_id)
        {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id],
                "Cannot form constants of 8- or 16-bit types",
            ));
        }
        Ok(())
    }
}

impl InstructionValidator for ConstantValidator {
    fn validate(&self, context: &ValidationContext, instruction: &Instruction) -> Result<()> {
        match instruction.opcode() {
            Op::ConstantTrue | Op::ConstantFalse | Op::SpecConstantTrue | Op::SpecConstantFalse => {
                Self::validate_bool(context, instruction)?;
            }
            Op::ConstantComposite | Op::SpecConstantComposite => {
                Self::validate_composite(context, instruction)?;
            }
            Op::ConstantSampler => Self::validate_sampler(context, instruction)?,
            Op::ConstantNull => Self::validate_null(context, instruction)?,
            Op::SpecConstant => Self::validate_spec_constant(context, instruction)?,
            Op::SpecConstantOp => Self::validate_spec_constant_op(context, instruction)?,
            Op::ConstantFunctionPointerINTEL => {
                Self::validate_function_pointer(context, instruction)?;
            }
            _ => {}
        }

        if instruction.opcode().is_constant() {
            Self::validate_narrow_numeric(context, instruction)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConstantValidator"
    }

    fn should_run(&self, context: &ValidationContext) -> bool {
        context.options().enable_constant_validation
    }
}

impl Default for ConstantValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// One composite constant checked against its result type.
struct Composite<'c, 'a> {
    ctx: &'c ValidationContext<'a>,
    inst: &'c Instruction,
    type_id: Id,
    result_type: &'a Instruction,
    constituents: &'c [u32],
}

impl<'c, 'a> Composite<'c, 'a> {
    fn fail(&self, ids: &[Id], message: String) -> Result<()> {
        Err(self
            .ctx
            .diag_with(ErrorKind::InvalidId, self.inst, ids, message))
    }

    fn name(&self, id: Id) -> String {
        self.ctx.id_name(id)
    }

    // Definition of an operand of the result type, or an error naming what is missing.
    fn type_operand(&self, index: usize, what: &str) -> Result<(Id, &'a Instruction)> {
        let id = self.result_type.operand(index).unwrap_or_default();
        match self.ctx.find_def(id) {
            Some(definition) => Ok((id, definition)),
            None => Err(self.ctx.diag_with(
                ErrorKind::InvalidId,
                self.inst,
                &[id],
                format!(
                    "{} {what} {} of Result Type {} is not defined.",
                    self.inst.opcode(),
                    self.name(id),
                    self.name(self.type_id)
                ),
            )),
        }
    }

    // A constituent that is a constant or undef, together with its type id.
    fn constant_constituent(&self, id: Id) -> Result<(&'a Instruction, Id)> {
        let constituent = self
            .ctx
            .find_def(id)
            .filter(|definition| definition.is_constant_or_undef());
        let Some(constituent) = constituent else {
            return Err(self.ctx.diag_with(
                ErrorKind::InvalidId,
                self.inst,
                &[id],
                format!(
                    "{} Constituent {} is not a constant or undef.",
                    self.inst.opcode(),
                    self.name(id)
                ),
            ));
        };

        match constituent.type_id().filter(|&ty| self.ctx.find_def(ty).is_some()) {
            Some(ty) => Ok((constituent, ty)),
            None => Err(self.ctx.diag_with(
                ErrorKind::InvalidId,
                self.inst,
                &[id],
                format!(
                    "{} Constituent {}'s type is not defined.",
                    self.inst.opcode(),
                    self.name(id)
                ),
            )),
        }
    }

    fn count_mismatch(&self, what: &str) -> Result<()> {
        self.fail(
            &[self.type_id],
            format!(
                "{} Constituent count does not match Result Type {}'s {what}.",
                self.inst.opcode(),
                self.name(self.type_id)
            ),
        )
    }

    fn type_mismatch(&self, constituent: Id, what: &str) -> Result<()> {
        self.fail(
            &[constituent, self.type_id],
            format!(
                "{} Constituent {}'s type does not match Result Type {}'s {what}.",
                self.inst.opcode(),
                self.name(constituent),
                self.name(self.type_id)
            ),
        )
    }

    fn check_vector(&self) -> Result<()> {
        let expected = if self.result_type.opcode() == Op::TypeCooperativeVectorNV {
            let count = self.result_type.operand(2).unwrap_or_default();
            let (_, is_const, value) = self.ctx.eval_int32_if_const(count);
            is_const.then_some(value)
        } else {
            self.result_type.operand(2)
        };

        if expected.is_some_and(|expected| expected as usize != self.constituents.len()) {
            return self.count_mismatch("vector component count");
        }

        let (component, _) = self.type_operand(1, "Component type")?;
        for &id in self.constituents {
            let (_, ty) = self.constant_constituent(id)?;
            if ty != component {
                return self.type_mismatch(id, "vector element type");
            }
        }
        Ok(())
    }

    fn check_matrix(&self) -> Result<()> {
        if self.result_type.operand(2) != Some(self.constituents.len() as u32) {
            return self.count_mismatch("matrix column count");
        }

        let (_, column) = self.type_operand(1, "Column type")?;
        let component = column.operand(1).unwrap_or_default();
        if self.ctx.find_def(component).is_none() {
            return self.fail(
                &[component],
                format!(
                    "{} Component type {} of Result Type {} is not defined.",
                    self.inst.opcode(),
                    self.name(component),
                    self.name(self.type_id)
                ),
            );
        }
        let component_count = column.operand(2);

        for &id in self.constituents {
            let (_, ty) = self.constant_constituent(id)?;
            let Some(vector) = self.ctx.find_def(ty) else {
                return self.type_mismatch(id, "matrix column type");
            };

            if vector.opcode() != column.opcode() {
                return self.type_mismatch(id, "matrix column type");
            }
            if vector.operand(1) != Some(component) {
                return self.fail(
                    &[id, self.type_id],
                    format!(
                        "{} Constituent {} component type does not match Result Type {}'s \
                         matrix column component type.",
                        self.inst.opcode(),
                        self.name(id),
                        self.name(self.type_id)
                    ),
                );
            }
            if vector.operand(2) != component_count {
                return self.fail(
                    &[id, self.type_id],
                    format!(
                        "{} Constituent {} vector component count does not match Result Type \
                         {}'s vector component count.",
                        self.inst.opcode(),
                        self.name(id),
                        self.name(self.type_id)
                    ),
                );
            }
        }
        Ok(())
    }

    fn check_array(&self) -> Result<()> {
        let (element, _) = self.type_operand(1, "Element type")?;
        let (length, _) = self.type_operand(2, "Length")?;

        let (is_int32, is_const, value) = self.ctx.eval_int32_if_const(length);
        if is_int32 && is_const && value as usize != self.constituents.len() {
            return self.count_mismatch("array length");
        }

        for &id in self.constituents {
            let (_, ty) = self.constant_constituent(id)?;
            if ty != element {
                return self.type_mismatch(id, "array element type");
            }
        }
        Ok(())
    }

    fn check_struct(&self) -> Result<()> {
        let members = self.result_type.operands_from(1);
        if members.len() != self.constituents.len() {
            return self.count_mismatch("struct member count");
        }

        for (&id, &member) in self.constituents.iter().zip(members) {
            let (_, ty) = self.constant_constituent(id)?;
            if ty != member {
                return self.type_mismatch(id, "member type");
            }
        }
        Ok(())
    }

    fn check_cooperative_matrix(&self) -> Result<()> {
        let (component, _) = self.type_operand(1, "Component type")?;

        let [id] = self.constituents else {
            return self.fail(
                &[self.type_id],
                format!(
                    "{} Expected a single constituent for cooperative matrix Result Type {}, \
                     found {}.",
                    self.inst.opcode(),
                    self.name(self.type_id),
                    self.constituents.len()
                ),
            );
        };

        let (_, ty) = self.constant_constituent(*id)?;
        if ty != component {
            return self.type_mismatch(*id, "component type");
        }
        Ok(())
    }

    fn check_tensor(&self) -> Result<()> {
        let (element, _) = self.type_operand(1, "Element type")?;
        let (rank_id, _) = self.type_operand(2, "Rank")?;
        let (_, shape) = self.type_operand(3, "Shape")?;

        let rank = self.ctx.eval_const_uint64(rank_id).unwrap_or(0);
        let outermost = shape
            .operand(2)
            .and_then(|dimension| self.ctx.eval_const_uint64(dimension));
        if outermost.is_some_and(|outermost| outermost != self.constituents.len() as u64) {
            return self.count_mismatch("outermost shape dimension");
        }

        for (index, &id) in self.constituents.iter().enumerate() {
            let (_, ty) = self.constant_constituent(id)?;
            // an unresolved rank only skips the rank-dependent checks
            if rank == 0 {
                continue;
            }

            if rank == 1 {
                if ty != element {
                    return self.type_mismatch(id, "tensor element type");
                }
                continue;
            }

            let Some(tensor) = self
                .ctx
                .find_def(ty)
                .filter(|tensor| tensor.opcode() == Op::TypeTensorARM)
            else {
                return self.fail(
                    &[id, self.type_id],
                    format!(
                        "{} Constituent {} must be a tensor, as Result Type {} has rank {rank}.",
                        self.inst.opcode(),
                        self.name(id),
                        self.name(self.type_id)
                    ),
                );
            };

            if tensor.operand(1) != Some(element) {
                return self.type_mismatch(id, "tensor element type");
            }

            let constituent_rank = tensor
                .operand(2)
                .and_then(|rank| self.ctx.eval_const_uint64(rank));
            if constituent_rank.is_some_and(|constituent_rank| constituent_rank + 1 != rank) {
                return self.fail(
                    &[id, self.type_id],
                    format!(
                        "{} Constituent {}'s rank must be one less than the rank {rank} of \
                         Result Type {}.",
                        self.inst.opcode(),
                        self.name(id),
                        self.name(self.type_id)
                    ),
                );
            }

            self.check_tensor_shape(index, id, tensor, shape)?;
        }
        Ok(())
    }

    // The constituent's dimensions must equal the result's dimensions after the outermost one.
    fn check_tensor_shape(
        &self,
        index: usize,
        id: Id,
        tensor: &Instruction,
        shape: &Instruction,
    ) -> Result<()> {
        let Some(shape_id) = tensor.operand(3) else {
            return Ok(());
        };
        let Some(constituent_shape) = self.ctx.find_def(shape_id) else {
            return self.fail(
                &[id, shape_id],
                format!(
                    "{} Shape {} of Constituent {index} is not defined.",
                    self.inst.opcode(),
                    self.name(shape_id)
                ),
            );
        };

        let inner = constituent_shape.operands_from(2);
        let outer = shape.operands_from(3);
        for (dimension, (&actual, &expected)) in inner.iter().zip(outer).enumerate() {
            let actual = self.ctx.eval_const_uint64(actual);
            let expected = self.ctx.eval_const_uint64(expected);
            if let (Some(actual), Some(expected)) = (actual, expected) {
                if actual != expected {
                    return self.fail(
                        &[id, self.type_id],
                        format!(
                            "{} Constituent {}'s shape dimension {dimension} is {actual}, but \
                             Result Type {} requires {expected}.",
                            self.inst.opcode(),
                            self.name(id),
                            self.name(self.type_id)
                        ),
                    );
                }
            }
        }
        Ok(())
    }
}
