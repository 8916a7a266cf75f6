//! # Function Validation
//!
//! Rules for the instructions that define, declare parameters of and call functions:
//!
//! - **`OpFunction`**: the declared function type must be an `OpTypeFunction` whose return type
//!   is the function's result type, and the function's id may only be referenced by instructions
//!   that legitimately name a function (entry points, calls, decorations, names, kernel queries,
//!   cooperative matrix callbacks and, with `FunctionPointersINTEL`, function pointer constants).
//!   References from debug-info and non-semantic extended instructions are always accepted.
//! - **`OpFunctionParameter`**: must follow an `OpFunction`, must not outnumber the parameters of
//!   its function type, and must have the type of the matching parameter slot.
//! - **`OpFunctionCall`**: the callee must be a function whose return type and parameter list
//!   match the call. Pointer arguments are additionally checked against the logical addressing
//!   restrictions unless they are relaxed by the configuration.
//! - **`OpCooperativeMatrixPerElementOpNV`**: the callback's signature must accept a row, a
//!   column and an element of the cooperative matrix and return the element type.

use crate::{
    ir::{AddressingModel, Capability, Features, Id, Instruction, Op, ParameterSlot, StorageClass},
    validation::{ErrorKind, InstructionValidator, ValidationContext},
    Result,
};

/// Validator for function definitions, parameters and calls.
pub struct FunctionValidator;

impl FunctionValidator {
    /// Creates a new function validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn validate_function(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let function_id = inst.result_id().unwrap_or_default();
        let type_id = inst.type_id().unwrap_or_default();
        let function_type_id = inst.operand(3).unwrap_or_default();

        let Some(function_type) = ctx.function_type_of(inst) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_type_id],
                format!(
                    "OpFunction Function Type {} is not a function type.",
                    ctx.id_name(function_type_id)
                ),
            ));
        };

        let return_type = function_type.operand(1).unwrap_or_default();
        if return_type != type_id {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id, function_type_id],
                format!(
                    "OpFunction Result Type {} does not match the Function Type's return type {}.",
                    ctx.id_name(type_id),
                    ctx.id_name(return_type)
                ),
            ));
        }

        for usage in inst.uses() {
            let Some(user) = ctx.module().instruction(usage.user) else {
                continue;
            };
            if !Self::is_valid_function_use(ctx, user) {
                return Err(ctx.diag_with(
                    ErrorKind::InvalidId,
                    user,
                    &[function_id],
                    format!(
                        "Invalid use of function result id {}.",
                        ctx.id_name(function_id)
                    ),
                ));
            }
        }
        Ok(())
    }

    // Instructions allowed to reference a function id.
    fn is_valid_function_use(ctx: &ValidationContext, user: &Instruction) -> bool {
        match user.opcode() {
            Op::GroupDecorate
            | Op::Decorate
            | Op::EnqueueKernel
            | Op::EntryPoint
            | Op::ExecutionMode
            | Op::ExecutionModeId
            | Op::FunctionCall
            | Op::GetKernelNDrangeSubGroupCount
            | Op::GetKernelNDrangeMaxSubGroupSize
            | Op::GetKernelWorkGroupSize
            | Op::GetKernelPreferredWorkGroupSizeMultiple
            | Op::GetKernelLocalSizeForSubgroupCount
            | Op::GetKernelMaxNumSubgroups
            | Op::Name
            | Op::CooperativeMatrixPerElementOpNV
            | Op::CooperativeMatrixReduceNV
            | Op::CooperativeMatrixLoadTensorNV => true,
            Op::ConstantFunctionPointerINTEL => {
                ctx.has_capability(Capability::FunctionPointersINTEL)
            }
            _ => user.is_debug_info() || user.is_non_semantic(),
        }
    }

    fn validate_function_parameter(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let (function_position, index) = match ctx.parameter_slot(inst.position()) {
            Some(ParameterSlot::InFunction { function, index }) => (function, index),
            Some(ParameterSlot::FirstInstruction) => {
                return Err(ctx.diag(
                    ErrorKind::InvalidLayout,
                    inst,
                    "Function parameter cannot be the first instruction.",
                ));
            }
            Some(ParameterSlot::NoEnclosingFunction) | None => {
                return Err(ctx.diag(
                    ErrorKind::InvalidLayout,
                    inst,
                    "Function parameter must be preceded by a function.",
                ));
            }
        };

        let function = ctx.module().instruction(function_position);
        let Some(function_type) = function.and_then(|function| ctx.function_type_of(function))
        else {
            return Err(ctx.diag(
                ErrorKind::InvalidId,
                inst,
                "Missing function type definition.",
            ));
        };

        let function_id = function
            .and_then(Instruction::result_id)
            .unwrap_or_default();
        let parameters = function_type.operands_from(2);
        let Some(&expected) = parameters.get(index) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                format!(
                    "Too many OpFunctionParameters for {}: expected {} based on the function's \
                     type",
                    ctx.id_name(function_id),
                    parameters.len()
                ),
            ));
        };

        let type_id = inst.type_id().unwrap_or_default();
        if type_id != expected {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id, expected],
                format!(
                    "OpFunctionParameter Result Type {} does not match the OpTypeFunction \
                     parameter type of the same index.",
                    ctx.id_name(type_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_function_call(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let callee_id = inst.operand(2).unwrap_or_default();
        let Some(callee) = ctx
            .find_def(callee_id)
            .filter(|callee| callee.opcode() == Op::Function)
        else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[callee_id],
                format!(
                    "OpFunctionCall Function {} is not a function.",
                    ctx.id_name(callee_id)
                ),
            ));
        };

        let type_id = inst.type_id().unwrap_or_default();
        let return_type = callee.type_id().unwrap_or_default();
        if ctx.find_def(return_type).is_none() || return_type != type_id {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[type_id, callee_id],
                format!(
                    "OpFunctionCall Result Type {}'s type does not match Function {}'s return \
                     type.",
                    ctx.id_name(type_id),
                    ctx.id_name(callee_id)
                ),
            ));
        }

        let Some(function_type) = ctx.function_type_of(callee) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[callee_id],
                "Missing function type definition.",
            ));
        };

        let parameters = function_type.operands_from(2);
        let arguments = inst.operands_from(3);
        if arguments.len() != parameters.len() {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[callee_id],
                format!(
                    "OpFunctionCall Function {}'s parameter count does not match the argument \
                     count.",
                    ctx.id_name(callee_id)
                ),
            ));
        }

        for (&argument_id, &parameter_type) in arguments.iter().zip(parameters) {
            Self::validate_argument(ctx, inst, callee_id, argument_id, parameter_type)?;
        }
        Ok(())
    }

    fn validate_argument(
        ctx: &ValidationContext,
        inst: &Instruction,
        callee_id: Id,
        argument_id: Id,
        parameter_type: Id,
    ) -> Result<()> {
        let options = ctx.options();
        let Some(argument) = ctx.find_def(argument_id) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[argument_id],
                format!("Missing argument {} definition.", ctx.id_name(argument_id)),
            ));
        };
        let Some(argument_type) = ctx.type_def(argument) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[argument_id],
                format!(
                    "Missing argument {} type definition.",
                    ctx.id_name(argument_id)
                ),
            ));
        };

        let argument_type_id = argument.type_id().unwrap_or_default();
        let matches = argument_type_id == parameter_type
            || (options.before_hlsl_legalization
                && ctx.find_def(parameter_type).is_some_and(|parameter| {
                    ctx.types()
                        .pointees_logically_match(argument_type, parameter)
                }));
        if !matches {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[argument_id, callee_id],
                format!(
                    "OpFunctionCall Argument {}'s type does not match Function {}'s parameter \
                     type.",
                    ctx.id_name(argument_id),
                    ctx.id_name(callee_id)
                ),
            ));
        }

        if ctx.addressing_model() == AddressingModel::Logical
            && !options.relax_logical_pointer
            && ctx.is_pointer_type(parameter_type)
        {
            Self::validate_logical_pointer_argument(ctx, inst, argument, parameter_type)?;
        }
        Ok(())
    }

    fn validate_logical_pointer_argument(
        ctx: &ValidationContext,
        inst: &Instruction,
        argument: &Instruction,
        parameter_type: Id,
    ) -> Result<()> {
        let argument_id = argument.result_id().unwrap_or_default();
        let storage = ctx.storage_class_of(parameter_type);

        match storage {
            Some(
                StorageClass::UniformConstant
                | StorageClass::Function
                | StorageClass::Private
                | StorageClass::Workgroup
                | StorageClass::AtomicCounter,
            ) => {}
            Some(StorageClass::StorageBuffer) => {
                if !ctx.features().contains(Features::VARIABLE_POINTERS) {
                    return Err(ctx.diag_with(
                        ErrorKind::InvalidId,
                        inst,
                        &[argument_id],
                        format!(
                            "StorageBuffer pointer operand {} requires a variable pointers \
                             capability",
                            ctx.id_name(argument_id)
                        ),
                    ));
                }
            }
            _ => {
                return Err(ctx.diag_with(
                    ErrorKind::InvalidId,
                    inst,
                    &[argument_id],
                    format!(
                        "Invalid storage class for pointer operand {}",
                        ctx.id_name(argument_id)
                    ),
                ));
            }
        }

        let is_declaration = matches!(
            argument.opcode(),
            Op::Variable | Op::UntypedVariableKHR | Op::FunctionParameter
        );
        if is_declaration || ctx.options().before_hlsl_legalization {
            return Ok(());
        }

        let allowed = match storage {
            Some(StorageClass::StorageBuffer) => {
                ctx.has_capability(Capability::VariablePointersStorageBuffer)
            }
            Some(StorageClass::Workgroup) => ctx.has_capability(Capability::VariablePointers),
            Some(StorageClass::UniformConstant) => true,
            _ => false,
        };
        if !allowed {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[argument_id],
                format!(
                    "Pointer operand {} must be a memory object declaration",
                    ctx.id_name(argument_id)
                ),
            ));
        }
        Ok(())
    }

    fn validate_per_element_op(ctx: &ValidationContext, inst: &Instruction) -> Result<()> {
        let function_id = inst.operand(3).unwrap_or_default();
        let Some(function) = ctx
            .find_def(function_id)
            .filter(|function| function.opcode() == Op::Function)
        else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Function {} is not a function.",
                    ctx.id_name(function_id)
                ),
            ));
        };

        let matrix_id = inst.operand(2).unwrap_or_default();
        let Some(matrix) = ctx.find_def(matrix_id) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[matrix_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Matrix {} is not defined.",
                    ctx.id_name(matrix_id)
                ),
            ));
        };

        let matrix_type_id = matrix.type_id().unwrap_or_default();
        let result_type_id = inst.type_id().unwrap_or_default();
        let matrix_type = ctx
            .find_def(matrix_type_id)
            .filter(|_| ctx.is_cooperative_matrix_khr_type(matrix_type_id));
        let Some(matrix_type) = matrix_type else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[matrix_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Matrix {} must be a cooperative matrix.",
                    ctx.id_name(matrix_id)
                ),
            ));
        };

        if matrix_type_id != result_type_id {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[result_type_id, matrix_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Result Type {} must match the type of \
                     Matrix {}.",
                    ctx.id_name(result_type_id),
                    ctx.id_name(matrix_id)
                ),
            ));
        }

        let component = matrix_type.operand(1).unwrap_or_default();
        let Some(function_type) = ctx.function_type_of(function) else {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                "Missing function type definition.",
            ));
        };

        if function_type.operand(1) != Some(component) {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Function {}'s return type must match \
                     the matrix component type.",
                    ctx.id_name(function_id)
                ),
            ));
        }

        let parameters = function_type.operands_from(2);
        let valid_signature = parameters.len() >= 3
            && parameters[..2]
                .iter()
                .all(|&index| ctx.is_int_scalar(index) && ctx.bit_width(index) == 32)
            && parameters[2] == component;
        if !valid_signature {
            return Err(ctx.diag_with(
                ErrorKind::InvalidId,
                inst,
                &[function_id],
                format!(
                    "OpCooperativeMatrixPerElementOpNV Function {} must take a 32-bit integer \
                     row, a 32-bit integer column and the matrix component type.",
                    ctx.id_name(function_id)
                ),
            ));
        }
        Ok(())
    }
}

impl InstructionValidator for FunctionValidator {
    fn validate(&self, context: &ValidationContext, instruction: &Instruction) -> Result<()> {
        match instruction.opcode() {
            Op::Function => Self::validate_function(context, instruction),
            Op::FunctionParameter => Self::validate_function_parameter(context, instruction),
            Op::FunctionCall => Self::validate_function_call(context, instruction),
            Op::CooperativeMatrixPerElementOpNV => {
                Self::validate_per_element_op(context, instruction)
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "FunctionValidator"
    }

    fn should_run(&self, context: &ValidationContext) -> bool {
        context.options().enable_function_validation
    }
}

impl Default for FunctionValidator {
    fn default() -> Self {
        Self::new()
    }
}
