//! Opcode table and per-opcode classification.
//!
//! [`Op`] enumerates every instruction the validator understands, using the numeric values of the
//! binary encoding so that an external decoder can map raw opcode words with [`Op::from_repr`].
//! The classification methods on [`Op`] are the single source of truth for questions such as
//! "does this opcode produce a result id", "is this a constant", or "which of its operand words
//! are id references", which the module construction pass and the validators rely on.
//!
//! # Operand indexing
//!
//! Operand indices used throughout this crate count the words after the opcode word. For an
//! instruction that has both a result type and a result id, operand `0` is the result type and
//! operand `1` is the result id; for instructions with only a result id (types, labels), operand
//! `0` is the result id.
//!
//! # Examples
//!
//! ```rust
//! use spvscope::ir::{Op, OpFamily};
//!
//! assert_eq!(Op::from_repr(57), Some(Op::FunctionCall));
//! assert_eq!(Op::FunctionCall.to_string(), "OpFunctionCall");
//! assert_eq!(Op::SpecConstantComposite.family(), OpFamily::Constant);
//! assert!(Op::TypeStruct.is_composite_type());
//! ```

use std::fmt;

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

/// Instruction opcodes, numbered as in the binary encoding.
#[allow(missing_docs)]
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount, FromRepr, IntoStaticStr,
)]
#[repr(u16)]
pub enum Op {
    Nop = 0,
    Undef = 1,
    SourceContinued = 2,
    Source = 3,
    SourceExtension = 4,
    Name = 5,
    MemberName = 6,
    String = 7,
    Line = 8,
    Extension = 10,
    ExtInstImport = 11,
    ExtInst = 12,
    MemoryModel = 14,
    EntryPoint = 15,
    ExecutionMode = 16,
    Capability = 17,
    TypeVoid = 19,
    TypeBool = 20,
    TypeInt = 21,
    TypeFloat = 22,
    TypeVector = 23,
    TypeMatrix = 24,
    TypeImage = 25,
    TypeSampler = 26,
    TypeSampledImage = 27,
    TypeArray = 28,
    TypeRuntimeArray = 29,
    TypeStruct = 30,
    TypeOpaque = 31,
    TypePointer = 32,
    TypeFunction = 33,
    TypeEvent = 34,
    TypeDeviceEvent = 35,
    TypeReserveId = 36,
    TypeQueue = 37,
    TypePipe = 38,
    TypeForwardPointer = 39,
    ConstantTrue = 41,
    ConstantFalse = 42,
    Constant = 43,
    ConstantComposite = 44,
    ConstantSampler = 45,
    ConstantNull = 46,
    SpecConstantTrue = 48,
    SpecConstantFalse = 49,
    SpecConstant = 50,
    SpecConstantComposite = 51,
    SpecConstantOp = 52,
    Function = 54,
    FunctionParameter = 55,
    FunctionEnd = 56,
    FunctionCall = 57,
    Variable = 59,
    ImageTexelPointer = 60,
    Load = 61,
    Store = 62,
    CopyMemory = 63,
    CopyMemorySized = 64,
    AccessChain = 65,
    InBoundsAccessChain = 66,
    PtrAccessChain = 67,
    ArrayLength = 68,
    GenericPtrMemSemantics = 69,
    InBoundsPtrAccessChain = 70,
    Decorate = 71,
    MemberDecorate = 72,
    DecorationGroup = 73,
    GroupDecorate = 74,
    GroupMemberDecorate = 75,
    VectorExtractDynamic = 77,
    VectorInsertDynamic = 78,
    VectorShuffle = 79,
    CompositeConstruct = 80,
    CompositeExtract = 81,
    CompositeInsert = 82,
    CopyObject = 83,
    Transpose = 84,
    SampledImage = 86,
    ImageSampleImplicitLod = 87,
    ImageSampleExplicitLod = 88,
    ImageSampleDrefImplicitLod = 89,
    ImageSampleDrefExplicitLod = 90,
    ImageSampleProjImplicitLod = 91,
    ImageSampleProjExplicitLod = 92,
    ImageSampleProjDrefImplicitLod = 93,
    ImageSampleProjDrefExplicitLod = 94,
    ImageFetch = 95,
    ImageGather = 96,
    ImageDrefGather = 97,
    ImageRead = 98,
    ImageWrite = 99,
    Image = 100,
    ImageQueryFormat = 101,
    ImageQueryOrder = 102,
    ImageQuerySizeLod = 103,
    ImageQuerySize = 104,
    ImageQueryLod = 105,
    ImageQueryLevels = 106,
    ImageQuerySamples = 107,
    ConvertFToU = 109,
    ConvertFToS = 110,
    ConvertSToF = 111,
    ConvertUToF = 112,
    UConvert = 113,
    SConvert = 114,
    FConvert = 115,
    QuantizeToF16 = 116,
    ConvertPtrToU = 117,
    SatConvertSToU = 118,
    SatConvertUToS = 119,
    ConvertUToPtr = 120,
    PtrCastToGeneric = 121,
    GenericCastToPtr = 122,
    GenericCastToPtrExplicit = 123,
    Bitcast = 124,
    SNegate = 126,
    FNegate = 127,
    IAdd = 128,
    FAdd = 129,
    ISub = 130,
    FSub = 131,
    IMul = 132,
    FMul = 133,
    UDiv = 134,
    SDiv = 135,
    FDiv = 136,
    UMod = 137,
    SRem = 138,
    SMod = 139,
    FRem = 140,
    FMod = 141,
    VectorTimesScalar = 142,
    MatrixTimesScalar = 143,
    VectorTimesMatrix = 144,
    MatrixTimesVector = 145,
    MatrixTimesMatrix = 146,
    OuterProduct = 147,
    Dot = 148,
    IAddCarry = 149,
    ISubBorrow = 150,
    UMulExtended = 151,
    SMulExtended = 152,
    Any = 154,
    All = 155,
    IsNan = 156,
    IsInf = 157,
    IsFinite = 158,
    IsNormal = 159,
    SignBitSet = 160,
    LessOrGreater = 161,
    Ordered = 162,
    Unordered = 163,
    LogicalEqual = 164,
    LogicalNotEqual = 165,
    LogicalOr = 166,
    LogicalAnd = 167,
    LogicalNot = 168,
    Select = 169,
    IEqual = 170,
    INotEqual = 171,
    UGreaterThan = 172,
    SGreaterThan = 173,
    UGreaterThanEqual = 174,
    SGreaterThanEqual = 175,
    ULessThan = 176,
    SLessThan = 177,
    ULessThanEqual = 178,
    SLessThanEqual = 179,
    FOrdEqual = 180,
    FUnordEqual = 181,
    FOrdNotEqual = 182,
    FUnordNotEqual = 183,
    FOrdLessThan = 184,
    FUnordLessThan = 185,
    FOrdGreaterThan = 186,
    FUnordGreaterThan = 187,
    FOrdLessThanEqual = 188,
    FUnordLessThanEqual = 189,
    FOrdGreaterThanEqual = 190,
    FUnordGreaterThanEqual = 191,
    ShiftRightLogical = 194,
    ShiftRightArithmetic = 195,
    ShiftLeftLogical = 196,
    BitwiseOr = 197,
    BitwiseXor = 198,
    BitwiseAnd = 199,
    Not = 200,
    BitFieldInsert = 201,
    BitFieldSExtract = 202,
    BitFieldUExtract = 203,
    BitReverse = 204,
    BitCount = 205,
    DPdx = 207,
    DPdy = 208,
    Fwidth = 209,
    DPdxFine = 210,
    DPdyFine = 211,
    FwidthFine = 212,
    DPdxCoarse = 213,
    DPdyCoarse = 214,
    FwidthCoarse = 215,
    EmitVertex = 218,
    EndPrimitive = 219,
    EmitStreamVertex = 220,
    EndStreamPrimitive = 221,
    ControlBarrier = 224,
    MemoryBarrier = 225,
    AtomicLoad = 227,
    AtomicStore = 228,
    AtomicExchange = 229,
    AtomicCompareExchange = 230,
    AtomicCompareExchangeWeak = 231,
    AtomicIIncrement = 232,
    AtomicIDecrement = 233,
    AtomicIAdd = 234,
    AtomicISub = 235,
    AtomicSMin = 236,
    AtomicUMin = 237,
    AtomicSMax = 238,
    AtomicUMax = 239,
    AtomicAnd = 240,
    AtomicOr = 241,
    AtomicXor = 242,
    Phi = 245,
    LoopMerge = 246,
    SelectionMerge = 247,
    Label = 248,
    Branch = 249,
    BranchConditional = 250,
    Switch = 251,
    Kill = 252,
    Return = 253,
    ReturnValue = 254,
    Unreachable = 255,
    LifetimeStart = 256,
    LifetimeStop = 257,
    EnqueueKernel = 292,
    GetKernelNDrangeSubGroupCount = 293,
    GetKernelNDrangeMaxSubGroupSize = 294,
    GetKernelWorkGroupSize = 295,
    GetKernelPreferredWorkGroupSizeMultiple = 296,
    NoLine = 317,
    SizeOf = 321,
    GetKernelLocalSizeForSubgroupCount = 325,
    GetKernelMaxNumSubgroups = 326,
    ModuleProcessed = 330,
    ExecutionModeId = 331,
    DecorateId = 332,
    CopyLogical = 400,
    PtrEqual = 401,
    PtrNotEqual = 402,
    PtrDiff = 403,
    TypeTensorARM = 4163,
    TerminateInvocation = 4416,
    TypeUntypedPointerKHR = 4417,
    UntypedVariableKHR = 4418,
    TypeCooperativeMatrixKHR = 4456,
    ConstantCompositeReplicateEXT = 4461,
    SpecConstantCompositeReplicateEXT = 4462,
    TypeRayQueryKHR = 4472,
    TypeCooperativeVectorNV = 5288,
    TypeAccelerationStructureKHR = 5341,
    TypeCooperativeMatrixNV = 5358,
    CooperativeMatrixReduceNV = 5366,
    CooperativeMatrixLoadTensorNV = 5367,
    CooperativeMatrixPerElementOpNV = 5369,
    ConstantFunctionPointerINTEL = 5600,
    FunctionPointerCallINTEL = 5601,
    DecorateString = 5632,
    MemberDecorateString = 5633,
    /// Any opcode without a dedicated variant. The numeric opcode is kept on the instruction,
    /// see [`crate::ir::Instruction::raw_opcode`].
    Unknown = 0xFFFF,
}

/// Opcode family used by the dispatcher to route an instruction to its validator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OpFamily {
    /// Constant-defining instructions, handled by the constant validator
    Constant,
    /// Function definitions, parameters, calls and per-element matrix operations
    Function,
    /// Everything else; no rule in this crate applies
    Other,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "Op{name}")
    }
}

impl Op {
    /// Returns the numeric opcode.
    #[must_use]
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Returns the family this opcode is dispatched to.
    #[must_use]
    pub fn family(self) -> OpFamily {
        if self.is_constant() {
            return OpFamily::Constant;
        }

        match self {
            Op::Function
            | Op::FunctionParameter
            | Op::FunctionCall
            | Op::CooperativeMatrixPerElementOpNV => OpFamily::Function,
            _ => OpFamily::Other,
        }
    }

    /// True for opcodes that declare a type.
    #[must_use]
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Op::TypeVoid
                | Op::TypeBool
                | Op::TypeInt
                | Op::TypeFloat
                | Op::TypeVector
                | Op::TypeMatrix
                | Op::TypeImage
                | Op::TypeSampler
                | Op::TypeSampledImage
                | Op::TypeArray
                | Op::TypeRuntimeArray
                | Op::TypeStruct
                | Op::TypeOpaque
                | Op::TypePointer
                | Op::TypeFunction
                | Op::TypeEvent
                | Op::TypeDeviceEvent
                | Op::TypeReserveId
                | Op::TypeQueue
                | Op::TypePipe
                | Op::TypeTensorARM
                | Op::TypeUntypedPointerKHR
                | Op::TypeCooperativeMatrixKHR
                | Op::TypeCooperativeVectorNV
                | Op::TypeCooperativeMatrixNV
                | Op::TypeRayQueryKHR
                | Op::TypeAccelerationStructureKHR
        )
    }

    /// True for every constant-defining opcode, specialization constants included.
    #[must_use]
    pub fn is_constant(self) -> bool {
        matches!(
            self,
            Op::ConstantTrue
                | Op::ConstantFalse
                | Op::Constant
                | Op::ConstantComposite
                | Op::ConstantSampler
                | Op::ConstantNull
                | Op::ConstantCompositeReplicateEXT
                | Op::ConstantFunctionPointerINTEL
        ) || self.is_spec_constant()
    }

    /// True for specialization-constant opcodes, whose value may change before execution.
    #[must_use]
    pub fn is_spec_constant(self) -> bool {
        matches!(
            self,
            Op::SpecConstantTrue
                | Op::SpecConstantFalse
                | Op::SpecConstant
                | Op::SpecConstantComposite
                | Op::SpecConstantOp
                | Op::SpecConstantCompositeReplicateEXT
        )
    }

    /// True for constants and `OpUndef`.
    #[must_use]
    pub fn is_constant_or_undef(self) -> bool {
        self == Op::Undef || self.is_constant()
    }

    /// True for type declarations that aggregate component values.
    ///
    /// Tensor types are deliberately absent: whether a tensor counts as a composite depends on
    /// its operands, see [`crate::ir::Instruction::is_shaped_tensor`].
    #[must_use]
    pub fn is_composite_type(self) -> bool {
        matches!(
            self,
            Op::TypeVector
                | Op::TypeMatrix
                | Op::TypeArray
                | Op::TypeStruct
                | Op::TypeCooperativeMatrixNV
                | Op::TypeCooperativeMatrixKHR
                | Op::TypeCooperativeVectorNV
        )
    }

    /// True for both pointer type declarations.
    #[must_use]
    pub fn is_pointer_type(self) -> bool {
        matches!(self, Op::TypePointer | Op::TypeUntypedPointerKHR)
    }

    /// True if the first operand word is a result type id.
    #[must_use]
    pub fn has_result_type(self) -> bool {
        self.has_result_id() && !self.is_type_declaration() && !self.has_bare_result()
    }

    /// True if the instruction defines a result id.
    #[must_use]
    pub fn has_result_id(self) -> bool {
        !matches!(
            self,
            Op::Nop
                | Op::SourceContinued
                | Op::Source
                | Op::SourceExtension
                | Op::Name
                | Op::MemberName
                | Op::Line
                | Op::NoLine
                | Op::Extension
                | Op::MemoryModel
                | Op::EntryPoint
                | Op::ExecutionMode
                | Op::ExecutionModeId
                | Op::Capability
                | Op::TypeForwardPointer
                | Op::FunctionEnd
                | Op::Store
                | Op::CopyMemory
                | Op::CopyMemorySized
                | Op::Decorate
                | Op::DecorateId
                | Op::MemberDecorate
                | Op::GroupDecorate
                | Op::GroupMemberDecorate
                | Op::LoopMerge
                | Op::SelectionMerge
                | Op::Branch
                | Op::BranchConditional
                | Op::Switch
                | Op::Kill
                | Op::Return
                | Op::ReturnValue
                | Op::Unreachable
                | Op::ImageWrite
                | Op::EmitVertex
                | Op::EndPrimitive
                | Op::EmitStreamVertex
                | Op::EndStreamPrimitive
                | Op::ControlBarrier
                | Op::MemoryBarrier
                | Op::AtomicStore
                | Op::LifetimeStart
                | Op::LifetimeStop
                | Op::ModuleProcessed
                | Op::TerminateInvocation
                | Op::DecorateString
                | Op::MemberDecorateString
                | Op::Unknown
        )
    }

    // Non-type instructions that define a result id without a result type.
    fn has_bare_result(self) -> bool {
        matches!(
            self,
            Op::String | Op::ExtInstImport | Op::DecorationGroup | Op::Label
        )
    }

    /// Operand index of the result id, if any.
    #[must_use]
    pub fn result_id_index(self) -> Option<usize> {
        if !self.has_result_id() {
            return None;
        }
        Some(usize::from(self.has_result_type()))
    }

    /// Decides whether operand `index` of an instruction with operand `words` is an id
    /// reference (as opposed to a literal, an enumerant or the instruction's own result id).
    ///
    /// Used to build use lists; only id operands can name another definition. Operands of
    /// [`Op::Unknown`] instructions are never ids, since their layout is not known.
    #[must_use]
    pub fn is_id_operand(self, index: usize, words: &[u32]) -> bool {
        if index >= words.len() || self.result_id_index() == Some(index) {
            return false;
        }
        self.operand_is_id(index, words)
    }

    fn operand_is_id(self, index: usize, words: &[u32]) -> bool {
        match self {
            Op::Nop
            | Op::SourceContinued
            | Op::SourceExtension
            | Op::String
            | Op::Extension
            | Op::ExtInstImport
            | Op::MemoryModel
            | Op::Capability
            | Op::NoLine
            | Op::ModuleProcessed
            | Op::TypeVoid
            | Op::TypeBool
            | Op::TypeInt
            | Op::TypeFloat
            | Op::TypeSampler
            | Op::TypeOpaque
            | Op::TypeEvent
            | Op::TypeDeviceEvent
            | Op::TypeReserveId
            | Op::TypeQueue
            | Op::TypePipe
            | Op::TypeUntypedPointerKHR
            | Op::TypeRayQueryKHR
            | Op::TypeAccelerationStructureKHR
            | Op::DecorationGroup
            | Op::Label
            | Op::EmitVertex
            | Op::EndPrimitive
            | Op::TerminateInvocation
            | Op::Unknown => false,
            Op::Source => index == 2,
            Op::Name
            | Op::MemberName
            | Op::Decorate
            | Op::DecorateString
            | Op::MemberDecorate
            | Op::MemberDecorateString
            | Op::ExecutionMode
            | Op::Line
            | Op::TypeForwardPointer
            | Op::SelectionMerge
            | Op::LifetimeStart
            | Op::LifetimeStop => index == 0,
            Op::DecorateId | Op::ExecutionModeId => index != 1,
            Op::GroupMemberDecorate => index == 0 || index % 2 == 1,
            Op::EntryPoint => {
                index == 1 || (index >= 2 && index >= 2 + literal_string_words(&words[2..]))
            }
            Op::TypeVector
            | Op::TypeMatrix
            | Op::TypeImage
            | Op::TypeSampledImage
            | Op::TypeRuntimeArray => index == 1,
            Op::TypePointer => index == 2,
            Op::Constant | Op::ConstantSampler | Op::SpecConstant => index == 0,
            // the embedded opcode's operands line up with `words[1..]` from index 2 on
            Op::SpecConstantOp => {
                index == 0
                    || (index >= 3
                        && words
                            .get(2)
                            .and_then(|&word| u16::try_from(word).ok())
                            .and_then(Op::from_repr)
                            .map_or(true, |op| op.operand_is_id(index - 1, &words[1..])))
            }
            Op::Variable | Op::Function => index == 0 || index == 3,
            Op::UntypedVariableKHR => index == 0 || index >= 3,
            Op::ExtInst => index == 0 || index == 2 || index >= 4,
            Op::Load
            | Op::CompositeExtract
            | Op::CopyMemorySized
            | Op::BranchConditional
            | Op::ArrayLength => index <= 2,
            Op::Store | Op::CopyMemory | Op::LoopMerge => index <= 1,
            Op::CompositeInsert | Op::VectorShuffle => index <= 3,
            Op::Switch => index <= 1 || index % 2 == 1,
            Op::CooperativeMatrixReduceNV => index != 3,
            Op::CooperativeMatrixLoadTensorNV => index <= 4,
            // the image-operands mask is a literal; the operands after it are ids
            Op::ImageSampleImplicitLod
            | Op::ImageSampleExplicitLod
            | Op::ImageSampleProjImplicitLod
            | Op::ImageSampleProjExplicitLod
            | Op::ImageFetch
            | Op::ImageRead => index != 4,
            Op::ImageSampleDrefImplicitLod
            | Op::ImageSampleDrefExplicitLod
            | Op::ImageSampleProjDrefImplicitLod
            | Op::ImageSampleProjDrefExplicitLod
            | Op::ImageGather
            | Op::ImageDrefGather => index != 5,
            Op::ImageWrite => index != 3,
            _ => true,
        }
    }
}

/// Number of words occupied by the nul-terminated literal string at the start of `words`.
///
/// A string without terminator is taken to extend to the end of the slice.
#[must_use]
pub fn literal_string_words(words: &[u32]) -> usize {
    words
        .iter()
        .position(|word| word.to_le_bytes().contains(&0))
        .map_or(words.len(), |index| index + 1)
}

/// Decodes a nul-terminated, little-endian packed UTF-8 literal string.
#[must_use]
pub fn decode_literal_string(words: &[u32]) -> String {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    'outer: for word in words {
        for byte in word.to_le_bytes() {
            if byte == 0 {
                break 'outer;
            }
            bytes.push(byte);
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Encodes `value` as a nul-terminated, little-endian packed literal string.
#[must_use]
pub fn encode_literal_string(value: &str) -> Vec<u32> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }

    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
