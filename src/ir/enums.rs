//! Operand enumerations, module version, capability set and derived feature flags.
//!
//! These are the module-wide facts the validators query read-only. The capability set is closed
//! over implied capabilities when it is built (declaring `Geometry` also grants `Shader`, which in
//! turn grants `Matrix`), so a query for a capability never needs to consider implications again.

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashSet;
use strum::{EnumIter, FromRepr, IntoStaticStr};

/// Capabilities a module may declare with `OpCapability`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u32)]
pub enum Capability {
    Matrix = 0,
    Shader = 1,
    Geometry = 2,
    Tessellation = 3,
    Addresses = 4,
    Linkage = 5,
    Kernel = 6,
    Vector16 = 7,
    Float16Buffer = 8,
    Float16 = 9,
    Float64 = 10,
    Int64 = 11,
    Int64Atomics = 12,
    ImageBasic = 13,
    ImageReadWrite = 14,
    ImageMipmap = 15,
    Pipes = 17,
    Groups = 18,
    DeviceEnqueue = 19,
    LiteralSampler = 20,
    AtomicStorage = 21,
    Int16 = 22,
    TessellationPointSize = 23,
    GeometryPointSize = 24,
    ImageGatherExtended = 25,
    StorageImageMultisample = 27,
    GenericPointer = 38,
    Int8 = 39,
    TensorsARM = 4174,
    StorageBuffer16BitAccess = 4433,
    UniformAndStorageBuffer16BitAccess = 4434,
    StoragePushConstant16 = 4435,
    StorageInputOutput16 = 4436,
    VariablePointersStorageBuffer = 4441,
    VariablePointers = 4442,
    StorageBuffer8BitAccess = 4448,
    UntypedPointersKHR = 4473,
    PhysicalStorageBufferAddresses = 5347,
    CooperativeMatrixNV = 5357,
    CooperativeVectorNV = 5394,
    CooperativeMatrixReductionsNV = 5430,
    CooperativeMatrixPerElementOperationsNV = 5432,
    CooperativeMatrixTensorAddressingNV = 5433,
    FunctionPointersINTEL = 5603,
    IndirectReferencesINTEL = 5604,
    CooperativeMatrixKHR = 6022,
}

impl Capability {
    /// Capabilities that declaring `self` grants implicitly.
    #[must_use]
    pub fn implied(self) -> &'static [Capability] {
        match self {
            Capability::Shader => &[Capability::Matrix],
            Capability::Geometry
            | Capability::Tessellation
            | Capability::AtomicStorage
            | Capability::ImageGatherExtended
            | Capability::StorageImageMultisample
            | Capability::VariablePointersStorageBuffer
            | Capability::PhysicalStorageBufferAddresses
            | Capability::CooperativeMatrixNV => &[Capability::Shader],
            Capability::TessellationPointSize => &[Capability::Tessellation],
            Capability::GeometryPointSize => &[Capability::Geometry],
            Capability::Vector16
            | Capability::Float16Buffer
            | Capability::ImageBasic
            | Capability::Pipes
            | Capability::DeviceEnqueue
            | Capability::LiteralSampler => &[Capability::Kernel],
            Capability::Int64Atomics => &[Capability::Int64],
            Capability::ImageReadWrite | Capability::ImageMipmap => &[Capability::ImageBasic],
            Capability::GenericPointer => &[Capability::Addresses],
            Capability::VariablePointers => &[Capability::VariablePointersStorageBuffer],
            _ => &[],
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

/// The declared capabilities of a module, closed over implication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    declared: FxHashSet<Capability>,
}

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `capability` together with everything it implies, transitively.
    pub fn insert(&mut self, capability: Capability) {
        let mut pending = vec![capability];
        while let Some(next) = pending.pop() {
            if self.declared.insert(next) {
                pending.extend_from_slice(next.implied());
            }
        }
    }

    /// Returns true if `capability` was declared or is implied by a declared capability.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.declared.contains(&capability)
    }

    /// Number of capabilities in the set, implied ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Returns true if no capability is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Iterates the capabilities in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.declared.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::new();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

bitflags! {
    /// Module-level features derived from the version, capabilities and extensions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u32 {
        /// `OpUConvert` is permitted inside `OpSpecConstantOp` without `Kernel`
        const UCONVERT_SPEC_CONSTANT_OP = 0x0001;
        /// Either variable-pointers capability is declared
        const VARIABLE_POINTERS = 0x0002;
    }
}

/// Storage classes of pointer types and variables.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u32)]
pub enum StorageClass {
    UniformConstant = 0,
    Input = 1,
    Uniform = 2,
    Output = 3,
    Workgroup = 4,
    CrossWorkgroup = 5,
    Private = 6,
    Function = 7,
    Generic = 8,
    PushConstant = 9,
    AtomicCounter = 10,
    Image = 11,
    StorageBuffer = 12,
    TileImageEXT = 4172,
    CallableDataKHR = 5328,
    IncomingCallableDataKHR = 5329,
    RayPayloadKHR = 5338,
    HitAttributeKHR = 5339,
    IncomingRayPayloadKHR = 5342,
    ShaderRecordBufferKHR = 5343,
    PhysicalStorageBuffer = 5349,
    TaskPayloadWorkgroupEXT = 5402,
    CodeSectionINTEL = 5605,
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        f.write_str(name)
    }
}

/// Addressing models declared by `OpMemoryModel`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, EnumIter, FromRepr)]
#[repr(u32)]
pub enum AddressingModel {
    #[default]
    Logical = 0,
    Physical32 = 1,
    Physical64 = 2,
    PhysicalStorageBuffer64 = 5348,
}

/// Memory models declared by `OpMemoryModel`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, FromRepr)]
#[repr(u32)]
pub enum MemoryModel {
    Simple = 0,
    GLSL450 = 1,
    OpenCL = 2,
    Vulkan = 3,
}

/// Module format version from the header.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version {
    /// Major version number
    pub major: u8,
    /// Minor version number
    pub minor: u8,
}

impl Version {
    /// Version 1.0
    pub const V1_0: Version = Version::new(1, 0);
    /// Version 1.3
    pub const V1_3: Version = Version::new(1, 3);
    /// Version 1.4, the first to allow `OpUConvert` in spec-constant operations
    pub const V1_4: Version = Version::new(1, 4);
    /// Version 1.6
    pub const V1_6: Version = Version::new(1, 6);

    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Version { major, minor }
    }

    /// Decodes the header version word (`0x00MMmm00`).
    #[must_use]
    pub fn from_word(word: u32) -> Self {
        let [_, minor, major, _] = word.to_le_bytes();
        Version { major, minor }
    }

    /// Encodes the header version word.
    #[must_use]
    pub fn to_word(self) -> u32 {
        u32::from_le_bytes([0, self.minor, self.major, 0])
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V1_6
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
