//! The immutable module and its construction pass.
//!
//! A [`Module`] owns the instruction sequence together with every table the validators query:
//! the definition table, the decoration table, the capability set, the extension list, the
//! derived [`Features`], the addressing and memory model, debug names and the precomputed
//! function-parameter layout. All of it is built in one go by [`Module::new`] and never changes
//! afterwards, which makes a module `Send + Sync` and lets independent modules be validated in
//! parallel.
//!
//! # Construction
//!
//! Building a module walks the instruction sequence a small, fixed number of times:
//!
//! 1. positions are assigned and every result id is entered into the definition table; a result
//!    id of `0` is malformed and a second definition of an id is rejected with
//!    [`crate::Error::DuplicateDefinition`]
//! 2. module-level facts are collected: capabilities (closed over implication), extensions,
//!    extended instruction set names, the memory model and `OpName` debug names
//! 3. extended instructions are classified as debug-info or non-semantic by the name of the set
//!    they belong to
//! 4. use lists are built from every id operand that names a defined id, forward references
//!    included
//! 5. decorations are gathered, and decoration groups are applied to their targets
//! 6. each `OpFunctionParameter` is assigned its owning function and index
//!
//! # Examples
//!
//! ```rust
//! use spvscope::ir::{Instruction, Module, Op, Version};
//!
//! let module = Module::new(
//!     Version::V1_6,
//!     vec![
//!         Instruction::new(Op::TypeBool, vec![1]),
//!         Instruction::new(Op::ConstantTrue, vec![1, 2]),
//!     ],
//! )?;
//!
//! let constant = module.find_def(2).expect("defined");
//! assert_eq!(constant.type_id(), Some(1));
//! assert_eq!(module.find_def(1).expect("defined").uses().len(), 1);
//! # Ok::<(), spvscope::Error>(())
//! ```

use rustc_hash::FxHashMap;

use crate::{
    ir::{
        opcode::decode_literal_string, AddressingModel, Capability, CapabilitySet, Features, Id,
        Instruction, InstructionFlags, MemoryModel, Op, Use, Version,
    },
    validation::{ValidationConfig, ValidationEngine},
    Error, Result,
};

/// A decoration applied to an id, or to a member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decoration {
    /// Numeric decoration kind (e.g. `6` for `ArrayStride`)
    pub kind: u32,
    /// Literal or id operands following the decoration kind
    pub literals: Vec<u32>,
    /// Struct member index for member decorations
    pub member: Option<u32>,
}

/// Where an `OpFunctionParameter` sits relative to its owning function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSlot {
    /// The parameter belongs to the function at module position `function`
    InFunction {
        /// Module position of the owning `OpFunction`
        function: usize,
        /// Zero-based parameter index
        index: usize,
    },
    /// The parameter is the very first instruction of the module
    FirstInstruction,
    /// No `OpFunction` precedes the parameter
    NoEnclosingFunction,
}

/// Extended instruction sets whose instructions carry debug information.
const DEBUG_INFO_SETS: &[&str] = &[
    "DebugInfo",
    "OpenCL.DebugInfo.100",
    "NonSemantic.Shader.DebugInfo.100",
];

/// A fully indexed, immutable module.
#[derive(Debug, Clone)]
pub struct Module {
    version: Version,
    instructions: Vec<Instruction>,
    definitions: FxHashMap<Id, usize>,
    decorations: FxHashMap<Id, Vec<Decoration>>,
    capabilities: CapabilitySet,
    extensions: Vec<String>,
    features: Features,
    addressing_model: AddressingModel,
    memory_model: Option<MemoryModel>,
    parameters: FxHashMap<usize, ParameterSlot>,
    names: FxHashMap<Id, String>,
}

impl Module {
    /// Builds a module from an ordered instruction sequence.
    ///
    /// The addressing model defaults to `Logical` unless the sequence contains `OpMemoryModel`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if an instruction lacks its result id or defines id
    /// `0`, and [`crate::Error::DuplicateDefinition`] if an id is defined twice.
    pub fn new(version: Version, instructions: Vec<Instruction>) -> Result<Self> {
        Self::with_addressing_model(version, AddressingModel::Logical, instructions)
    }

    /// Builds a module from `(opcode, operand words)` pairs as produced by a binary decoder.
    ///
    /// Opcode numbers without an [`Op`] variant are kept as [`Op::Unknown`] instructions. They
    /// define no id and reference none, so no rule in this crate looks at them.
    ///
    /// # Errors
    ///
    /// Same as [`Module::new`].
    pub fn from_raw<I>(version: Version, stream: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u16, Vec<u32>)>,
    {
        let instructions = stream
            .into_iter()
            .map(|(opcode, words)| Instruction::from_raw(opcode, words))
            .collect();

        Self::new(version, instructions)
    }

    /// Builds a module, using `addressing_model` unless `OpMemoryModel` declares one.
    ///
    /// # Errors
    ///
    /// Same as [`Module::new`].
    pub fn with_addressing_model(
        version: Version,
        addressing_model: AddressingModel,
        mut instructions: Vec<Instruction>,
    ) -> Result<Self> {
        let definitions = Self::index_definitions(&mut instructions)?;

        let mut module = Module {
            version,
            instructions: Vec::new(),
            definitions,
            decorations: FxHashMap::default(),
            capabilities: CapabilitySet::new(),
            extensions: Vec::new(),
            features: Features::empty(),
            addressing_model,
            memory_model: None,
            parameters: FxHashMap::default(),
            names: FxHashMap::default(),
        };

        let ext_inst_sets = module.collect_module_facts(&instructions);
        Self::classify_ext_insts(&mut instructions, &ext_inst_sets);
        module.link_uses(&mut instructions);
        module.collect_decorations(&instructions);
        module.layout_parameters(&instructions);
        module.derive_features();
        module.instructions = instructions;

        log::debug!(
            "built module {} with {} instructions, {} definitions",
            module.version,
            module.instructions.len(),
            module.definitions.len()
        );
        Ok(module)
    }

    fn index_definitions(instructions: &mut [Instruction]) -> Result<FxHashMap<Id, usize>> {
        let mut definitions = FxHashMap::default();
        definitions.reserve(instructions.len());

        for (position, instruction) in instructions.iter_mut().enumerate() {
            instruction.position = position;
            instruction.uses.clear();

            let Some(index) = instruction.opcode.result_id_index() else {
                continue;
            };
            let Some(id) = instruction.operand(index) else {
                return Err(malformed_error!(
                    "{} at position {} is missing its result id",
                    instruction.opcode,
                    position
                ));
            };
            if id == 0 {
                return Err(malformed_error!(
                    "{} at position {} defines id 0",
                    instruction.opcode,
                    position
                ));
            }
            if definitions.insert(id, position).is_some() {
                return Err(Error::DuplicateDefinition(id));
            }
        }

        Ok(definitions)
    }

    fn collect_module_facts(&mut self, instructions: &[Instruction]) -> FxHashMap<Id, String> {
        let mut ext_inst_sets = FxHashMap::default();

        for instruction in instructions {
            match instruction.opcode {
                Op::Capability => match instruction.operand(0).and_then(Capability::from_repr) {
                    Some(capability) => self.capabilities.insert(capability),
                    None => log::debug!(
                        "ignoring unknown capability {:?} at position {}",
                        instruction.operand(0),
                        instruction.position
                    ),
                },
                Op::Extension => self
                    .extensions
                    .push(decode_literal_string(instruction.words())),
                Op::ExtInstImport => {
                    if let Some(id) = instruction.result_id() {
                        ext_inst_sets.insert(id, decode_literal_string(instruction.operands_from(1)));
                    }
                }
                Op::MemoryModel => {
                    if let Some(model) = instruction.operand(0).and_then(AddressingModel::from_repr)
                    {
                        self.addressing_model = model;
                    }
                    self.memory_model = instruction.operand(1).and_then(MemoryModel::from_repr);
                }
                Op::Name => {
                    if let Some(target) = instruction.operand(0) {
                        self.names
                            .insert(target, decode_literal_string(instruction.operands_from(1)));
                    }
                }
                _ => {}
            }
        }

        ext_inst_sets
    }

    fn classify_ext_insts(instructions: &mut [Instruction], sets: &FxHashMap<Id, String>) {
        for instruction in instructions
            .iter_mut()
            .filter(|instruction| instruction.opcode == Op::ExtInst)
        {
            let Some(set_name) = instruction.operand(2).and_then(|set| sets.get(&set)) else {
                continue;
            };

            if DEBUG_INFO_SETS.contains(&set_name.as_str()) {
                instruction.flags.insert(InstructionFlags::DEBUG_INFO);
            }
            if set_name.starts_with("NonSemantic.") {
                instruction.flags.insert(InstructionFlags::NON_SEMANTIC);
            }
        }
    }

    fn link_uses(&self, instructions: &mut [Instruction]) {
        let mut links = Vec::new();
        for instruction in instructions.iter() {
            for (operand, id) in instruction.id_operands() {
                if let Some(&definition) = self.definitions.get(&id) {
                    links.push((
                        definition,
                        Use {
                            user: instruction.position,
                            operand,
                        },
                    ));
                }
            }
        }

        for (definition, link) in links {
            instructions[definition].uses.push(link);
        }
    }

    fn collect_decorations(&mut self, instructions: &[Instruction]) {
        let mut group_applications = Vec::new();

        for instruction in instructions {
            match instruction.opcode {
                Op::Decorate | Op::DecorateId => {
                    if let (Some(target), Some(kind)) = (instruction.operand(0), instruction.operand(1))
                    {
                        self.decorations.entry(target).or_default().push(Decoration {
                            kind,
                            literals: instruction.operands_from(2).to_vec(),
                            member: None,
                        });
                    }
                }
                Op::MemberDecorate => {
                    if let (Some(target), Some(member), Some(kind)) = (
                        instruction.operand(0),
                        instruction.operand(1),
                        instruction.operand(2),
                    ) {
                        self.decorations.entry(target).or_default().push(Decoration {
                            kind,
                            literals: instruction.operands_from(3).to_vec(),
                            member: Some(member),
                        });
                    }
                }
                Op::GroupDecorate | Op::GroupMemberDecorate => group_applications.push(instruction),
                _ => {}
            }
        }

        for instruction in group_applications {
            let Some(group) = instruction.operand(0) else {
                continue;
            };
            let inherited = self.decorations.get(&group).cloned().unwrap_or_default();

            if instruction.opcode == Op::GroupDecorate {
                for &target in instruction.operands_from(1) {
                    self.decorations
                        .entry(target)
                        .or_default()
                        .extend(inherited.iter().cloned());
                }
            } else {
                for pair in instruction.operands_from(1).chunks_exact(2) {
                    let (target, member) = (pair[0], pair[1]);
                    self.decorations
                        .entry(target)
                        .or_default()
                        .extend(inherited.iter().map(|decoration| Decoration {
                            member: Some(member),
                            ..decoration.clone()
                        }));
                }
            }
        }
    }

    // A parameter's index counts the parameters between it and the closest preceding
    // OpFunction; debug instructions in between do not shift it.
    fn layout_parameters(&mut self, instructions: &[Instruction]) {
        let mut enclosing: Option<(usize, usize)> = None;

        for instruction in instructions {
            match instruction.opcode {
                Op::Function => enclosing = Some((instruction.position, 0)),
                Op::FunctionParameter => {
                    let slot = match enclosing.as_mut() {
                        _ if instruction.position == 0 => ParameterSlot::FirstInstruction,
                        Some((function, next)) => {
                            let index = *next;
                            *next += 1;
                            ParameterSlot::InFunction {
                                function: *function,
                                index,
                            }
                        }
                        None => ParameterSlot::NoEnclosingFunction,
                    };
                    self.parameters.insert(instruction.position, slot);
                }
                _ => {}
            }
        }
    }

    fn derive_features(&mut self) {
        if self.version >= Version::V1_4 || self.has_extension("SPV_AMD_gpu_shader_int16") {
            self.features.insert(Features::UCONVERT_SPEC_CONSTANT_OP);
        }
        if self.capabilities.contains(Capability::VariablePointers)
            || self.capabilities.contains(Capability::VariablePointersStorageBuffer)
        {
            self.features.insert(Features::VARIABLE_POINTERS);
        }
    }

    /// Header version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// All instructions in module order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The instruction at `position`.
    #[must_use]
    pub fn instruction(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the module has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Looks up the instruction defining `id`. Undefined ids yield `None`.
    #[must_use]
    pub fn find_def(&self, id: Id) -> Option<&Instruction> {
        self.definitions
            .get(&id)
            .and_then(|&position| self.instructions.get(position))
    }

    /// Number of defined ids.
    #[must_use]
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Decorations applied to `id`, member decorations included.
    #[must_use]
    pub fn decorations_of(&self, id: Id) -> &[Decoration] {
        self.decorations.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Declared and implied capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Returns true if `capability` is declared or implied.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Extension names declared with `OpExtension`.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns true if the extension `name` is declared.
    #[must_use]
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|extension| extension == name)
    }

    /// Derived feature flags.
    #[must_use]
    pub fn features(&self) -> Features {
        self.features
    }

    /// Addressing model.
    #[must_use]
    pub fn addressing_model(&self) -> AddressingModel {
        self.addressing_model
    }

    /// Memory model, if `OpMemoryModel` is present.
    #[must_use]
    pub fn memory_model(&self) -> Option<MemoryModel> {
        self.memory_model
    }

    /// Owning function and index of the `OpFunctionParameter` at `position`.
    #[must_use]
    pub fn parameter_slot(&self, position: usize) -> Option<ParameterSlot> {
        self.parameters.get(&position).copied()
    }

    /// Debug name given to `id` by `OpName`.
    #[must_use]
    pub fn name_of(&self, id: Id) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Validates the module, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] describing the first violated rule.
    pub fn validate(&self, config: ValidationConfig) -> Result<()> {
        ValidationEngine::new(self, &config).validate()
    }
}
