//! Validation diagnostics.
//!
//! A [`Diagnostic`] is what a validator produces when an instruction breaks a rule. It records
//! the [`ErrorKind`], a rendered message (ids already passed through the
//! [`crate::validation::NameResolver`]), the position and opcode of the offending instruction and
//! the raw ids involved, so callers can point at them without parsing the message.

use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::ir::{Id, Op};

/// Classification of a validation failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIter, IntoStaticStr)]
pub enum ErrorKind {
    /// An id does not resolve, or resolves to the wrong kind of definition or type
    #[strum(serialize = "INVALID_ID")]
    InvalidId,
    /// A constant specializes to a disallowed base type
    #[strum(serialize = "INVALID_DATA")]
    InvalidData,
    /// An opcode or storage class is used without the capability that legalizes it
    #[strum(serialize = "INVALID_CAPABILITY")]
    InvalidCapability,
    /// An instruction is placed where the module layout does not allow it
    #[strum(serialize = "INVALID_LAYOUT")]
    InvalidLayout,
}

/// One violated rule.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    /// Kind of the violation
    pub kind: ErrorKind,
    /// Human readable description
    pub message: String,
    /// Module position of the instruction the diagnostic is reported at
    pub position: usize,
    /// Opcode of that instruction
    pub opcode: Op,
    /// Ids involved, the reporting instruction's result id first when it has one
    pub ids: Vec<Id>,
}

impl Diagnostic {
    /// Creates a diagnostic without any attached ids.
    #[must_use]
    pub fn new(kind: ErrorKind, position: usize, opcode: Op, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            position,
            opcode,
            ids: Vec::new(),
        }
    }

    /// Attaches the ids involved in the violation.
    #[must_use]
    pub fn with_ids(mut self, ids: &[Id]) -> Self {
        for &id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at instruction {} ({}): {}",
            self.kind, self.position, self.opcode, self.message
        )
    }
}
