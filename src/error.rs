use thiserror::Error;

use crate::{ir::Id, validation::Diagnostic};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Two families of failure exist. Construction errors ([`Error::Malformed`] and
/// [`Error::DuplicateDefinition`]) are raised while a
/// [`crate::ir::Module`] is being assembled and mean the instruction stream could not even be
/// turned into a well-defined module. Validation errors ([`Error::Validation`]) carry a
/// [`Diagnostic`] describing the first semantic rule an instruction violated.
///
/// # Examples
///
/// ```rust
/// use spvscope::{ir::{ModuleBuilder, Op}, validation::ErrorKind, Error};
///
/// let mut builder = ModuleBuilder::new();
/// let int_ty = builder.type_int(32, false);
/// let id = builder.fresh_id();
/// builder.push(Op::ConstantTrue, vec![int_ty, id]);
/// let module = builder.build()?;
///
/// match module.validate(Default::default()) {
///     Err(Error::Validation(diag)) => assert_eq!(diag.kind, ErrorKind::InvalidId),
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// # Ok::<(), spvscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An instruction violated a semantic rule.
    ///
    /// The boxed [`Diagnostic`] names the error kind, the position of the offending
    /// instruction in module order and the ids involved.
    #[error("{0}")]
    Validation(Box<Diagnostic>),

    /// The instruction stream is damaged and could not be turned into a module.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An id was defined by more than one instruction.
    #[error("Id {0} is defined more than once")]
    DuplicateDefinition(Id),
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::Validation(Box::new(diagnostic))
    }
}

impl Error {
    /// Returns the validation diagnostic if this error is one.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Validation(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}
