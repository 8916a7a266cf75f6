// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # spvscope
//!
//! [![Crates.io](https://img.shields.io/crates/v/spvscope.svg)](https://crates.io/crates/spvscope)
//! [![Documentation](https://docs.rs/spvscope/badge.svg)](https://docs.rs/spvscope)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/spvscope/blob/main/LICENSE-APACHE)
//!
//! A semantic validator for SPIR-V modules, written in pure Rust. `spvscope` checks the rules
//! that a structurally well-formed module can still break: constants whose shape does not match
//! their type, null values of types without one, operations used without the capability that
//! legalizes them, and functions, parameters and calls whose signatures disagree.
//!
//! ## Features
//!
//! - **Constant validation** - boolean, composite, sampler, null, specialization and function
//!   pointer constants
//! - **Function validation** - definitions, parameter layout, call signatures, pointer arguments
//!   under logical addressing and cooperative matrix per-element callbacks
//! - **Structural type equivalence** - exact and decoration-aware logical matching of types
//! - **Precise diagnostics** - error kind, instruction position, opcode and involved ids
//! - **Batch validation** - independent modules validated in parallel
//!
//! ## Quick Start
//!
//! Add `spvscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! spvscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust
//! use spvscope::prelude::*;
//!
//! let mut builder = ModuleBuilder::new();
//! let float = builder.type_float(32);
//! let vec3 = builder.type_vector(float, 3);
//! let zero = builder.constant(float, 0);
//! builder.constant_composite(vec3, &[zero, zero, zero]);
//!
//! let module = builder.build()?;
//! module.validate(ValidationConfig::default())?;
//! # Ok::<(), spvscope::Error>(())
//! ```
//!
//! ### Reading Diagnostics
//!
//! ```rust
//! use spvscope::{ir::ModuleBuilder, validation::ErrorKind, Error, ValidationConfig};
//!
//! let mut builder = ModuleBuilder::new();
//! let float = builder.type_float(32);
//! let vec3 = builder.type_vector(float, 3);
//! let zero = builder.constant(float, 0);
//! builder.constant_composite(vec3, &[zero, zero]);
//! let module = builder.build()?;
//!
//! match module.validate(ValidationConfig::default()) {
//!     Err(Error::Validation(diagnostic)) => {
//!         assert_eq!(diagnostic.kind, ErrorKind::InvalidId);
//!         println!("{diagnostic}");
//!     }
//!     other => panic!("expected a diagnostic, got {other:?}"),
//! }
//! # Ok::<(), spvscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - opcodes, instructions, the indexed [`ir::Module`] and the [`ir::ModuleBuilder`]
//! - [`validation`] - the engine, its configuration, the validation context and the passes
//! - [`prelude`] - convenient re-exports of commonly used types
//! - [`Error`] and [`Result`] - error handling
//!
//! Decoding the SPIR-V binary into `(opcode, operand words)` pairs is left to the caller;
//! [`ir::Module::from_raw`] turns such a stream into a validated-ready module.
//!
//! ## Development and Testing
//!
//! ### Fuzzing
//!
//! ```bash
//! cargo +nightly fuzz run validate --release
//! ```
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Examples
///
/// ```rust
/// use spvscope::prelude::*;
///
/// let mut builder = ModuleBuilder::new();
/// let boolean = builder.type_bool();
/// builder.constant_true(boolean);
/// assert!(builder.build()?.validate(ValidationConfig::default()).is_ok());
/// # Ok::<(), spvscope::Error>(())
/// ```
pub mod prelude;

/// Instruction and module model of a SPIR-V module
///
/// # Key Components
///
/// - [`ir::Op`] - the opcode table with per-opcode classification
/// - [`ir::Instruction`] - operand words, position, flags and use list of one instruction
/// - [`ir::Module`] - the immutable, indexed instruction sequence
/// - [`ir::ModuleBuilder`] - incremental module construction with id allocation
pub mod ir;

/// Semantic validation of constants and functions
///
/// # Key Components
///
/// - [`validation::ValidationEngine`] - drives the passes over a module
/// - [`validation::ValidationContext`] - the query surface the passes use
/// - [`validation::Diagnostic`] - what a failed rule reports
///
/// # Examples
///
/// ```rust
/// use spvscope::{ir::ModuleBuilder, validation::ValidationEngine, ValidationConfig};
///
/// let mut builder = ModuleBuilder::new();
/// let uint = builder.type_int(32, false);
/// builder.constant_null(uint);
/// let module = builder.build()?;
///
/// let config = ValidationConfig::default();
/// assert!(ValidationEngine::new(&module, &config).validate().is_ok());
/// # Ok::<(), spvscope::Error>(())
/// ```
pub mod validation;

/// `spvscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `spvscope` Error type
///
/// The main error type for all operations in this crate. Covers both module construction
/// failures and validation diagnostics.
pub use error::Error;

/// Configuration of a validation run
///
/// See [`validation::ValidationConfig`] for the available options and presets.
pub use validation::ValidationConfig;
