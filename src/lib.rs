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
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # cilweave
//!
//! The metadata engine beneath tools that build, inspect, merge and re-emit ECMA-335
//! (.NET CLI) modules. It works on the logical model of a module, its tables of typed rows,
//! not on the physical PE layout.
//!
//! ## Features
//!
//! - **Schema-driven tables** - every table kind `0x00..=0x2C`, typed rows, and type-erased
//!   cell access for code that does not know the row type
//! - **In-place resolution** - custom attribute and permission set blobs turned into typed
//!   values, loading referenced modules on demand
//! - **Reference probing** - candidate files for module and assembly references, aware of
//!   the framework a module targets, in single-threaded, locked and concurrent flavours
//! - **Stack depth analysis** - the `max_stack` a method body needs before it can be emitted
//! - **Strong names** - CAPI key blobs, public key tokens and RSA signatures
//!
//! ## Quick Start
//!
//! ```rust
//! use cilweave::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(SchemaProvider::standard()?);
//! let mut module = ModuleTables::new(&provider)?;
//! module.add_row(TypeDefRow {
//!     type_name: "Program".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let summary = module.resolve_everything(&LocalTypeResolver);
//! assert!(summary.is_complete());
//! # Ok::<(), cilweave::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - re-exports of the commonly used types and traits
//! - [`metadata`] - tables, tokens, resolution, identities and reference probing
//! - [`assembly`] - CIL instruction decoding and stack depth analysis
//! - [`file`] - bounds-checked byte access and the module loaders
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events and never installs a
//! subscriber. Resolution outcomes and reference probing log at `debug`, failed dependency
//! loads at `warn`, stack depth transitions at `trace`.
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`Result<T, Error>`](Result). A cell that cannot be
//! resolved is not an error; it stays raw and shows up in the
//! [`ResolutionSummary`](metadata::resolution::ResolutionSummary) of a bulk pass.
//!
//! ```rust
//! use cilweave::{Error, metadata::token::{decode_one_based, Token}};
//!
//! match decode_one_based(Token::new(0x7F00_0001)) {
//!     Ok(index) => println!("{index:?}"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed: {message}"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

pub mod assembly;
pub mod file;
pub mod metadata;
pub mod prelude;

#[cfg(test)]
pub(crate) mod test;

/// `cilweave` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilweave` Error type
///
/// Errors are grouped into schema, binary-format and column errors; see the variants.
pub use error::Error;

/// Bounds-checked cursor over a byte slice, used for every blob and instruction stream.
///
/// # Example
///
/// ```rust
/// use cilweave::{Parser, assembly::decode_instruction};
/// let code = [0x2A]; // ret
/// let mut parser = Parser::new(&code);
/// let instr = decode_instruction(&mut parser)?;
/// assert_eq!(instr.mnemonic, "ret");
/// # Ok::<(), cilweave::Error>(())
/// ```
pub use file::parser::Parser;
