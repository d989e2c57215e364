//! CIL instruction decoding and stack depth analysis.
//!
//! # Key Components
//!
//! - [`decode_instruction`] / [`decode_stream`] - decode raw method body code
//! - [`Instruction`] - one decoded instruction with operand, flow and stack effect
//! - [`StackDepthAnalyzer`] - the `max_stack` value a method body needs
//! - [`update_max_stack`] - rewrite `max_stack` of every body in a module
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cilweave::{
//!     assembly::StackDepthAnalyzer,
//!     metadata::{method::MethodBody, tables::{MethodDefRow, ModuleTables, SchemaProvider}},
//! };
//!
//! let mut module = ModuleTables::new(&Arc::new(SchemaProvider::standard()?))?;
//! let method = module.add_row(MethodDefRow {
//!     name: "Sum".to_string(),
//!     // static int32 Sum()
//!     signature: vec![0x00, 0x00, 0x08],
//!     // ldc.i4.1; ldc.i4.2; add; ret
//!     body: Some(MethodBody::new(vec![0x17, 0x18, 0x58, 0x2A])),
//!     ..Default::default()
//! })?;
//!
//! let depth = StackDepthAnalyzer::new(&module).compute(method.row)?;
//! assert_eq!(depth, Some(2));
//! # Ok::<(), cilweave::Error>(())
//! ```

mod decoder;
mod instruction;
mod instructions;
mod maxstack;

pub use decoder::{decode_instruction, decode_stream};
pub use instruction::{
    FlowType, Immediate, Instruction, Operand, OperandType, StackDelta, StackEffect,
};
pub use instructions::{CilInstruction, INSTRUCTIONS, INSTRUCTIONS_FE};
pub use maxstack::{update_max_stack, StackDepthAnalyzer};
