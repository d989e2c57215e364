//! Method bodies and their exception handling regions.
//!
//! A [`MethodBody`] carries the CIL instruction stream of one `MethodDef` row together with the
//! header data the emitter records for it. [`MethodBody::parse`] reads the tiny and fat header
//! formats of ECMA-335 II.25.4; the max-stack value of a rewritten body is recomputed by
//! [`crate::assembly::StackDepthAnalyzer`].

mod body;
mod exceptions;
mod types;

pub use body::MethodBody;
pub use exceptions::{ExceptionHandler, ExceptionHandlerFlags};
pub use types::{MethodBodyFlags, SectionFlags};
