//! Maximum evaluation stack depth of method bodies.
//!
//! The analysis walks the instruction stream once, in code order. Each offset remembers the
//! deepest stack any branch brought to it; the depth entering an instruction is the larger of
//! that and the depth the previous instruction fell through with. Handlers of `catch` and
//! `filter` clauses start with the exception object on the stack. After an instruction that
//! never falls through, the running depth restarts at zero.

use crate::{
    assembly::{decode_instruction, Instruction},
    file::parser::Parser,
    metadata::{
        method::MethodBody,
        tables::{MethodDefRow, ModuleTables, TableRow},
    },
    Result,
};

/// Computes the `max_stack` value of method bodies in one module.
pub struct StackDepthAnalyzer<'a> {
    module: &'a ModuleTables,
}

impl<'a> StackDepthAnalyzer<'a> {
    /// Analyzer for the methods of `module`.
    #[must_use]
    pub fn new(module: &'a ModuleTables) -> Self {
        StackDepthAnalyzer { module }
    }

    /// Maximum stack depth of `MethodDef` row `method`.
    ///
    /// Returns `Ok(None)` when the row does not exist or has no body.
    ///
    /// # Errors
    /// Returns [`crate::Error`] when the code cannot be decoded, a branch or handler points
    /// outside the code, or a call target cannot be resolved to a signature.
    pub fn compute(&self, method: u32) -> Result<Option<u32>> {
        let Some(row) = self.module.row::<MethodDefRow>(method) else {
            return Ok(None);
        };
        let Some(body) = &row.body else {
            return Ok(None);
        };

        self.compute_body(body, method).map(Some)
    }

    /// Maximum stack depth of `body`, interpreted as the body of `MethodDef` row `method`.
    ///
    /// # Errors
    /// See [`StackDepthAnalyzer::compute`].
    pub fn compute_body(&self, body: &MethodBody, method: u32) -> Result<u32> {
        let code = body.code.as_slice();
        let mut incoming = vec![0_u32; code.len()];
        let mut max_depth = 0_u32;

        for handler in &body.exception_handlers {
            let mut seeds = Vec::with_capacity(2);
            if handler.is_catch() {
                seeds.push(handler.handler_offset);
            } else if handler.is_filter() {
                seeds.push(handler.handler_offset);
                seeds.push(handler.filter_offset);
            }

            for seed in seeds {
                let slot = incoming.get_mut(seed as usize).ok_or_else(|| {
                    malformed_error!("Handler offset {} outside of {} code bytes", seed, code.len())
                })?;
                *slot = (*slot).max(1);
            }
        }

        let mut parser = Parser::new(code);
        let mut depth = 0_u32;

        while parser.has_more_data() {
            let instruction = decode_instruction(&mut parser)?;
            depth = depth.max(incoming[instruction.offset as usize]);
            depth = self.apply(&instruction, depth, method)?;
            max_depth = max_depth.max(depth);

            tracing::trace!(
                method,
                offset = instruction.offset,
                mnemonic = instruction.mnemonic,
                depth,
                "stack depth"
            );

            if instruction.is_branch() && depth > 0 {
                for &target in &instruction.branch_targets {
                    let slot = incoming.get_mut(target as usize).ok_or_else(|| {
                        malformed_error!(
                            "{} at {} branches to {}, outside of {} code bytes",
                            instruction.mnemonic,
                            instruction.offset,
                            target,
                            code.len()
                        )
                    })?;
                    *slot = (*slot).max(depth);
                }
            }

            if instruction.ends_block() {
                depth = 0;
            }
        }

        Ok(max_depth)
    }

    fn apply(&self, instruction: &Instruction, depth: u32, method: u32) -> Result<u32> {
        let delta = instruction.stack_delta(self.module, method)?;
        if delta.clears {
            return Ok(delta.pushes);
        }

        let remaining = if delta.pops > depth {
            tracing::debug!(
                method,
                offset = instruction.offset,
                mnemonic = instruction.mnemonic,
                depth,
                pops = delta.pops,
                "stack underflow, clamping to zero"
            );
            0
        } else {
            depth - delta.pops
        };

        Ok(remaining + delta.pushes)
    }
}

/// Recompute and store `max_stack` for every method body of `module`.
///
/// Returns the number of bodies updated.
///
/// # Errors
/// Returns [`crate::Error`] on the first body that cannot be analyzed or whose depth does not
/// fit the 16-bit header field. Nothing is written in that case.
pub fn update_max_stack(module: &mut ModuleTables) -> Result<usize> {
    let analyzer = StackDepthAnalyzer::new(module);
    let mut computed = Vec::new();

    for method in 0..module.row_count(MethodDefRow::TABLE) {
        if let Some(depth) = analyzer.compute(method)? {
            let depth = u16::try_from(depth)
                .map_err(|_| malformed_error!("Method {} needs {} stack slots", method, depth))?;
            computed.push((method, depth));
        }
    }

    let Some(table) = module.table_mut::<MethodDefRow>() else {
        return Ok(0);
    };
    for &(method, depth) in &computed {
        if let Some(body) = table.get_mut(method).and_then(|row| row.body.as_mut()) {
            body.max_stack = depth;
        }
    }

    Ok(computed.len())
}
