//! CIL instruction decoding.
//!
//! [`decode_instruction`] reads one instruction at the parser's position, [`decode_stream`]
//! reads instructions until the parser runs out of data. Offsets are relative to the start of
//! the parser's data, which is expected to be the code of one method body.
//!
//! # Examples
//!
//! ```rust
//! use cilweave::{Parser, assembly::{decode_instruction, decode_stream}};
//!
//! let mut parser = Parser::new(&[0x2A]); // ret
//! let instruction = decode_instruction(&mut parser)?;
//! assert_eq!(instruction.mnemonic, "ret");
//!
//! let mut parser = Parser::new(&[0x00, 0x2A]); // nop, ret
//! assert_eq!(decode_stream(&mut parser)?.len(), 2);
//! # Ok::<(), cilweave::Error>(())
//! ```

use crate::{
    assembly::{
        FlowType, Immediate, Instruction, Operand, OperandType, INSTRUCTIONS, INSTRUCTIONS_FE,
    },
    file::parser::Parser,
    metadata::token::Token,
    Result,
};

/// Decode every instruction from the parser's position to the end of its data.
///
/// # Errors
/// Returns [`crate::Error`] on unassigned opcodes, truncated operands and branch targets
/// before the start of the code.
pub fn decode_stream(parser: &mut Parser) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        instructions.push(decode_instruction(parser)?);
    }

    Ok(instructions)
}

/// Decode the instruction at the parser's position and advance past it.
///
/// Branch and switch displacements are resolved into absolute offsets in
/// [`Instruction::branch_targets`].
///
/// # Errors
/// Returns [`crate::Error::Malformed`] on unassigned opcodes and on branch targets before
/// the start of the code, [`crate::Error::OutOfBounds`] on truncated operands.
pub fn decode_instruction(parser: &mut Parser) -> Result<Instruction> {
    let start = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let (cil_instruction, prefix, opcode) = match first_byte {
        0xFE => {
            let second_byte = parser.read_le::<u8>()?;

            match INSTRUCTIONS_FE.get(second_byte as usize) {
                Some(instr) => (instr, 0xFE, second_byte),
                None => return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte)),
            }
        }
        _ => match INSTRUCTIONS.get(first_byte as usize) {
            Some(instr) => (instr, 0, first_byte),
            None => return Err(malformed_error!("Invalid opcode: {:02X}", first_byte)),
        },
    };

    if !cil_instruction.is_assigned() {
        return Err(malformed_error!(
            "Reserved opcode {:02X}{:02X} at offset {}",
            prefix,
            opcode,
            start
        ));
    }

    let operand = match cil_instruction.op_type {
        OperandType::None => Operand::None,
        OperandType::Int8 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandType::UInt8 => Operand::Immediate(Immediate::UInt8(parser.read_le::<u8>()?)),
        OperandType::UInt16 => Operand::Immediate(Immediate::UInt16(parser.read_le::<u16>()?)),
        OperandType::Int32 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandType::Int64 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandType::Float32 => Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?)),
        OperandType::Float64 => Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?)),
        OperandType::Token => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        OperandType::Switch => {
            let case_count = parser.read_le::<u32>()? as usize;
            if case_count.saturating_mul(4) > parser.remaining() {
                return Err(crate::Error::OutOfBounds);
            }

            let mut targets = Vec::with_capacity(case_count);
            for _ in 0..case_count {
                targets.push(parser.read_le::<i32>()?);
            }

            Operand::Switch(targets)
        }
    };

    let offset = to_offset(start)?;
    let size = to_offset(parser.pos() - start)?;
    let next = i64::from(offset) + i64::from(size);

    let branch_targets = match (cil_instruction.flow, &operand) {
        (
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave,
            Operand::Immediate(value),
        ) => match value.as_displacement() {
            Some(displacement) => vec![branch_target(next, displacement)?],
            None => Vec::new(),
        },
        (FlowType::Switch, Operand::Switch(displacements)) => displacements
            .iter()
            .map(|&displacement| branch_target(next, i64::from(displacement)))
            .collect::<Result<Vec<u32>>>()?,
        _ => Vec::new(),
    };

    Ok(Instruction {
        offset,
        size,
        opcode,
        prefix,
        mnemonic: cil_instruction.instr,
        operand,
        flow_type: cil_instruction.flow,
        stack_pops: cil_instruction.stack_pops,
        stack_pushes: cil_instruction.stack_pushes,
        branch_targets,
    })
}

fn to_offset(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed_error!("Code offset {} exceeds 32 bits", value))
}

fn branch_target(next: i64, displacement: i64) -> Result<u32> {
    let target = next + displacement;
    u32::try_from(target).map_err(|_| malformed_error!("Branch target {} is out of range", target))
}
