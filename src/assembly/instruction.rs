//! Decoded CIL instructions and their effect on the evaluation stack.
//!
//! Most opcodes move a fixed number of stack slots. Calls, `calli`, `newobj` and `ret` depend on
//! a method signature and report [`StackEffect::Variable`]; [`Instruction::stack_delta`] looks
//! that signature up in the enclosing module. Block exits (`leave`, `endfinally`) empty the
//! stack and report [`StackEffect::All`].

use std::fmt;

use crate::{
    metadata::{
        signatures::{parse_method_signature, SignatureMethod},
        tables::{MemberRefRow, MethodDefRow, MethodSpecRow, ModuleTables, StandAloneSigRow, TableId},
        token::{decode_one_based, TableIndex, Token},
    },
    Result,
};

const OP_CALL: u8 = 0x28;
const OP_CALLI: u8 = 0x29;
const OP_RET: u8 = 0x2A;
const OP_CALLVIRT: u8 = 0x6F;
const OP_NEWOBJ: u8 = 0x73;

/// Kind of inline operand that follows an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// No operand
    None,
    /// Signed 8-bit value, also short branch offsets
    Int8,
    /// Unsigned 8-bit value, short argument and local indices
    UInt8,
    /// Unsigned 16-bit value, long argument and local indices
    UInt16,
    /// Signed 32-bit value, also long branch offsets
    Int32,
    /// Signed 64-bit value
    Int64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Metadata token
    Token,
    /// Case count followed by that many 32-bit offsets
    Switch,
}

/// An inline immediate value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit value
    Int8(i8),
    /// Unsigned 8-bit value
    UInt8(u8),
    /// Unsigned 16-bit value
    UInt16(u16),
    /// Signed 32-bit value
    Int32(i32),
    /// Signed 64-bit value
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
}

impl Immediate {
    /// The value as a signed branch displacement, for the integer variants.
    #[must_use]
    pub fn as_displacement(&self) -> Option<i64> {
        match *self {
            Immediate::Int8(value) => Some(i64::from(value)),
            Immediate::UInt8(value) => Some(i64::from(value)),
            Immediate::UInt16(value) => Some(i64::from(value)),
            Immediate::Int32(value) => Some(i64::from(value)),
            Immediate::Int64(value) => Some(value),
            Immediate::Float32(_) | Immediate::Float64(_) => None,
        }
    }
}

/// The decoded operand of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// An immediate value
    Immediate(Immediate),
    /// A metadata token
    Token(Token),
    /// Relative offsets of a `switch`
    Switch(Vec<i32>),
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Falls through to the next instruction
    Sequential,
    /// Either branches or falls through
    ConditionalBranch,
    /// Always branches
    UnconditionalBranch,
    /// Jump table, falls through when no case matches
    Switch,
    /// Calls a method and continues
    Call,
    /// `jmp`, transfers to another method with the current arguments
    Jump,
    /// Returns from the method
    Return,
    /// `throw` or `rethrow`
    Throw,
    /// Leaves a protected region
    Leave,
    /// `endfinally` or `endfilter`
    EndFinally,
    /// Modifies the instruction that follows
    Prefix,
}

/// Number of stack slots an opcode pops or pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEffect {
    /// A fixed count
    Fixed(u8),
    /// Depends on a method signature
    Variable,
    /// Every slot on the stack
    All,
}

/// Stack movement of one decoded instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackDelta {
    /// Slots popped
    pub pops: u32,
    /// Slots pushed after popping
    pub pushes: u32,
    /// The stack is emptied before pushing
    pub clears: bool,
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the first byte, relative to the start of the code
    pub offset: u32,
    /// Encoded size including prefix byte and operand
    pub size: u32,
    /// Opcode byte after the prefix
    pub opcode: u8,
    /// `0xFE` for two-byte opcodes, `0` otherwise
    pub prefix: u8,
    /// Mnemonic as written in IL assembly
    pub mnemonic: &'static str,
    /// Decoded operand
    pub operand: Operand,
    /// Effect on control flow
    pub flow_type: FlowType,
    /// Slots popped, as declared by the opcode
    pub stack_pops: StackEffect,
    /// Slots pushed, as declared by the opcode
    pub stack_pushes: StackEffect,
    /// Absolute offsets this instruction may branch to
    pub branch_targets: Vec<u32>,
}

impl Instruction {
    /// Offset of the instruction that follows.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset + self.size
    }

    /// Whether the instruction transfers control to its [`Instruction::branch_targets`].
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch
                | FlowType::UnconditionalBranch
                | FlowType::Switch
                | FlowType::Leave
        )
    }

    /// Whether control never falls through to the next instruction.
    #[must_use]
    pub fn ends_block(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::UnconditionalBranch
                | FlowType::Leave
                | FlowType::Return
                | FlowType::Throw
                | FlowType::EndFinally
                | FlowType::Jump
        )
    }

    /// The metadata token operand, if any.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self.operand {
            Operand::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Stack movement of this instruction inside method `method` of `module`.
    ///
    /// Fixed effects come straight from the opcode table. Calls take their argument count
    /// from the callee signature, with one more slot for the receiver of instance calls that
    /// do not spell it out and one more for the function pointer of `calli`. `newobj` pushes
    /// the new object instead of a return value. `ret` pops the return value of the enclosing
    /// method.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a callee token is null, names an unexpected
    /// table or a missing row, or if a signature blob cannot be parsed.
    pub fn stack_delta(&self, module: &ModuleTables, method: u32) -> Result<StackDelta> {
        let mut delta = StackDelta {
            pops: fixed(self.stack_pops),
            pushes: fixed(self.stack_pushes),
            clears: self.stack_pops == StackEffect::All,
        };

        if self.stack_pops != StackEffect::Variable && self.stack_pushes != StackEffect::Variable {
            return Ok(delta);
        }

        match (self.prefix, self.opcode) {
            (0, OP_RET) => {
                let enclosing = enclosing_signature(module, method)?;
                delta.pops = u32::from(!enclosing.returns_void());
            }
            (0, OP_CALL | OP_CALLVIRT) => {
                let callee = self.callee_signature(module)?;
                delta.pops = callee.argument_count() + receiver(&callee);
                delta.pushes = u32::from(!callee.returns_void());
            }
            (0, OP_NEWOBJ) => {
                let callee = self.callee_signature(module)?;
                delta.pops = callee.argument_count();
                delta.pushes = 1;
            }
            (0, OP_CALLI) => {
                let callee = self.callee_signature(module)?;
                delta.pops = callee.argument_count() + receiver(&callee) + 1;
                delta.pushes = u32::from(!callee.returns_void());
            }
            _ => {
                return Err(malformed_error!(
                    "No variable stack behaviour known for {}",
                    self.mnemonic
                ))
            }
        }

        Ok(delta)
    }

    fn callee_signature(&self, module: &ModuleTables) -> Result<SignatureMethod> {
        let Some(token) = self.token() else {
            return Err(malformed_error!("{} without a token operand", self.mnemonic));
        };
        let Some(target) = decode_one_based(token)? else {
            return Err(malformed_error!("{} with a null token", self.mnemonic));
        };

        let target = match target.table {
            TableId::MethodSpec => {
                let spec = module
                    .row::<MethodSpecRow>(target.row)
                    .ok_or_else(|| missing(target))?;
                spec.method
            }
            _ => target,
        };

        let blob = match target.table {
            TableId::MethodDef => {
                &module
                    .row::<MethodDefRow>(target.row)
                    .ok_or_else(|| missing(target))?
                    .signature
            }
            TableId::MemberRef => {
                &module
                    .row::<MemberRefRow>(target.row)
                    .ok_or_else(|| missing(target))?
                    .signature
            }
            TableId::StandAloneSig => {
                &module
                    .row::<StandAloneSigRow>(target.row)
                    .ok_or_else(|| missing(target))?
                    .signature
            }
            other => {
                return Err(malformed_error!(
                    "{} cannot target a {:?} row",
                    self.mnemonic,
                    other
                ))
            }
        };

        parse_method_signature(blob)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.mnemonic)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Immediate(_) if !self.branch_targets.is_empty() => {
                write!(f, " IL_{:04x}", self.branch_targets[0])
            }
            Operand::Immediate(value) => match value {
                Immediate::Int8(v) => write!(f, " {v}"),
                Immediate::UInt8(v) => write!(f, " {v}"),
                Immediate::UInt16(v) => write!(f, " {v}"),
                Immediate::Int32(v) => write!(f, " {v}"),
                Immediate::Int64(v) => write!(f, " {v}"),
                Immediate::Float32(v) => write!(f, " {v}"),
                Immediate::Float64(v) => write!(f, " {v}"),
            },
            Operand::Token(token) => write!(f, " {token}"),
            Operand::Switch(_) => {
                let targets: Vec<String> = self
                    .branch_targets
                    .iter()
                    .map(|target| format!("IL_{target:04x}"))
                    .collect();
                write!(f, " ({})", targets.join(", "))
            }
        }
    }
}

fn fixed(effect: StackEffect) -> u32 {
    match effect {
        StackEffect::Fixed(count) => u32::from(count),
        StackEffect::Variable | StackEffect::All => 0,
    }
}

fn receiver(signature: &SignatureMethod) -> u32 {
    u32::from(signature.has_this && !signature.explicit_this)
}

fn missing(index: TableIndex) -> crate::Error {
    malformed_error!("Call target {} does not exist", index)
}

fn enclosing_signature(module: &ModuleTables, method: u32) -> Result<SignatureMethod> {
    let Some(row) = module.row::<MethodDefRow>(method) else {
        return Err(missing(TableIndex::new(TableId::MethodDef, method)));
    };
    parse_method_signature(&row.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assembly::decode_instruction, test::ModuleBuilder, Parser};

    // DEFAULT calling convention, 2 params, returns I4, takes (I4, I4)
    const STATIC_BINARY: [u8; 5] = [0x00, 0x02, 0x08, 0x08, 0x08];
    // HASTHIS, 1 param, returns void, takes string
    const INSTANCE_UNARY: [u8; 4] = [0x20, 0x01, 0x01, 0x0E];
    // DEFAULT, no params, returns void
    const STATIC_VOID: [u8; 3] = [0x00, 0x00, 0x01];

    fn decode(bytes: &[u8]) -> Instruction {
        decode_instruction(&mut Parser::new(bytes)).unwrap()
    }

    fn call(opcode: u8, target: TableIndex) -> Instruction {
        let token = target.to_token().unwrap().value().to_le_bytes();
        decode(&[opcode, token[0], token[1], token[2], token[3]])
    }

    #[test]
    fn fixed_effects() {
        let module = ModuleBuilder::new().build();
        let add = decode(&[0x58]);
        assert_eq!(
            add.stack_delta(&module, 0).unwrap(),
            StackDelta {
                pops: 2,
                pushes: 1,
                clears: false
            }
        );

        let leave = decode(&[0xDE, 0x00]);
        assert!(leave.stack_delta(&module, 0).unwrap().clears);
        assert!(leave.ends_block());
        assert!(leave.is_branch());
    }

    #[test]
    fn call_effects_follow_signatures() {
        let mut builder = ModuleBuilder::new();
        let program = builder.type_def("App", "Program", &[]);
        let caller = builder.method(program, "Caller", STATIC_VOID.to_vec());
        let binary = builder.method(program, "Add", STATIC_BINARY.to_vec());
        let console = builder.type_ref(None, "System", "Console");
        let instance = builder.member_ref(console, "Write", INSTANCE_UNARY.to_vec());
        let spec = builder.method_spec(binary);
        let standalone = builder.stand_alone_sig(STATIC_BINARY.to_vec());
        let module = builder.build();

        let delta = call(OP_CALL, binary).stack_delta(&module, caller.row).unwrap();
        assert_eq!((delta.pops, delta.pushes), (2, 1));

        let delta = call(OP_CALLVIRT, instance)
            .stack_delta(&module, caller.row)
            .unwrap();
        assert_eq!((delta.pops, delta.pushes), (2, 0));

        let delta = call(OP_NEWOBJ, instance).stack_delta(&module, caller.row).unwrap();
        assert_eq!((delta.pops, delta.pushes), (1, 1));

        let delta = call(OP_CALL, spec).stack_delta(&module, caller.row).unwrap();
        assert_eq!((delta.pops, delta.pushes), (2, 1));

        let delta = call(OP_CALLI, standalone)
            .stack_delta(&module, caller.row)
            .unwrap();
        assert_eq!((delta.pops, delta.pushes), (3, 1));
    }

    #[test]
    fn ret_depends_on_enclosing_method() {
        let mut builder = ModuleBuilder::new();
        let program = builder.type_def("App", "Program", &[]);
        let void = builder.method(program, "Run", STATIC_VOID.to_vec());
        let value = builder.method(program, "Add", STATIC_BINARY.to_vec());
        let module = builder.build();

        let ret = decode(&[OP_RET]);
        assert_eq!(ret.stack_delta(&module, void.row).unwrap().pops, 0);
        assert_eq!(ret.stack_delta(&module, value.row).unwrap().pops, 1);
        assert!(ret.stack_delta(&module, 99).is_err());
    }

    #[test]
    fn bad_call_targets() {
        let mut builder = ModuleBuilder::new();
        let program = builder.type_def("App", "Program", &[]);
        let caller = builder.method(program, "Caller", STATIC_VOID.to_vec());
        let module = builder.build();

        let null = decode(&[OP_CALL, 0x00, 0x00, 0x00, 0x06]);
        assert!(null.stack_delta(&module, caller.row).is_err());

        let missing = call(OP_CALL, TableIndex::new(TableId::MethodDef, 40));
        assert!(missing.stack_delta(&module, caller.row).is_err());

        let field = call(OP_CALL, TableIndex::new(TableId::Field, 0));
        assert!(field.stack_delta(&module, caller.row).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(decode(&[0x2B, 0x02]).to_string(), "IL_0000: br.s IL_0004");
        assert_eq!(decode(&[0x1F, 0xFE]).to_string(), "IL_0000: ldc.i4.s -2");
        assert_eq!(
            decode(&[0x72, 0x01, 0x00, 0x00, 0x70]).to_string(),
            "IL_0000: ldstr 0x70000001"
        );
    }
}
