use crate::error::{Error, Result};
use std::convert::TryFrom;
use std::fmt;

/// The CHIP 8 operations this machine executes. Operands live in the
/// `Instruction` that carries the tag, see its accessors.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Op {
    // 0XXX
    // 00E0 	Display 	disp_clear() 	Clears the screen.
    Cld,
    // 00EE 	Flow 	return; 	Returns from a subroutine.
    Ret,

    // 1NNN 	Flow 	goto NNN;
    Goto,
    // 2NNN 	Flow 	*(0xNNN)()
    Calls,
    // 3XNN 	Cond 	if (Vx == NN) skip
    Jeq,
    // 4XNN 	Cond 	if (Vx != NN) skip
    Jneq,
    // 5XY_ 	Cond 	if (Vx == Vy) skip
    Jveq,
    // 6XNN 	Const 	Vx = NN
    Mov,
    // 7XNN 	Const 	Vx += NN, no carry
    Add,

    // 8XY_
    Ass,
    Or,
    And,
    Xor,
    Addc,
    Subc,
    Shr,
    Subr,
    Shl,

    // 9XY_ 	Cond 	if (Vx != Vy) skip
    Jvneq,
    // ANNN 	MEM 	I = NNN
    Seti,
    // BNNN 	Flow 	PC = V0 + NNN
    Jmv0,
    // CXNN 	Rand 	Vx = rand() % (NN + 1)
    Rnd,
    // DXYN 	Disp 	draw(Vx, Vy, N)
    Drw,

    // EX__
    Keyd,
    Keyu,

    // FX__
    Getdt,
    Getk,
    Setdt,
    Setst,
    Addi,
    Setispr,
    Bcd,
    Dump,
    Load,
}

impl Op {
    /// True for the ops that touch the framebuffer
    pub fn is_display_op(&self) -> bool {
        matches!(self, Op::Cld | Op::Drw)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Cld => "CLD",
            Op::Ret => "RET",
            Op::Goto => "GOTO",
            Op::Calls => "CALLS",
            Op::Jeq => "JEQ",
            Op::Jneq => "JNEQ",
            Op::Jveq => "JVEQ",
            Op::Mov => "MOV",
            Op::Add => "ADD",
            Op::Ass => "ASS",
            Op::Or => "OR",
            Op::And => "AND",
            Op::Xor => "XOR",
            Op::Addc => "ADDC",
            Op::Subc => "SUBC",
            Op::Shr => "SHR",
            Op::Subr => "SUBR",
            Op::Shl => "SHL",
            Op::Jvneq => "JVNEQ",
            Op::Seti => "SETI",
            Op::Jmv0 => "JMV0",
            Op::Rnd => "RND",
            Op::Drw => "DRW",
            Op::Keyd => "KEYD",
            Op::Keyu => "KEYU",
            Op::Getdt => "GETDT",
            Op::Getk => "GETK",
            Op::Setdt => "SETDT",
            Op::Setst => "SETST",
            Op::Addi => "ADDI",
            Op::Setispr => "SETISPR",
            Op::Bcd => "BCD",
            Op::Dump => "DUMP",
            Op::Load => "LOAD",
        }
    }
}

/// A decoded opcode: the operation plus the low 12 bits of the opcode. The operand
/// fields are only pulled apart when the executor asks for them.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Instruction {
    op: Op,
    operand: u16,
}

impl Instruction {
    pub fn new(op: Op, operand: u16) -> Self {
        Instruction {
            op,
            operand: operand & 0x0FFF,
        }
    }

    /// Decode a big-endian opcode. The `0x0`, `0xE` and `0xF` groups are selected by
    /// the low byte and the `0x8` group by the low nibble; anything without a mapping
    /// is rejected, never guessed at.
    pub fn decode(opcode: u16) -> Result<Self> {
        let unknown = Error::UnknownOpcode { opcode };
        let low_byte = opcode & 0x00FF;

        let op = match opcode >> 12 {
            0x0 => match low_byte {
                0xE0 => Op::Cld,
                0xEE => Op::Ret,
                _ => return Err(unknown),
            },
            0x1 => Op::Goto,
            0x2 => Op::Calls,
            0x3 => Op::Jeq,
            0x4 => Op::Jneq,
            0x5 => Op::Jveq,
            0x6 => Op::Mov,
            0x7 => Op::Add,
            0x8 => match opcode & 0x000F {
                0x0 => Op::Ass,
                0x1 => Op::Or,
                0x2 => Op::And,
                0x3 => Op::Xor,
                0x4 => Op::Addc,
                0x5 => Op::Subc,
                0x6 => Op::Shr,
                0x7 => Op::Subr,
                0xE => Op::Shl,
                _ => return Err(unknown),
            },
            0x9 => Op::Jvneq,
            0xA => Op::Seti,
            0xB => Op::Jmv0,
            0xC => Op::Rnd,
            0xD => Op::Drw,
            0xE => match low_byte {
                0x9E => Op::Keyd,
                0xA1 => Op::Keyu,
                _ => return Err(unknown),
            },
            0xF => match low_byte {
                0x07 => Op::Getdt,
                0x0A => Op::Getk,
                0x15 => Op::Setdt,
                0x18 => Op::Setst,
                0x1E => Op::Addi,
                0x29 => Op::Setispr,
                0x33 => Op::Bcd,
                0x55 => Op::Dump,
                0x65 => Op::Load,
                _ => return Err(unknown),
            },
            _ => return Err(unknown),
        };

        Ok(Instruction::new(op, opcode))
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> u16 {
        self.operand
    }

    /// register index in bits 8-11
    pub fn x(&self) -> usize {
        ((self.operand >> 8) & 0xF) as usize
    }

    /// register index in bits 4-7
    pub fn y(&self) -> usize {
        ((self.operand >> 4) & 0xF) as usize
    }

    /// immediate byte in bits 0-7
    pub fn nn(&self) -> u8 {
        (self.operand & 0xFF) as u8
    }

    /// address in bits 0-11
    pub fn nnn(&self) -> u16 {
        self.operand
    }

    /// nibble in bits 0-3
    pub fn n(&self) -> u8 {
        (self.operand & 0xF) as u8
    }
}

impl TryFrom<u16> for Instruction {
    type Error = Error;

    fn try_from(opcode: u16) -> Result<Self> {
        Instruction::decode(opcode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op.mnemonic();
        match self.op {
            Op::Cld | Op::Ret => write!(f, "{}", name),
            Op::Goto | Op::Calls | Op::Seti | Op::Jmv0 => {
                write!(f, "{:<5} {:#X}", name, self.nnn())
            }
            Op::Jeq | Op::Jneq | Op::Mov | Op::Add | Op::Rnd => {
                write!(f, "{:<5} V{:X} {:#X}", name, self.x(), self.nn())
            }
            Op::Jveq
            | Op::Jvneq
            | Op::Ass
            | Op::Or
            | Op::And
            | Op::Xor
            | Op::Addc
            | Op::Subc
            | Op::Shr
            | Op::Subr
            | Op::Shl => write!(f, "{:<5} V{:X} V{:X}", name, self.x(), self.y()),
            Op::Drw => write!(
                f,
                "{:<5} V{:X} V{:X} {:#X}",
                name,
                self.x(),
                self.y(),
                self.n()
            ),
            _ => write!(f, "{:<5} V{:X}", name, self.x()),
        }
    }
}
