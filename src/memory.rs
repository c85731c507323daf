use crate::error::{Error, Result};
use std::ops::Range;

// NB. addresses are u16 as the CHIP 8 sees them; lengths and indices into the
// buffer are usize to stop endless casting

/// 4K of RAM
pub const MEMORY_SIZE: usize = 0x1000;

/// Memory map:
///   0x000-0x1ff  font table
///   0x200-0xe9f  program
///   0xea0-0xeff  call stack
///   0xf00-0xfff  display refresh
pub const FONT_REGION: Range<usize> = 0x000..0x200;
pub const PROGRAM_REGION: Range<usize> = 0x200..0xEA0;
pub const STACK_REGION: Range<usize> = 0xEA0..0xF00;
pub const DISPLAY_REGION: Range<usize> = 0xF00..0x1000;

/// where programs get loaded and where the program counter starts
pub const PROGRAM_START: u16 = 0x200;

/// the stack pointer starts one past the stack region and grows downward
pub const STACK_TOP: u16 = 0xF00;
const STACK_BOTTOM: u16 = 0xEA0;

pub const FONT_ADDR: u16 = 0x000;
pub const NUM_BYTES_IN_FONT_CHAR: u16 = 5;

const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The flat 4096 byte address space plus the call stack pointer that lives
/// inside it. Every access is bounds checked and reported as an `Error`.
pub struct Memory {
    bytes: Box<[u8]>,
    sp: u16,
}

impl Memory {
    /// A zeroed address space with the hex font written at `FONT_ADDR`
    pub fn new() -> Self {
        let mut bytes = vec![0u8; MEMORY_SIZE].into_boxed_slice();
        let font_start = FONT_ADDR as usize;
        bytes[font_start..font_start + FONT_SET.len()].copy_from_slice(&FONT_SET);

        Memory {
            bytes,
            sp: STACK_TOP,
        }
    }

    /// Address of the glyph for the hex digit `value`
    pub fn font_glyph_addr(value: u8) -> Result<u16> {
        if value > 0xF {
            return Err(Error::InvalidFontIndex { value });
        }
        Ok(FONT_ADDR + value as u16 * NUM_BYTES_IN_FONT_CHAR)
    }

    pub fn read_byte(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Error::AddressOutOfRange { addr })
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<()> {
        let byte = self
            .bytes
            .get_mut(addr)
            .ok_or(Error::AddressOutOfRange { addr })?;
        *byte = value;
        Ok(())
    }

    /// get a r/o slice of `len` bytes starting at `addr`
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        let range = Self::checked_range(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// get a r/w slice of `len` bytes starting at `addr`
    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        let range = Self::checked_range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn checked_range(addr: usize, len: usize) -> Result<Range<usize>> {
        let end = addr
            .checked_add(len)
            .filter(|end| *end <= MEMORY_SIZE)
            .ok_or(Error::AddressOutOfRange {
                addr: addr.saturating_add(len.saturating_sub(1)),
            })?;
        Ok(addr..end)
    }

    /// Read the big-endian opcode stored at `addr`
    pub fn read_opcode(&self, addr: usize) -> Result<u16> {
        let word = self.slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// Copy a program image (opcodes in big-endian byte order, as they sit in a
    /// ROM file) into program space
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let max = PROGRAM_REGION.len();
        if program.len() > max {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }
        self.program_mut()[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Write opcodes into program space. Each word is stored big-endian whatever
    /// the host byte order is.
    pub fn load_opcodes(&mut self, opcodes: &[u16]) -> Result<()> {
        let bytes: Vec<u8> = opcodes.iter().flat_map(|op| op.to_be_bytes().to_vec()).collect();
        self.load_program(&bytes)
    }

    /// Zero the first `count` opcodes of program space
    pub fn clear_program(&mut self, count: usize) {
        let program = self.program_mut();
        let len = (count * 2).min(program.len());
        for byte in &mut program[..len] {
            *byte = 0;
        }
    }

    /// The `count` opcodes stored from `start` onward
    pub fn opcodes(&self, start: usize, count: usize) -> Result<Vec<u16>> {
        let bytes = self.slice(start, count * 2)?;
        Ok(bytes
            .chunks(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]))
            .collect())
    }

    pub fn font(&self) -> &[u8] {
        &self.bytes[FONT_REGION]
    }

    pub fn program(&self) -> &[u8] {
        &self.bytes[PROGRAM_REGION]
    }

    fn program_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[PROGRAM_REGION]
    }

    pub fn stack(&self) -> &[u8] {
        &self.bytes[STACK_REGION]
    }

    pub fn display(&self) -> &[u8] {
        &self.bytes[DISPLAY_REGION]
    }

    pub fn display_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[DISPLAY_REGION]
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    /// Number of return addresses currently on the call stack
    pub fn stack_depth(&self) -> usize {
        ((STACK_TOP - self.sp) / 2) as usize
    }

    /// Push a return address. The full address is stored big-endian in the two
    /// bytes below the stack pointer.
    pub fn push(&mut self, addr: u16) -> Result<()> {
        if self.sp < STACK_BOTTOM + 2 {
            return Err(Error::StackOverflow { sp: self.sp });
        }
        self.sp -= 2;
        let slot = self.sp as usize;
        self.bytes[slot..slot + 2].copy_from_slice(&addr.to_be_bytes());
        Ok(())
    }

    /// Pop the most recently pushed return address
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp >= STACK_TOP {
            return Err(Error::StackUnderflow { sp: self.sp });
        }
        let slot = self.sp as usize;
        let addr = u16::from_be_bytes([self.bytes[slot], self.bytes[slot + 1]]);
        self.sp += 2;
        Ok(addr)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}
