/// Everything that can stop the emulator. Program errors are surfaced once, at the
/// step that hit them, and the emulator halts afterwards.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("unknown opcode {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },

    #[error("stack overflow: no room for a return address below {sp:#05X}")]
    StackOverflow { sp: u16 },

    #[error("stack underflow: return with an empty call stack (sp {sp:#05X})")]
    StackUnderflow { sp: u16 },

    #[error("no font glyph for value {value:#04X}, expected 0x0-0xF")]
    InvalidFontIndex { value: u8 },

    #[error("no key with index {value:#04X}, expected 0x0-0xF")]
    InvalidKeyIndex { value: u8 },

    #[error("program counter {pc:#05X} is outside program space")]
    ProgramCounterOutOfRange { pc: u16 },

    #[error("memory access at {addr:#06X} is out of range")]
    AddressOutOfRange { addr: usize },

    #[error("program is {size} bytes, program space holds {max}")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("emulator is halted")]
    Halted,

    #[error("could not build logger: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, Error>;
