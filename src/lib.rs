//! A CHIP 8 virtual machine: the machine state plus the decode/execute engine.
//! Windowing, host key mapping, frame pacing and ROM files belong to the caller,
//! which drives the machine through `step`, the keypad setters, `tick_timers` and
//! the framebuffer view.

// # Interpreter
// * 4096 (0x1000) bytes of memory
// * the font table lives in the first 512 (0x200) bytes
// * uppermost 256 (0xF00-0xFFF) bytes are used for display refresh
// * 96 (0xEA0-0xEFF) for the call stack, return addresses only
// * 16 8-bit registers: V0 - VF
// * VF if used is the carry flag in addition operations, "no borrow" flag in subtraction, in draw
// operation the VF flag is set to denote pixel collision
// * the address register I is 12 bits wide

// # Timers
// * two timers counting down at 60 hertz, driven by the elapsed time the caller reports
//  - delay timer is used for events, it can be set and read
//  - sound timer beeps when its value is nonzero

// # Input
// there is a 16 symbol hex keyboard with values 0 - F. There are 3 opcode that deal with handling input
//  - one skips an instruction if a specific key is pressed
//  - one skips an instruction if a specific key is NOT pressed
//  - waits for a key press and release and stores the key in a register

// # Graphics
// 64x32 pixels

use std::convert::TryFrom;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slog::{debug, error, info, o, trace, Discard, Logger};

pub mod config;
pub mod error;
pub mod graphics;
pub mod keyboard;
pub mod memory;
pub mod op;
pub mod timer;


pub use config::Config;
pub use error::{Error, Result};
pub use graphics::{Framebuffer, HEIGHT, WIDTH};
pub use keyboard::{AsKeyboard, Key, KeyWait};
pub use memory::{Memory, PROGRAM_START};
pub use op::{Instruction, Op};

use keyboard::{Keypad, Poll};
use memory::PROGRAM_REGION;
use timer::Timers;

pub const NUM_REGISTERS: usize = 16;

/// longest sprite a DXYN instruction can draw
const MAX_SPRITE_ROWS: usize = 15;

pub struct Emulator {
    memory: Memory, // 4k of RAM, font, call stack and framebuffer included

    pc: u16,                 // program counter
    v: [u8; NUM_REGISTERS], // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    addr: u16,               // the I register

    timers: Timers,
    keypad: Keypad,

    halted: bool,
    display_changed: bool,

    rng: StdRng,
    max_steps: Option<usize>,
    logger: Logger,
}

impl Emulator {
    /// Create an emulator with the font loaded and the program counter at 0x200.
    /// Pass `None` for the logger to discard all log output.
    pub fn new(config: &Config, logger: Option<Logger>) -> Self {
        let logger = logger.unwrap_or_else(|| Logger::root(Discard, o!()));
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Emulator {
            memory: Memory::new(),
            pc: PROGRAM_START,
            v: [0; NUM_REGISTERS],
            addr: 0,
            timers: Timers::new(),
            keypad: Keypad::new(),
            halted: false,
            display_changed: false,
            rng,
            max_steps: config.max_steps,
            logger,
        }
    }

    /// Copy a program image into memory at 0x200. The bytes are opcodes in
    /// big-endian order, exactly as they sit in a ROM file.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.memory.load_program(program)?;
        info!(self.logger, "loaded program"; "bytes" => program.len());
        Ok(())
    }

    /// Write opcodes into memory at 0x200
    pub fn load_opcodes(&mut self, opcodes: &[u16]) -> Result<()> {
        self.memory.load_opcodes(opcodes)?;
        info!(self.logger, "loaded program"; "opcodes" => opcodes.len());
        Ok(())
    }

    /// Zero the first `count` opcodes of program space
    pub fn clear_program(&mut self, count: usize) {
        self.memory.clear_program(count);
    }

    /// Execute exactly one instruction: fetch the opcode at the program counter,
    /// decode it, move the counter past it, then execute it.
    ///
    /// Any error halts the emulator. It is reported once, here, and every later
    /// call returns `Error::Halted`.
    pub fn step(&mut self) -> Result<Op> {
        if self.halted {
            return Err(Error::Halted);
        }

        self.cycle().map_err(|err| {
            error!(self.logger, "program error, halting";
                "pc" => format!("{:#05X}", self.pc),
                "error" => %err);
            self.halted = true;
            err
        })
    }

    fn cycle(&mut self) -> Result<Op> {
        let pc = self.pc as usize;
        if pc < PROGRAM_REGION.start || pc + 1 >= PROGRAM_REGION.end {
            return Err(Error::ProgramCounterOutOfRange { pc: self.pc });
        }

        let opcode = self.memory.read_opcode(pc)?;
        let inst = Instruction::try_from(opcode)?;
        trace!(self.logger, "execute";
            "pc" => format!("{:#05X}", pc),
            "opcode" => format!("{:04X}", opcode),
            "inst" => %inst);

        self.pc += 2;
        self.execute(inst)?;
        Ok(inst.op())
    }

    /// Step `max_steps` times, stopping at the first error. Returns the number of
    /// instructions executed.
    pub fn run(&mut self, max_steps: usize) -> Result<usize> {
        for _ in 0..max_steps {
            self.step()?;
        }
        Ok(max_steps)
    }

    /// Run for the configured number of steps, or until an error when no limit
    /// is configured
    pub fn run_configured(&mut self) -> Result<usize> {
        match self.max_steps {
            Some(max_steps) => self.run(max_steps),
            None => loop {
                self.step()?;
            },
        }
    }

    /// Apply one decoded instruction to the machine. The program counter is
    /// expected to already point past the instruction.
    pub fn execute(&mut self, inst: Instruction) -> Result<()> {
        let x = inst.x();
        let y = inst.y();

        match inst.op() {
            Op::Cld => {
                graphics::clear(self.memory.display_mut());
                self.display_changed = true;
            }
            Op::Ret => self.pc = self.memory.pop()?,
            Op::Goto => self.pc = inst.nnn(),
            Op::Calls => {
                self.memory.push(self.pc)?;
                self.pc = inst.nnn();
            }
            Op::Jeq => self.skip_if(self.v[x] == inst.nn()),
            Op::Jneq => self.skip_if(self.v[x] != inst.nn()),
            Op::Jveq => self.skip_if(self.v[x] == self.v[y]),
            Op::Jvneq => self.skip_if(self.v[x] != self.v[y]),
            Op::Mov => self.v[x] = inst.nn(),
            Op::Add => self.v[x] = self.v[x].wrapping_add(inst.nn()),
            Op::Ass => self.v[x] = self.v[y],
            Op::Or => self.v[x] |= self.v[y],
            Op::And => self.v[x] &= self.v[y],
            Op::Xor => self.v[x] ^= self.v[y],
            Op::Addc => {
                let (result, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = result;
                self.v[0xF] = carry as u8;
            }
            Op::Subc => {
                let (result, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = result;
                self.v[0xF] = !borrow as u8;
            }
            Op::Subr => {
                let (result, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = result;
                self.v[0xF] = !borrow as u8;
            }
            Op::Shr => {
                let shifted_out = self.v[x] & 0x1;
                self.v[x] >>= 1;
                self.v[0xF] = shifted_out;
            }
            Op::Shl => {
                let shifted_out = self.v[x] >> 7;
                self.v[x] <<= 1;
                self.v[0xF] = shifted_out;
            }
            Op::Seti => self.addr = inst.nnn(),
            Op::Jmv0 => self.pc = self.v[0] as u16 + inst.nnn(),
            Op::Rnd => {
                // the range includes NN itself, CX00 always yields 0
                let byte: u8 = self.rng.gen();
                self.v[x] = (byte as u16 % (inst.nn() as u16 + 1)) as u8;
            }
            Op::Drw => self.draw(inst)?,
            Op::Keyd => {
                let key = self.key_index(x)?;
                self.skip_if(self.keypad.is_pressed(key));
            }
            Op::Keyu => {
                let key = self.key_index(x)?;
                self.skip_if(!self.keypad.is_pressed(key));
            }
            Op::Getdt => self.v[x] = self.timers.delay(),
            Op::Getk => self.wait_for_key(x),
            Op::Setdt => self.timers.set_delay(self.v[x]),
            Op::Setst => self.timers.set_sound(self.v[x]),
            Op::Addi => self.addr = self.addr.wrapping_add(self.v[x] as u16) & 0x0FFF,
            Op::Setispr => self.addr = Memory::font_glyph_addr(self.v[x])?,
            Op::Bcd => {
                let value = self.v[x];
                let digits = [value / 100, value / 10 % 10, value % 10];
                self.memory
                    .slice_mut(self.addr as usize, 3)?
                    .copy_from_slice(&digits);
            }
            Op::Dump => {
                self.memory
                    .slice_mut(self.addr as usize, x + 1)?
                    .copy_from_slice(&self.v[..=x]);
            }
            Op::Load => {
                let src = self.memory.slice(self.addr as usize, x + 1)?;
                self.v[..=x].copy_from_slice(src);
            }
        }

        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    fn key_index(&self, x: usize) -> Result<usize> {
        Key::try_from(self.v[x]).map(usize::from)
    }

    /// DXYN: draw the N byte sprite at I to (Vx, Vy), VF set on collision
    fn draw(&mut self, inst: Instruction) -> Result<()> {
        let x = self.v[inst.x()];
        let y = self.v[inst.y()];
        let rows = inst.n() as usize;

        let mut sprite = [0u8; MAX_SPRITE_ROWS];
        sprite[..rows].copy_from_slice(self.memory.slice(self.addr as usize, rows)?);

        let collision = graphics::draw_sprite(self.memory.display_mut(), x, y, &sprite[..rows]);
        self.v[0xF] = collision as u8;
        self.display_changed = true;
        Ok(())
    }

    /// FX0A: hold the program counter on this instruction until a key goes down and
    /// comes back up. The key is stored in Vx as soon as it is pressed.
    fn wait_for_key(&mut self, x: usize) {
        match self.keypad.poll_key_wait() {
            Poll::Repeat => self.pc = self.pc.wrapping_sub(2),
            Poll::Latched(key) => {
                let key = key as u8;
                debug!(self.logger, "key latched"; "key" => key, "register" => x);
                self.v[x] = key;
                self.pc = self.pc.wrapping_sub(2);
            }
            Poll::Done => {}
        }
    }

    /// Set key `idx` (0x0-0xF) up or down
    pub fn set_key(&mut self, idx: usize, pressed: bool) {
        self.keypad.set(idx, pressed);
    }

    /// Mark the given keys down and all others up
    pub fn set_keys(&mut self, keys: &[Key]) {
        self.keypad.update_with_keys(keys);
    }

    /// check for key press changes and update the Emulator with which keys are up or down
    pub fn handle_key_input(&mut self, keyboard: &impl AsKeyboard) {
        self.set_keys(&keyboard.keys_down());
    }

    pub fn key_state(&self, idx: usize) -> bool {
        self.keypad.is_pressed(idx)
    }

    /// Count both timers down by `elapsed_secs` seconds worth of 60 Hz ticks
    pub fn tick_timers(&mut self, elapsed_secs: f64) {
        self.timers.tick(elapsed_secs);
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    pub fn framebuffer(&self) -> Framebuffer<'_> {
        Framebuffer::new(self.memory.display())
    }

    /// True once a CLD or DRW has run since the last `clear_display_changed`
    pub fn display_changed(&self) -> bool {
        self.display_changed
    }

    /// Called by the display consumer after it has read the framebuffer
    pub fn clear_display_changed(&mut self) {
        self.display_changed = false;
    }

    /// True while an FX0A instruction is waiting on the keypad
    pub fn is_blocked(&self) -> bool {
        self.keypad.is_blocking()
    }

    /// True once FX0A has latched a key and is waiting for its release
    pub fn is_waiting_release(&self) -> bool {
        self.keypad.is_waiting_release()
    }

    pub fn key_wait(&self) -> KeyWait {
        self.keypad.wait_state()
    }

    /// Stop the emulator; every later `step` returns `Error::Halted`
    pub fn halt(&mut self) {
        debug!(self.logger, "halted by host"; "pc" => format!("{:#05X}", self.pc));
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.memory.sp()
    }

    /// The I register
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn register(&self, idx: usize) -> Option<u8> {
        self.v.get(idx).copied()
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// One line per opcode from `start`: address, raw opcode and mnemonic. Words
    /// that don't decode are listed as `???`.
    pub fn disassemble(&self, start: u16, count: usize) -> Result<Vec<String>> {
        let opcodes = self.memory.opcodes(start as usize, count)?;
        Ok(opcodes
            .iter()
            .enumerate()
            .map(|(i, &opcode)| {
                let addr = start as usize + i * 2;
                match Instruction::decode(opcode) {
                    Ok(inst) => format!("{:#05X}  {:04X}  {}", addr, opcode, inst),
                    Err(_) => format!("{:#05X}  {:04X}  ???", addr, opcode),
                }
            })
            .collect())
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator::new(&Config::default(), None)
    }
}
