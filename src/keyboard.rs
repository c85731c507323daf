use std::convert::TryFrom;

use crate::error::Error;

pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard, laid out
/// as
///
/// +-+-+-+-+
/// |1|2|3|C|
/// +-+-+-+-+
/// |4|5|6|D|
/// +-+-+-+-+
/// |7|8|9|E|
/// +-+-+-+-+
/// |A|0|B|F|
/// +-+-+-+-+
///
/// Which host keys produce them is up to the caller.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Key {
    Key0 = 0x0,
    Key1 = 0x1,
    Key2 = 0x2,
    Key3 = 0x3,
    Key4 = 0x4,
    Key5 = 0x5,
    Key6 = 0x6,
    Key7 = 0x7,
    Key8 = 0x8,
    Key9 = 0x9,
    A = 0xA,
    B = 0xB,
    C = 0xC,
    D = 0xD,
    E = 0xE,
    F = 0xF,
}

const ALL_KEYS: [Key; NUM_KEYS] = [
    Key::Key0,
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
];

impl From<Key> for usize {
    fn from(key: Key) -> usize {
        key as usize
    }
}

impl TryFrom<u8> for Key {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        ALL_KEYS
            .get(value as usize)
            .copied()
            .ok_or(Error::InvalidKeyIndex { value })
    }
}

/// Implemented by whatever feeds host input into the emulator
pub trait AsKeyboard {
    /// The keys that are currently held down
    fn keys_down(&self) -> Vec<Key>;
}

/// Where the FX0A (GETK) instruction is in its wait for a key press and release
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeyWait {
    /// Not executing FX0A
    Idle,
    /// Executing FX0A and no key has been pressed yet
    Blocked,
    /// A key was pressed and latched, waiting for that same key to come back up
    WaitingRelease(Key),
}

impl Default for KeyWait {
    fn default() -> Self {
        KeyWait::Idle
    }
}

/// What the executor should do with the program counter after polling FX0A
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Poll {
    /// Stay on the FX0A instruction
    Repeat,
    /// A key was pressed this cycle; latch it and stay on the instruction
    Latched(Key),
    /// The latched key was released, move past the instruction
    Done,
}

/// Contains the state (up or down) of the CHIP-8's 16 keys, as well as any
/// state related to keyboard input
#[derive(Debug, Default)]
pub struct Keypad {
    key_input: [bool; NUM_KEYS],
    wait: KeyWait,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// Set the key at `idx` up or down. Indices past 0xF are ignored.
    pub fn set(&mut self, idx: usize, pressed: bool) {
        if let Some(state) = self.key_input.get_mut(idx) {
            *state = pressed;
        }
    }

    /// Given the keys held down on the host, mark those down and every other key up
    pub fn update_with_keys(&mut self, keys: &[Key]) {
        self.key_input = [false; NUM_KEYS];
        for &key in keys {
            self.key_input[usize::from(key)] = true;
        }
    }

    /// Return whether the key at the given index is down
    pub fn is_pressed(&self, idx: usize) -> bool {
        self.key_input.get(idx).copied().unwrap_or(false)
    }

    /// The lowest key currently held down
    pub fn first_pressed(&self) -> Option<Key> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| self.key_input[usize::from(*key)])
    }

    pub fn wait_state(&self) -> KeyWait {
        self.wait
    }

    /// True while an FX0A instruction is holding up the program
    pub fn is_blocking(&self) -> bool {
        self.wait != KeyWait::Idle
    }

    pub fn is_waiting_release(&self) -> bool {
        matches!(self.wait, KeyWait::WaitingRelease(_))
    }

    /// Advance the FX0A state machine by one execution of the instruction
    pub fn poll_key_wait(&mut self) -> Poll {
        match self.wait {
            KeyWait::Idle | KeyWait::Blocked => match self.first_pressed() {
                Some(key) => {
                    self.wait = KeyWait::WaitingRelease(key);
                    Poll::Latched(key)
                }
                None => {
                    self.wait = KeyWait::Blocked;
                    Poll::Repeat
                }
            },
            KeyWait::WaitingRelease(key) => {
                if self.is_pressed(key.into()) {
                    Poll::Repeat
                } else {
                    self.wait = KeyWait::Idle;
                    Poll::Done
                }
            }
        }
    }
}
