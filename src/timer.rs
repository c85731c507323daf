/// Both timers count down at 60 Hz
pub const TIMER_HZ: f64 = 60.0;

/// The delay and sound timers. They hold a count of 60 Hz ticks and are only ever
/// moved by the elapsed time the caller hands to `tick`, never by a clock of their own.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Timers {
    delay: f64,
    sound: f64,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    /// Count both timers down by `elapsed_secs` worth of ticks, stopping at zero.
    /// Negative and non-finite values are ignored.
    pub fn tick(&mut self, elapsed_secs: f64) {
        if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
            return;
        }
        let ticks = elapsed_secs * TIMER_HZ;
        self.delay = (self.delay - ticks).max(0.0);
        self.sound = (self.sound - ticks).max(0.0);
    }

    /// The delay timer truncated to a whole tick
    pub fn delay(&self) -> u8 {
        self.delay as u8
    }

    pub fn sound(&self) -> u8 {
        self.sound as u8
    }

    pub fn set_delay(&mut self, value: u8) {
        self.delay = value as f64;
    }

    pub fn set_sound(&mut self, value: u8) {
        self.sound = value as f64;
    }

    /// The buzzer should sound while the sound timer is nonzero
    pub fn sound_active(&self) -> bool {
        self.sound > 0.0
    }
}
