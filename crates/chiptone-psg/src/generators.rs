//! Tone, noise and envelope generators.
//!
//! All generators run on 16.16 fixed-point accumulators: the per-sample
//! increment is `chip_freq / (divisor * sample_freq)` which is well below 1
//! for the envelope clock at usual chip frequencies, so the fractional part
//! must be kept or the generator would never advance.

/// Number of tone channels.
pub const NUM_CHANNELS: usize = 3;

/// Fractional bits of the generator accumulators.
pub const FRAC_BITS: u32 = 16;

/// Tone generator for a single channel.
///
/// A 12-bit period divides the tone clock; every time the accumulated
/// increment crosses the period the output square wave flips. Writing the
/// period registers never resets the counter - the channel free-runs.
#[derive(Clone, Debug, Default)]
pub struct ToneChannel {
    period: u32,
    counter: u64,
    /// Fixed amplitude from R8/R9/R10 (low 4 bits).
    pub amplitude: u8,
    /// Bit 4 of the amplitude register: level comes from the envelope.
    pub use_envelope: bool,
    /// Current square wave phase.
    pub output: bool,
}

impl ToneChannel {
    /// Set the 12-bit period. The counter keeps its value.
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Current period as programmed.
    #[inline]
    #[allow(dead_code)]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Advance by one sample tick worth of tone clock.
    #[inline]
    pub fn tick(&mut self, tone_scale: u64) {
        self.counter += tone_scale;
        // Period 0 counts as 1 on hardware.
        let period = (self.period.max(1) as u64) << FRAC_BITS;
        while self.counter >= period {
            self.counter -= period;
            self.output = !self.output;
        }
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared noise source: 17-bit LFSR stepped by the 5-bit noise period.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    period: u32,
    counter: u64,
    rng: u32,
    /// Current noise output bit.
    pub high: bool,
}

impl NoiseGenerator {
    /// Create a generator with the LFSR seeded to 1.
    pub fn new() -> Self {
        Self {
            period: 0,
            counter: 0,
            // Zero is the absorbing state of the LFSR, the seed must be 1.
            rng: 1,
            high: false,
        }
    }

    /// Set the 5-bit noise period.
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Advance by one sample tick worth of noise clock.
    #[inline]
    pub fn tick(&mut self, tone_scale: u64) {
        self.counter += tone_scale;
        let period = (self.period.max(1) as u64) << FRAC_BITS;
        while self.counter >= period {
            self.counter -= period;
            self.rng = (self.rng >> 1) | (((self.rng ^ (self.rng >> 3)) & 1) << 16);
            self.high = self.rng & 1 != 0;
        }
    }

    /// Current LFSR state (test hook).
    #[inline]
    #[allow(dead_code)]
    pub fn rng(&self) -> u32 {
        self.rng
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Hardware envelope generator.
///
/// The shape register R13 decomposes into continue/attack/alternate/hold
/// bits which drive a piecewise ramp over `step_mask + 1` levels. Writing
/// R13 always restarts the envelope.
#[derive(Clone, Debug)]
pub struct EnvelopeGenerator {
    period: u32,
    counter: u64,
    volume: u8,
    step_mask: u8,
    hold: bool,
    attack: bool,
    continue_: bool,
    alternate: bool,
    holding: bool,
}

impl EnvelopeGenerator {
    /// Create a generator with the given amplitude resolution mask
    /// (0x0F for 16-step chips, 0x1F for the AY8930).
    pub fn new(step_mask: u8) -> Self {
        Self {
            period: 0,
            counter: 0,
            volume: 0,
            step_mask,
            hold: false,
            attack: false,
            continue_: false,
            alternate: false,
            holding: true,
        }
    }

    /// Set the 16-bit envelope period from R11/R12.
    #[inline]
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Write the shape register R13. Restarts the envelope.
    pub fn set_shape(&mut self, shape: u8) {
        self.hold = shape & 0x01 != 0;
        self.alternate = shape & 0x02 != 0;
        self.attack = shape & 0x04 != 0;
        self.continue_ = shape & 0x08 != 0;
        self.holding = false;
        self.counter = 0;
        self.volume = if self.attack { 0 } else { self.step_mask };
    }

    /// Current envelope level (0..=step_mask).
    #[inline]
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Whether the envelope has latched its final level.
    #[inline]
    #[allow(dead_code)]
    pub fn holding(&self) -> bool {
        self.holding
    }

    /// Advance by one sample tick worth of envelope clock.
    #[inline]
    pub fn tick(&mut self, env_scale: u64) {
        self.counter += env_scale;
        let period = (self.period.max(1) as u64) << FRAC_BITS;
        while self.counter >= period {
            self.counter -= period;
            self.step();
        }
    }

    fn step(&mut self) {
        if self.holding {
            return;
        }
        let at_boundary = if self.attack {
            self.volume >= self.step_mask
        } else {
            self.volume == 0
        };
        if !at_boundary {
            self.volume = if self.attack {
                self.volume + 1
            } else {
                self.volume - 1
            };
            return;
        }

        if !self.continue_ {
            self.volume = 0;
            self.holding = true;
        } else if self.hold {
            self.volume = if self.alternate ^ self.attack {
                0
            } else {
                self.step_mask
            };
            self.holding = true;
        } else if self.alternate {
            self.attack = !self.attack;
        } else {
            // Sawtooth: wrap back to the starting end of the ramp.
            self.volume = if self.attack { 0 } else { self.step_mask };
        }
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        let mask = self.step_mask;
        *self = Self::new(mask);
    }
}
