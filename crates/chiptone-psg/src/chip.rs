//! AY-3-8910 register file, mixer and sample generation.

use crate::generators::{EnvelopeGenerator, FRAC_BITS, NoiseGenerator, NUM_CHANNELS, ToneChannel};
use crate::tables::ChipVariant;
use chiptone_common::{CHIP_SAMPLE_RATE, DEFAULT_PSG_CLOCK};

/// Number of addressable PSG registers (R0-R13 plus the two I/O ports).
const NUM_REGISTERS: usize = 16;

/// Valid bits per register.
const REG_MASK: [u8; NUM_REGISTERS] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0x3F, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF,
];

/// AY-3-8910 / YM2149 family PSG.
///
/// The chip runs at 44.1 kHz sample resolution: every [`Ay38910::get_sample`]
/// call advances the tone, noise and envelope clocks by one sample tick and
/// mixes the three channels into a packed stereo value (low 16 bits left,
/// high 16 bits right; both lanes carry the same mono signal, per-channel
/// stereo masking is accepted on the wire but not rendered).
///
/// # Example
///
/// ```
/// use chiptone_psg::Ay38910;
///
/// let mut chip = Ay38910::new(0x10, 0x00); // YM2149
/// chip.write(0, 0x50);
/// chip.write(7, 0x3E);
/// chip.write(8, 0x0F);
/// let _ = chip.get_sample();
/// ```
#[derive(Clone, Debug)]
pub struct Ay38910 {
    variant: ChipVariant,
    flags: u8,
    registers: [u8; NUM_REGISTERS],
    chip_freq: u32,
    sample_freq: u32,
    /// 16.16 tone clock increment per sample tick.
    tone_scale: u64,
    /// 16.16 envelope clock increment per sample tick.
    env_scale: u64,
    channels: [ToneChannel; NUM_CHANNELS],
    noise: NoiseGenerator,
    envelope: EnvelopeGenerator,
    mixer: u8,
    user_volume: u8,
}

impl Ay38910 {
    /// Create a chip from the VGM header's type and flags bytes.
    ///
    /// Defaults: 3 579 545 Hz chip clock, 44 100 Hz sample rate, volume 64.
    pub fn new(chip_type: u8, flags: u8) -> Self {
        let variant = ChipVariant::from_tag(chip_type);
        let mut chip = Self {
            variant,
            flags,
            registers: [0; NUM_REGISTERS],
            chip_freq: DEFAULT_PSG_CLOCK,
            sample_freq: CHIP_SAMPLE_RATE,
            tone_scale: 0,
            env_scale: 0,
            channels: Default::default(),
            noise: NoiseGenerator::new(),
            envelope: EnvelopeGenerator::new(variant.env_step_mask()),
            mixer: 0x3F,
            user_volume: 64,
        };
        chip.recompute_scales();
        chip.reset();
        chip
    }

    /// Chip variant selected at construction.
    pub fn variant(&self) -> ChipVariant {
        self.variant
    }

    /// Flags byte from the container header (unused by the base variants).
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Reset generators and registers. The mixer comes up with all outputs
    /// disabled (R7 = 0x3F) and the noise LFSR reseeded to 1.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        self.noise.reset();
        self.envelope.reset();
        self.registers = [0; NUM_REGISTERS];
        self.registers[7] = 0x3F;
        self.mixer = 0x3F;
    }

    /// Write a PSG register. Registers outside the window are ignored.
    pub fn write(&mut self, reg: u8, value: u8) {
        let reg = reg as usize;
        if reg >= NUM_REGISTERS {
            return;
        }
        let value = value & REG_MASK[reg];
        self.registers[reg] = value;

        match reg {
            // Tone periods: fine/coarse pairs, counter keeps free-running.
            0..=5 => {
                let channel = reg / 2;
                let base = channel * 2;
                let period =
                    ((self.registers[base + 1] as u32) << 8) | self.registers[base] as u32;
                self.channels[channel].set_period(period);
            }
            6 => self.noise.set_period(value as u32),
            7 => self.mixer = value,
            8..=10 => {
                let channel = reg - 8;
                self.channels[channel].amplitude = value & 0x0F;
                self.channels[channel].use_envelope = value & 0x10 != 0;
            }
            11 | 12 => {
                let period =
                    ((self.registers[12] as u32) << 8) | self.registers[11] as u32;
                self.envelope.set_period(period);
            }
            13 => self.envelope.set_shape(value),
            // I/O port data registers: stored for read-back only.
            _ => {}
        }
    }

    /// Read back the last value written to a register.
    pub fn read(&self, reg: u8) -> u8 {
        self.registers.get(reg as usize).copied().unwrap_or(0)
    }

    /// Set the external chip clock and recompute the clock scales.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.chip_freq = frequency;
        self.recompute_scales();
    }

    /// Set the sample rate the chip is pulled at.
    ///
    /// 44 100 Hz is the engine-wide rate; lower rates degrade high tones
    /// and downsampling should happen behind the chip instead.
    pub fn set_sample_frequency(&mut self, sample_frequency: u32) {
        self.sample_freq = sample_frequency;
        self.recompute_scales();
    }

    /// Currently configured sample rate.
    pub fn sample_frequency(&self) -> u32 {
        self.sample_freq
    }

    /// Set the output volume. 64 is unity gain.
    pub fn set_volume(&mut self, volume: u8) {
        self.user_volume = volume;
    }

    fn recompute_scales(&mut self) {
        let sample = self.sample_freq.max(1) as u64;
        self.tone_scale = ((self.chip_freq as u64) << FRAC_BITS) / (16 * sample);
        self.env_scale = ((self.chip_freq as u64) << FRAC_BITS) / (256 * sample);
    }

    /// Produce one packed stereo sample, advancing the chip by one tick.
    pub fn get_sample(&mut self) -> u32 {
        for channel in &mut self.channels {
            channel.tick(self.tone_scale);
        }
        self.noise.tick(self.tone_scale);
        self.envelope.tick(self.env_scale);

        let table = self.variant.level_table();
        let mut sum: u32 = 0;
        for (i, channel) in self.channels.iter().enumerate() {
            let tone_disabled = self.mixer & (1 << i) != 0;
            let noise_disabled = self.mixer & (1 << (i + 3)) != 0;
            let gate = (channel.output || tone_disabled) && (self.noise.high || noise_disabled);
            if !gate {
                continue;
            }
            let index = if channel.use_envelope {
                self.envelope.volume() as usize
            } else if table.len() == 32 {
                // 4-bit fixed levels sit on the odd steps of the 32-entry DAC.
                ((channel.amplitude as usize) << 1) | 1
            } else {
                channel.amplitude as usize
            };
            sum += table[index] as u32;
        }

        let mono = sum.min(u16::MAX as u32);
        let mono = (mono * self.user_volume as u32 / 64).min(u16::MAX as u32);
        mono | (mono << 16)
    }
}
