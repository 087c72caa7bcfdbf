//! Chip variant identification and DAC level tables.
//!
//! The PSG's DAC is logarithmic. Each variant family maps its amplitude
//! steps through a table `L[i] = round(65535 * 10^(-(mask - i) * db / 10))`
//! where `db` is the step size of that family's DAC and `mask` the top
//! amplitude index. Tables are generated once on first use.

use std::sync::OnceLock;

/// dB per amplitude step on the AY-3-8910 family DAC.
pub const AY_STEP_DB: f64 = 0.75;

/// dB per amplitude step on the Yamaha (YM) family DAC.
pub const YM_STEP_DB: f64 = 1.5;

/// Chip variant as encoded in the VGM header's AY8910 type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    /// General Instrument AY-3-8910.
    Ay8910,
    /// AY-3-8912 (28-pin package, one I/O port).
    Ay8912,
    /// AY-3-8913 (24-pin package, no I/O ports).
    Ay8913,
    /// AY8930 enhanced PSG (32-step envelope resolution).
    Ay8930,
    /// AY-3-8914 (Intellivision variant).
    Ay8914,
    /// Yamaha YM2149.
    Ym2149,
    /// Yamaha YM3439 (CMOS YM2149).
    Ym3439,
    /// Yamaha YMZ284.
    Ymz284,
    /// Yamaha YMZ294.
    Ymz294,
    /// SSG part of the Yamaha YM2203.
    Ym2203,
    /// SSG part of the Yamaha YM2608.
    Ym2608,
    /// SSG part of the Yamaha YM2610.
    Ym2610,
    /// SSG part of the Yamaha YM2610B.
    Ym2610b,
}

impl ChipVariant {
    /// Decode the VGM header type byte. Unknown tags fall back to AY8910.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x00 => ChipVariant::Ay8910,
            0x01 => ChipVariant::Ay8912,
            0x02 => ChipVariant::Ay8913,
            0x03 => ChipVariant::Ay8930,
            0x04 => ChipVariant::Ay8914,
            0x10 => ChipVariant::Ym2149,
            0x11 => ChipVariant::Ym3439,
            0x12 => ChipVariant::Ymz284,
            0x13 => ChipVariant::Ymz294,
            0x20 => ChipVariant::Ym2203,
            0x21 => ChipVariant::Ym2608,
            0x22 => ChipVariant::Ym2610,
            0x23 => ChipVariant::Ym2610b,
            _ => ChipVariant::Ay8910,
        }
    }

    /// Top envelope/amplitude index: 0x1F on the AY8930, 0x0F elsewhere.
    pub fn env_step_mask(self) -> u8 {
        match self {
            ChipVariant::Ay8930 => 0x1F,
            _ => 0x0F,
        }
    }

    /// Whether this is a Yamaha-family part (different DAC step size).
    pub fn is_ym(self) -> bool {
        matches!(
            self,
            ChipVariant::Ym2149
                | ChipVariant::Ym3439
                | ChipVariant::Ymz284
                | ChipVariant::Ymz294
                | ChipVariant::Ym2203
                | ChipVariant::Ym2608
                | ChipVariant::Ym2610
                | ChipVariant::Ym2610b
        )
    }

    /// The DAC level table for this variant.
    pub fn level_table(self) -> &'static [u16] {
        match self {
            ChipVariant::Ay8930 => ay8930_levels(),
            v if v.is_ym() => ym_levels(),
            _ => ay_levels(),
        }
    }
}

fn build_levels<const N: usize>(step_db: f64) -> [u16; N] {
    let mask = (N - 1) as f64;
    let mut table = [0u16; N];
    for (i, entry) in table.iter_mut().enumerate() {
        let attenuation = (mask - i as f64) * step_db;
        *entry = (65535.0 * 10f64.powf(-attenuation / 10.0)).round() as u16;
    }
    // Amplitude 0 is silence on hardware, not the formula's noise floor.
    table[0] = 0;
    table
}

fn ay_levels() -> &'static [u16] {
    static TABLE: OnceLock<[u16; 16]> = OnceLock::new();
    TABLE.get_or_init(|| build_levels(AY_STEP_DB))
}

fn ym_levels() -> &'static [u16] {
    static TABLE: OnceLock<[u16; 16]> = OnceLock::new();
    TABLE.get_or_init(|| build_levels(YM_STEP_DB))
}

fn ay8930_levels() -> &'static [u16] {
    static TABLE: OnceLock<[u16; 32]> = OnceLock::new();
    TABLE.get_or_init(|| build_levels(AY_STEP_DB))
}
