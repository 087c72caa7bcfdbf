//! AY-3-8910 / YM2149 family PSG emulator.
//!
//! Integer emulation of the General Instrument AY-3-8910 and its Yamaha
//! derivatives: 3 tone channels with 12-bit periods, a shared 17-bit LFSR
//! noise source, the 10-shape hardware envelope and the R7 mixer. The chip
//! produces one packed stereo sample per 44.1 kHz tick.
//!
//! # Quick start
//! ```
//! use chiptone_psg::Ay38910;
//!
//! let mut chip = Ay38910::new(0x00, 0x00); // plain AY-3-8910
//! chip.write(0, 0xFE); // Tone A fine period
//! chip.write(1, 0x00); // Tone A coarse period
//! chip.write(7, 0x3E); // Mixer: tone A on
//! chip.write(8, 0x0F); // Channel A at full fixed level
//! let sample = chip.get_sample();
//! let left = sample as u16;
//! let right = (sample >> 16) as u16;
//! assert_eq!(left, right);
//! ```

#![warn(missing_docs)]

mod chip;
mod generators;
mod tables;

pub use chip::Ay38910;
pub use tables::ChipVariant;
