//! NES APU emulation and the 6502 machine that hosts it.
//!
//! Three pieces make up the NSF/VGM sound path of the NES:
//!
//! - [`Apu`] - the 2A03 audio unit: two pulse channels, triangle, noise,
//!   DMC and the frame sequencer, pulled at 44.1 kHz
//! - [`NesMachine`] - a 64 KiB address space implementing the CPU bus,
//!   overlaying the APU registers at `$4000-$4017` and the NSF 4 KiB bank
//!   switch ports at `$5FF8-$5FFF`
//! - [`call_subroutine`] - a sentinel-return harness that runs NSF
//!   init/play routines on a `mos6502` core with a cycle budget
//!
//! The VGM path drives the machine's registers directly from the command
//! stream; the NSF path lets the emulated CPU do the writes.

#![warn(missing_docs)]

mod apu;
mod cpu;
mod machine;

pub use apu::Apu;
pub use cpu::{call_subroutine, CallResult, NesCpu, DEFAULT_CALL_CYCLE_BUDGET};
pub use machine::NesMachine;
