//! VGM playback for chiptone.
//!
//! A VGM image is a time-indexed stream of chip register writes. This
//! crate parses the header (and its GD3 metadata tag), walks the command
//! stream with the documented operand widths, dispatches the AY-3-8910 and
//! NES APU writes to the emulated chips and pulls PCM through the shared
//! sample pump. Commands for the many chips outside this engine's scope
//! advance the cursor and are otherwise ignored.

#![warn(missing_docs)]

pub mod error;
mod header;
mod player;

pub use error::{Result, VgmError};
pub use header::{VgmHeader, VGM_IDENT};
pub use player::VgmPlayer;
