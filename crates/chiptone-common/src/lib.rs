//! Common traits and types shared by the chiptone decoders.
//!
//! This crate provides the abstractions used by both playback paths:
//!
//! - [`PcmDecoder`] - Pull-based decoding interface implemented by the VGM
//!   and NSF players
//! - [`SamplePump`] - Chip-rate to host-rate converter with peak-preserving
//!   downsampling
//! - [`TrackMetadata`] - Title/author/system information extracted from the
//!   container formats
//!
//! # Example
//!
//! ```ignore
//! use chiptone_common::PcmDecoder;
//!
//! fn drain(decoder: &mut impl PcmDecoder) {
//!     let mut buffer = [0u8; 4096];
//!     loop {
//!         let written = decoder.decode_pcm(&mut buffer);
//!         if written == 0 {
//!             break;
//!         }
//!         // ... hand buffer[..written] to the output sink
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod decoder;
mod pump;

pub use decoder::{PcmDecoder, TrackMetadata};
pub use pump::SamplePump;

// ============================================================================
// Common Constants
// ============================================================================

/// Chip-native sample rate. VGM streams are always timed in 44.1 kHz samples
/// and both chip emulations produce one sample per tick at this rate.
pub const CHIP_SAMPLE_RATE: u32 = 44_100;

/// Default playback cap (3 minutes), expressed in milliseconds.
pub const DEFAULT_MAX_DURATION_MS: u32 = 3 * 60 * 1000;

/// NTSC NES CPU clock frequency (2A03).
pub const NTSC_CPU_CLOCK: u32 = 1_789_773;

/// Default AY-3-8910 chip clock when the container does not supply one.
pub const DEFAULT_PSG_CLOCK: u32 = 3_579_545;

/// Bytes per emitted stereo frame (s16 left + s16 right, little-endian).
pub const FRAME_BYTES: usize = 4;
