//! chiptone - VGM and NSF chiptune decoding to stereo PCM.
//!
//! The engine auto-detects the container format from the image magic and
//! decodes it by cycle-level emulation of the referenced sound chip: the
//! AY-3-8910 / YM2149 PSG family for VGM register streams, the NES APU
//! (driven by an emulated 6502 running the tune's own player code) for
//! NSF images. Output is interleaved little-endian `s16 left, s16 right`
//! frames at a caller-chosen host rate.
//!
//! # Quick start
//! ```no_run
//! use chiptone::{ChiptuneDecoder, PcmDecoder};
//!
//! let image = std::fs::read("tune.vgm").unwrap();
//! let mut decoder = ChiptuneDecoder::open(&image).unwrap();
//! decoder.set_sample_frequency(44_100);
//! let mut buffer = vec![0u8; 4096];
//! loop {
//!     let written = decoder.decode_pcm(&mut buffer);
//!     if written == 0 {
//!         break;
//!     }
//!     // ... hand buffer[..written] to the audio sink
//! }
//! ```

#![warn(missing_docs)]

use chiptone_nsf::{NsfError, NsfPlayer};
use chiptone_vgm::{VgmError, VgmPlayer};
use thiserror::Error;

pub use chiptone_common::{
    PcmDecoder, SamplePump, TrackMetadata, CHIP_SAMPLE_RATE, DEFAULT_MAX_DURATION_MS,
};
pub use chiptone_nes::{Apu, NesMachine};
pub use chiptone_psg::{Ay38910, ChipVariant};

/// Errors from [`ChiptuneDecoder::open`].
#[derive(Debug, Error)]
pub enum OpenError {
    /// The image starts with neither `"Vgm "` nor `"NESM"`.
    #[error("unrecognised image format")]
    UnrecognisedFormat,
    /// A VGM image failed validation.
    #[error(transparent)]
    Vgm(#[from] VgmError),
    /// An NSF image failed validation or its init routine faulted.
    #[error(transparent)]
    Nsf(#[from] NsfError),
}

/// The two formats the engine decodes. Dispatch is a closed enum: the
/// format set is fixed and known at compile time.
enum Decoder<'a> {
    Vgm(VgmPlayer<'a>),
    Nsf(NsfPlayer<'a>),
}

/// Format-detecting decoder facade.
///
/// Borrows the file image read-only for its lifetime; chips, cursor and
/// playback state are owned. Decoding is synchronous pull: see
/// [`PcmDecoder::decode_pcm`].
pub struct ChiptuneDecoder<'a> {
    decoder: Decoder<'a>,
}

impl<'a> ChiptuneDecoder<'a> {
    /// Open an image, auto-detecting VGM or NSF from the magic.
    pub fn open(data: &'a [u8]) -> Result<Self, OpenError> {
        let decoder = match data.get(0..4) {
            Some(b"Vgm ") => Decoder::Vgm(VgmPlayer::open(data)?),
            Some(b"NESM") => Decoder::Nsf(NsfPlayer::open(data)?),
            _ => return Err(OpenError::UnrecognisedFormat),
        };
        Ok(Self { decoder })
    }

    /// Whether the loaded image is an NSF.
    pub fn is_nsf(&self) -> bool {
        matches!(self.decoder, Decoder::Nsf(_))
    }
}

impl PcmDecoder for ChiptuneDecoder<'_> {
    fn decode_pcm(&mut self, out: &mut [u8]) -> usize {
        match &mut self.decoder {
            Decoder::Vgm(player) => player.decode_pcm(out),
            Decoder::Nsf(player) => player.decode_pcm(out),
        }
    }

    fn track_count(&self) -> u32 {
        match &self.decoder {
            Decoder::Vgm(player) => player.track_count(),
            Decoder::Nsf(player) => player.track_count(),
        }
    }

    fn set_track(&mut self, track: u32) -> bool {
        match &mut self.decoder {
            Decoder::Vgm(player) => player.set_track(track),
            Decoder::Nsf(player) => player.set_track(track),
        }
    }

    fn set_volume(&mut self, volume: u16) {
        match &mut self.decoder {
            Decoder::Vgm(player) => player.set_volume(volume),
            Decoder::Nsf(player) => player.set_volume(volume),
        }
    }

    fn set_sample_frequency(&mut self, frequency: u32) {
        match &mut self.decoder {
            Decoder::Vgm(player) => player.set_sample_frequency(frequency),
            Decoder::Nsf(player) => player.set_sample_frequency(frequency),
        }
    }

    fn set_max_duration(&mut self, milliseconds: u32) {
        match &mut self.decoder {
            Decoder::Vgm(player) => player.set_max_duration(milliseconds),
            Decoder::Nsf(player) => player.set_max_duration(milliseconds),
        }
    }

    fn metadata(&self) -> &TrackMetadata {
        match &self.decoder {
            Decoder::Vgm(player) => player.metadata(),
            Decoder::Nsf(player) => player.metadata(),
        }
    }
}
