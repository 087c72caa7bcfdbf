//! Pull-based decoder interface shared by the VGM and NSF players.

/// Metadata extracted from a chiptune container.
///
/// VGM files carry a GD3 tag, NSF files carry three fixed 32-byte header
/// strings. Fields that a format does not provide stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Track title.
    pub title: String,
    /// Game or program the track comes from.
    pub game: String,
    /// System / hardware the track was written for.
    pub system: String,
    /// Composer or author string.
    pub author: String,
    /// Release date as stored in the file (free-form).
    pub date: String,
    /// Notes, ripper credits or copyright text.
    pub comments: String,
}

/// Unified pull interface over the chiptune playback engines.
///
/// A decoder owns its chip instances and byte cursor; the caller repeatedly
/// asks for PCM until the stream ends. Decoding is synchronous and
/// single-threaded: `decode_pcm` runs until the buffer is full, the stream
/// ends, or the duration cap fires, then returns the bytes written.
pub trait PcmDecoder {
    /// Decode interleaved little-endian `s16 left, s16 right` frames into
    /// `out`. Returns the number of bytes written; 0 means end of stream.
    ///
    /// Only whole 4-byte frames are ever written.
    fn decode_pcm(&mut self, out: &mut [u8]) -> usize;

    /// Number of selectable tracks. VGM containers always hold one.
    fn track_count(&self) -> u32 {
        1
    }

    /// Select a track. Returns `true` on success. Decoders for single-track
    /// formats accept index 0 as a no-op.
    fn set_track(&mut self, track: u32) -> bool {
        track == 0
    }

    /// Set the output volume. 64 is unity gain, 255 the maximum boost.
    fn set_volume(&mut self, volume: u16);

    /// Set the host sample rate the caller pulls at.
    ///
    /// The chips keep running at 44.1 kHz; the rate converter resamples.
    fn set_sample_frequency(&mut self, frequency: u32);

    /// Cap playback at `milliseconds` of virtual time.
    fn set_max_duration(&mut self, milliseconds: u32);

    /// Metadata for the loaded track.
    fn metadata(&self) -> &TrackMetadata;
}
