//! VGM header and GD3 tag parsing.

use crate::error::{Result, VgmError};
use chiptone_common::TrackMetadata;

/// `"Vgm "` as a little-endian u32.
pub const VGM_IDENT: u32 = 0x206D_6756;

/// `"Gd3 "` as a little-endian u32.
const GD3_IDENT: u32 = 0x2033_6447;

/// Smallest header any VGM version carries.
const MIN_HEADER_SIZE: usize = 0x40;

/// Parsed VGM header with the fields the engine acts on.
///
/// Offsets are resolved to absolute image positions during parsing; clock
/// fields that sit beyond the start of the command data (older versions)
/// read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VgmHeader {
    /// BCD version, e.g. `0x0000_0161`.
    pub version: u32,
    /// Total sample count as declared (informational).
    pub total_samples: u32,
    /// Absolute loop entry offset; 0 when the track does not loop.
    pub loop_offset: usize,
    /// Declared loop length in samples (informational).
    pub loop_samples: u32,
    /// Playback rate hint; 0 in the file becomes 50.
    pub rate: u32,
    /// Absolute offset of the first command.
    pub data_offset: usize,
    /// Absolute GD3 tag offset; 0 when absent.
    pub gd3_offset: usize,
    /// AY-3-8910 clock; non-zero selects the PSG path.
    pub ay8910_clock: u32,
    /// NES APU clock; non-zero selects the APU path.
    pub nes_apu_clock: u32,
    /// AY-3-8910 variant tag byte.
    pub ay8910_type: u8,
    /// AY-3-8910 flags byte.
    pub ay8910_flags: u8,
    /// Fixed header span for this version (64 below v1.61, else 128).
    pub header_size: usize,
}

impl VgmHeader {
    /// Parse and validate a VGM header.
    ///
    /// Rejects images whose identifier, size or `eof_offset` cross-check
    /// fail, and images whose v1.50+ data offset points outside the file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_HEADER_SIZE {
            return Err(VgmError::TruncatedHeader { size: data.len() });
        }
        if read_u32(data, 0x00) != VGM_IDENT {
            return Err(VgmError::InvalidIdent);
        }
        let eof_offset = read_u32(data, 0x04);
        if eof_offset as usize != data.len() - 4 {
            return Err(VgmError::EofOffsetMismatch {
                stored: eof_offset,
                size: data.len(),
            });
        }

        let version = read_u32(data, 0x08);
        let header_size = if version >= 0x0000_0161 { 0x80 } else { 0x40 };

        let data_offset = if version >= 0x0000_0150 {
            let relative = read_u32(data, 0x34);
            if relative != 0 {
                0x34 + relative as usize
            } else {
                MIN_HEADER_SIZE
            }
        } else {
            MIN_HEADER_SIZE
        };
        if data_offset > data.len() {
            return Err(VgmError::DataOffsetOutOfRange {
                offset: data_offset,
            });
        }

        let raw_loop = read_u32(data, 0x1C);
        let loop_offset = if raw_loop != 0 {
            0x1C + raw_loop as usize
        } else {
            0
        };

        let raw_gd3 = read_u32(data, 0x14);
        let gd3_offset = if raw_gd3 != 0 { 0x14 + raw_gd3 as usize } else { 0 };

        let rate = match read_u32(data, 0x24) {
            0 => 50,
            rate => rate,
        };

        Ok(Self {
            version,
            total_samples: read_u32(data, 0x18),
            loop_offset,
            loop_samples: read_u32(data, 0x20),
            rate,
            data_offset,
            gd3_offset,
            ay8910_clock: clock_field(data, 0x7C, data_offset),
            nes_apu_clock: clock_field(data, 0x78, data_offset),
            ay8910_type: byte_field(data, 0x74, data_offset),
            ay8910_flags: byte_field(data, 0x75, data_offset),
            header_size,
        })
    }
}

/// Parse the GD3 tag at `offset` into track metadata.
///
/// GD3 is a `"Gd3 "` magic, a version, a payload length and eleven
/// UTF-16LE null-terminated strings. A damaged tag degrades to empty
/// metadata instead of failing the open.
pub fn parse_gd3(data: &[u8], offset: usize) -> TrackMetadata {
    let mut metadata = TrackMetadata::default();
    if offset == 0 || offset + 12 > data.len() || read_u32(data, offset) != GD3_IDENT {
        return metadata;
    }
    let length = read_u32(data, offset + 8) as usize;
    let payload_end = (offset + 12 + length).min(data.len());
    let mut cursor = offset + 12;
    let mut strings = Vec::with_capacity(11);
    while strings.len() < 11 {
        match read_utf16_string(data, cursor, payload_end) {
            Some((text, next)) => {
                strings.push(text);
                cursor = next;
            }
            None => break,
        }
    }
    let field = |index: usize| strings.get(index).cloned().unwrap_or_default();
    // Order: track EN/JP, game EN/JP, system EN/JP, author EN/JP, date,
    // ripper, notes.
    metadata.title = field(0);
    metadata.game = field(2);
    metadata.system = field(4);
    metadata.author = field(6);
    metadata.date = field(8);
    metadata.comments = field(10);
    metadata
}

fn read_utf16_string(data: &[u8], start: usize, end: usize) -> Option<(String, usize)> {
    let mut units = Vec::new();
    let mut cursor = start;
    loop {
        if cursor + 2 > end {
            return None;
        }
        let unit = u16::from_le_bytes([data[cursor], data[cursor + 1]]);
        cursor += 2;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Some((String::from_utf16_lossy(&units), cursor))
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Clock fields live past 0x40; on older images those offsets already hold
/// command data and must read as zero.
fn clock_field(data: &[u8], offset: usize, data_start: usize) -> u32 {
    if offset + 4 <= data_start && offset + 4 <= data.len() {
        read_u32(data, offset)
    } else {
        0
    }
}

fn byte_field(data: &[u8], offset: usize, data_start: usize) -> u8 {
    if offset < data_start && offset < data.len() {
        data[offset]
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_image(version: u32) -> Vec<u8> {
        let mut image = vec![0u8; 0x40];
        image[0..4].copy_from_slice(b"Vgm ");
        image[0x08..0x0C].copy_from_slice(&version.to_le_bytes());
        image.push(0x66);
        let eof = (image.len() - 4) as u32;
        image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
        image
    }

    #[test]
    fn accepts_minimal_v101_image() {
        let image = minimal_image(0x0000_0101);
        let header = VgmHeader::parse(&image).expect("parse");
        assert_eq!(header.data_offset, 0x40);
        assert_eq!(header.header_size, 0x40);
        assert_eq!(header.rate, 50);
        assert_eq!(header.ay8910_clock, 0);
    }

    #[test]
    fn rejects_bad_ident() {
        let mut image = minimal_image(0x0000_0101);
        image[0] = b'X';
        assert_eq!(VgmHeader::parse(&image), Err(VgmError::InvalidIdent));
    }

    #[test]
    fn rejects_eof_offset_mismatch() {
        let mut image = minimal_image(0x0000_0101);
        image[0x04] = image[0x04].wrapping_add(1);
        assert!(matches!(
            VgmHeader::parse(&image),
            Err(VgmError::EofOffsetMismatch { .. })
        ));
    }

    #[test]
    fn rejects_truncated_image() {
        assert!(matches!(
            VgmHeader::parse(&[0u8; 0x10]),
            Err(VgmError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn honours_v150_data_offset() {
        let mut image = vec![0u8; 0x90];
        image[0..4].copy_from_slice(b"Vgm ");
        image[0x08..0x0C].copy_from_slice(&0x0000_0161u32.to_le_bytes());
        // Data starts at 0x34 + 0x4C = 0x80.
        image[0x34..0x38].copy_from_slice(&0x4Cu32.to_le_bytes());
        image[0x80] = 0x66;
        let eof = (image.len() - 4) as u32;
        image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
        let header = VgmHeader::parse(&image).expect("parse");
        assert_eq!(header.data_offset, 0x80);
        assert_eq!(header.header_size, 0x80);
    }

    #[test]
    fn rejects_data_offset_past_end() {
        let mut image = minimal_image(0x0000_0150);
        image[0x34..0x38].copy_from_slice(&0x1000u32.to_le_bytes());
        // Keep the eof cross-check satisfied so the offset check fires.
        assert!(matches!(
            VgmHeader::parse(&image),
            Err(VgmError::DataOffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn clock_fields_read_zero_on_legacy_headers() {
        // A v1.01 image whose bytes at 0x78+ are command data, not clocks.
        let mut image = vec![0u8; 0x40];
        image[0..4].copy_from_slice(b"Vgm ");
        image[0x08..0x0C].copy_from_slice(&0x0000_0101u32.to_le_bytes());
        let mut tail = vec![0xFFu8; 0x40]; // would parse as a huge clock
        image.append(&mut tail);
        image.push(0x66);
        let eof = (image.len() - 4) as u32;
        image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
        let header = VgmHeader::parse(&image).expect("parse");
        assert_eq!(header.ay8910_clock, 0);
        assert_eq!(header.nes_apu_clock, 0);
    }

    #[test]
    fn gd3_parses_track_fields() {
        let mut image = minimal_image(0x0000_0161);
        let gd3_at = image.len();
        let mut tag = Vec::new();
        tag.extend_from_slice(b"Gd3 ");
        tag.extend_from_slice(&0x0100u32.to_le_bytes());
        let strings = [
            "Title", "タイトル", "Game", "", "System", "", "Author", "", "2020", "Ripper",
            "Notes",
        ];
        let mut payload = Vec::new();
        for s in strings {
            for unit in s.encode_utf16() {
                payload.extend_from_slice(&unit.to_le_bytes());
            }
            payload.extend_from_slice(&0u16.to_le_bytes());
        }
        tag.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        tag.extend_from_slice(&payload);
        image.extend_from_slice(&tag);
        let eof = (image.len() - 4) as u32;
        image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());

        let metadata = parse_gd3(&image, gd3_at);
        assert_eq!(metadata.title, "Title");
        assert_eq!(metadata.game, "Game");
        assert_eq!(metadata.system, "System");
        assert_eq!(metadata.author, "Author");
        assert_eq!(metadata.date, "2020");
        assert_eq!(metadata.comments, "Notes");
    }

    #[test]
    fn damaged_gd3_degrades_to_empty_metadata() {
        let image = minimal_image(0x0000_0161);
        assert_eq!(parse_gd3(&image, 0x20), TrackMetadata::default());
        assert_eq!(parse_gd3(&image, image.len()), TrackMetadata::default());
    }
}
