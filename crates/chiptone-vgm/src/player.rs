//! VGM command interpreter and PCM player.

use crate::error::{Result, VgmError};
use crate::header::{parse_gd3, VgmHeader};
use chiptone_common::{
    PcmDecoder, SamplePump, TrackMetadata, CHIP_SAMPLE_RATE, DEFAULT_MAX_DURATION_MS, FRAME_BYTES,
};
use chiptone_nes::NesMachine;
use chiptone_psg::Ay38910;

/// The sound chip selected by the header clocks.
///
/// The interpreter only ever targets these two; a closed enum keeps the
/// write dispatch monomorphic.
#[derive(Debug, Clone)]
enum Chip {
    Psg(Ay38910),
    Apu(NesMachine),
}

impl Chip {
    fn get_sample(&mut self) -> u32 {
        match self {
            Chip::Psg(psg) => psg.get_sample(),
            Chip::Apu(apu) => apu.get_sample(),
        }
    }
}

/// VGM player: walks the command stream and pulls chip samples.
///
/// The image is borrowed for the lifetime of the player; the command
/// cursor, loop state and the chip instance are owned.
pub struct VgmPlayer<'a> {
    data: &'a [u8],
    header: VgmHeader,
    metadata: TrackMetadata,
    chip: Option<Chip>,
    cursor: usize,
    wait_samples: u32,
    samples_played: u64,
    duration: u64,
    loops: u32,
    pump: SamplePump,
    finished: bool,
}

impl<'a> VgmPlayer<'a> {
    /// Open a VGM image. Fails on identifier, size or offset validation.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let header = VgmHeader::parse(data)?;
        let metadata = parse_gd3(data, header.gd3_offset);

        let chip = if header.ay8910_clock != 0 {
            let mut psg = Ay38910::new(header.ay8910_type, header.ay8910_flags);
            psg.set_frequency(header.ay8910_clock);
            Some(Chip::Psg(psg))
        } else if header.nes_apu_clock != 0 {
            Some(Chip::Apu(NesMachine::new()))
        } else {
            None
        };

        let loops = if header.loop_offset != 0 { 2 } else { 1 };
        let cursor = header.data_offset;
        Ok(Self {
            data,
            header,
            metadata,
            chip,
            cursor,
            wait_samples: 0,
            samples_played: 0,
            duration: ms_to_samples(DEFAULT_MAX_DURATION_MS),
            loops,
            pump: SamplePump::new(CHIP_SAMPLE_RATE),
            finished: false,
        })
    }

    /// Parsed header (test hook).
    pub fn header(&self) -> &VgmHeader {
        &self.header
    }

    /// Total samples consumed so far at chip rate.
    pub fn samples_played(&self) -> u64 {
        self.samples_played
    }

    /// Execute one command at the cursor. `Ok(true)` keeps going,
    /// `Ok(false)` is a clean end of stream.
    fn next_command(&mut self) -> Result<bool> {
        let offset = self.cursor;
        let command = *self
            .data
            .get(offset)
            .ok_or(VgmError::UnexpectedEof { offset })?;

        match command {
            // AY8910 stereo mask: accepted, not rendered.
            0x31 => {
                self.operands(1)?;
                log::debug!("stereo mask 0x{:02x} accepted, not rendered", self.data[offset + 1]);
                self.cursor += 2;
            }
            // Game Gear PSG stereo / SN76489 write: chips out of scope.
            0x4F | 0x50 => {
                self.operands(1)?;
                self.cursor += 2;
            }
            // FM chip writes (YM2413..YMF262): out of scope, skip aa dd.
            0x51..=0x5F => {
                self.operands(2)?;
                self.cursor += 3;
            }
            0x61 => {
                let operands = self.operands(2)?;
                self.wait_samples = (operands[0] as u32 | ((operands[1] as u32) << 8)) + 1;
                self.cursor += 3;
            }
            0x62 => {
                self.wait_samples = 735;
                self.cursor += 1;
            }
            0x63 => {
                self.wait_samples = 882;
                self.cursor += 1;
            }
            0x66 => {
                if self.header.loop_offset != 0 && self.loops != 1 {
                    self.cursor = self.header.loop_offset;
                    self.loops = self.loops.saturating_sub(1);
                } else {
                    return Ok(false);
                }
            }
            0x67 => {
                let operands = self.operands(6)?;
                let length = u32::from_le_bytes([operands[2], operands[3], operands[4], operands[5]])
                    as usize;
                let start = offset + 7;
                let end = start
                    .checked_add(length)
                    .ok_or(VgmError::UnexpectedEof { offset: start })?;
                let block = self
                    .data
                    .get(start..end)
                    .ok_or(VgmError::UnexpectedEof { offset: start })?;
                if let Some(Chip::Apu(apu)) = &mut self.chip {
                    apu.set_data_block(block);
                }
                self.cursor += 7 + length;
            }
            // PCM RAM write: 0x68 0x66 cc oo oo oo dd dd dd ss ss ss.
            0x68 => {
                self.operands(11)?;
                self.cursor += 12;
            }
            0xA0 => {
                let operands = self.operands(2)?;
                match &mut self.chip {
                    Some(Chip::Psg(psg)) => psg.write(operands[0], operands[1]),
                    _ => log::warn!("AY8910 write without an AY8910 chip declared"),
                }
                self.cursor += 3;
            }
            0xB4 => {
                let operands = self.operands(2)?;
                match &mut self.chip {
                    Some(Chip::Apu(apu)) => {
                        // Registers 0x00-0x1F mirror NES $4000-$401F.
                        if operands[0] < 0x20 {
                            apu.write(0x4000 + operands[0] as u16, operands[1]);
                        } else {
                            log::debug!("NES APU mirror register 0x{:02x} skipped", operands[0]);
                        }
                    }
                    _ => log::warn!("NES APU write without an APU chip declared"),
                }
                self.cursor += 3;
            }
            // Other aa dd style chip writes: out of scope.
            0xB0..=0xB3 | 0xB5..=0xBF => {
                self.operands(2)?;
                self.cursor += 3;
            }
            // Dual chip selectors.
            0x30 | 0x3F => {
                self.operands(1)?;
                self.cursor += 2;
            }
            // Three-operand chip writes.
            0xC0..=0xC8 | 0xD0..=0xD6 => {
                self.operands(3)?;
                self.cursor += 4;
            }
            // PCM seek / C352 write.
            0xE0 | 0xE1 => {
                self.operands(4)?;
                self.cursor += 5;
            }
            // Short waits.
            0x70..=0x7F => {
                self.wait_samples = (command & 0x0F) as u32 + 1;
                self.cursor += 1;
            }
            // YM2612 DAC shortcut: chip out of scope, the wait is ignored.
            0x80..=0x8F => {
                self.cursor += 1;
            }
            // DAC stream control: documented operand widths.
            0x90 | 0x91 | 0x95 => {
                self.operands(4)?;
                self.cursor += 5;
            }
            0x92 => {
                self.operands(5)?;
                self.cursor += 6;
            }
            0x93 => {
                self.operands(10)?;
                self.cursor += 11;
            }
            0x94 => {
                self.operands(1)?;
                self.cursor += 2;
            }
            // Reserved ranges with declared widths.
            0x32..=0x3E => {
                self.operands(1)?;
                self.cursor += 2;
            }
            0x40..=0x4E => {
                self.operands(2)?;
                self.cursor += 3;
            }
            0xA1..=0xAF => {
                self.operands(2)?;
                self.cursor += 3;
            }
            0xC9..=0xCF | 0xD7..=0xDF => {
                self.operands(3)?;
                self.cursor += 4;
            }
            0xE2..=0xFF => {
                self.operands(4)?;
                self.cursor += 5;
            }
            _ => return Err(VgmError::UnknownCommand { command, offset }),
        }
        Ok(true)
    }

    /// Bounds-checked view of the `count` operand bytes after the command.
    fn operands(&self, count: usize) -> Result<&'a [u8]> {
        let start = self.cursor + 1;
        self.data
            .get(start..start + count)
            .ok_or(VgmError::UnexpectedEof { offset: start })
    }

    fn chip_sample(&mut self) -> u32 {
        self.chip.as_mut().map(Chip::get_sample).unwrap_or(0)
    }
}

impl PcmDecoder for VgmPlayer<'_> {
    fn decode_pcm(&mut self, out: &mut [u8]) -> usize {
        // A VGM that declares neither supported chip has nothing to say.
        if self.chip.is_none() {
            return 0;
        }
        let mut decoded = 0;
        while decoded + FRAME_BYTES <= out.len() && !self.finished {
            while self.wait_samples == 0 {
                if self.duration != 0 && self.samples_played >= self.duration {
                    self.finished = true;
                    return decoded;
                }
                match self.next_command() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.finished = true;
                        return decoded;
                    }
                    Err(err) => {
                        log::warn!("VGM stream stopped: {err}");
                        self.finished = true;
                        return decoded;
                    }
                }
            }
            while self.wait_samples > 0 && decoded + FRAME_BYTES <= out.len() {
                let sample = self.chip_sample();
                self.samples_played += 1;
                self.wait_samples -= 1;
                if let Some(frame) = self.pump.push(sample) {
                    out[decoded..decoded + FRAME_BYTES].copy_from_slice(&frame);
                    decoded += FRAME_BYTES;
                }
            }
        }
        decoded
    }

    fn set_volume(&mut self, volume: u16) {
        let volume = volume.min(u8::MAX as u16) as u8;
        match &mut self.chip {
            Some(Chip::Psg(psg)) => psg.set_volume(volume),
            Some(Chip::Apu(apu)) => apu.set_volume(volume),
            None => {}
        }
    }

    fn set_sample_frequency(&mut self, frequency: u32) {
        self.pump.set_host_rate(frequency);
        if let Some(Chip::Psg(psg)) = &self.chip {
            if psg.sample_frequency() != CHIP_SAMPLE_RATE {
                log::warn!(
                    "PSG runs at {} Hz, expected {} Hz",
                    psg.sample_frequency(),
                    CHIP_SAMPLE_RATE
                );
            }
        }
    }

    fn set_max_duration(&mut self, milliseconds: u32) {
        self.duration = ms_to_samples(milliseconds);
    }

    fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }
}

fn ms_to_samples(milliseconds: u32) -> u64 {
    milliseconds as u64 * CHIP_SAMPLE_RATE as u64 / 1000
}
