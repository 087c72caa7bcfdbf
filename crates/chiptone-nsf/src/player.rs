//! NSF player: 6502-driven APU playback.
//!
//! The tune image carries its own player code. `set_track` bootstraps the
//! machine the way an NSF host does (ROM load or bank map, RAM and APU
//! zeroing, the ordered $4015 writes, register presets) and runs the init
//! routine; decoding then alternates between running the play routine and
//! pulling samples for the wait window it schedules.

use crate::error::{NsfError, Result};
use crate::header::{NsfHeader, NSF_HEADER_SIZE};
use chiptone_common::{
    PcmDecoder, SamplePump, TrackMetadata, CHIP_SAMPLE_RATE, DEFAULT_MAX_DURATION_MS, FRAME_BYTES,
};
use chiptone_nes::{call_subroutine, CallResult, NesCpu, NesMachine, DEFAULT_CALL_CYCLE_BUDGET};
use mos6502::cpu::CPU;
use mos6502::instruction::Nmos6502;
use mos6502::registers::StackPointer;

/// NSF player over a borrowed image.
pub struct NsfPlayer<'a> {
    data: &'a [u8],
    header: NsfHeader,
    metadata: TrackMetadata,
    cpu: NesCpu,
    track: u32,
    wait_samples: u32,
    samples_played: u64,
    duration: u64,
    pump: SamplePump,
    finished: bool,
}

impl<'a> NsfPlayer<'a> {
    /// Open an NSF image and start its header-selected song.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let header = NsfHeader::parse(data)?;
        let metadata = header.metadata();
        let starting = header.starting_song.saturating_sub(1) as u32;
        let mut player = Self {
            data,
            header,
            metadata,
            cpu: CPU::new(NesMachine::new(), Nmos6502),
            track: 0,
            wait_samples: 0,
            samples_played: 0,
            duration: ms_to_samples(DEFAULT_MAX_DURATION_MS),
            pump: SamplePump::new(CHIP_SAMPLE_RATE),
            finished: false,
        };
        player.start_track(starting)?;
        Ok(player)
    }

    /// Parsed header (test hook).
    pub fn header(&self) -> &NsfHeader {
        &self.header
    }

    /// The machine behind the CPU (test hook).
    pub fn machine(&self) -> &NesMachine {
        &self.cpu.memory
    }

    /// Currently selected track (0-based).
    pub fn track(&self) -> u32 {
        self.track
    }

    /// Bootstrap and init the given 0-based track.
    fn start_track(&mut self, track: u32) -> Result<()> {
        let track = if track < self.header.song_count as u32 {
            track
        } else {
            0
        };
        let machine = &mut self.cpu.memory;
        machine.reset_apu();

        let rom = &self.data[NSF_HEADER_SIZE..];
        if self.header.is_bank_switched() {
            machine.load_banked_rom(self.header.load_addr, rom);
            for (i, &bank) in self.header.bank_switch.iter().enumerate() {
                machine.write(0x5FF8 + i as u16, bank);
            }
        } else {
            machine.load_into_ram(self.header.load_addr, rom);
        }

        for addr in 0x0000..0x0800u16 {
            machine.write(addr, 0);
        }
        for addr in 0x4000..=0x4013u16 {
            machine.write(addr, 0);
        }
        // Reset, then enable the four analog channels, strictly in order.
        machine.write(0x4015, 0x00);
        machine.write(0x4015, 0x0F);
        machine.write(0x4017, 0x40);

        self.cpu.registers.accumulator = track as u8;
        self.cpu.registers.index_x = 0; // NTSC
        self.cpu.registers.stack_pointer = StackPointer(0xEF);

        match call_subroutine(&mut self.cpu, self.header.init_addr, DEFAULT_CALL_CYCLE_BUDGET) {
            CallResult::Done(_) => {
                self.track = track;
                self.wait_samples = 0;
                self.samples_played = 0;
                self.pump.reset();
                self.finished = false;
                Ok(())
            }
            result => {
                log::warn!("NSF init for track {track} failed: {result:?}");
                Err(NsfError::InitFailed { track })
            }
        }
    }

    /// Run the play routine once and schedule the next wait window.
    fn run_play_routine(&mut self) -> bool {
        match call_subroutine(&mut self.cpu, self.header.play_addr, DEFAULT_CALL_CYCLE_BUDGET) {
            CallResult::Done(_) => {
                let window = CHIP_SAMPLE_RATE as u64 * self.header.ntsc_play_speed as u64
                    / 1_000_000;
                self.wait_samples = (window as u32).max(1);
                true
            }
            CallResult::BudgetExceeded => {
                log::warn!("NSF play routine exceeded its cycle budget, stopping");
                false
            }
            CallResult::IllegalInstruction => {
                log::warn!("NSF play routine hit an illegal instruction, stopping");
                false
            }
        }
    }
}

impl PcmDecoder for NsfPlayer<'_> {
    fn decode_pcm(&mut self, out: &mut [u8]) -> usize {
        let mut decoded = 0;
        while decoded + FRAME_BYTES <= out.len() && !self.finished {
            if self.wait_samples == 0 {
                if self.duration != 0 && self.samples_played >= self.duration {
                    self.finished = true;
                    break;
                }
                if !self.run_play_routine() {
                    self.finished = true;
                    break;
                }
            }
            while self.wait_samples > 0 && decoded + FRAME_BYTES <= out.len() {
                let sample = self.cpu.memory.get_sample();
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

    fn track_count(&self) -> u32 {
        self.header.song_count as u32
    }

    fn set_track(&mut self, track: u32) -> bool {
        match self.start_track(track) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("set_track({track}) failed: {err}");
                false
            }
        }
    }

    fn set_volume(&mut self, volume: u16) {
        self.cpu.memory.set_volume(volume.min(u8::MAX as u16) as u8);
    }

    fn set_sample_frequency(&mut self, frequency: u32) {
        self.pump.set_host_rate(frequency);
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
