//! End-to-end NSF playback behaviour against synthesised images.

use chiptone_common::{PcmDecoder, CHIP_SAMPLE_RATE};
use chiptone_nsf::{NsfError, NsfPlayer, NSF_HEADER_SIZE};

/// Build an NSF image from header fields and 6502 code placed at the load
/// address.
struct ImageBuilder {
    song_count: u8,
    starting_song: u8,
    load_addr: u16,
    init_addr: u16,
    play_addr: u16,
    ntsc_play_speed: u16,
    bank_switch: [u8; 8],
    rom: Vec<u8>,
}

impl ImageBuilder {
    fn new() -> Self {
        Self {
            song_count: 1,
            starting_song: 1,
            load_addr: 0x8000,
            init_addr: 0x8000,
            play_addr: 0x8001,
            ntsc_play_speed: 16666, // ~60 Hz
            bank_switch: [0; 8],
            // init: RTS / play: RTS
            rom: vec![0x60, 0x60],
        }
    }

    fn songs(mut self, count: u8, starting: u8) -> Self {
        self.song_count = count;
        self.starting_song = starting;
        self
    }

    fn entry_points(mut self, init: u16, play: u16) -> Self {
        self.init_addr = init;
        self.play_addr = play;
        self
    }

    fn play_speed(mut self, microseconds: u16) -> Self {
        self.ntsc_play_speed = microseconds;
        self
    }

    fn banks(mut self, banks: [u8; 8]) -> Self {
        self.bank_switch = banks;
        self
    }

    fn rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = rom;
        self
    }

    fn build(self) -> Vec<u8> {
        let mut image = vec![0u8; NSF_HEADER_SIZE];
        image[0..5].copy_from_slice(b"NESM\x1a");
        image[0x05] = 1;
        image[0x06] = self.song_count;
        image[0x07] = self.starting_song;
        image[0x08..0x0A].copy_from_slice(&self.load_addr.to_le_bytes());
        image[0x0A..0x0C].copy_from_slice(&self.init_addr.to_le_bytes());
        image[0x0C..0x0E].copy_from_slice(&self.play_addr.to_le_bytes());
        image[0x0E..0x12].copy_from_slice(b"Test");
        image[0x6E..0x70].copy_from_slice(&self.ntsc_play_speed.to_le_bytes());
        image[0x70..0x78].copy_from_slice(&self.bank_switch);
        image.extend_from_slice(&self.rom);
        image
    }
}

#[test]
fn trivial_init_and_play_produce_frames() {
    // S5: init is a bare RTS; playback proceeds at the header cadence.
    let image = ImageBuilder::new().build();
    let mut player = NsfPlayer::open(&image).expect("open");
    let mut buffer = vec![0u8; 2000 * 4];
    assert_eq!(player.decode_pcm(&mut buffer), buffer.len());
}

#[test]
fn play_cadence_follows_ntsc_speed() {
    // 44100 * 10000 / 1e6 = 441 samples per play call. The duration cap at
    // 100 ms (4410 samples) is only checked between play windows, so the
    // stream ends on a 441-sample boundary.
    let image = ImageBuilder::new().play_speed(10_000).build();
    let mut player = NsfPlayer::open(&image).expect("open");
    player.set_max_duration(100);
    let mut total = 0usize;
    let mut buffer = [0u8; 4096];
    loop {
        let written = player.decode_pcm(&mut buffer);
        if written == 0 {
            break;
        }
        total += written / 4;
    }
    assert_eq!(total % 441, 0, "stream must end on a play window boundary");
    assert!(total >= 4410, "cap of 4410 samples, got {total}");
}

#[test]
fn runaway_play_routine_stops_without_hanging() {
    // S6: play jumps to itself forever. The cycle budget must end the
    // stream with a partial (here: empty) buffer instead of spinning.
    let rom = vec![
        0x60, // $8000 init: RTS
        0x4C, 0x01, 0x80, // $8001 play: JMP $8001
    ];
    let image = ImageBuilder::new().rom(rom).build();
    let mut player = NsfPlayer::open(&image).expect("open");
    let mut buffer = [0u8; 4096];
    assert_eq!(player.decode_pcm(&mut buffer), 0);
    // The stream stays ended on subsequent calls.
    assert_eq!(player.decode_pcm(&mut buffer), 0);
}

#[test]
fn faulting_init_fails_open() {
    let rom = vec![0x02]; // jam opcode at the init entry
    let image = ImageBuilder::new().rom(rom).build();
    assert!(matches!(
        NsfPlayer::open(&image),
        Err(NsfError::InitFailed { track: 0 })
    ));
}

#[test]
fn init_writes_reach_the_apu() {
    // init: LDA #$01 / STA $4015 / LDA #$BF / STA $4000 / LDA #$FD /
    //       STA $4002 / LDA #$08 / STA $4003 / RTS ... play: RTS
    let rom = vec![
        0xA9, 0x01, 0x8D, 0x15, 0x40, //
        0xA9, 0xBF, 0x8D, 0x00, 0x40, //
        0xA9, 0xFD, 0x8D, 0x02, 0x40, //
        0xA9, 0x08, 0x8D, 0x03, 0x40, //
        0x60, // RTS
        0x60, // play: RTS
    ];
    let image = ImageBuilder::new().entry_points(0x8000, 0x8014).rom(rom).build();
    let mut player = NsfPlayer::open(&image).expect("open");
    let mut buffer = vec![0u8; 1000 * 4];
    assert_eq!(player.decode_pcm(&mut buffer), buffer.len());
    let loud = buffer
        .chunks_exact(4)
        .any(|f| i16::from_le_bytes([f[0], f[1]]) != 0);
    assert!(loud, "the pulse set up by init should be audible");
}

#[test]
fn bank_switched_image_maps_banks_before_init() {
    // Two 4 KiB banks; init lives in bank 1, which only executes if the
    // bank registers were written before the init call.
    let mut rom = vec![0u8; 2 * 0x1000];
    rom[0x1000] = 0x60; // bank 1, offset 0: RTS
    rom[0x1001] = 0x60; // play: RTS
    let image = ImageBuilder::new()
        .banks([1, 0, 0, 0, 0, 0, 0, 0])
        .entry_points(0x8000, 0x8001)
        .rom(rom)
        .build();
    let player = NsfPlayer::open(&image).expect("open");
    assert_eq!(player.machine().banks()[0], 1);
    assert!(player.machine().is_banking());
}

#[test]
fn track_selection_clamps_and_restarts() {
    let image = ImageBuilder::new().songs(3, 1).build();
    let mut player = NsfPlayer::open(&image).expect("open");
    assert_eq!(player.track_count(), 3);
    assert_eq!(player.track(), 0);
    assert!(player.set_track(2));
    assert_eq!(player.track(), 2);
    // Out of range tracks fall back to 0, like the original driver.
    assert!(player.set_track(9));
    assert_eq!(player.track(), 0);
}

#[test]
fn starting_song_field_selects_the_first_track() {
    let image = ImageBuilder::new().songs(4, 3).build();
    let player = NsfPlayer::open(&image).expect("open");
    assert_eq!(player.track(), 2, "starting_song is 1-based");
}

#[test]
fn header_metadata_is_exposed() {
    let image = ImageBuilder::new().build();
    let player = NsfPlayer::open(&image).expect("open");
    assert_eq!(player.metadata().title, "Test");
    assert_eq!(player.metadata().system, "NES");
}

#[test]
fn rejects_non_nsf_images() {
    let image = vec![0u8; 0x100];
    assert!(matches!(
        NsfPlayer::open(&image),
        Err(NsfError::InvalidIdent)
    ));
}

#[test]
fn downsampled_nsf_keeps_cadence() {
    let image = ImageBuilder::new().play_speed(10_000).build();
    let mut player = NsfPlayer::open(&image).expect("open");
    player.set_sample_frequency(CHIP_SAMPLE_RATE / 2);
    player.set_max_duration(100);
    let mut total = 0usize;
    let mut buffer = [0u8; 4096];
    loop {
        let written = player.decode_pcm(&mut buffer);
        if written == 0 {
            break;
        }
        total += written / 4;
    }
    // 4410 chip samples cap -> half as many emitted frames, +-1 per window.
    assert!((2200..=2210).contains(&total), "got {total}");
}
