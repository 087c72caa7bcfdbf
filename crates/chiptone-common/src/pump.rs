//! Chip-rate to host-rate sample pump.
//!
//! The chips emit one packed stereo sample per 44.1 kHz tick. The pump
//! accumulates those ticks and emits one output frame every time the host
//! rate counter rolls over, merging skipped ticks with a peak-preserving
//! rule so transients survive downsampling instead of being averaged away.

use crate::CHIP_SAMPLE_RATE;

/// Midpoint of the unsigned 16-bit lane encoding used by the chips.
const LANE_MIDPOINT: u16 = 8192;

/// Converts the 44.1 kHz chip stream to an arbitrary host sample rate.
///
/// Each lane of the packed `u32` sample (low 16 bits left, high 16 bits
/// right) is treated as an unsigned offset from the 8192 midpoint; across
/// one output window the pump keeps the value farthest from the midpoint.
/// At a host rate of exactly 44 100 Hz every chip tick maps to one output
/// frame and the pump is bit-exact pass-through. Host rates above 44 100 Hz
/// degenerate to nearest-neighbour duplication.
#[derive(Debug, Clone)]
pub struct SamplePump {
    host_rate: u32,
    write_counter: u32,
    sample_sum: u32,
    sample_sum_valid: bool,
}

impl SamplePump {
    /// Create a pump delivering at `host_rate` Hz.
    pub fn new(host_rate: u32) -> Self {
        Self {
            host_rate,
            write_counter: 0,
            sample_sum: 0,
            sample_sum_valid: false,
        }
    }

    /// Currently configured host rate.
    pub fn host_rate(&self) -> u32 {
        self.host_rate
    }

    /// Change the host rate. Clears the accumulator window.
    pub fn set_host_rate(&mut self, host_rate: u32) {
        self.host_rate = host_rate;
        self.reset();
    }

    /// Drop any partially accumulated window.
    pub fn reset(&mut self) {
        self.write_counter = 0;
        self.sample_sum = 0;
        self.sample_sum_valid = false;
    }

    /// Feed one chip tick. Returns a 4-byte little-endian stereo frame when
    /// the host rate counter rolls over, `None` otherwise.
    pub fn push(&mut self, sample: u32) -> Option<[u8; 4]> {
        if self.sample_sum_valid {
            let left = merge_lane(self.sample_sum as u16, sample as u16);
            let right = merge_lane((self.sample_sum >> 16) as u16, (sample >> 16) as u16);
            self.sample_sum = (left as u32) | ((right as u32) << 16);
        } else {
            self.sample_sum = sample;
            self.sample_sum_valid = true;
        }

        self.write_counter += self.host_rate;
        if self.write_counter >= CHIP_SAMPLE_RATE {
            self.write_counter -= CHIP_SAMPLE_RATE;
            self.sample_sum_valid = false;
            Some(self.sample_sum.to_le_bytes())
        } else {
            None
        }
    }
}

/// Keep whichever value deviates more from the lane midpoint.
#[inline]
fn merge_lane(acc: u16, next: u16) -> u16 {
    if (next >= LANE_MIDPOINT && next > acc) || (next < LANE_MIDPOINT && next < acc) {
        next
    } else {
        acc
    }
}
