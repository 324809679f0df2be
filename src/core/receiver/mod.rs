// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! UART Receiver Implementation
//!
//! Recovers bytes from an asynchronously arriving 8N1 line signal.
//!
//! ## Input Synchronizer
//!
//! The raw line passes through two registers before any phase logic sees it.
//! A level presented on tick `t` is visible to the state machine on tick
//! `t + 2`. Both registers reset low, so after a reset nothing is recognized
//! until the line has been observed idle (high).
//!
//! ## Phases
//!
//! ```text
//! ErrorRecovery -> Idle -> WaitFirstBit -> ReadBit <-> WaitNextBit
//!       ^           ^                        |
//!       |           |                        v (8th bit)
//!       |           +---- high ---- CheckStopBit <- WaitStopBit
//!       +------------------- low -------/
//! ```
//!
//! ## Sample Points
//!
//! The falling edge of the start bit arms the timer so the first data bit is
//! sampled `round(1.5 * tick_frequency / bit_rate)` ticks after the edge, at
//! the bit center. Each following bit, and the stop bit, is sampled one bit
//! period later. `ReadBit` occupies a tick of its own, so timer delays are
//! loaded one short.
//!
//! ## Outputs
//!
//! - `received`: one-tick pulse; `data` is valid only on that tick.
//! - `break_detected`: one-tick pulse when the stop bit is sampled low. A bad
//!   stop bit and a held-low line are not distinguished. After a break the
//!   receiver waits for the line to return high before looking for the next
//!   start bit.

#[cfg(test)]
mod tests;

use super::config::LinkConfig;
use super::error::Result;
use super::timer::TickTimer;

/// Smallest bit period the receiver accepts
pub const MIN_TICKS_PER_BIT: u64 = 4;

/// Synchronizer depth in ticks
pub const SYNC_STAGES: usize = 2;

/// Receiver phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxPhase {
    /// Waiting for the line to return high
    ErrorRecovery,
    /// Waiting for a start bit
    Idle,
    /// Waiting for the center of the first data bit
    WaitFirstBit,
    /// Sampling a data bit
    ReadBit,
    /// Waiting for the center of the next data bit
    WaitNextBit,
    /// Waiting for the center of the stop bit
    WaitStopBit,
    /// Sampling the stop bit
    CheckStopBit,
}

/// Per-tick receiver outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxOutput {
    /// Received byte, valid only when `received` is set
    pub data: u8,

    /// Valid frame pulse
    pub received: bool,

    /// Framing error / line break pulse
    pub break_detected: bool,
}

/// Bit-level UART receiver
///
/// # Example
///
/// ```
/// use uartsim::core::config::LinkConfig;
/// use uartsim::core::receiver::Receiver;
///
/// let mut rx = Receiver::new(&LinkConfig::new(1_000, 250)).unwrap();
///
/// // Idle line, then 0xFF: start bit low, 8 high data bits, stop bit high
/// let mut line = vec![true; 4];
/// line.extend([false; 4]);
/// line.extend([true; 40]);
///
/// let received: Vec<u8> = line
///     .into_iter()
///     .map(|level| rx.tick(level))
///     .filter(|out| out.received)
///     .map(|out| out.data)
///     .collect();
/// assert_eq!(received, vec![0xFF]);
/// ```
#[derive(Debug, Clone)]
pub struct Receiver {
    /// Configuration the receiver was built from
    config: LinkConfig,

    /// Bit period in ticks
    ticks_per_bit: u64,

    /// Timer load from start edge to first data sample
    first_sample_delay: u64,

    /// Timer load between samples
    next_sample_delay: u64,

    /// Current phase
    phase: RxPhase,

    /// Input synchronizer; logic reads the last stage
    sync: [bool; SYNC_STAGES],

    /// Accumulation buffer (filled from the MSB, LSB-first on the wire)
    buffer: u8,

    /// Data bits received in the current frame (3-bit, wraps after the 8th)
    bit_count: u8,

    /// Sample point timer
    timer: TickTimer,

    /// Received pulse
    received: bool,

    /// Break pulse
    break_detected: bool,
}

impl Receiver {
    /// Create a new receiver
    ///
    /// # Arguments
    ///
    /// * `config` - Link configuration
    ///
    /// # Returns
    ///
    /// The receiver in `ErrorRecovery`, or a configuration error if the bit
    /// period is shorter than [`MIN_TICKS_PER_BIT`]
    pub fn new(config: &LinkConfig) -> Result<Self> {
        let ticks_per_bit = config.validate("receiver", MIN_TICKS_PER_BIT)?;
        let ticks_per_bit_and_half = config.ticks_per_bit_and_half();

        log::debug!(
            "Receiver: {} Hz / {} bps, {} ticks per bit, first sample after {} ticks",
            config.tick_frequency,
            config.bit_rate,
            ticks_per_bit,
            ticks_per_bit_and_half
        );

        Ok(Self {
            config: *config,
            ticks_per_bit,
            first_sample_delay: ticks_per_bit_and_half - 1,
            next_sample_delay: ticks_per_bit - 1,
            phase: RxPhase::ErrorRecovery,
            sync: [false; SYNC_STAGES],
            buffer: 0,
            bit_count: 0,
            timer: TickTimer::new(),
            received: false,
            break_detected: false,
        })
    }

    /// Force the initial state
    ///
    /// Returns to `ErrorRecovery` with the synchronizer cleared and both
    /// pulses deasserted.
    pub fn reset(&mut self) {
        self.phase = RxPhase::ErrorRecovery;
        self.sync = [false; SYNC_STAGES];
        self.buffer = 0;
        self.bit_count = 0;
        self.timer.clear();
        self.received = false;
        self.break_detected = false;

        log::debug!("Receiver reset");
    }

    /// Advance the receiver by one tick
    ///
    /// # Arguments
    ///
    /// * `line` - Raw line level on this tick
    ///
    /// # Returns
    ///
    /// Data and pulse outputs after this tick
    pub fn tick(&mut self, line: bool) -> RxOutput {
        let level = self.sync[SYNC_STAGES - 1];
        self.sync.copy_within(0..SYNC_STAGES - 1, 1);
        self.sync[0] = line;

        match self.phase {
            RxPhase::ErrorRecovery => {
                self.break_detected = false;
                if level {
                    self.enter(RxPhase::Idle);
                }
            }
            RxPhase::Idle => {
                self.received = false;
                if !level {
                    self.bit_count = 0;
                    self.timer.load(self.first_sample_delay);
                    self.enter(RxPhase::WaitFirstBit);
                }
            }
            RxPhase::WaitFirstBit | RxPhase::WaitNextBit => {
                if self.timer.tick() {
                    self.enter(RxPhase::ReadBit);
                }
            }
            RxPhase::ReadBit => {
                self.buffer = (self.buffer >> 1) | ((level as u8) << 7);
                self.bit_count = (self.bit_count + 1) & 0x07;
                self.timer.load(self.next_sample_delay);

                if self.bit_count == 0 {
                    self.enter(RxPhase::WaitStopBit);
                } else {
                    self.enter(RxPhase::WaitNextBit);
                }
            }
            RxPhase::WaitStopBit => {
                if self.timer.tick() {
                    self.enter(RxPhase::CheckStopBit);
                }
            }
            RxPhase::CheckStopBit => {
                if level {
                    self.received = true;
                    log::debug!("Receiver got 0x{:02X}", self.buffer);
                    self.enter(RxPhase::Idle);
                } else {
                    self.break_detected = true;
                    log::debug!("Receiver break (stop bit low)");
                    self.enter(RxPhase::ErrorRecovery);
                }
            }
        }

        self.output()
    }

    fn enter(&mut self, phase: RxPhase) {
        log::trace!("Receiver {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Outputs as of the last tick
    #[inline(always)]
    pub fn output(&self) -> RxOutput {
        RxOutput {
            data: self.buffer,
            received: self.received,
            break_detected: self.break_detected,
        }
    }

    /// Accumulation buffer
    #[inline(always)]
    pub fn data(&self) -> u8 {
        self.buffer
    }

    /// Received pulse
    #[inline(always)]
    pub fn received(&self) -> bool {
        self.received
    }

    /// Break pulse
    #[inline(always)]
    pub fn break_detected(&self) -> bool {
        self.break_detected
    }

    /// Current phase
    #[inline(always)]
    pub fn phase(&self) -> RxPhase {
        self.phase
    }

    /// Bit period in ticks
    #[inline(always)]
    pub fn ticks_per_bit(&self) -> u64 {
        self.ticks_per_bit
    }

    /// Ticks from the first low level seen on the raw line to the `received`
    /// or `break_detected` pulse of that frame
    ///
    /// Includes the synchronizer latency.
    pub fn frame_latency(&self) -> u64 {
        SYNC_STAGES as u64 + self.first_sample_delay + 1 + 8 * self.ticks_per_bit
    }

    /// Configuration the receiver was built from
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}
