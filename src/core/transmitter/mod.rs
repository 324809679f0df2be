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

//! UART Transmitter Implementation
//!
//! Converts one byte at a time into a timed sequence of line levels using
//! fixed 8N1 framing.
//!
//! ## Frame Layout
//!
//! ```text
//! idle ‾‾‾‾‾|_____|  D0 |  D1 | ... |  D7 |‾‾‾‾‾‾|‾‾‾‾ idle / next start
//!           start   LSB first              stop
//! ```
//!
//! ## Phases
//!
//! ```text
//! Idle -> StartBit -> DataBit x8 -> StopBit -> Idle
//!                                          \-> StartBit (byte queued during stop bit)
//! ```
//!
//! ## Caller Contract
//!
//! - `data` is sampled only on the tick a `send` is accepted.
//! - A `send` is accepted in `Idle`, or during the stop bit while `ready` is
//!   high. Anywhere else it is ignored without any error being reported.
//! - Queuing the next byte during the stop bit starts its start bit right
//!   after the stop bit, with no idle gap.
//!
//! The line output is registered: the level returned by a tick reflects the
//! phase as it was before that tick's transition.

#[cfg(test)]
mod tests;

use super::config::LinkConfig;
use super::error::Result;
use super::timer::TickTimer;

/// Smallest bit period the transmitter accepts
pub const MIN_TICKS_PER_BIT: u64 = 3;

/// Transmitter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    /// Line idle high, waiting for `send`
    Idle,
    /// Driving the start bit (low)
    StartBit,
    /// Driving the buffer LSB
    DataBit,
    /// Driving the stop bit (high); next byte may be queued
    StopBit,
}

/// Per-tick transmitter outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutput {
    /// Serial line level
    pub line: bool,

    /// Safe to present the next `data`/`send`
    pub ready: bool,
}

/// Bit-level UART transmitter
///
/// # Example
///
/// ```
/// use uartsim::core::config::LinkConfig;
/// use uartsim::core::transmitter::Transmitter;
///
/// let mut tx = Transmitter::new(&LinkConfig::new(1_000, 250)).unwrap();
///
/// // Accept 0x01 on the first tick
/// let out = tx.tick(true, 0x01);
/// assert!(out.line);
/// assert!(!out.ready);
///
/// // Start bit is driven for one bit period (4 ticks)
/// for _ in 0..4 {
///     assert!(!tx.tick(false, 0).line);
/// }
///
/// // Then D0 = 1
/// assert!(tx.tick(false, 0).line);
/// ```
#[derive(Debug, Clone)]
pub struct Transmitter {
    /// Configuration the transmitter was built from
    config: LinkConfig,

    /// Bit period in ticks
    ticks_per_bit: u64,

    /// Current phase
    phase: TxPhase,

    /// Shift buffer (LSB is the next bit on the line)
    buffer: u8,

    /// Data bits sent in the current frame (3-bit, wraps after the 8th)
    bit_count: u8,

    /// Bit boundary timer
    timer: TickTimer,

    /// Ready flag
    ready: bool,

    /// Registered line output
    line: bool,
}

impl Transmitter {
    /// Create a new transmitter
    ///
    /// # Arguments
    ///
    /// * `config` - Link configuration
    ///
    /// # Returns
    ///
    /// The transmitter in `Idle`, or a configuration error if the bit period
    /// is shorter than [`MIN_TICKS_PER_BIT`]
    pub fn new(config: &LinkConfig) -> Result<Self> {
        let ticks_per_bit = config.validate("transmitter", MIN_TICKS_PER_BIT)?;

        log::debug!(
            "Transmitter: {} Hz / {} bps, {} ticks per bit",
            config.tick_frequency,
            config.bit_rate,
            ticks_per_bit
        );

        Ok(Self {
            config: *config,
            ticks_per_bit,
            phase: TxPhase::Idle,
            buffer: 0,
            bit_count: 0,
            timer: TickTimer::new(),
            ready: false,
            line: true,
        })
    }

    /// Force the initial state
    ///
    /// Returns to `Idle` with the line high. `ready` stays low until the
    /// first idle tick.
    pub fn reset(&mut self) {
        self.phase = TxPhase::Idle;
        self.buffer = 0;
        self.bit_count = 0;
        self.timer.clear();
        self.ready = false;
        self.line = true;

        log::debug!("Transmitter reset");
    }

    /// Advance the transmitter by one tick
    ///
    /// # Arguments
    ///
    /// * `send` - Send request level
    /// * `data` - Byte to send, sampled only when `send` is accepted
    ///
    /// # Returns
    ///
    /// Line level and ready flag after this tick
    pub fn tick(&mut self, send: bool, data: u8) -> TxOutput {
        self.line = match self.phase {
            TxPhase::StartBit => false,
            TxPhase::DataBit => self.buffer & 0x01 != 0,
            TxPhase::Idle | TxPhase::StopBit => true,
        };

        match self.phase {
            TxPhase::Idle => {
                if send {
                    self.latch(data);
                    self.timer.load(self.ticks_per_bit);
                    self.enter(TxPhase::StartBit);
                } else {
                    self.ready = true;
                }
            }
            TxPhase::StartBit => {
                if self.timer.tick() {
                    self.bit_count = 0;
                    self.timer.load(self.ticks_per_bit);
                    self.enter(TxPhase::DataBit);
                }
            }
            TxPhase::DataBit => {
                if self.timer.tick() {
                    self.buffer >>= 1;
                    self.bit_count = (self.bit_count + 1) & 0x07;
                    self.timer.load(self.ticks_per_bit);

                    if self.bit_count == 0 {
                        self.ready = true;
                        self.enter(TxPhase::StopBit);
                    }
                }
            }
            TxPhase::StopBit => {
                // Queue the next byte while the stop bit is on the line
                if self.ready && send {
                    self.latch(data);
                }

                if self.timer.tick() {
                    if self.ready {
                        self.enter(TxPhase::Idle);
                    } else {
                        self.timer.load(self.ticks_per_bit);
                        self.enter(TxPhase::StartBit);
                    }
                }
            }
        }

        self.output()
    }

    fn latch(&mut self, data: u8) {
        self.buffer = data;
        self.ready = false;
        log::trace!("Transmitter latched 0x{:02X}", data);
    }

    fn enter(&mut self, phase: TxPhase) {
        log::trace!("Transmitter {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Outputs as of the last tick
    #[inline(always)]
    pub fn output(&self) -> TxOutput {
        TxOutput {
            line: self.line,
            ready: self.ready,
        }
    }

    /// Serial line level
    #[inline(always)]
    pub fn line(&self) -> bool {
        self.line
    }

    /// Ready flag
    #[inline(always)]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Current phase
    #[inline(always)]
    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Bit period in ticks
    #[inline(always)]
    pub fn ticks_per_bit(&self) -> u64 {
        self.ticks_per_bit
    }

    /// Configuration the transmitter was built from
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}
