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

//! Loopback link harness
//!
//! Wires one [`Transmitter`] to one [`Receiver`] through a line with an
//! optional constant delay ("skew"), and plays the external byte producer and
//! consumer roles around them. Both components are advanced exactly once per
//! [`Link::tick`]; they share nothing but the line level.
//!
//! ```text
//!  bytes --> [producer] --send/data--> Transmitter --line--> [skew] --> Receiver --> [consumer] --> events
//!                 ^                        |
//!                 +-------- ready ---------+
//! ```

use super::config::LinkConfig;
use super::error::Result;
use super::receiver::{Receiver, RxOutput};
use super::trace::LineTrace;
use super::transmitter::{Transmitter, TxPhase};
use std::collections::VecDeque;

/// Outputs of one link tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTick {
    /// Tick index since construction or reset
    pub tick: u64,

    /// Transmitter line output
    pub line: bool,

    /// Transmitter ready flag
    pub ready: bool,

    /// Receiver outputs
    pub rx: RxOutput,
}

/// Consumer-visible link events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Receiver pulsed `received`
    Received { tick: u64, byte: u8 },

    /// Receiver pulsed `break`
    Break { tick: u64 },
}

impl LinkEvent {
    /// Tick the event happened on
    pub fn tick(&self) -> u64 {
        match *self {
            LinkEvent::Received { tick, .. } | LinkEvent::Break { tick } => tick,
        }
    }
}

/// Transmitter and receiver joined by one line
pub struct Link {
    tx: Transmitter,
    rx: Receiver,

    /// Line levels in flight between transmitter and receiver
    delay_line: VecDeque<bool>,

    /// Line delay in ticks
    skew: usize,

    /// Ticks elapsed
    tick: u64,

    /// Capture of the transmitter line, if enabled
    trace: Option<LineTrace>,
}

impl Link {
    /// Create a link with both ends on the same configuration
    pub fn new(config: &LinkConfig) -> Result<Self> {
        Self::with_configs(config, config)
    }

    /// Create a link with independently configured ends
    ///
    /// # Arguments
    ///
    /// * `tx_config` - Transmitter configuration
    /// * `rx_config` - Receiver configuration
    pub fn with_configs(tx_config: &LinkConfig, rx_config: &LinkConfig) -> Result<Self> {
        Ok(Self {
            tx: Transmitter::new(tx_config)?,
            rx: Receiver::new(rx_config)?,
            delay_line: VecDeque::new(),
            skew: 0,
            tick: 0,
            trace: None,
        })
    }

    /// Delay the line between the two ends by `skew` ticks
    pub fn with_skew(mut self, skew: usize) -> Self {
        self.skew = skew;
        self.delay_line = std::iter::repeat_n(true, skew).collect();
        self
    }

    /// Start capturing the transmitter line
    pub fn enable_trace(&mut self) {
        self.trace = Some(LineTrace::new(self.tx.config()));
    }

    /// Stop capturing and hand over the trace
    pub fn take_trace(&mut self) -> Option<LineTrace> {
        self.trace.take()
    }

    /// Reset both ends and drain the line
    pub fn reset(&mut self) {
        self.tx.reset();
        self.rx.reset();
        self.delay_line = std::iter::repeat_n(true, self.skew).collect();
        self.tick = 0;
        log::debug!("Link reset");
    }

    /// Advance both ends by one tick
    ///
    /// # Arguments
    ///
    /// * `send` - Transmitter send request
    /// * `data` - Transmitter data
    pub fn tick(&mut self, send: bool, data: u8) -> LinkTick {
        let tx = self.tx.tick(send, data);

        if let Some(trace) = self.trace.as_mut() {
            trace.record(tx.line);
        }

        let line_at_rx = if self.skew == 0 {
            tx.line
        } else {
            self.delay_line.push_back(tx.line);
            self.delay_line.pop_front().unwrap_or(true)
        };
        let rx = self.rx.tick(line_at_rx);

        let out = LinkTick {
            tick: self.tick,
            line: tx.line,
            ready: tx.ready,
            rx,
        };
        self.tick += 1;
        out
    }

    /// Send bytes through the link and collect what arrives
    ///
    /// Presents the next byte whenever the transmitter reports ready,
    /// including during the stop bit, so consecutive bytes go out without
    /// idle gaps. Runs until every byte has been sent and the receiver has
    /// had a full frame time to report the last one.
    pub fn transmit(&mut self, bytes: &[u8]) -> Vec<LinkEvent> {
        let mut events = Vec::with_capacity(bytes.len());
        let mut pending = bytes.iter().copied().peekable();

        while pending.peek().is_some() || self.tx.phase() != TxPhase::Idle {
            let out = match pending.peek() {
                Some(&data) if self.tx.ready() => {
                    pending.next();
                    self.tick(true, data)
                }
                _ => self.tick(false, 0),
            };
            Self::collect(out, &mut events);
        }

        events.extend(self.idle(self.drain_ticks()));
        events
    }

    /// Run with the transmitter idle for `ticks` ticks
    pub fn idle(&mut self, ticks: u64) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            let out = self.tick(false, 0);
            Self::collect(out, &mut events);
        }
        events
    }

    fn collect(out: LinkTick, events: &mut Vec<LinkEvent>) {
        if out.rx.received {
            log::trace!("Link tick {}: received 0x{:02X}", out.tick, out.rx.data);
            events.push(LinkEvent::Received {
                tick: out.tick,
                byte: out.rx.data,
            });
        } else if out.rx.break_detected {
            log::warn!("Link tick {}: break detected", out.tick);
            events.push(LinkEvent::Break { tick: out.tick });
        }
    }

    /// Idle ticks needed for the receiver to finish a frame already on the line
    fn drain_ticks(&self) -> u64 {
        (self.skew as u64)
            .saturating_add(self.rx.frame_latency())
            .saturating_add(self.rx.ticks_per_bit())
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.tx
    }

    pub fn receiver(&self) -> &Receiver {
        &self.rx
    }

    /// Ticks elapsed since construction or reset
    pub fn elapsed(&self) -> u64 {
        self.tick
    }

    pub fn skew(&self) -> usize {
        self.skew
    }
}
