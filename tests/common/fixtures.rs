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

//! Test fixtures for driving a transmitter and receiver side by side

use uartsim::core::config::LinkConfig;
use uartsim::core::receiver::{Receiver, RxOutput};
use uartsim::core::transmitter::Transmitter;

/// Everything observed while driving a transmitter/receiver pair
#[allow(dead_code)]
pub struct Capture {
    /// Transmitter line output per tick
    pub line: Vec<bool>,

    /// Transmitter ready flag per tick
    pub ready: Vec<bool>,

    /// Receiver outputs per tick
    pub rx: Vec<RxOutput>,
}

/// Build a transmitter and receiver on the same configuration
#[allow(dead_code)]
pub fn create_pair(tick_frequency: u64, bit_rate: u64) -> (Transmitter, Receiver) {
    let config = LinkConfig::new(tick_frequency, bit_rate);
    (
        Transmitter::new(&config).expect("valid transmitter config"),
        Receiver::new(&config).expect("valid receiver config"),
    )
}

/// Drive a pair for `ticks` ticks, presenting each byte as soon as the
/// transmitter reported ready on the previous tick
///
/// The receiver sees the transmitter line `skew` ticks late.
#[allow(dead_code)]
pub fn drive_pair(
    tx: &mut Transmitter,
    rx: &mut Receiver,
    bytes: &[u8],
    skew: usize,
    ticks: usize,
) -> Capture {
    let mut pending = bytes.iter().copied().peekable();
    let mut capture = Capture {
        line: Vec::with_capacity(ticks),
        ready: Vec::with_capacity(ticks),
        rx: Vec::with_capacity(ticks),
    };

    for t in 0..ticks {
        let out = match pending.peek() {
            Some(&data) if tx.ready() => {
                pending.next();
                tx.tick(true, data)
            }
            _ => tx.tick(false, 0),
        };
        capture.line.push(out.line);
        capture.ready.push(out.ready);

        let level = if t >= skew { capture.line[t - skew] } else { true };
        capture.rx.push(rx.tick(level));
    }

    capture
}

/// Ticks needed to send `count` back-to-back frames and let the receiver finish
#[allow(dead_code)]
pub fn ticks_for_frames(tx: &Transmitter, rx: &Receiver, count: usize, skew: usize) -> usize {
    let frame = 10 * tx.ticks_per_bit() as usize;
    2 + count * frame + skew + rx.frame_latency() as usize + rx.ticks_per_bit() as usize
}
