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

//! Receiver test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: Construction, configuration limits, reset, frame decoding
//! - `sync`: Synchronizer latency and sample point placement
//! - `errors`: Break detection, recovery, pulse exclusivity


use super::*;

/// Pulse observed on the receiver outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Pulse {
    Received(u8),
    Break,
}

/// Build a receiver for tests
pub(super) fn receiver(tick_frequency: u64, bit_rate: u64) -> Receiver {
    Receiver::new(&LinkConfig::new(tick_frequency, bit_rate)).unwrap()
}

/// Line levels for one 8N1 frame with `n` ticks per bit
pub(super) fn frame(data: u8, n: usize, stop: bool) -> Vec<bool> {
    let mut levels = vec![false; n];
    for bit in 0..8 {
        levels.extend(std::iter::repeat_n((data >> bit) & 1 != 0, n));
    }
    levels.extend(std::iter::repeat_n(stop, n));
    levels
}

/// Feed levels into the receiver, returning the per-tick outputs
pub(super) fn feed(rx: &mut Receiver, levels: &[bool]) -> Vec<RxOutput> {
    levels.iter().map(|&level| rx.tick(level)).collect()
}

/// Extract (tick, pulse) pairs from a run of outputs
pub(super) fn pulses(outputs: &[RxOutput]) -> Vec<(usize, Pulse)> {
    outputs
        .iter()
        .enumerate()
        .filter_map(|(t, out)| {
            assert!(
                !(out.received && out.break_detected),
                "received and break asserted together on tick {}",
                t
            );
            if out.received {
                Some((t, Pulse::Received(out.data)))
            } else if out.break_detected {
                Some((t, Pulse::Break))
            } else {
                None
            }
        })
        .collect()
}
