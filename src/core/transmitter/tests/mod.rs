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

//! Transmitter test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: Construction, configuration limits, reset, idle behavior
//! - `timing`: Bit durations and ready timing on the line
//! - `queueing`: Back-to-back sends and ignored requests


use super::*;

/// Build a transmitter for tests
pub(super) fn transmitter(tick_frequency: u64, bit_rate: u64) -> Transmitter {
    Transmitter::new(&LinkConfig::new(tick_frequency, bit_rate)).unwrap()
}

/// Run `ticks` ticks, sending `data` on the listed tick indices
pub(super) fn run(tx: &mut Transmitter, ticks: usize, sends: &[(usize, u8)]) -> Vec<TxOutput> {
    (0..ticks)
        .map(|t| match sends.iter().find(|(at, _)| *at == t) {
            Some(&(_, data)) => tx.tick(true, data),
            None => tx.tick(false, 0),
        })
        .collect()
}

/// Collapse a line capture into (level, length) runs
pub(super) fn runs(outputs: &[TxOutput]) -> Vec<(bool, usize)> {
    let mut runs: Vec<(bool, usize)> = Vec::new();
    for out in outputs {
        match runs.last_mut() {
            Some((level, len)) if *level == out.line => *len += 1,
            _ => runs.push((out.line, 1)),
        }
    }
    runs
}
