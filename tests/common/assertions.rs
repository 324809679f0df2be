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

//! Custom assertions for link testing

use uartsim::core::receiver::RxOutput;

/// Collapse per-tick levels into (level, length) runs
#[allow(dead_code)]
pub fn runs(levels: &[bool]) -> Vec<(bool, usize)> {
    let mut runs: Vec<(bool, usize)> = Vec::new();
    for &level in levels {
        match runs.last_mut() {
            Some((last, len)) if *last == level => *len += 1,
            _ => runs.push((level, 1)),
        }
    }
    runs
}

/// Bytes delivered by `received` pulses, checking pulse exclusivity on the way
#[allow(dead_code)]
pub fn received_bytes(outputs: &[RxOutput]) -> Vec<u8> {
    outputs
        .iter()
        .enumerate()
        .inspect(|(t, out)| {
            assert!(
                !(out.received && out.break_detected),
                "received and break asserted together on tick {}",
                t
            )
        })
        .filter(|(_, out)| out.received)
        .map(|(_, out)| out.data)
        .collect()
}

/// Assert the receiver never reported a break
#[allow(dead_code)]
pub fn assert_no_break(outputs: &[RxOutput]) {
    if let Some(t) = outputs.iter().position(|o| o.break_detected) {
        panic!("unexpected break on tick {}", t);
    }
}

/// Assert exactly one `received` pulse, on `tick`, carrying `data`
#[allow(dead_code)]
pub fn assert_received_once(outputs: &[RxOutput], tick: usize, data: u8) {
    let ticks: Vec<usize> = outputs
        .iter()
        .enumerate()
        .filter(|(_, o)| o.received)
        .map(|(t, _)| t)
        .collect();
    assert_eq!(ticks, vec![tick], "received pulse ticks");
    assert_eq!(
        outputs[tick].data, data,
        "received 0x{:02X}, expected 0x{:02X}",
        outputs[tick].data, data
    );
}
