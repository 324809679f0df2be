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

//! Bit-period countdown timer
//!
//! Both state machines measure bit periods with a [`TickTimer`]. The timer is
//! armed with a delay of `D` ticks and reports the boundary on exactly the
//! `D`-th tick after it was armed, never one early or one late.
//!
//! ```text
//! tick:      load(3)   1      2      3      4
//! remaining:    3      2      1      0      0
//! boundary:     -    false  false  true   false
//! ```

/// Countdown timer producing single-tick boundary events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickTimer {
    /// Ticks left until the boundary (0 = expired/idle)
    remaining: u64,
}

impl TickTimer {
    /// Create an idle timer
    ///
    /// # Example
    ///
    /// ```
    /// use uartsim::core::timer::TickTimer;
    ///
    /// let mut timer = TickTimer::new();
    /// assert!(!timer.tick());
    /// ```
    pub fn new() -> Self {
        Self { remaining: 0 }
    }

    /// Arm the timer
    ///
    /// # Arguments
    ///
    /// * `delay` - Ticks until the boundary; must be at least 1
    #[inline(always)]
    pub fn load(&mut self, delay: u64) {
        debug_assert!(delay >= 1, "timer delay must be at least one tick");
        self.remaining = delay;
    }

    /// Advance the timer by one tick
    ///
    /// # Returns
    ///
    /// `true` on the tick the boundary is reached, `false` otherwise
    #[inline(always)]
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Ticks left until the boundary
    #[inline(always)]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Disarm the timer
    pub fn clear(&mut self) {
        self.remaining = 0;
    }
}
