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

//! Link configuration
//!
//! A link component is parametrized by the frequency of its driving tick and
//! the target bit rate. Everything else (bit period, first-sample delay,
//! per-frame rounding error) is derived from those two numbers once, at
//! construction time.
//!
//! ## Derived Constants
//!
//! ```text
//! ticks_per_bit          = tick_frequency / bit_rate            (truncating)
//! ticks_per_bit_and_half = round(1.5 * tick_frequency / bit_rate)
//! ticks_per_frame        = tick_frequency * 10 / bit_rate
//! frame_inaccuracy       = ticks_per_frame - ticks_per_bit * 10
//! ```
//!
//! ## File Format
//!
//! Configurations can be loaded from TOML:
//!
//! ```toml
//! tick_frequency = 16000000
//! bit_rate = 115200
//! ```

use super::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default driving clock (16 MHz)
pub const DEFAULT_TICK_FREQUENCY: u64 = 16_000_000;

/// Default bit rate (115200 baud)
pub const DEFAULT_BIT_RATE: u64 = 115_200;

/// Bits per 8N1 frame (start + 8 data + stop)
pub const BITS_PER_FRAME: u64 = 10;

/// Construction-time link configuration
///
/// Immutable for the lifetime of the component built from it.
///
/// # Example
///
/// ```
/// use uartsim::core::config::LinkConfig;
///
/// let config = LinkConfig::new(16_000_000, 115_200);
/// assert_eq!(config.ticks_per_bit(), 138);
/// assert_eq!(config.ticks_per_bit_and_half(), 208);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Ticks per second of the driving clock
    pub tick_frequency: u64,

    /// Target bits per second
    pub bit_rate: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_FREQUENCY, DEFAULT_BIT_RATE)
    }
}

impl LinkConfig {
    /// Create a configuration
    ///
    /// No validation happens here; components validate against their own
    /// minimum bit period when they are built.
    pub const fn new(tick_frequency: u64, bit_rate: u64) -> Self {
        Self {
            tick_frequency,
            bit_rate,
        }
    }

    /// Bit period in ticks (truncating division)
    #[inline(always)]
    pub fn ticks_per_bit(&self) -> u64 {
        self.tick_frequency / self.bit_rate.max(1)
    }

    /// One and a half bit periods, rounded to the nearest tick
    ///
    /// Computed from the unrounded ratio so the truncation of
    /// `ticks_per_bit` does not leak into the first-sample delay.
    pub fn ticks_per_bit_and_half(&self) -> u64 {
        let bit_rate = self.bit_rate.max(1) as u128;
        let ticks = (3 * self.tick_frequency as u128 + bit_rate) / (2 * bit_rate);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Exact frame duration in ticks (truncating)
    ///
    /// Saturates at `u64::MAX`; [`LinkConfig::validate`] rejects such
    /// configurations.
    pub fn ticks_per_frame(&self) -> u64 {
        u64::try_from(self.wide_ticks_per_frame()).unwrap_or(u64::MAX)
    }

    /// Ticks lost per frame to integer truncation of the bit period
    pub fn frame_inaccuracy(&self) -> u64 {
        let whole_bits = self.ticks_per_bit() as u128 * BITS_PER_FRAME as u128;
        let lost = self.wide_ticks_per_frame() - whole_bits;
        u64::try_from(lost).unwrap_or(u64::MAX)
    }

    fn wide_ticks_per_frame(&self) -> u128 {
        self.tick_frequency as u128 * BITS_PER_FRAME as u128 / self.bit_rate.max(1) as u128
    }

    /// Whether the accumulated per-frame error stays below half a bit
    ///
    /// Design-time diagnostic only; the state machines never consult it.
    pub fn is_frame_accurate(&self) -> bool {
        self.frame_inaccuracy() < self.ticks_per_bit() / 2
    }

    /// Validate the configuration for a component
    ///
    /// # Arguments
    ///
    /// * `component` - Component name used in the error message
    /// * `minimum` - Smallest acceptable bit period in ticks
    ///
    /// # Returns
    ///
    /// The bit period in ticks, or a configuration error
    pub fn validate(&self, component: &'static str, minimum: u64) -> Result<u64> {
        if self.tick_frequency == 0 {
            return Err(ConfigError::ZeroTickFrequency.into());
        }
        if self.bit_rate == 0 {
            return Err(ConfigError::ZeroBitRate.into());
        }

        // Every derived constant is bounded by the frame length
        if u64::try_from(self.wide_ticks_per_frame()).is_err() {
            return Err(ConfigError::TimingOverflow {
                tick_frequency: self.tick_frequency,
                bit_rate: self.bit_rate,
            }
            .into());
        }

        let ticks_per_bit = self.ticks_per_bit();
        if ticks_per_bit < minimum {
            return Err(ConfigError::BitRateTooHigh {
                component,
                ticks_per_bit,
                minimum,
            }
            .into());
        }

        Ok(ticks_per_bit)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load a configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!(
            "Loaded link config from {}: {} Hz / {} bps",
            path.as_ref().display(),
            config.tick_frequency,
            config.bit_rate
        );
        Ok(config)
    }

    /// Serialize the configuration as TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }
}
