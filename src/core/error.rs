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

/// Link error types
use thiserror::Error;

/// Result type for link operations
pub type Result<T> = std::result::Result<T, UartError>;

/// Main error type for the simulator
#[derive(Error, Debug)]
pub enum UartError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("Invalid hex input: {0}")]
    InvalidHex(String),
}

/// Construction-time configuration errors
///
/// These are fatal: a component built from a rejected configuration
/// never exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Tick frequency must be non-zero")]
    ZeroTickFrequency,

    #[error("Bit rate must be non-zero")]
    ZeroBitRate,

    #[error("Bit rate too high for {component}: {ticks_per_bit} ticks per bit (minimum {minimum})")]
    BitRateTooHigh {
        component: &'static str,
        ticks_per_bit: u64,
        minimum: u64,
    },

    #[error("Timing constants overflow for {tick_frequency} Hz / {bit_rate} bps")]
    TimingOverflow { tick_frequency: u64, bit_rate: u64 },

    #[error("Parse error: {0}")]
    Parse(String),
}
