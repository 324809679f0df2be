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

//! Core link components
//!
//! This module contains the UART building blocks:
//! - Link configuration and derived timing constants
//! - Bit-period tick timer
//! - Transmitter (byte to line levels)
//! - Receiver (line levels to bytes and break pulses)
//! - Loopback link harness
//! - Line trace capture and replay

pub mod config;
pub mod error;
pub mod link;
pub mod receiver;
pub mod timer;
pub mod trace;
pub mod transmitter;

// Re-export commonly used types
pub use config::LinkConfig;
pub use error::{ConfigError, Result, UartError};
pub use link::{Link, LinkEvent};
pub use receiver::Receiver;
pub use trace::LineTrace;
pub use transmitter::Transmitter;
