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

//! Cycle-accurate UART link simulation
//!
//! This library provides a tick-driven model of an asynchronous serial link
//! using fixed 8N1 framing: a transmitter, a receiver with a two-stage input
//! synchronizer, and a loopback harness that wires the two together.
//!
//! # Example
//!
//! ```
//! use uartsim::core::config::LinkConfig;
//! use uartsim::core::link::{Link, LinkEvent};
//!
//! let config = LinkConfig::new(16_000_000, 115_200);
//! let mut link = Link::new(&config).unwrap();
//!
//! let events = link.transmit(b"Hi");
//! assert!(matches!(events[0], LinkEvent::Received { byte: b'H', .. }));
//! assert!(matches!(events[1], LinkEvent::Received { byte: b'i', .. }));
//! ```

pub mod core;
