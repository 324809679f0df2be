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

//! Line trace capture and replay
//!
//! A [`LineTrace`] records one line level per tick, stored as run-length
//! segments so that long idle stretches stay small. Traces can be saved as
//! JSON, loaded back, and replayed into a [`Receiver`].
//!
//! # Trace Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "metadata": {
//!     "captured_at": "2025-01-01T00:00:00Z",
//!     "tick_frequency": 16000000,
//!     "bit_rate": 115200
//!   },
//!   "segments": [
//!     { "level": true, "ticks": 1 },
//!     { "level": false, "ticks": 138 }
//!   ]
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use uartsim::core::config::LinkConfig;
//! use uartsim::core::trace::LineTrace;
//!
//! let mut trace = LineTrace::new(&LinkConfig::default());
//! for level in [true, true, false, false, false, true] {
//!     trace.record(level);
//! }
//! assert_eq!(trace.len(), 6);
//! assert_eq!(trace.segments().len(), 3);
//! assert_eq!(trace.transitions(), vec![2, 5]);
//! ```

use super::config::LinkConfig;
use super::error::{Result, UartError};
use super::receiver::Receiver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Trace file version for compatibility checking
pub const TRACE_FORMAT_VERSION: u32 = 1;

/// Capture metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// When the capture was started
    pub captured_at: DateTime<Utc>,

    /// Tick frequency of the capturing link
    pub tick_frequency: u64,

    /// Bit rate of the capturing link
    pub bit_rate: u64,
}

/// Run of identical line levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Line level held for the whole run
    pub level: bool,

    /// Run length in ticks
    pub ticks: u64,
}

/// Recorded line waveform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTrace {
    /// Format version
    pub version: u32,

    /// Capture metadata
    pub metadata: TraceMetadata,

    /// Run-length encoded levels
    segments: Vec<Segment>,
}

/// Result of replaying a trace into a receiver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// (tick, byte) for every `received` pulse
    pub received: Vec<(u64, u8)>,

    /// Tick of every `break` pulse
    pub breaks: Vec<u64>,

    /// Ticks replayed
    pub ticks: u64,
}

impl ReplayReport {
    /// Received bytes in order
    pub fn bytes(&self) -> Vec<u8> {
        self.received.iter().map(|&(_, byte)| byte).collect()
    }
}

impl LineTrace {
    /// Start an empty capture for a link configuration
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            metadata: TraceMetadata {
                captured_at: Utc::now(),
                tick_frequency: config.tick_frequency,
                bit_rate: config.bit_rate,
            },
            segments: Vec::new(),
        }
    }

    /// Build a trace from per-tick levels
    pub fn from_levels<I>(config: &LinkConfig, levels: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut trace = Self::new(config);
        for level in levels {
            trace.record(level);
        }
        trace
    }

    /// Configuration the trace was captured with
    pub fn config(&self) -> LinkConfig {
        LinkConfig::new(self.metadata.tick_frequency, self.metadata.bit_rate)
    }

    /// Append one tick
    #[inline]
    pub fn record(&mut self, level: bool) {
        match self.segments.last_mut() {
            Some(segment) if segment.level == level => segment.ticks += 1,
            _ => self.segments.push(Segment { level, ticks: 1 }),
        }
    }

    /// Number of recorded ticks
    pub fn len(&self) -> u64 {
        self.segments
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.ticks))
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate the recorded levels, one per tick
    pub fn levels(&self) -> impl Iterator<Item = bool> + '_ {
        self.segments
            .iter()
            .flat_map(|s| std::iter::repeat_n(s.level, s.ticks as usize))
    }

    /// Ticks on which the level differs from the previous tick
    pub fn transitions(&self) -> Vec<u64> {
        let mut tick = 0;
        let mut transitions = Vec::with_capacity(self.segments.len().saturating_sub(1));
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                transitions.push(tick);
            }
            tick += segment.ticks;
        }
        transitions
    }

    /// Feed the trace into a receiver, one level per tick
    ///
    /// # Arguments
    ///
    /// * `rx` - Receiver to drive; it is not reset first
    ///
    /// # Returns
    ///
    /// Every pulse the receiver produced, with trace-relative ticks
    pub fn replay(&self, rx: &mut Receiver) -> ReplayReport {
        let mut report = ReplayReport::default();

        for (tick, level) in self.levels().enumerate() {
            let out = rx.tick(level);
            if out.received {
                report.received.push((tick as u64, out.data));
            } else if out.break_detected {
                report.breaks.push(tick as u64);
            }
        }

        report.ticks = self.len();
        report
    }

    /// Save the trace as JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| UartError::Trace(e.to_string()))?;
        writer.flush()?;

        log::debug!(
            "Saved {} ticks ({} segments) to {}",
            self.len(),
            self.segments.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load a trace saved with [`LineTrace::save_to_file`]
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened
    /// - JSON is malformed
    /// - Version is incompatible
    /// - Total length does not fit in a `u64`
    ///
    /// Empty runs are dropped and neighbouring runs with the same level are
    /// merged.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut trace: LineTrace = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| UartError::Trace(e.to_string()))?;

        if trace.version != TRACE_FORMAT_VERSION {
            return Err(UartError::Trace(format!(
                "incompatible trace version: {} (expected {})",
                trace.version, TRACE_FORMAT_VERSION
            )));
        }

        trace.segments = Self::normalize(trace.segments)?;
        Ok(trace)
    }

    /// Drop empty runs and merge neighbours with the same level
    ///
    /// Files may be edited by hand; recorded traces are already normal.
    fn normalize(segments: Vec<Segment>) -> Result<Vec<Segment>> {
        let mut normal: Vec<Segment> = Vec::with_capacity(segments.len());
        let mut total: u64 = 0;

        for segment in segments.into_iter().filter(|s| s.ticks > 0) {
            total = total
                .checked_add(segment.ticks)
                .ok_or_else(|| UartError::Trace("trace length overflows u64".to_string()))?;

            match normal.last_mut() {
                Some(last) if last.level == segment.level => last.ticks += segment.ticks,
                _ => normal.push(segment),
            }
        }

        Ok(normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_run_length() {
        let mut trace = LineTrace::new(&LinkConfig::default());
        assert!(trace.is_empty());

        for _ in 0..5 {
            trace.record(true);
        }
        trace.record(false);
        trace.record(false);
        trace.record(true);

        assert_eq!(
            trace.segments(),
            &[
                Segment { level: true, ticks: 5 },
                Segment { level: false, ticks: 2 },
                Segment { level: true, ticks: 1 },
            ]
        );
        assert_eq!(trace.len(), 8);
        assert_eq!(trace.transitions(), vec![5, 7]);
    }

    #[test]
    fn test_levels_expand_segments() {
        let levels = vec![true, false, false, true, true, true, false];
        let trace = LineTrace::from_levels(&LinkConfig::default(), levels.clone());
        assert_eq!(trace.levels().collect::<Vec<_>>(), levels);
    }

    #[test]
    fn test_metadata_keeps_config() {
        let config = LinkConfig::new(1_000, 100);
        let trace = LineTrace::new(&config);
        assert_eq!(trace.config(), config);
        assert_eq!(trace.version, TRACE_FORMAT_VERSION);
    }

    #[test]
    fn test_replay_reports_pulses() {
        let config = LinkConfig::new(1_000, 100);
        let mut levels = vec![true; 4];
        levels.extend([false; 10]);
        for bit in [true, false, true, false, true, false, true, false] {
            levels.extend([bit; 10]);
        }
        levels.extend([true; 20]);
        // Start, eight zero bits and a low stop bit, then idle
        levels.extend([false; 100]);
        levels.extend([true; 20]);

        let trace = LineTrace::from_levels(&config, levels);
        let mut rx = Receiver::new(&config).unwrap();
        let report = trace.replay(&mut rx);

        assert_eq!(report.bytes(), vec![0x55]);
        assert_eq!(report.received[0].0, 4 + rx.frame_latency());
        assert_eq!(report.breaks, vec![114 + rx.frame_latency()]);
        assert_eq!(report.ticks, trace.len());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");

        let config = LinkConfig::new(1_000, 100);
        let trace = LineTrace::from_levels(&config, [true, false, false, true]);
        trace.save_to_file(&path).unwrap();

        let loaded = LineTrace::load_from_file(&path).unwrap();
        assert_eq!(loaded, trace);
    }

    #[test]
    fn test_load_rejects_other_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");

        let mut trace = LineTrace::new(&LinkConfig::default());
        trace.version = TRACE_FORMAT_VERSION + 1;
        trace.save_to_file(&path).unwrap();

        assert!(matches!(
            LineTrace::load_from_file(&path),
            Err(UartError::Trace(_))
        ));
    }

    #[test]
    fn test_load_normalizes_hand_edited_segments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");

        let mut trace = LineTrace::new(&LinkConfig::new(1_000, 100));
        trace.segments = vec![
            Segment { level: true, ticks: 3 },
            Segment { level: false, ticks: 0 },
            Segment { level: true, ticks: 2 },
            Segment { level: false, ticks: 4 },
            Segment { level: false, ticks: 1 },
        ];
        trace.save_to_file(&path).unwrap();

        let loaded = LineTrace::load_from_file(&path).unwrap();
        assert_eq!(
            loaded.segments(),
            &[
                Segment { level: true, ticks: 5 },
                Segment { level: false, ticks: 5 },
            ]
        );
        assert_eq!(loaded.transitions(), vec![5]);
        assert_eq!(loaded.len(), 10);
    }

    #[test]
    fn test_load_all_empty_segments_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");

        let mut trace = LineTrace::new(&LinkConfig::default());
        trace.segments = vec![
            Segment { level: true, ticks: 0 },
            Segment { level: false, ticks: 0 },
        ];
        trace.save_to_file(&path).unwrap();

        let loaded = LineTrace::load_from_file(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.len(), 0);
        assert!(loaded.transitions().is_empty());
    }

    #[test]
    fn test_load_rejects_overflowing_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");

        let mut trace = LineTrace::new(&LinkConfig::default());
        trace.segments = vec![
            Segment { level: true, ticks: u64::MAX },
            Segment { level: false, ticks: 1 },
        ];
        trace.save_to_file(&path).unwrap();

        assert!(matches!(
            LineTrace::load_from_file(&path),
            Err(UartError::Trace(_))
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line.json");
        std::fs::write(&path, "not a trace").unwrap();

        assert!(matches!(
            LineTrace::load_from_file(&path),
            Err(UartError::Trace(_))
        ));
    }
}
