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

//! UART link simulator
//!
//! Runs bytes through a simulated transmitter/receiver pair, prints derived
//! timing constants, and replays captured line traces.

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use uartsim::core::config::LinkConfig;
use uartsim::core::error::{Result, UartError};
use uartsim::core::link::{Link, LinkEvent};
use uartsim::core::receiver::{self, Receiver};
use uartsim::core::transmitter;
use uartsim::core::trace::LineTrace;

/// Cycle-accurate UART link simulator
#[derive(Parser)]
#[command(name = "uartsim")]
#[command(about = "Cycle-accurate UART link simulator", long_about = None)]
struct Cli {
    /// Link configuration file (TOML with tick_frequency and bit_rate)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Driving clock in ticks per second (overrides the config file)
    #[arg(short = 'f', long, global = true)]
    tick_frequency: Option<u64>,

    /// Bit rate in bits per second (overrides the config file)
    #[arg(short = 'b', long, global = true)]
    bit_rate: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print derived timing constants
    Info,
    /// Send bytes through a loopback link
    Send {
        /// Text to send (or hex bytes with --hex, e.g. "55 AA 00")
        payload: String,

        /// Interpret the payload as hex bytes
        #[arg(long)]
        hex: bool,

        /// Line delay between transmitter and receiver, in ticks
        #[arg(long, default_value = "0")]
        skew: usize,

        /// Save the transmitter line as a JSON trace
        #[arg(short = 't', long)]
        trace: Option<PathBuf>,
    },
    /// Replay a saved line trace into a receiver
    Decode {
        /// Trace file written by `send --trace`
        trace: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (RUST_LOG and friends)
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("uartsim v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Info => resolve_config(&cli, None).and_then(|config| run_info(&config)),
        Commands::Send {
            payload,
            hex,
            skew,
            trace,
        } => run_send(&cli, payload, *hex, *skew, trace.as_deref()),
        Commands::Decode { trace } => run_decode(&cli, trace),
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

/// Config file first, then command line overrides
fn resolve_config(cli: &Cli, base: Option<LinkConfig>) -> Result<LinkConfig> {
    let mut config = match &cli.config {
        Some(path) => LinkConfig::load_from_file(path)?,
        None => base.unwrap_or_default(),
    };

    if let Some(tick_frequency) = cli.tick_frequency {
        config.tick_frequency = tick_frequency;
    }
    if let Some(bit_rate) = cli.bit_rate {
        config.bit_rate = bit_rate;
    }

    if config.bit_rate > 0 && !config.is_frame_accurate() {
        warn!(
            "Frame inaccuracy of {} ticks is not below half a bit ({} ticks)",
            config.frame_inaccuracy(),
            config.ticks_per_bit() / 2
        );
    }

    Ok(config)
}

/// Validate against both ends before printing anything
fn run_info(config: &LinkConfig) -> Result<()> {
    config.validate("transmitter", transmitter::MIN_TICKS_PER_BIT)?;
    config.validate("receiver", receiver::MIN_TICKS_PER_BIT)?;
    print_info(config);
    Ok(())
}

fn print_info(config: &LinkConfig) {
    println!("tick frequency:         {} Hz", config.tick_frequency);
    println!("bit rate:               {} bps", config.bit_rate);
    println!("ticks per bit:          {}", config.ticks_per_bit());
    println!("ticks per bit and half: {}", config.ticks_per_bit_and_half());
    println!("ticks per frame:        {}", config.ticks_per_frame());
    println!(
        "frame inaccuracy:       {} ticks ({})",
        config.frame_inaccuracy(),
        if config.is_frame_accurate() { "ok" } else { "too high" }
    );
}

fn run_send(cli: &Cli, payload: &str, hex: bool, skew: usize, trace: Option<&Path>) -> Result<()> {
    let config = resolve_config(cli, None)?;
    let bytes = if hex {
        parse_hex(payload)?
    } else {
        payload.as_bytes().to_vec()
    };

    info!(
        "Sending {} bytes at {} bps ({} ticks per bit, skew {})",
        bytes.len(),
        config.bit_rate,
        config.ticks_per_bit(),
        skew
    );

    let mut link = Link::new(&config)?.with_skew(skew);
    if trace.is_some() {
        link.enable_trace();
    }

    let events = link.transmit(&bytes);
    print_events(&events);

    info!("Link ran for {} ticks", link.elapsed());

    if let (Some(path), Some(captured)) = (trace, link.take_trace()) {
        captured.save_to_file(path)?;
        info!("Trace saved to {}", path.display());
    }

    Ok(())
}

fn run_decode(cli: &Cli, path: &Path) -> Result<()> {
    let trace = LineTrace::load_from_file(path)?;
    let config = resolve_config(cli, Some(trace.config()))?;

    info!(
        "Replaying {} ticks captured {} at {} bps",
        trace.len(),
        trace.metadata.captured_at,
        config.bit_rate
    );

    let mut rx = Receiver::new(&config)?;
    let report = trace.replay(&mut rx);

    let mut events: Vec<LinkEvent> = report
        .received
        .iter()
        .map(|&(tick, byte)| LinkEvent::Received { tick, byte })
        .chain(report.breaks.iter().map(|&tick| LinkEvent::Break { tick }))
        .collect();
    events.sort_by_key(|e| e.tick());
    print_events(&events);

    Ok(())
}

fn print_events(events: &[LinkEvent]) {
    for event in events {
        match *event {
            LinkEvent::Received { tick, byte } => {
                let shown = if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                };
                println!("{:>10}  0x{:02X}  '{}'", tick, byte, shown);
            }
            LinkEvent::Break { tick } => println!("{:>10}  BREAK", tick),
        }
    }
}

/// Parse whitespace-separated or packed hex bytes
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input.split_whitespace().collect();
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(UartError::InvalidHex(format!(
            "{:?} is not a hex digit in {:?}",
            bad, input
        )));
    }
    if digits.len() % 2 != 0 {
        return Err(UartError::InvalidHex(format!(
            "odd number of hex digits in {:?}",
            input
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| UartError::InvalidHex(format!("bad byte at offset {} in {:?}", i, input)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uartsim::core::error::ConfigError;

    #[test]
    fn test_parse_hex_spaced() {
        assert_eq!(parse_hex("55 AA 00 ff").unwrap(), vec![0x55, 0xAA, 0x00, 0xFF]);
    }

    #[test]
    fn test_parse_hex_packed() {
        assert_eq!(parse_hex("48656c").unwrap(), b"Hel".to_vec());
    }

    #[test]
    fn test_parse_hex_errors() {
        assert!(matches!(parse_hex("123"), Err(UartError::InvalidHex(_))));
        assert!(matches!(parse_hex("zz"), Err(UartError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_hex_rejects_sign() {
        assert!(matches!(parse_hex("+5"), Err(UartError::InvalidHex(_))));
        assert!(matches!(parse_hex("55 -1"), Err(UartError::InvalidHex(_))));
    }

    #[test]
    fn test_info_rejects_zero_bit_rate() {
        assert!(matches!(
            run_info(&LinkConfig::new(1_000_000, 0)),
            Err(UartError::Config(ConfigError::ZeroBitRate))
        ));
    }

    #[test]
    fn test_info_checks_receiver_minimum() {
        // Three ticks per bit: enough to transmit, too few to receive
        match run_info(&LinkConfig::new(300, 100)) {
            Err(UartError::Config(ConfigError::BitRateTooHigh { component, .. })) => {
                assert_eq!(component, "receiver");
            }
            other => panic!("expected BitRateTooHigh, got {:?}", other),
        }
        assert!(run_info(&LinkConfig::new(400, 100)).is_ok());
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::parse_from(["uartsim", "-b", "9600", "send", "--hex", "55", "--skew", "3"]);
        assert_eq!(cli.bit_rate, Some(9600));
        match cli.command {
            Commands::Send { payload, hex, skew, trace } => {
                assert_eq!(payload, "55");
                assert!(hex);
                assert_eq!(skew, 3);
                assert!(trace.is_none());
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_overrides_apply_on_top_of_base() {
        let cli = Cli::parse_from(["uartsim", "--bit-rate", "9600", "info"]);
        let config = resolve_config(&cli, Some(LinkConfig::new(1_000_000, 115_200))).unwrap();
        assert_eq!(config, LinkConfig::new(1_000_000, 9600));
    }
}
