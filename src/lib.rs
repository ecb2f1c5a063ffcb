//! # simsms - SIM7000 SMS driver
//!
//! A non-blocking driver that sends and receives SMS through a SIMCom SIM7000
//! modem in PDU mode. It is designed for embedded systems and supports
//! `no_std` environments: every buffer is a fixed-capacity `heapless` type and
//! the driver never allocates or blocks.
//!
//! ## Features
//!
//! ### SMS
//! - GSM 03.38 7-bit and UCS-2 encoding, picked automatically per message
//! - Concatenated messages for long texts, sent one part at a time
//! - Decoding of incoming SMS-DELIVER PDUs, including alphanumeric senders
//!
//! ### Modem session
//! - Power key sequencing and AT bring-up
//! - One command in flight with timeouts, retries and restart signalling
//! - Network registration tracking and optional clock setting from the network
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! simsms = "0.1.0"
//! ```
//!
//! The host supplies a [`network::Transport`] (usually a UART) and a
//! [`system::Platform`] (clock and power key), then polls the driver from its
//! main loop:
//!
//! ```rust,no_run
//! use simsms::modem::{Modem, config::Config};
//! # use simsms::network::{Read, Transport, Write};
//! # use simsms::system::Platform;
//! # struct Uart;
//! # impl Read for Uart {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Uart {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Transport for Uart {
//! #     fn open(&mut self, _baud_rate: u32) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn now_ms(&self) -> u64 { 0 }
//! # }
//!
//! let mut modem = Modem::new(Uart, Board, Config::default());
//! modem.begin();
//!
//! let mut sent = false;
//! loop {
//!     modem.poll();
//!     if modem.need_restart() {
//!         modem.begin();
//!     } else if modem.is_idle() && !sent {
//!         sent = modem.send_sms("+33607612640", "Hello from the field").is_ok();
//!     }
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Log through defmt for embedded debugging
//! - `log`: Log through the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// Must stay first so the logging macros are visible to the other modules
mod fmt;

/// Byte transport to the modem.
///
/// Defines the non-blocking read and write traits the driver is generic over.
pub mod network;

/// Host platform services: clock, power key line and wall time.
pub mod system;

/// The modem session: bring-up, command engine and SMS exchange.
pub mod modem;

/// SMS encoding: GSM 7-bit alphabet, PDU codec and message splitting.
pub mod sms;
