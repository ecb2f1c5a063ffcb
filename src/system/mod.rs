//! Host platform services used by the driver.
//!
//! The driver never touches hardware other than the transport directly. The
//! host provides a [`Platform`] implementation giving it a monotonic
//! millisecond clock, the modem power key line and (optionally) the wall
//! clock.
//!
//! # Usage
//!
//! ```rust
//! use simsms::system::{PinLevel, Platform};
//!
//! struct Board {
//!     millis: u64,
//! }
//!
//! impl Platform for Board {
//!     fn now_ms(&self) -> u64 {
//!         self.millis
//!     }
//!
//!     fn set_power_key(&mut self, level: PinLevel) {
//!         // Drive the GPIO wired to the modem PWRKEY
//!         let _ = level;
//!     }
//! }
//! ```

/// Network time parsing and civil date helpers.
pub mod time;

/// Electrical level of a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    /// Logic high
    High,
    /// Logic low
    Low,
}

impl PinLevel {
    /// The opposite level
    pub fn inverted(self) -> Self {
        match self {
            PinLevel::High => PinLevel::Low,
            PinLevel::Low => PinLevel::High,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PinLevel {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PinLevel::High => defmt::write!(f, "High"),
            PinLevel::Low => defmt::write!(f, "Low"),
        }
    }
}

impl core::fmt::Display for PinLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PinLevel::High => f.write_str("high"),
            PinLevel::Low => f.write_str("low"),
        }
    }
}

/// Services the host provides to the driver.
///
/// Only [`now_ms`](Platform::now_ms) is mandatory. Boards without a power key
/// line or a settable clock can keep the default no-op implementations.
pub trait Platform {
    /// Milliseconds since an arbitrary epoch. Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Drive the modem power key line to `level`.
    fn set_power_key(&mut self, level: PinLevel) {
        let _ = level;
    }

    /// Stop driving the power key line (open drain / input).
    fn release_power_key(&mut self) {}

    /// Current wall clock time as seconds since the Unix epoch, if known.
    fn unix_time(&self) -> Option<i64> {
        None
    }

    /// Set the wall clock to `unix_seconds`.
    fn set_unix_time(&mut self, unix_seconds: i64) {
        let _ = unix_seconds;
    }
}
