//! Common error types for transport operations

use core::fmt;

/// A common error type for transport implementations.
///
/// Transports are free to use their own error type; this one is provided for
/// simple UART wrappers and for tests. It is designed to be simple and
/// portable for `no_std` environments.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An operation was attempted on a link that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// The requested speed is not supported by the link.
    UnsupportedBaudRate,
    /// A timeout occurred.
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::NotOpen => "link not open",
            Error::WriteError => "write error",
            Error::ReadError => "read error",
            Error::UnsupportedBaudRate => "unsupported baud rate",
            Error::Timeout => "timeout",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::UnsupportedBaudRate => defmt::write!(f, "UnsupportedBaudRate"),
            Error::Timeout => defmt::write!(f, "Timeout"),
        }
    }
}
