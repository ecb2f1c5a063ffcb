//! Transport abstraction for the modem link.
//!
//! The driver only needs a raw byte pipe: write bytes, and read whatever bytes
//! happen to be available without blocking. Opening the pipe at a given speed
//! is the only lifecycle operation the driver performs itself; everything else
//! (pin muxing, UART peripheral setup, reopening after a fault) stays with the
//! host.
//!

#![deny(unsafe_code)]

/// Common error types for transport operations
pub mod error;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Read, Transport, Write};
}

/// Non-blocking byte source.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read up to `buf.len()` currently available bytes.
    ///
    /// Must return `Ok(0)` immediately when nothing is pending instead of
    /// waiting for data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Byte sink.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the transport
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A serial-like link to the modem.
pub trait Transport: Read + Write {
    /// Open (or reopen) the link at `baud_rate` bauds.
    fn open(&mut self, baud_rate: u32) -> Result<(), <Self as Write>::Error>;

    /// Write a whole buffer, retrying partial writes.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<(), <Self as Write>::Error> {
        while !buf.is_empty() {
            let written = self.write(buf)?;
            if written == 0 {
                break;
            }
            buf = &buf[written..];
        }
        Ok(())
    }

    /// Read a single byte if one is available.
    fn read_byte(&mut self) -> Result<Option<u8>, <Self as Read>::Error> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
