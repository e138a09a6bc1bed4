//! Byte transport consumed by the engine.
//!
//! The engine never touches a serial port directly. Anything that can read
//! a byte with a timeout, write a byte, and report pending input can drive
//! it: a UART driver, a TCP socket bridged to a device, or the in-process
//! [`ChannelTransport`](crate::ChannelTransport).

use std::time::Duration;

use thiserror::Error;

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The other end of the link has gone away.
    #[error("transport disconnected")]
    Disconnected,

    /// An I/O error from the underlying device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other transport specific failure.
    #[error("{0}")]
    Other(String),
}

/// A byte oriented serial link.
pub trait Transport {
    /// Prepare the link. Called once when a session is created.
    fn init(&mut self, timeout: Duration) -> Result<(), TransportError>;

    /// Read one byte, waiting at most `timeout`. `None` means no byte arrived.
    fn read_byte(&mut self, timeout: Duration) -> Option<u8>;

    /// Write one byte.
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Whether a byte can be read without waiting.
    fn data_available(&mut self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn init(&mut self, timeout: Duration) -> Result<(), TransportError> {
        (**self).init(timeout)
    }

    fn read_byte(&mut self, timeout: Duration) -> Option<u8> {
        (**self).read_byte(timeout)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn data_available(&mut self) -> bool {
        (**self).data_available()
    }
}
