//! In-process serial link backed by channels.
//!
//! [`ChannelTransport::pair`] returns the host side, which implements
//! [`Transport`], and a [`DeviceEnd`] that plays the peripheral: it injects
//! responses and notifications and reads back what the host sent. The two
//! halves can live on different threads.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::transport::{Transport, TransportError};

/// Host side of an in-process serial link.
#[derive(Debug)]
pub struct ChannelTransport {
    /// Device → host bytes.
    rx: Receiver<u8>,
    /// Host → device bytes.
    tx: Sender<u8>,
}

/// Device side of an in-process serial link.
#[derive(Debug, Clone)]
pub struct DeviceEnd {
    /// Host → device bytes.
    rx: Receiver<u8>,
    /// Device → host bytes.
    tx: Sender<u8>,
}

impl ChannelTransport {
    /// Create a connected host/device pair.
    pub fn pair() -> (ChannelTransport, DeviceEnd) {
        let (to_host_tx, to_host_rx) = crossbeam_channel::unbounded();
        let (to_device_tx, to_device_rx) = crossbeam_channel::unbounded();
        (
            ChannelTransport {
                rx: to_host_rx,
                tx: to_device_tx,
            },
            DeviceEnd {
                rx: to_device_rx,
                tx: to_host_tx,
            },
        )
    }
}

impl Transport for ChannelTransport {
    fn init(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Option<u8> {
        self.rx.recv_timeout(timeout).ok()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.tx.send(byte).map_err(|_| TransportError::Disconnected)
    }

    fn data_available(&mut self) -> bool {
        !self.rx.is_empty()
    }
}

impl DeviceEnd {
    /// Send bytes to the host.
    pub fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        for &byte in data {
            self.tx.send(byte).map_err(|_| TransportError::Disconnected)?;
        }
        Ok(())
    }

    /// Receive one byte written by the host.
    pub fn recv_byte(&self, timeout: Duration) -> Option<u8> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Receive bytes until `delimiter`, returning the line without it.
    ///
    /// Returns `None` if the whole line does not arrive within `timeout` or
    /// the host side is dropped.
    pub fn read_line(&self, delimiter: &[u8], timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut line = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(byte) => {
                    line.push(byte);
                    if line.ends_with(delimiter) {
                        line.truncate(line.len() - delimiter.len());
                        return Some(line);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Everything the host has written so far.
    pub fn drain(&self) -> Vec<u8> {
        self.rx.try_iter().collect()
    }
}
