//! The AT command session.

use std::fmt;
use std::time::Duration;

use atcmd_scan::{format, split_args, Arg};

use crate::buffer::ScratchBuffer;
use crate::config::ParserConfig;
use crate::error::{AtError, AtResult};
use crate::oob::{OobAction, OobRegistry};
use crate::transport::Transport;

/// Receives data the idle poller read that matched no out-of-band prefix.
pub type UnprocessedSink = Box<dyn FnMut(&[u8])>;

/// A request/response session over one transport.
///
/// The session owns its transport, a fixed-capacity scratch buffer and the
/// table of out-of-band handlers. It is driven by one caller at a time;
/// handlers run on the caller's stack with full access to the session.
pub struct AtParser<T> {
    pub(crate) transport: T,
    pub(crate) buffer: ScratchBuffer,
    pub(crate) oobs: OobRegistry<T>,
    pub(crate) unprocessed: Option<UnprocessedSink>,
    pub(crate) timeout: Duration,
    pub(crate) debug: bool,
    pub(crate) output_delimiter: Vec<u8>,
    pub(crate) input_delimiter: Vec<u8>,
}

impl<T: fmt::Debug> fmt::Debug for AtParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtParser")
            .field("transport", &self.transport)
            .field("buffer_size", &self.buffer.capacity())
            .field("oobs", &self.oobs)
            .field("unprocessed_sink", &self.unprocessed.is_some())
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .field("output_delimiter", &String::from_utf8_lossy(&self.output_delimiter))
            .field("input_delimiter", &String::from_utf8_lossy(&self.input_delimiter))
            .finish()
    }
}

impl<T: Transport> AtParser<T> {
    /// Create a session and initialise its transport.
    pub fn new(mut transport: T, config: ParserConfig) -> AtResult<Self> {
        config.validate()?;
        transport.init(config.timeout()).map_err(AtError::Init)?;

        Ok(AtParser {
            transport,
            buffer: ScratchBuffer::new(config.buffer_size),
            oobs: OobRegistry::new(),
            unprocessed: None,
            timeout: config.timeout(),
            debug: config.debug,
            output_delimiter: config.output_delimiter.into_bytes(),
            input_delimiter: config.input_delimiter.into_bytes(),
        })
    }

    /// Create a session with the default configuration.
    pub fn with_defaults(transport: T) -> AtResult<Self> {
        Self::new(transport, ParserConfig::default())
    }

    /// Change the per-character timeout. Takes effect on the next read.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Raise matcher traces from trace to debug level.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Register a handler for unsolicited data starting with `prefix`.
    ///
    /// The prefix is compared against the accumulated line exactly, so it
    /// must include everything up to the point where the handler takes over,
    /// e.g. `"+CMTI:"` or `"RING\r\n"`. When two registrations share a
    /// prefix, the first one wins.
    pub fn register_oob<F>(&mut self, prefix: &str, handler: F)
    where
        F: FnMut(&mut AtParser<T>) -> OobAction + 'static,
    {
        self.oobs.register(prefix.as_bytes(), Box::new(handler));
    }

    /// Forward data the idle poller cannot attribute to any handler.
    pub fn set_unprocessed_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&[u8]) + 'static,
    {
        self.unprocessed = Some(Box::new(sink));
    }

    pub fn clear_unprocessed_sink(&mut self) {
        self.unprocessed = None;
    }

    /// Split a comma separated argument list, honouring `\,` escapes.
    ///
    /// See [`split_args`].
    pub fn analyse_args(&self, args: &str, max_args: usize) -> Vec<String> {
        let fields = split_args(args, max_args);
        at_trace!(self, "AT( args {:?} -> {:?} )", args, fields);
        fields
    }

    /// Format and send a command followed by the output delimiter.
    ///
    /// Pending out-of-band data is drained first, so a notification that
    /// arrived while idle is handled before the command goes out.
    pub fn send(&mut self, command: &str, args: &[Arg<'_>]) -> AtResult<()> {
        while self.poll_oob() {}

        let text = format(command, args)?;
        self.buffer
            .stage_output(text.as_bytes())
            .map_err(|overflow| AtError::CommandTooLong {
                max: overflow.max,
                actual: overflow.actual,
            })?;

        for &byte in self.buffer.output() {
            self.transport.write_byte(byte).map_err(AtError::Write)?;
        }
        for &byte in &self.output_delimiter {
            self.transport.write_byte(byte).map_err(AtError::Write)?;
        }

        at_trace!(self, "AT> {}", text);
        Ok(())
    }

    /// Read exactly `buf.len()` raw bytes.
    ///
    /// Fails with [`AtError::Timeout`] if any byte is late; bytes read before
    /// the timeout are consumed and lost.
    pub fn read(&mut self, buf: &mut [u8]) -> AtResult<usize> {
        for slot in buf.iter_mut() {
            *slot = self.transport.read_byte(self.timeout).ok_or(AtError::Timeout)?;
        }
        Ok(buf.len())
    }

    /// Write raw bytes with no delimiter.
    pub fn write(&mut self, data: &[u8]) -> AtResult<usize> {
        for &byte in data {
            self.transport.write_byte(byte).map_err(AtError::Write)?;
        }
        Ok(data.len())
    }

    /// Run the handler registered at `index`.
    ///
    /// The handler is lifted out of the table while it runs, so a nested
    /// receive inside it cannot dispatch to it again.
    pub(crate) fn dispatch_oob(&mut self, index: usize) -> OobAction {
        at_trace!(self, "AT! {}", String::from_utf8_lossy(self.oobs.prefix(index)));

        let Some(mut handler) = self.oobs.take_handler(index) else {
            return OobAction::Continue;
        };
        let action = handler(self);
        self.oobs.restore_handler(index, handler);
        action
    }
}

impl<T> AtParser<T> {
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear the session down and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The scratch buffer, for inspection.
    pub fn scratch(&self) -> &ScratchBuffer {
        &self.buffer
    }

    pub fn oobs(&self) -> &OobRegistry<T> {
        &self.oobs
    }
}
