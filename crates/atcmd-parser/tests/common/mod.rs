//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use atcmd_parser::{AtParser, ParserConfig, Transport, TransportError};

/// One step of a scripted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Byte(u8),
    /// The next read times out.
    Timeout,
}

/// A transport that replays a fixed script and records everything written.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Event>,
    written: Vec<u8>,
    /// Echo each written line back, terminated by `\r\n`, once `\r` is written.
    echo: bool,
    pending_line: Vec<u8>,
    /// Fail writes once this many bytes have been written.
    write_limit: Option<usize>,
    fail_init: bool,
    reads: usize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the host to read.
    pub fn with_input(mut self, data: &[u8]) -> Self {
        self.push(data);
        self
    }

    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn push(&mut self, data: &[u8]) {
        self.script.extend(data.iter().copied().map(Event::Byte));
    }

    pub fn push_timeout(&mut self) {
        self.script.push_back(Event::Timeout);
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Number of bytes still queued.
    pub fn remaining(&self) -> usize {
        self.script
            .iter()
            .filter(|event| matches!(event, Event::Byte(_)))
            .count()
    }

    /// Number of read attempts made, including timeouts.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Transport for ScriptedTransport {
    fn init(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        if self.fail_init {
            return Err(TransportError::Other("port not found".into()));
        }
        Ok(())
    }

    fn read_byte(&mut self, _timeout: Duration) -> Option<u8> {
        self.reads += 1;
        match self.script.pop_front()? {
            Event::Byte(byte) => Some(byte),
            Event::Timeout => None,
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        if self.write_limit.is_some_and(|limit| self.written.len() >= limit) {
            return Err(TransportError::Disconnected);
        }
        self.written.push(byte);

        if self.echo {
            if byte == b'\r' {
                let line = std::mem::take(&mut self.pending_line);
                self.push(&line);
                self.push(b"\r\n");
            } else {
                self.pending_line.push(byte);
            }
        }
        Ok(())
    }

    fn data_available(&mut self) -> bool {
        matches!(self.script.front(), Some(Event::Byte(_)))
    }
}

/// Install a subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A session over `transport` with a short timeout and debug traces on.
pub fn session(transport: ScriptedTransport) -> AtParser<ScriptedTransport> {
    init_tracing();
    let config = ParserConfig::default()
        .with_timeout(Duration::from_millis(10))
        .with_debug(true);
    AtParser::new(transport, config).expect("session should start")
}

/// A session over a transport that will deliver `input`.
pub fn session_with_input(input: &[u8]) -> AtParser<ScriptedTransport> {
    session(ScriptedTransport::new().with_input(input))
}
