//! Registry of out-of-band notification prefixes.
//!
//! Devices push unsolicited lines (`+CMTI: "SM",3`, `RING`, `+CREG: 1`) at
//! any time. Each registered prefix is compared against the text
//! accumulated so far; when the accumulated text is exactly the prefix, the
//! prefix's handler runs with full access to the session, so it can read the
//! rest of the notification with [`AtParser::recv`] or even send commands.

use std::fmt;

use crate::parser::AtParser;

/// What the interrupted receive should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobAction {
    /// Restart the interrupted receive from its first pattern line.
    Continue,
    /// Fail the interrupted receive with [`AtError::Aborted`](crate::AtError::Aborted).
    Abort,
}

/// Handler invoked when a registered prefix is seen.
pub type OobHandler<T> = Box<dyn FnMut(&mut AtParser<T>) -> OobAction>;

struct OobEntry<T> {
    prefix: Vec<u8>,
    /// Taken out while the handler runs.
    handler: Option<OobHandler<T>>,
}

/// Ordered collection of prefixes and their handlers.
///
/// Entries are only ever appended, so an index stays valid for the lifetime
/// of the registry. When two entries share a prefix the earlier one wins.
pub struct OobRegistry<T> {
    entries: Vec<OobEntry<T>>,
}

impl<T> Default for OobRegistry<T> {
    fn default() -> Self {
        OobRegistry {
            entries: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for OobRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.prefixes().map(String::from_utf8_lossy))
            .finish()
    }
}

impl<T> OobRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, prefix: &[u8], handler: OobHandler<T>) {
        self.entries.push(OobEntry {
            prefix: prefix.to_vec(),
            handler: Some(handler),
        });
    }

    /// Index of the first entry whose prefix equals `candidate` exactly.
    ///
    /// Entries whose handler is currently running are skipped, so a nested
    /// receive inside a handler sees its own prefix as plain data.
    pub fn find(&self, candidate: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.handler.is_some() && entry.prefix.as_slice() == candidate)
    }

    /// Prefix of the entry at `index`.
    pub fn prefix(&self, index: usize) -> &[u8] {
        self.entries
            .get(index)
            .map(|entry| entry.prefix.as_slice())
            .unwrap_or_default()
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|entry| entry.prefix.as_slice())
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn take_handler(&mut self, index: usize) -> Option<OobHandler<T>> {
        self.entries.get_mut(index)?.handler.take()
    }

    pub(crate) fn restore_handler(&mut self, index: usize, handler: OobHandler<T>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.handler = Some(handler);
        }
    }
}
