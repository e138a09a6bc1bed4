//! The session's fixed-capacity scratch buffer.
//!
//! One allocation serves three roles, never two at once:
//!
//! ```text
//! matching:  | template ... | 0 | candidate ... | 0 | free ... |
//! polling:   | candidate ... | 0 | free ...                    |
//! sending:   | command ... | 0 | free ...                      |
//! ```
//!
//! Entering a role discards whatever the previous role left behind. Writes
//! are bounded by the capacity; a candidate that would overflow is refused
//! and the caller resets it.

use crate::config::MIN_BUFFER_SIZE;

/// Preferred byte injected where an empty text run begins, so verification
/// still has something to consume. Runs whose scanset rejects it get another.
pub(crate) const FILLER: u8 = b'x';

/// Room kept free after a candidate: a filler, the next byte and the
/// terminator.
const RESERVE: usize = 3;

/// A region did not fit the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
    /// Largest length that would have fit.
    pub max: usize,
    /// Length that was requested.
    pub actual: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Idle,
    /// Candidate text starts at `offset`; a staged template, if any,
    /// occupies `0..offset - 1`.
    Accumulating { offset: usize, len: usize },
    Output { len: usize },
}

/// Fixed-capacity buffer shared by the matcher, the idle poller and the
/// command sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchBuffer {
    bytes: Box<[u8]>,
    role: Role,
}

impl ScratchBuffer {
    /// Allocate a buffer of `capacity` bytes, at least [`MIN_BUFFER_SIZE`].
    pub fn new(capacity: usize) -> Self {
        ScratchBuffer {
            bytes: vec![0; capacity.max(MIN_BUFFER_SIZE)].into_boxed_slice(),
            role: Role::Idle,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Stage a verification template and start an empty candidate after it.
    ///
    /// Fails unless a candidate of at least `min_candidate` bytes still fits
    /// behind the template.
    pub(crate) fn stage_template(&mut self, template: &[u8], min_candidate: usize) -> Result<(), Overflow> {
        let max = self
            .capacity()
            .saturating_sub(RESERVE + 1)
            .saturating_sub(min_candidate);
        if template.len() > max {
            return Err(Overflow {
                max,
                actual: template.len(),
            });
        }
        let offset = template.len() + 1;
        self.bytes[..template.len()].copy_from_slice(template);
        self.bytes[template.len()] = 0;
        self.bytes[offset] = 0;
        self.role = Role::Accumulating { offset, len: 0 };
        Ok(())
    }

    /// Start an empty candidate at the front of the buffer.
    pub(crate) fn begin_accumulate(&mut self) {
        self.bytes[0] = 0;
        self.role = Role::Accumulating { offset: 0, len: 0 };
    }

    /// Copy a formatted command into the buffer.
    pub(crate) fn stage_output(&mut self, text: &[u8]) -> Result<(), Overflow> {
        let max = self.capacity().saturating_sub(1);
        if text.len() > max {
            return Err(Overflow {
                max,
                actual: text.len(),
            });
        }
        self.bytes[..text.len()].copy_from_slice(text);
        self.bytes[text.len()] = 0;
        self.role = Role::Output { len: text.len() };
        Ok(())
    }

    /// The staged verification template.
    pub fn template(&self) -> &[u8] {
        match self.role {
            Role::Accumulating { offset, .. } if offset > 0 => &self.bytes[..offset - 1],
            _ => &[],
        }
    }

    /// The accumulated candidate text.
    pub fn candidate(&self) -> &[u8] {
        match self.role {
            Role::Accumulating { offset, len } => &self.bytes[offset..offset + len],
            _ => &[],
        }
    }

    /// The staged command.
    pub fn output(&self) -> &[u8] {
        match self.role {
            Role::Output { len } => &self.bytes[..len],
            _ => &[],
        }
    }

    /// Whether `n` more candidate bytes fit, leaving room for the terminator.
    pub fn has_room(&self, n: usize) -> bool {
        match self.role {
            Role::Accumulating { offset, len } => offset + len + n < self.capacity(),
            _ => false,
        }
    }

    /// Whether the candidate has grown too large to take another step.
    pub fn is_exhausted(&self) -> bool {
        !self.has_room(RESERVE - 1)
    }

    /// Append a byte to the candidate. A byte that does not fit is dropped;
    /// callers check [`has_room`](Self::has_room) first.
    pub(crate) fn push_candidate(&mut self, byte: u8) {
        if !self.has_room(1) {
            return;
        }
        if let Role::Accumulating { offset, len } = self.role {
            self.bytes[offset + len] = byte;
            self.bytes[offset + len + 1] = 0;
            self.role = Role::Accumulating {
                offset,
                len: len + 1,
            };
        }
    }

    /// Drop the candidate, keeping any staged template.
    pub(crate) fn reset_candidate(&mut self) {
        if let Role::Accumulating { offset, .. } = self.role {
            self.bytes[offset] = 0;
            self.role = Role::Accumulating { offset, len: 0 };
        }
    }

    /// Remove the bytes at `positions` (ascending candidate indices) from the
    /// candidate, keeping the order of everything else.
    pub(crate) fn strip(&mut self, positions: &[usize]) {
        let Role::Accumulating { offset, len } = self.role else {
            return;
        };
        let mut skip = positions.iter().copied().peekable();
        let mut write = 0;
        for read in 0..len {
            if skip.peek() == Some(&read) {
                skip.next();
                continue;
            }
            self.bytes[offset + write] = self.bytes[offset + read];
            write += 1;
        }
        self.bytes[offset + write] = 0;
        self.role = Role::Accumulating { offset, len: write };
    }
}
