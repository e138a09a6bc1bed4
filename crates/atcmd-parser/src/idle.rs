//! Draining unsolicited data between commands.

use crate::oob::OobAction;
use crate::parser::AtParser;
use crate::transport::Transport;

impl<T: Transport> AtParser<T> {
    /// Handle at most one out-of-band notification without blocking when the
    /// link is quiet.
    ///
    /// Returns `true` if a handler ran. Returns `false` straight away, with
    /// the session untouched, when the transport reports no pending data.
    /// Complete input lines that match no prefix are passed to the
    /// unprocessed sink, if one is set.
    pub fn poll_oob(&mut self) -> bool {
        if !self.transport.data_available() {
            return false;
        }

        self.buffer.begin_accumulate();
        loop {
            let Some(byte) = self.transport.read_byte(self.timeout) else {
                return false;
            };
            self.buffer.push_candidate(byte);

            if let Some(index) = self.oobs.find(self.buffer.candidate()) {
                if self.dispatch_oob(index) == OobAction::Abort {
                    at_trace!(self, "AT(Aborted)");
                }
                return true;
            }

            if self.buffer.is_exhausted() || self.buffer.candidate().ends_with(&self.input_delimiter) {
                self.flush_unprocessed();
                if !self.transport.data_available() {
                    return false;
                }
            }
        }
    }

    fn flush_unprocessed(&mut self) {
        let candidate = self.buffer.candidate();
        at_trace!(
            self,
            "AT< {:?} ({} bytes)",
            String::from_utf8_lossy(candidate),
            candidate.len()
        );
        if let Some(sink) = self.unprocessed.as_mut() {
            sink(candidate);
        }
        self.buffer.reset_candidate();
    }
}
