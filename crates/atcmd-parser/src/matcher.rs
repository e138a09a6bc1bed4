//! The streaming response matcher.
//!
//! Each pattern line is matched against a candidate that grows one byte at a
//! time. After every byte (or every `\n`, for lines that end in a
//! terminator) the candidate is checked against the line's verification
//! form; a full-length match triggers value extraction and moves on to the
//! next line. Out-of-band prefixes are checked on every byte and restart the
//! whole pattern once their handler returns.

use atcmd_scan::{ScanMode, Template, Value};

use crate::error::{AtError, AtResult};
use crate::oob::OobAction;
use crate::parser::AtParser;
use crate::pattern::PatternLine;
use crate::transport::Transport;

enum LineOutcome {
    Matched,
    Restarted,
}

impl<T: Transport> AtParser<T> {
    /// Wait for a response matching `response` and return the captured
    /// values in specifier order.
    ///
    /// Lines that do not match are skipped as noise; the call only fails on a
    /// per-character timeout, an aborting out-of-band handler or a bad
    /// pattern.
    pub fn recv(&mut self, response: &str) -> AtResult<Vec<Value>> {
        let mut values = Vec::new();
        self.recv_into(response, &mut values)?;
        Ok(values)
    }

    /// Like [`recv`](Self::recv), but append into `values`.
    ///
    /// Values captured by lines that matched before a failure stay in
    /// `values`; a multi-line receive is not atomic. An out-of-band restart
    /// truncates `values` back to its length on entry.
    pub fn recv_into(&mut self, response: &str, values: &mut Vec<Value>) -> AtResult<()> {
        let lines = PatternLine::split(response)?;
        let base = values.len();

        'restart: loop {
            values.truncate(base);
            for line in &lines {
                match self.match_line(line, values)? {
                    LineOutcome::Matched => {}
                    LineOutcome::Restarted => continue 'restart,
                }
            }
            return Ok(());
        }
    }

    fn match_line(&mut self, line: &PatternLine<'_>, values: &mut Vec<Value>) -> AtResult<LineOutcome> {
        let verifier = Template::parse(line.verification())?;
        let extractor = Template::parse(line.source())?;

        self.buffer
            .stage_template(line.verification().as_bytes(), line.source().len())
            .map_err(|overflow| AtError::PatternTooLong {
                max: overflow.max,
                actual: overflow.actual,
            })?;
        at_trace!(self, "AT? {:?}", line.verification());

        let mut fillers = Vec::new();
        loop {
            let Some(byte) = self.transport.read_byte(self.timeout) else {
                at_trace!(self, "AT(Timeout)");
                return Err(AtError::Timeout);
            };

            if let Some(filler) = line.filler_for(self.buffer.candidate(), byte) {
                fillers.push(self.buffer.candidate().len());
                self.buffer.push_candidate(filler);
            }
            self.buffer.push_candidate(byte);

            if let Some(index) = self.oobs.find(self.buffer.candidate()) {
                return match self.dispatch_oob(index) {
                    OobAction::Abort => {
                        at_trace!(self, "AT(Aborted)");
                        Err(AtError::Aborted)
                    }
                    OobAction::Continue => Ok(LineOutcome::Restarted),
                };
            }

            if !line.whole_line_wanted() || byte == b'\n' {
                let candidate = self.buffer.candidate();
                let outcome = verifier.scan(candidate, ScanMode::Verify);
                if outcome.final_count() == Some(candidate.len()) {
                    self.buffer.strip(&fillers);
                    let cleaned = self.buffer.candidate();
                    at_trace!(self, "AT= {:?}", String::from_utf8_lossy(cleaned));
                    values.extend(extractor.scan(cleaned, ScanMode::Extract).values);
                    return Ok(LineOutcome::Matched);
                }
            }

            if byte == b'\n' || self.buffer.is_exhausted() {
                at_trace!(
                    self,
                    "AT< {:?}",
                    String::from_utf8_lossy(self.buffer.candidate())
                );
                self.buffer.reset_candidate();
                fillers.clear();
            }
        }
    }
}
