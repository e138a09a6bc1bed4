//! Response pattern rewriting.
//!
//! A response pattern is split into lines at each `\n` that is not inside a
//! `%[...]` scanset. Every line gets a verification form in which each
//! storing conversion is suppressed (`%d` → `%*d`) and `%n` is appended.
//! Running the verification form over the accumulated input yields the
//! number of bytes it accounted for; the line matches only when that equals
//! the whole input. Scanning stops silently on a mismatch, so a short count
//! is the only reliable failure signal, which is why the two are compared
//! for exact equality instead of trusting a partial scan.
//!
//! Verification treats a text run that matches nothing as a mismatch, yet
//! responses such as `+CMD:` or `"",` carry empty fields. For every `%s` or
//! `%[` that directly follows a literal, the line records where the run
//! starts so the matcher can pad an empty one with a filler byte.

use atcmd_scan::{is_space, specifier_span, ScanError, ScanMode, Template, TextRun};

use crate::buffer::FILLER;

/// Where a text run starts within a line, and how to pad it when empty.
#[derive(Debug, Clone, PartialEq)]
struct CaptureStart {
    /// The literal byte right before the run.
    trigger: u8,
    /// Verification form up to the run, ending in `%n`.
    prefix: Template,
    /// The suppressed run alone, ending in `%n`.
    run: Template,
    kind: TextRun,
    /// A byte the run accepts.
    filler: u8,
}

impl CaptureStart {
    fn new(trigger: u8, prefix: &str, run: &str, kind: TextRun) -> Result<Option<Self>, ScanError> {
        let prefix = Template::parse(&format!("{}%n", prefix))?;
        let run = Template::parse(&format!("{}%n", run))?;

        let accepts = |byte: u8| run.scan(&[byte], ScanMode::Verify).final_count() == Some(1);
        let filler = std::iter::once(FILLER)
            .chain(b'!'..=b'~')
            .find(|&byte| accepts(byte));

        Ok(filler.map(|filler| CaptureStart {
            trigger,
            prefix,
            run,
            kind,
            filler,
        }))
    }

    /// Whether `candidate` ends exactly where the run begins and `next`
    /// cannot be part of it.
    fn is_empty_at(&self, candidate: &[u8], next: u8) -> bool {
        if candidate.last() != Some(&self.trigger) {
            return false;
        }
        if self.prefix.scan(candidate, ScanMode::Verify).final_count() != Some(candidate.len()) {
            return false;
        }
        match self.kind {
            // `%s` skips spaces, so only the end of the line empties it.
            TextRun::Word => next == b'\r' || next == b'\n',
            TextRun::Set => self.run.scan(&[next], ScanMode::Verify).final_count() != Some(1),
        }
    }
}

/// One line of a response pattern, ready for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternLine<'a> {
    source: &'a str,
    verification: String,
    whole_line_wanted: bool,
    capture_starts: Vec<CaptureStart>,
}

impl<'a> PatternLine<'a> {
    /// Rewrite the first line of `pattern`.
    pub fn rewrite(pattern: &'a str) -> Result<Self, ScanError> {
        let bytes = pattern.as_bytes();
        let mut verification = String::with_capacity(pattern.len() + 8);
        let mut capture_starts = Vec::new();
        let mut whole_line_wanted = false;
        let mut last_literal = None;
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'%' => {
                    verification.push_str(&pattern[literal_start..i]);
                    let span = specifier_span(pattern, i)?;
                    let specifier = &pattern[i..i + span.len];
                    let suppressed = if span.literal_percent || span.suppressed {
                        specifier.to_string()
                    } else {
                        format!("%*{}", &specifier[1..])
                    };

                    if let (Some(kind), Some(trigger)) =
                        (span.text_run, last_literal.filter(|&b| !is_space(b)))
                    {
                        if let Some(start) = CaptureStart::new(trigger, &verification, &suppressed, kind)? {
                            capture_starts.push(start);
                        }
                    }

                    verification.push_str(&suppressed);
                    last_literal = None;
                    i += span.len;
                    literal_start = i;
                }
                b'\n' => {
                    i += 1;
                    whole_line_wanted = true;
                    break;
                }
                byte => {
                    last_literal = Some(byte);
                    i += 1;
                }
            }
        }

        verification.push_str(&pattern[literal_start..i]);
        verification.push_str("%n");

        Ok(PatternLine {
            source: &pattern[..i],
            verification,
            whole_line_wanted,
            capture_starts,
        })
    }

    /// Split a whole pattern into its lines.
    pub fn split(pattern: &'a str) -> Result<Vec<Self>, ScanError> {
        let mut lines = Vec::new();
        let mut rest = pattern;
        while !rest.is_empty() {
            let line = PatternLine::rewrite(rest)?;
            rest = &rest[line.source.len()..];
            lines.push(line);
        }
        Ok(lines)
    }

    /// The line as written, including its terminator. Used for extraction.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The non-storing form ending in `%n`.
    pub fn verification(&self) -> &str {
        &self.verification
    }

    /// Whether the line ends in a terminator, so verification must wait for
    /// a `\n` to arrive. Without this, `Foo: %s\n` would match as soon as
    /// the first character of the value came in.
    pub fn whole_line_wanted(&self) -> bool {
        self.whole_line_wanted
    }

    /// The filler to insert before `next` when `candidate` has just reached
    /// the start of a text run that `next` leaves empty.
    pub fn filler_for(&self, candidate: &[u8], next: u8) -> Option<u8> {
        self.capture_starts
            .iter()
            .find(|start| start.is_empty_at(candidate, next))
            .map(|start| start.filler)
    }
}
