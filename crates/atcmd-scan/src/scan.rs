//! scanf-style response templates.
//!
//! A [`Template`] is parsed once from a format string and then run against
//! candidate input. The directives follow the formatted-scan conventions:
//!
//! - A run of whitespace matches zero or more whitespace bytes.
//! - Any other literal byte must match exactly.
//! - `%%` matches a literal percent sign (after skipping whitespace).
//! - `%[*][width][length]conv` is a conversion. `*` matches without storing.
//!
//! Supported conversions are `d i u o x X` (integers), `f e g E G a F A`
//! (floats), `s` (non-whitespace word), `c` (fixed count of bytes), `[...]`
//! (scanset) and `n` (bytes consumed so far). Length modifiers are accepted
//! and ignored since every value is stored at full width.
//!
//! Scanning stops at the first failure. Values stored before the failure are
//! kept, which is what lets a trailing `%n` tell a complete match from one
//! that stopped part way.

use std::fmt;

use crate::error::ScanError;

/// How strictly conversions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Every conversion must match at least one byte.
    Verify,
    /// Text conversions (`%s`, `%c`, `%[`) that match nothing store an
    /// empty string instead of failing.
    Extract,
}

/// A value stored by a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `%d`, `%i`
    Int(i64),
    /// `%u`, `%o`, `%x`
    Uint(u64),
    /// `%f`, `%e`, `%g`
    Float(f64),
    /// `%s`, `%c`, `%[`
    Str(String),
    /// `%n`
    Count(usize),
}

impl Value {
    /// The value as a signed integer, if it is integral and fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::Uint(v) => i64::try_from(v).ok(),
            Value::Count(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is integral and non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::Uint(v) => Some(v),
            Value::Count(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as a float. Integers are converted.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::Uint(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// The captured text of a string conversion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Take the captured text of a string conversion.
    pub fn into_string(self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Count(v) => write!(f, "{}", v),
        }
    }
}

/// Result of running a template against some input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanOutcome {
    /// Values stored by non-suppressed conversions, left to right.
    pub values: Vec<Value>,
    /// Input bytes consumed when scanning stopped.
    pub consumed: usize,
    /// Whether every directive was processed.
    pub complete: bool,
}

impl ScanOutcome {
    /// The count stored by a trailing `%n`, if scanning reached it.
    ///
    /// Only meaningful for templates whose last directive is `%n`.
    pub fn final_count(&self) -> Option<usize> {
        if !self.complete {
            return None;
        }
        match self.values.last() {
            Some(Value::Count(n)) => Some(*n),
            _ => None,
        }
    }
}

/// Location and shape of one `%` specifier inside a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecifierSpan {
    /// Length in bytes, including the leading `%`.
    pub len: usize,
    /// `%*...`: matched but not stored.
    pub suppressed: bool,
    /// `%%`: a literal percent sign.
    pub literal_percent: bool,
    /// `%s` or `%[`: a text run that a response may leave empty.
    ///
    /// `%c` is not a run; it always takes exactly its width in bytes.
    pub text_run: Option<TextRun>,
}

/// The two variable-length text conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRun {
    /// `%s`: skips leading whitespace, then takes non-whitespace.
    Word,
    /// `%[...]`: takes bytes of the scanset, whitespace included.
    Set,
}

/// Measure the specifier starting at `offset`, which must hold a `%`.
pub fn specifier_span(format: &str, offset: usize) -> Result<SpecifierSpan, ScanError> {
    let (specifier, len) = parse_specifier(format.as_bytes(), offset)?;
    Ok(match specifier {
        Specifier::Percent => SpecifierSpan {
            len,
            suppressed: false,
            literal_percent: true,
            text_run: None,
        },
        Specifier::Conversion(conversion) => SpecifierSpan {
            len,
            suppressed: conversion.suppress,
            literal_percent: false,
            text_run: match conversion.kind {
                ConversionKind::Str => Some(TextRun::Word),
                ConversionKind::Set(_) => Some(TextRun::Set),
                _ => None,
            },
        },
    })
}

/// A parsed scan template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Whitespace,
    Literal(u8),
    Percent,
    Conversion(Conversion),
}

enum Specifier {
    Percent,
    Conversion(Conversion),
}

#[derive(Debug, Clone, PartialEq)]
struct Conversion {
    suppress: bool,
    width: Option<usize>,
    kind: ConversionKind,
}

#[derive(Debug, Clone, PartialEq)]
enum ConversionKind {
    /// Radix 0 picks the base from the prefix, as `%i` does.
    Signed { radix: u32 },
    Unsigned { radix: u32 },
    Float,
    Str,
    Chars,
    Set(ScanSet),
    Count,
}

#[derive(Clone, PartialEq, Eq)]
struct ScanSet {
    negated: bool,
    members: [bool; 256],
}

impl ScanSet {
    fn contains(&self, byte: u8) -> bool {
        self.members[byte as usize] != self.negated
    }
}

impl fmt::Debug for ScanSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<u8> = (0..=255u8).filter(|&b| self.members[b as usize]).collect();
        f.debug_struct("ScanSet")
            .field("negated", &self.negated)
            .field("members", &String::from_utf8_lossy(&members))
            .finish()
    }
}

impl Template {
    /// Parse a scanf-style format string.
    pub fn parse(format: &str) -> Result<Self, ScanError> {
        let bytes = format.as_bytes();
        let mut directives = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let byte = bytes[i];
            if is_space(byte) {
                while i < bytes.len() && is_space(bytes[i]) {
                    i += 1;
                }
                directives.push(Directive::Whitespace);
            } else if byte == b'%' {
                let (specifier, len) = parse_specifier(bytes, i)?;
                directives.push(match specifier {
                    Specifier::Percent => Directive::Percent,
                    Specifier::Conversion(conversion) => Directive::Conversion(conversion),
                });
                i += len;
            } else {
                directives.push(Directive::Literal(byte));
                i += 1;
            }
        }

        Ok(Template { directives })
    }

    /// Run the template against `input`.
    pub fn scan(&self, input: &[u8], mode: ScanMode) -> ScanOutcome {
        let mut cursor = Cursor { input, pos: 0 };
        let mut values = Vec::new();
        let mut complete = true;

        for directive in &self.directives {
            let step = match directive {
                Directive::Whitespace => {
                    cursor.skip_space();
                    Ok(None)
                }
                Directive::Literal(byte) => cursor.expect(*byte).map(|_| None),
                Directive::Percent => {
                    cursor.skip_space();
                    cursor.expect(b'%').map(|_| None)
                }
                Directive::Conversion(conversion) => conversion.apply(&mut cursor, mode),
            };

            match step {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(Mismatch) => {
                    complete = false;
                    break;
                }
            }
        }

        ScanOutcome {
            values,
            consumed: cursor.pos,
            complete,
        }
    }
}

fn parse_specifier(bytes: &[u8], start: usize) -> Result<(Specifier, usize), ScanError> {
    let incomplete = || ScanError::IncompleteSpecifier { offset: start };
    let mut i = start + 1;

    match bytes.get(i) {
        None => return Err(incomplete()),
        Some(b'%') => return Ok((Specifier::Percent, 2)),
        Some(_) => {}
    }

    let suppress = bytes.get(i) == Some(&b'*');
    if suppress {
        i += 1;
    }

    let digits_start = i;
    let mut width = 0usize;
    while let Some(d) = bytes.get(i).copied().filter(u8::is_ascii_digit) {
        width = width.saturating_mul(10).saturating_add((d - b'0') as usize);
        i += 1;
    }
    let width = if i > digits_start {
        if width == 0 {
            return Err(ScanError::ZeroWidth { offset: start });
        }
        Some(width)
    } else {
        None
    };

    while matches!(
        bytes.get(i),
        Some(b'h' | b'l' | b'L' | b'j' | b'z' | b't' | b'q')
    ) {
        i += 1;
    }

    let conv = *bytes.get(i).ok_or_else(incomplete)?;
    i += 1;

    let kind = match conv {
        b'd' => ConversionKind::Signed { radix: 10 },
        b'i' => ConversionKind::Signed { radix: 0 },
        b'u' => ConversionKind::Unsigned { radix: 10 },
        b'o' => ConversionKind::Unsigned { radix: 8 },
        b'x' | b'X' => ConversionKind::Unsigned { radix: 16 },
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A' => ConversionKind::Float,
        b's' => ConversionKind::Str,
        b'c' => ConversionKind::Chars,
        b'n' => ConversionKind::Count,
        b'[' => {
            let (set, end) = parse_scanset(bytes, i, start)?;
            i = end;
            ConversionKind::Set(set)
        }
        other => {
            return Err(ScanError::InvalidSpecifier {
                offset: start,
                found: char::from(other),
            })
        }
    };

    Ok((
        Specifier::Conversion(Conversion {
            suppress,
            width,
            kind,
        }),
        i - start,
    ))
}

/// Parse the body of `%[...]`; `i` points just past the `[`.
fn parse_scanset(bytes: &[u8], mut i: usize, start: usize) -> Result<(ScanSet, usize), ScanError> {
    let mut members = [false; 256];

    let negated = bytes.get(i) == Some(&b'^');
    if negated {
        i += 1;
    }
    // A leading ']' is a member, not the terminator.
    if bytes.get(i) == Some(&b']') {
        members[b']' as usize] = true;
        i += 1;
    }

    loop {
        let byte = *bytes
            .get(i)
            .ok_or(ScanError::UnterminatedScanSet { offset: start })?;
        if byte == b']' {
            return Ok((ScanSet { negated, members }, i + 1));
        }

        let range_end = match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(b'-'), Some(&hi)) if hi != b']' => Some(hi),
            _ => None,
        };

        match range_end {
            Some(hi) if hi >= byte => {
                for member in byte..=hi {
                    members[member as usize] = true;
                }
                i += 3;
            }
            Some(hi) => {
                members[byte as usize] = true;
                members[b'-' as usize] = true;
                members[hi as usize] = true;
                i += 3;
            }
            None => {
                members[byte as usize] = true;
                i += 1;
            }
        }
    }
}

struct Mismatch;

struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn skip_space(&mut self) {
        while self.pos < self.input.len() && is_space(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), Mismatch> {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Mismatch)
        }
    }

    fn limit(&self, width: usize) -> usize {
        self.pos.saturating_add(width).min(self.input.len())
    }

    fn take_while(&mut self, width: usize, accept: impl Fn(u8) -> bool) -> &'a [u8] {
        let limit = self.limit(width);
        let start = self.pos;
        while self.pos < limit && accept(self.input[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Sign and magnitude of an integer field.
    fn integer(&mut self, radix: u32, width: usize) -> Result<(bool, u64), Mismatch> {
        self.skip_space();
        let input = self.input;
        let limit = self.limit(width);
        let mut i = self.pos;

        let mut negative = false;
        if i < limit && matches!(input[i], b'+' | b'-') {
            negative = input[i] == b'-';
            i += 1;
        }

        let hex_prefix = i + 2 < limit
            && input[i] == b'0'
            && matches!(input[i + 1], b'x' | b'X')
            && input[i + 2].is_ascii_hexdigit();

        let radix = match radix {
            16 | 0 if hex_prefix => {
                i += 2;
                16
            }
            0 if i < limit && input[i] == b'0' => 8,
            0 => 10,
            radix => radix,
        };

        let digits_start = i;
        let mut magnitude = 0u64;
        while i < limit {
            let Some(digit) = char::from(input[i]).to_digit(radix) else {
                break;
            };
            magnitude = magnitude
                .saturating_mul(radix as u64)
                .saturating_add(digit as u64);
            i += 1;
        }
        if i == digits_start {
            return Err(Mismatch);
        }

        self.pos = i;
        Ok((negative, magnitude))
    }

    fn float(&mut self, width: usize) -> Result<f64, Mismatch> {
        self.skip_space();
        let input = self.input;
        let limit = self.limit(width);
        let start = self.pos;
        let mut i = start;

        if i < limit && matches!(input[i], b'+' | b'-') {
            i += 1;
        }

        let rest = &input[i..limit];
        let special = ["infinity", "inf", "nan"]
            .into_iter()
            .find(|word| rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes()));

        if let Some(word) = special {
            i += word.len();
        } else {
            let mut digits = 0;
            while i < limit && input[i].is_ascii_digit() {
                i += 1;
                digits += 1;
            }
            if i < limit && input[i] == b'.' {
                i += 1;
                while i < limit && input[i].is_ascii_digit() {
                    i += 1;
                    digits += 1;
                }
            }
            if digits == 0 {
                return Err(Mismatch);
            }
            if i < limit && matches!(input[i], b'e' | b'E') {
                let mut j = i + 1;
                if j < limit && matches!(input[j], b'+' | b'-') {
                    j += 1;
                }
                if j < limit && input[j].is_ascii_digit() {
                    while j < limit && input[j].is_ascii_digit() {
                        j += 1;
                    }
                    i = j;
                }
            }
        }

        let text = std::str::from_utf8(&input[start..i]).map_err(|_| Mismatch)?;
        let value = text.parse::<f64>().map_err(|_| Mismatch)?;
        self.pos = i;
        Ok(value)
    }
}

impl Conversion {
    fn apply(&self, cursor: &mut Cursor<'_>, mode: ScanMode) -> Result<Option<Value>, Mismatch> {
        let width = self.width.unwrap_or(usize::MAX);
        let lenient = mode == ScanMode::Extract;

        let value = match &self.kind {
            ConversionKind::Signed { radix } => {
                let (negative, magnitude) = cursor.integer(*radix, width)?;
                let signed = if negative {
                    -(magnitude as i128)
                } else {
                    magnitude as i128
                };
                Value::Int(signed.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
            }
            ConversionKind::Unsigned { radix } => {
                let (negative, magnitude) = cursor.integer(*radix, width)?;
                Value::Uint(if negative {
                    magnitude.wrapping_neg()
                } else {
                    magnitude
                })
            }
            ConversionKind::Float => Value::Float(cursor.float(width)?),
            ConversionKind::Str => {
                cursor.skip_space();
                let word = cursor.take_while(width, |b| !is_space(b));
                if word.is_empty() && !lenient {
                    return Err(Mismatch);
                }
                Value::Str(String::from_utf8_lossy(word).into_owned())
            }
            ConversionKind::Chars => {
                let count = self.width.unwrap_or(1);
                let available = cursor.input.len() - cursor.pos;
                if available < count && !lenient {
                    return Err(Mismatch);
                }
                let chars = cursor.take_while(count, |_| true);
                Value::Str(String::from_utf8_lossy(chars).into_owned())
            }
            ConversionKind::Set(set) => {
                let run = cursor.take_while(width, |b| set.contains(b));
                if run.is_empty() && !lenient {
                    return Err(Mismatch);
                }
                Value::Str(String::from_utf8_lossy(run).into_owned())
            }
            ConversionKind::Count => Value::Count(cursor.pos),
        };

        Ok(if self.suppress { None } else { Some(value) })
    }
}

/// Whitespace as the C locale classifies it.
pub fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}
