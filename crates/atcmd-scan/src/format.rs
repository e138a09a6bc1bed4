//! printf-style command formatting.
//!
//! Commands are written the way they appear in modem manuals, e.g.
//! `AT+CMGS="%s"` or `AT+CFUN=%d,%d`, and filled from a slice of [`Arg`]s.
//!
//! Supported conversions: `d i u x X o c s f F e E g G %`, with the flags
//! `- + space 0 #`, a width and a precision (either may be `*`, taken from
//! an integer argument). Length modifiers are accepted and ignored.

use std::borrow::Cow;

use crate::error::FormatError;

/// A single argument for [`format`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a> {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(Cow<'a, str>),
    /// Single character.
    Char(char),
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Arg<'_> {
                fn from(value: $source) -> Self {
                    Arg::$variant(value as $target)
                }
            }
        )+
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(Uint as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f32, f64);

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Str(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Str(Cow::Owned(value))
    }
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Arg::Char(value)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format `command` with `args`.
///
/// Surplus arguments are ignored.
pub fn format(command: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
    let bytes = command.as_bytes();
    let mut out = String::with_capacity(command.len() + 16);
    let mut next_arg = 0usize;
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        out.push_str(&command[literal_start..i]);
        let start = i;
        i += 1;

        if bytes.get(i) == Some(&b'%') {
            out.push('%');
            i += 1;
            literal_start = i;
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = bytes.get(i) {
            match flag {
                b'-' => spec.left = true,
                b'+' => spec.plus = true,
                b' ' => spec.space = true,
                b'0' => spec.zero = true,
                b'#' => spec.alternate = true,
                _ => break,
            }
            i += 1;
        }

        if bytes.get(i) == Some(&b'*') {
            let width = star_argument(args, &mut next_arg)?;
            if width < 0 {
                spec.left = true;
            }
            spec.width = width.unsigned_abs() as usize;
            i += 1;
        } else {
            spec.width = parse_number(bytes, &mut i);
        }

        if bytes.get(i) == Some(&b'.') {
            i += 1;
            if bytes.get(i) == Some(&b'*') {
                let precision = star_argument(args, &mut next_arg)?;
                // A negative precision is taken as if omitted.
                spec.precision = usize::try_from(precision).ok();
                i += 1;
            } else {
                spec.precision = Some(parse_number(bytes, &mut i));
            }
        }

        while matches!(
            bytes.get(i),
            Some(b'h' | b'l' | b'L' | b'j' | b'z' | b't' | b'q')
        ) {
            i += 1;
        }

        let conversion = *bytes
            .get(i)
            .ok_or(FormatError::IncompleteSpecifier { offset: start })?;
        i += 1;
        literal_start = i;

        if !b"diuxXocsfFeEgG".contains(&conversion) {
            return Err(FormatError::InvalidConversion {
                offset: start,
                found: char::from(conversion),
            });
        }

        let index = next_arg;
        let arg = args
            .get(index)
            .ok_or(FormatError::MissingArgument { index })?;
        next_arg += 1;

        let mismatch = || FormatError::TypeMismatch {
            index,
            conversion: char::from(conversion),
        };

        let body = match conversion {
            b'd' | b'i' => match arg {
                Arg::Int(v) => signed(*v < 0, v.unsigned_abs(), &spec),
                Arg::Uint(v) => signed(false, *v, &spec),
                _ => return Err(mismatch()),
            },
            b'u' | b'x' | b'X' | b'o' => {
                let value = match arg {
                    Arg::Uint(v) => *v,
                    // Reinterpreted as two's complement, as C does.
                    Arg::Int(v) => *v as u64,
                    _ => return Err(mismatch()),
                };
                unsigned(value, conversion, &spec)
            }
            b'c' => {
                let c = match arg {
                    Arg::Char(c) => *c,
                    Arg::Int(v) => u32::try_from(*v).ok().and_then(char::from_u32).ok_or_else(mismatch)?,
                    Arg::Uint(v) => u32::try_from(*v).ok().and_then(char::from_u32).ok_or_else(mismatch)?,
                    _ => return Err(mismatch()),
                };
                pad(String::new(), c.to_string(), &spec, false)
            }
            b's' => {
                let text: &str = match arg {
                    Arg::Str(s) => s.as_ref(),
                    _ => return Err(mismatch()),
                };
                let text = match spec.precision {
                    Some(max) => text.chars().take(max).collect(),
                    None => text.to_string(),
                };
                pad(String::new(), text, &spec, false)
            }
            _ => match arg {
                Arg::Float(v) => float(*v, conversion, &spec),
                _ => return Err(mismatch()),
            },
        };
        out.push_str(&body);
    }

    out.push_str(&command[literal_start..]);
    Ok(out)
}

fn parse_number(bytes: &[u8], i: &mut usize) -> usize {
    let mut value = 0usize;
    while let Some(d) = bytes.get(*i).copied().filter(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((d - b'0') as usize);
        *i += 1;
    }
    value
}

fn star_argument(args: &[Arg<'_>], next_arg: &mut usize) -> Result<i64, FormatError> {
    let index = *next_arg;
    *next_arg += 1;
    match args.get(index) {
        Some(Arg::Int(v)) => Ok(*v),
        Some(Arg::Uint(v)) => i64::try_from(*v).map_err(|_| FormatError::TypeMismatch {
            index,
            conversion: '*',
        }),
        Some(_) => Err(FormatError::TypeMismatch {
            index,
            conversion: '*',
        }),
        None => Err(FormatError::MissingArgument { index }),
    }
}

fn sign_prefix(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

/// Apply width: zero padding goes between prefix and digits.
fn pad(prefix: String, digits: String, spec: &Spec, zero_allowed: bool) -> String {
    let len = prefix.chars().count() + digits.chars().count();
    if len >= spec.width {
        return prefix + &digits;
    }
    let fill = spec.width - len;
    if spec.left {
        prefix + &digits + &" ".repeat(fill)
    } else if spec.zero && zero_allowed {
        prefix + &"0".repeat(fill) + &digits
    } else {
        " ".repeat(fill) + &prefix + &digits
    }
}

fn with_precision(mut digits: String, spec: &Spec, value_is_zero: bool) -> String {
    match spec.precision {
        Some(0) if value_is_zero => String::new(),
        Some(min) if digits.len() < min => {
            digits.insert_str(0, &"0".repeat(min - digits.len()));
            digits
        }
        _ => digits,
    }
}

fn signed(negative: bool, magnitude: u64, spec: &Spec) -> String {
    let digits = with_precision(magnitude.to_string(), spec, magnitude == 0);
    pad(
        sign_prefix(negative, spec).to_string(),
        digits,
        spec,
        spec.precision.is_none(),
    )
}

fn unsigned(value: u64, conversion: u8, spec: &Spec) -> String {
    let (digits, prefix) = match conversion {
        b'x' => (format!("{:x}", value), if spec.alternate && value != 0 { "0x" } else { "" }),
        b'X' => (format!("{:X}", value), if spec.alternate && value != 0 { "0X" } else { "" }),
        b'o' => (format!("{:o}", value), ""),
        _ => (value.to_string(), ""),
    };
    let mut digits = with_precision(digits, spec, value == 0);
    if conversion == b'o' && spec.alternate && !digits.starts_with('0') {
        digits.insert(0, '0');
    }
    pad(prefix.to_string(), digits, spec, spec.precision.is_none())
}

fn float(value: f64, conversion: u8, spec: &Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    let precision = spec.precision.unwrap_or(6);
    let negative = value.is_sign_negative() && !value.is_nan();
    let magnitude = value.abs();

    if !magnitude.is_finite() {
        let text = if magnitude.is_nan() { "nan" } else { "inf" };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        return pad(sign_prefix(negative, spec).to_string(), text, spec, false);
    }

    let body = match conversion.to_ascii_lowercase() {
        b'f' => format!("{:.*}", precision, magnitude),
        b'e' => exponential(magnitude, precision),
        _ => general(magnitude, precision, spec.alternate),
    };
    let body = if upper { body.to_uppercase() } else { body };
    pad(sign_prefix(negative, spec).to_string(), body, spec, true)
}

/// `d.ddde±XX` with at least two exponent digits.
fn exponential(magnitude: f64, precision: usize) -> String {
    let rendered = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
}

fn general(magnitude: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let probe = format!("{:.*e}", precision - 1, magnitude);
    let exponent: i32 = probe
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let rendered = if exponent < -4 || exponent >= precision as i32 {
        exponential(magnitude, precision - 1)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, magnitude)
    };

    if alternate {
        return rendered;
    }

    // Strip trailing zeros from the fractional part.
    let (mantissa, suffix) = match rendered.find('e') {
        Some(at) => rendered.split_at(at),
        None => (rendered.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, suffix)
}
