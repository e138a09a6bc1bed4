//! Text templates for AT command links
//!
//! This crate holds the pure text machinery used by the AT command engine,
//! independent of any serial transport:
//!
//! - **Scanning** ([`Template`]): scanf-style response templates with literal
//!   text, whitespace directives and `%` conversions. Scanning reports how
//!   much input was consumed, so callers can tell a full match from a prefix.
//! - **Formatting** ([`format`]): printf-style command formatting from a list
//!   of [`Arg`] values.
//! - **Argument lists** ([`split_args`]): comma separated parameter lists
//!   where `\,` is data rather than a separator.
//!
//! # Example
//!
//! ```rust
//! use atcmd_scan::{format, ScanMode, Template, Value};
//!
//! let command = format("AT+CMGR=%d", &[3.into()]).unwrap();
//! assert_eq!(command, "AT+CMGR=3");
//!
//! let template = Template::parse("+CSQ: %d,%d").unwrap();
//! let outcome = template.scan(b"+CSQ: 21,99", ScanMode::Extract);
//! assert_eq!(outcome.values, vec![Value::Int(21), Value::Int(99)]);
//! ```

mod args;
mod error;
mod format;
mod scan;

pub use args::*;
pub use error::*;
pub use format::*;
pub use scan::*;
