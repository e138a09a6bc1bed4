//! AT Command Parser
//!
//! This crate drives the text request/response protocol spoken by modems,
//! radios and other peripherals on a serial link (the "AT command" family).
//!
//! # Protocol Overview
//!
//! - **Commands** (host → device): printf-style text followed by the output
//!   delimiter, typically `\r`.
//! - **Responses** (device → host): one or more lines matched against a
//!   scanf-style pattern. Each line of the pattern is matched on its own, in
//!   order, and noise between lines is skipped.
//! - **Out-of-band notifications** (device → host, unsolicited): lines such
//!   as `+CMTI: "SM",3` that may arrive at any time, including in the middle
//!   of a response. They are recognised by a registered prefix and handed to
//!   a handler, after which the response parse starts over.
//!
//! # Example
//!
//! ```rust,ignore
//! use atcmd_parser::{AtParser, ChannelTransport, OobAction, ParserConfig};
//!
//! let (transport, device) = ChannelTransport::pair();
//! let mut at = AtParser::new(transport, ParserConfig::default())?;
//!
//! at.register_oob("+CMTI:", |at| {
//!     let _ = at.recv(" \"%[^\"]\",%d\n");
//!     OobAction::Continue
//! });
//!
//! at.send("AT+CSQ", &[])?;
//! let values = at.recv("+CSQ: %d,%d\r\nOK\r\n")?;
//! ```

/// Emit a matcher trace line, at debug level when the session debug flag is
/// set and at trace level otherwise.
macro_rules! at_trace {
    ($parser:expr, $($arg:tt)+) => {
        if $parser.debug {
            tracing::debug!(target: "atcmd", $($arg)+)
        } else {
            tracing::trace!(target: "atcmd", $($arg)+)
        }
    };
}

mod buffer;
mod channel;
mod config;
mod error;
mod idle;
mod matcher;
mod oob;
mod parser;
mod pattern;
mod transport;

pub use buffer::*;
pub use channel::*;
pub use config::*;
pub use error::*;
pub use oob::*;
pub use parser::*;
pub use pattern::*;
pub use transport::*;

pub use atcmd_scan::{split_args, Arg, ScanError, FormatError, Value};
