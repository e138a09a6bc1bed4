//! Error types for template parsing and command formatting.

use thiserror::Error;

/// Errors raised while parsing a scan template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A `%` at the end of the template with no conversion character.
    #[error("incomplete conversion specifier at offset {offset}")]
    IncompleteSpecifier {
        /// Byte offset of the `%`.
        offset: usize,
    },

    /// Unknown conversion character.
    #[error("invalid conversion '{found}' at offset {offset}")]
    InvalidSpecifier {
        /// Byte offset of the `%`.
        offset: usize,
        /// The offending conversion character.
        found: char,
    },

    /// A `%[` scanset without its closing `]`.
    #[error("unterminated scanset at offset {offset}")]
    UnterminatedScanSet {
        /// Byte offset of the `%`.
        offset: usize,
    },

    /// An explicit field width of zero.
    #[error("zero field width at offset {offset}")]
    ZeroWidth {
        /// Byte offset of the `%`.
        offset: usize,
    },
}

/// Errors raised while formatting a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A `%` at the end of the command with no conversion character.
    #[error("incomplete conversion specifier at offset {offset}")]
    IncompleteSpecifier {
        /// Byte offset of the `%`.
        offset: usize,
    },

    /// Unknown conversion character.
    #[error("invalid conversion '{found}' at offset {offset}")]
    InvalidConversion {
        /// Byte offset of the `%`.
        offset: usize,
        /// The offending conversion character.
        found: char,
    },

    /// The command consumes more arguments than were supplied.
    #[error("missing argument {index}")]
    MissingArgument {
        /// Zero-based index of the missing argument.
        index: usize,
    },

    /// The argument cannot be rendered by the conversion.
    #[error("argument {index} cannot be formatted with %{conversion}")]
    TypeMismatch {
        /// Zero-based index of the argument.
        index: usize,
        /// The conversion character it was used with.
        conversion: char,
    },
}
