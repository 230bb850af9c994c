//! Unified error types for cellprov.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! service boundary and the binary's error handling uniform.  Orchestrator
//! failures are absent: they are absorbed into session state
//! and surface only as an [`Outcome`](crate::fsm::Outcome).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation outside the orchestrator funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provisioning document could not be decoded.
    Decode(DecodeError),
    /// A push message was rejected before reaching the decoder.
    Push(PushError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Push(e) => write!(f, "push: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Malformed document.  Decoding fails closed: no partial settings are
/// ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended in the middle of a token, string or element.
    Truncated,
    /// A multi-byte integer overflowed 32 bits.
    InvalidMultiByte,
    /// WBXML version byte outside 1.0–1.3.
    UnsupportedVersion(u8),
    /// Character set MIBenum we cannot decode.
    UnsupportedCharset(u32),
    /// Tag token not present in the PROV 1.0 code pages.
    UnknownTag { page: u8, token: u8 },
    /// Attribute start or value token not present in the PROV 1.0 code pages.
    UnknownAttribute { page: u8, token: u8 },
    /// Attribute value token with no preceding attribute start.
    OrphanAttributeValue,
    /// String table reference past the end of the table or unterminated.
    InvalidStringTableOffset(u32),
    /// String bytes are not valid in the declared charset.
    InvalidString,
    /// Document root is not `wap-provisioningdoc`.
    UnexpectedRoot(String),
    /// Document contains no root element.
    MissingRoot,
    /// End tag without a matching start, or document ended with open elements.
    UnbalancedElement,
    /// Bytes remain after the root element and trailing processing instructions.
    TrailingData,
    /// Elements nested deeper than the decoder accepts.
    NestingTooDeep,
    /// Textual XML parse failure.
    Xml(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "document truncated"),
            Self::InvalidMultiByte => write!(f, "invalid multi-byte integer"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported WBXML version 0x{v:02x}"),
            Self::UnsupportedCharset(c) => write!(f, "unsupported charset {c}"),
            Self::UnknownTag { page, token } => {
                write!(f, "unknown tag 0x{token:02x} on page {page}")
            }
            Self::UnknownAttribute { page, token } => {
                write!(f, "unknown attribute token 0x{token:02x} on page {page}")
            }
            Self::OrphanAttributeValue => write!(f, "attribute value without attribute start"),
            Self::InvalidStringTableOffset(o) => write!(f, "invalid string table offset {o}"),
            Self::InvalidString => write!(f, "invalid string encoding"),
            Self::UnexpectedRoot(name) => write!(f, "unexpected root element <{name}>"),
            Self::MissingRoot => write!(f, "document has no root element"),
            Self::UnbalancedElement => write!(f, "unbalanced element"),
            Self::TrailingData => write!(f, "trailing data after root element"),
            Self::NestingTooDeep => write!(f, "elements nested too deeply"),
            Self::Xml(msg) => write!(f, "XML: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Push message errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// Declared content type is not a provisioning document.
    UnsupportedContentType(String),
    /// No subscriber identity accompanied the message.
    MissingIdentity,
    /// Message carried no payload bytes.
    EmptyPayload,
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedContentType(t) => write!(f, "unsupported content type '{t}'"),
            Self::MissingIdentity => write!(f, "missing subscriber identity"),
            Self::EmptyPayload => write!(f, "empty payload"),
        }
    }
}

impl std::error::Error for PushError {}

impl From<PushError> for Error {
    fn from(e: PushError) -> Self {
        Self::Push(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The configuration file is not valid JSON for [`ServiceConfig`](crate::config::ServiceConfig).
    Parse(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
