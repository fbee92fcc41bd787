//! Error types for async-mib.
//!
//! [`Error`] covers everything the library can fail with: transport and
//! timeout failures on the manager-client side, BER codec errors, malformed
//! OIDs, and the MIB registration conflicts (`Occupied`,
//! `EncroachesOnPlugin`, `CannotNestInProxy`).
//!
//! [`ErrorStatus`] carries the SNMPv1 wire error codes (RFC 1157).

use std::net::SocketAddr;
use std::time::Duration;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Request timed out (after retries if configured).
    #[error("timeout after {elapsed:?}{} (request_id={request_id}, retries={retries})", target.map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// SNMP protocol error returned by an upstream agent.
    #[error("SNMP error{}: {status} at index {index}", target.map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
    },

    /// Response could not be parsed or failed correlation checks.
    #[error("malformed response from {target}")]
    MalformedResponse { target: SocketAddr },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        /// Only allocated when parsing string input.
        input: Option<Box<str>>,
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Registration target already holds a node.
    #[error("registration at {oid} conflicts with an existing node")]
    Occupied { oid: crate::oid::Oid },

    /// Registration target lies inside a registered plugin or proxy subtree.
    #[error("registration at {oid} encroaches on the plugin or proxy at {owner}")]
    EncroachesOnPlugin {
        oid: crate::oid::Oid,
        owner: crate::oid::Oid,
    },

    /// Attempted to insert a child beneath a proxy delegation.
    #[error("cannot nest a node inside the proxy subtree at {oid}")]
    CannotNestInProxy { oid: crate::oid::Oid },

    /// A plugin produced (or a plugin file declared) an unusable shape.
    #[error("bad plugin shape: {reason}")]
    BadPluginShape { reason: Box<str> },
}

impl Error {
    /// Create a decode error.
    pub(crate) fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Error::Decode { offset, kind }
    }

    /// Create an invalid-OID error without input context.
    pub(crate) fn invalid_oid(kind: OidErrorKind) -> Self {
        Error::InvalidOid { kind, input: None }
    }

    /// Create an invalid-OID error retaining the offending input text.
    pub(crate) fn invalid_oid_with_input(kind: OidErrorKind, input: String) -> Self {
        Error::InvalidOid {
            kind,
            input: Some(input.into_boxed_str()),
        }
    }

    /// Create a configuration error.
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into().into_boxed_str())
    }

    /// Create a bad-plugin-shape error.
    pub(crate) fn bad_shape(reason: impl Into<String>) -> Self {
        Error::BadPluginShape {
            reason: reason.into().into_boxed_str(),
        }
    }

    /// True for timeout and I/O failures, the errors a proxy degrades on.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Timeout { .. })
    }
}

/// What went wrong while interpreting an OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OidErrorKind {
    /// A dotted-string component was not a non-negative integer.
    InvalidArc,
    /// The OID exceeds the maximum number of subidentifiers.
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "component is not a non-negative integer"),
            Self::TooManyArcs { count, max } => {
                write!(f, "too many subidentifiers ({count}, max {max})")
            }
        }
    }
}

/// Detailed BER decode failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Unexpected end of input.
    TruncatedData,
    /// Length field with zero following octets.
    InvalidLength,
    /// Indefinite-length form (0x80), rejected per net-snmp behaviour.
    IndefiniteLength,
    /// Long-form length with too many octets.
    LengthTooLong { octets: usize },
    /// Length exceeds the sanity cap.
    LengthExceedsMax { length: usize, max: usize },
    /// INTEGER with zero-length content.
    ZeroLengthInteger,
    /// NULL with non-zero length.
    InvalidNull,
    /// IpAddress content was not 4 octets.
    InvalidIpAddressLength { length: usize },
    /// A different tag was required here.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Subidentifier overflowed 32 bits.
    IntegerOverflow,
    /// TLV length points past the end of the buffer.
    TlvOverflow,
    /// OID exceeds the subidentifier limit.
    OidTooLong { count: usize, max: usize },
    /// Constructed OCTET STRING (0x24), which we do not parse.
    ConstructedOctetString,
    /// PDU tag outside the v1 read-only set.
    UnknownPduType(u8),
    /// Message version other than SNMPv1.
    UnknownVersion(i32),
    /// A response PDU carried no varbinds where one was required.
    EmptyResponse,
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TruncatedData => write!(f, "truncated data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length field uses {octets} octets (max 4)")
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {length} exceeds maximum {max}")
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IpAddress must be 4 octets, got {length}")
            }
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{expected:02X}, got 0x{actual:02X}")
            }
            Self::IntegerOverflow => write!(f, "subidentifier overflows 32 bits"),
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {count} subidentifiers (max {max})")
            }
            Self::ConstructedOctetString => write!(f, "constructed OCTET STRING not supported"),
            Self::UnknownPduType(tag) => write!(f, "unknown PDU type 0x{tag:02X}"),
            Self::UnknownVersion(v) => write!(f, "unsupported SNMP version {v}"),
            Self::EmptyResponse => write!(f, "response contained no varbinds"),
        }
    }
}

/// SNMPv1 error-status codes (RFC 1157 Section 4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Operation completed successfully (status = 0).
    NoError,
    /// Response message would be too large for transport (status = 1).
    TooBig,
    /// Requested OID not found, or GetNext walked off the end (status = 2).
    NoSuchName,
    /// Invalid value provided in SET request (status = 3).
    BadValue,
    /// Attempted to SET a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error occurred (status = 5).
    GenErr,
    /// Unknown or future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}
