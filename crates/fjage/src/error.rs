// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for gateway operations.
//!
//! Remote rejections ([`RemoteError`]) are kept apart from transport-level
//! failures so callers can tell "the agent said no" from "nobody answered".

use crate::config::ConfigError;
use crate::message::Performative;
use crate::param::ParamType;
use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while talking to a fjåge container.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No reply arrived within the request timeout
    #[error("request timed out")]
    Timeout,

    /// The link to the container failed or was lost
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway was closed locally
    #[error("gateway is closed")]
    Closed,

    /// The remote agent rejected the request
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The decoded value does not fit the requested Rust type
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ParamType, found: String },

    /// A value on the wire could not be decoded
    #[error("value codec error: {0}")]
    Codec(#[from] CodecError),

    /// A frame could not be serialized or parsed
    #[error("JSON frame error: {0}")]
    Frame(#[from] serde_json::Error),

    /// A well-formed JSON line that is not a known frame
    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A caller-supplied argument is unusable (NULL pointer, negative length...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Rejections reported by the remote agent.
///
/// fjåge replies carry no reason code, so the variant is inferred from the
/// performative, the `readonly` list and the echoed value of the reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("parameter '{param}' not found")]
    NotFound { param: String },

    #[error("parameter '{param}' is read-only")]
    ReadOnly { param: String },

    #[error("index {index} out of range for parameter '{param}'")]
    IndexOutOfRange { param: String, index: u32 },

    /// The agent echoed a value of another kind than the one written
    #[error("parameter '{param}' holds a value of type {found}")]
    TypeMismatch { param: String, found: String },

    /// The agent echoed a value of the right kind that differs from the one written
    #[error("agent did not apply the new value of parameter '{param}'")]
    Rejected { param: String },

    #[error("request refused by agent ({perf:?})")]
    Refused { perf: Performative },

    #[error("no agent provides service '{service}'")]
    NoService { service: String },
}

/// Errors raised while decoding values from their JSON wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported array class '{0}'")]
    UnsupportedClass(String),

    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("payload of {len} bytes is not a multiple of the {width}-byte element width")]
    Misaligned { len: usize, width: usize },

    #[error("array mixes element kinds")]
    Heterogeneous,

    #[error("unsupported JSON value: {0}")]
    Unsupported(String),
}

/// Stable numeric error codes, used at the C boundary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    Timeout = 1,
    Transport = 2,
    Closed = 3,
    NotFound = 4,
    ReadOnly = 5,
    IndexOutOfRange = 6,
    RemoteTypeMismatch = 7,
    Rejected = 8,
    Refused = 9,
    TypeMismatch = 10,
    Codec = 11,
    InvalidArgument = 12,
    Config = 13,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl GatewayError {
    /// Map this error to its stable [`ErrorCode`].
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout => ErrorCode::Timeout,
            Self::Transport(_) | Self::Io(_) => ErrorCode::Transport,
            Self::Closed => ErrorCode::Closed,
            Self::Remote(remote) => remote.code(),
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::Codec(_) | Self::Frame(_) | Self::UnexpectedFrame(_) => ErrorCode::Codec,
            Self::Config(_) => ErrorCode::Config,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
        }
    }

    /// True when the agent answered and rejected the request.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl RemoteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } | Self::NoService { .. } => ErrorCode::NotFound,
            Self::ReadOnly { .. } => ErrorCode::ReadOnly,
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::TypeMismatch { .. } => ErrorCode::RemoteTypeMismatch,
            Self::Rejected { .. } => ErrorCode::Rejected,
            Self::Refused { .. } => ErrorCode::Refused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ScalarKind;

    #[test]
    fn test_remote_errors_keep_their_code() {
        let err: GatewayError = RemoteError::ReadOnly {
            param: "roIntParam".into(),
        }
        .into();
        assert!(err.is_remote());
        assert_eq!(err.code(), ErrorCode::ReadOnly);
        assert_eq!(err.to_string(), "parameter 'roIntParam' is read-only");
    }

    #[test]
    fn test_local_mismatch_is_not_remote() {
        let err = GatewayError::TypeMismatch {
            expected: ParamType::Array(ScalarKind::Int),
            found: "string".into(),
        };
        assert!(!err.is_remote());
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
        assert_eq!(err.to_string(), "type mismatch: expected int[], found string");
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::Ok.as_i32(), 0);
        assert_eq!(GatewayError::Timeout.code().as_i32(), 1);
        assert_eq!(GatewayError::Closed.code().as_i32(), 3);
        assert_eq!(
            GatewayError::InvalidArgument("x".into()).code().as_i32(),
            12
        );
    }
}
