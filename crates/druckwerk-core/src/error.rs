// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckwerk.

use thiserror::Error;

/// Failures detected while decoding an IPP message off the wire.
///
/// Each variant corresponds to one class of malformed input; the decoder
/// never recovers silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Fewer bytes remained than a declared length field demands.
    #[error("truncated message: {0}")]
    Truncated(String),

    /// A delimiter or value tag outside the known table.
    #[error("unknown tag 0x{0:02x}")]
    BadTag(u8),

    /// A length field inconsistent with its value syntax (e.g. an integer
    /// whose length is not 4).
    #[error("bad length: {0}")]
    BadLength(String),

    /// An attribute or collection element in a position the framing does
    /// not allow.
    #[error("out-of-order element: {0}")]
    BadOrder(String),
}

/// Top-level error type for all Druckwerk operations.
#[derive(Debug, Error)]
pub enum CupsError {
    // -- Transport --
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP error: server returned status {0}")]
    Http(u16),

    #[error("authentication required")]
    AuthRequired,

    #[error("operation timed out after {0}s")]
    Timeout(u64),

    // -- Protocol --
    #[error("IPP protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The response parsed but carried a non-success IPP status code.
    #[error("IPP status 0x{code:04x}{}", status_message_suffix(.message))]
    IppStatus {
        code: u16,
        /// The `status-message` operation attribute, when the server sent one.
        message: Option<String>,
    },

    // -- Caller input --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn status_message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

impl CupsError {
    /// The IPP status code carried by a [`CupsError::IppStatus`], if any.
    pub fn ipp_status(&self) -> Option<u16> {
        match self {
            CupsError::IppStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CupsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipp_status_display_includes_message() {
        let err = CupsError::IppStatus {
            code: 0x040c,
            message: Some("job already completed".into()),
        };
        assert_eq!(err.to_string(), "IPP status 0x040c: job already completed");
    }

    #[test]
    fn ipp_status_display_without_message() {
        let err = CupsError::IppStatus {
            code: 0x0400,
            message: None,
        };
        assert_eq!(err.to_string(), "IPP status 0x0400");
    }

    #[test]
    fn protocol_error_converts() {
        let err: CupsError = ProtocolError::BadTag(0x99).into();
        assert!(matches!(
            err,
            CupsError::Protocol(ProtocolError::BadTag(0x99))
        ));
    }
}
