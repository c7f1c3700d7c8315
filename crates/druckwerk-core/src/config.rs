// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use serde::{Deserialize, Serialize};

/// Default CUPS host when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Default CUPS port (IANA-assigned for IPP).
pub const DEFAULT_PORT: u16 = 631;

/// Connection target and timeouts for a CUPS client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// CUPS server host name or address.
    pub host: String,
    /// CUPS server port (default 631).
    pub port: u16,
    /// Target expects TLS (an `https`/`ipps` URL was configured).
    pub secure: bool,
    /// Timeout for document-carrying operations like Print-Job (seconds).
    pub print_timeout_secs: u64,
    /// Timeout for query operations like Get-Printer-Attributes (seconds).
    pub query_timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            secure: false,
            print_timeout_secs: 60,
            query_timeout_secs: 15,
        }
    }
}

impl ClientOptions {
    /// Options for an explicit host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Options from the `CUPS_URL` environment variable, falling back to
    /// `localhost:631`. Accepts `http://host[:port]` and `https://host[:port]`.
    pub fn from_env() -> Self {
        match std::env::var("CUPS_URL") {
            Ok(url) => Self::parse_url(&url).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    fn parse_url(url: &str) -> Option<Self> {
        let (secure, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (false, rest)
        } else {
            return None;
        };

        let authority = rest.split('/').next()?;
        if authority.is_empty() {
            return None;
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().ok()?),
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return None;
        }

        Some(Self {
            host: host.into(),
            port,
            secure,
            ..Self::default()
        })
    }
}

/// The user identity to send as `requesting-user-name` when the caller does
/// not override it.
///
/// Resolved from the environment once at client construction, never per
/// request.
pub fn default_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "anonymous".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let opts = ClientOptions::default();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 631);
        assert!(!opts.secure);
    }

    #[test]
    fn parse_url_with_port() {
        let opts = ClientOptions::parse_url("http://cups.example.com:8631").unwrap();
        assert_eq!(opts.host, "cups.example.com");
        assert_eq!(opts.port, 8631);
        assert!(!opts.secure);
    }

    #[test]
    fn parse_url_defaults_port() {
        let opts = ClientOptions::parse_url("https://printhost").unwrap();
        assert_eq!(opts.host, "printhost");
        assert_eq!(opts.port, 631);
        assert!(opts.secure);
    }

    #[test]
    fn parse_url_ignores_path() {
        let opts = ClientOptions::parse_url("http://host:631/printers/").unwrap();
        assert_eq!(opts.host, "host");
        assert_eq!(opts.port, 631);
    }

    #[test]
    fn parse_url_rejects_garbage() {
        assert!(ClientOptions::parse_url("not a url").is_none());
        assert!(ClientOptions::parse_url("ftp://host").is_none());
        assert!(ClientOptions::parse_url("http://").is_none());
    }
}
