// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP authentication challenge handling (RFC 7617 Basic, RFC 2617 Digest).
//
// CUPS answers an unauthenticated request for a protected resource with
// `401` and a `WWW-Authenticate` challenge; the transport retries exactly
// once with the `Authorization` header built here.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use druckwerk_core::types::Credentials;

/// A parsed `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Challenge {
    Basic,
    Digest {
        realm: String,
        nonce: String,
        opaque: Option<String>,
        /// The server offered `qop="auth"`.
        qop_auth: bool,
    },
}

/// Parse one `WWW-Authenticate` header value.
///
/// Returns `None` for schemes we cannot answer (Negotiate, Bearer, a Digest
/// with a non-MD5 algorithm).
pub(crate) fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, params) = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest),
        None => (header, ""),
    };

    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("digest") {
        return None;
    }

    let params = parse_params(params);
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
    };

    // Only plain MD5 digests; MD5-sess and SHA-256 are not offered by CUPS.
    if let Some(alg) = get("algorithm")
        && !alg.eq_ignore_ascii_case("md5")
    {
        return None;
    }

    let qop_auth = get("qop")
        .map(|v| v.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")))
        .unwrap_or(false);

    Some(Challenge::Digest {
        realm: get("realm")?,
        nonce: get("nonce")?,
        opaque: get("opaque"),
        qop_auth,
    })
}

/// Build the `Authorization` header value answering `challenge`.
pub(crate) fn authorization(
    challenge: &Challenge,
    creds: &Credentials,
    method: &str,
    uri: &str,
) -> String {
    let password = creds.password.as_deref().unwrap_or("");
    match challenge {
        Challenge::Basic => {
            let token = BASE64.encode(format!("{}:{}", creds.user, password));
            format!("Basic {token}")
        }
        Challenge::Digest {
            realm,
            nonce,
            opaque,
            qop_auth,
        } => {
            let cnonce = uuid::Uuid::new_v4().simple().to_string();
            digest_authorization(
                &creds.user,
                password,
                realm,
                nonce,
                opaque.as_deref(),
                *qop_auth,
                method,
                uri,
                &cnonce,
            )
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn digest_authorization(
    user: &str,
    password: &str,
    realm: &str,
    nonce: &str,
    opaque: Option<&str>,
    qop_auth: bool,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let ha1 = md5_hex(&format!("{user}:{realm}:{password}"));
    let ha2 = md5_hex(&format!("{method}:{uri}"));

    let mut header = if qop_auth {
        let nc = "00000001";
        let response = md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:auth:{ha2}"));
        format!(
            "Digest username=\"{user}\", realm=\"{realm}\", nonce=\"{nonce}\", uri=\"{uri}\", \
             qop=auth, nc={nc}, cnonce=\"{cnonce}\", response=\"{response}\""
        )
    } else {
        let response = md5_hex(&format!("{ha1}:{nonce}:{ha2}"));
        format!(
            "Digest username=\"{user}\", realm=\"{realm}\", nonce=\"{nonce}\", uri=\"{uri}\", \
             response=\"{response}\""
        )
    };

    if let Some(opaque) = opaque {
        header.push_str(&format!(", opaque=\"{opaque}\""));
    }
    header
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Parse `key=value, key="quoted value", ...` challenge parameters.
fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();

        let value;
        if let Some(stripped) = rest.strip_prefix('"') {
            match stripped.find('"') {
                Some(end) => {
                    value = stripped[..end].to_string();
                    rest = stripped[end + 1..].trim_start();
                }
                None => {
                    value = stripped.to_string();
                    rest = "";
                }
            }
        } else {
            match rest.find(',') {
                Some(end) => {
                    value = rest[..end].trim().to_string();
                    rest = &rest[end..];
                }
                None => {
                    value = rest.trim().to_string();
                    rest = "";
                }
            }
        }

        params.push((key, value));
        rest = rest.trim_start_matches(',').trim_start();
    }

    params
}
