// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP/CUPS operations.
//
// Every operation builds a request with the same prelude, performs one HTTP
// exchange, checks the response status, and projects attribute groups into
// domain entities. The per-operation request layouts live in the
// submodules.

pub mod jobs;
pub mod print_job;
pub mod printers;

use tracing::{debug, warn};

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, Result};
use druckwerk_core::types::Credentials;

use crate::message::{IppMessage, Operation, is_success};
use crate::parser;
use crate::tag::DelimiterTag;
use crate::transport::{RequestBody, post_ipp};

/// A new request carrying the mandatory operation-attributes prelude.
///
/// `attributes-charset` and `attributes-natural-language` must come first,
/// in that order (RFC 8011 §4.1.4).
pub(crate) fn new_request(operation: Operation, request_id: u32) -> IppMessage {
    let mut message = IppMessage::request(operation, request_id);
    message
        .add_group(DelimiterTag::OperationAttributes)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en");
    message
}

/// Map a non-success response status to `IppStatus`, attaching the
/// `status-message` attribute when the server sent one.
pub(crate) fn check_status(response: &IppMessage) -> Result<()> {
    if is_success(response.code) {
        Ok(())
    } else {
        Err(CupsError::IppStatus {
            code: response.code,
            message: response.status_message().map(str::to_string),
        })
    }
}

/// Send one request and decode the response.
pub(crate) async fn send(
    opts: &ClientOptions,
    path: &str,
    message: &IppMessage,
    creds: Option<&Credentials>,
    timeout_secs: u64,
) -> Result<IppMessage> {
    debug!(
        path,
        code = %format!("0x{:04x}", message.code),
        request_id = message.request_id,
        "sending IPP request"
    );
    let body = post_ipp(opts, path, RequestBody::Ipp(message.encode()), creds, timeout_secs).await?;
    let response = parser::decode(&body)?;
    if response.request_id != message.request_id {
        warn!(
            sent = message.request_id,
            received = response.request_id,
            "response request-id does not echo the request"
        );
    }
    Ok(response)
}

/// The IPP URI of a named printer on the target server.
pub(crate) fn printer_uri(opts: &ClientOptions, name: &str) -> String {
    format!("ipp://{}:{}/printers/{}", opts.host, opts.port, name)
}

/// The IPP URI of a job on the target server.
pub(crate) fn job_uri(opts: &ClientOptions, job_id: i32) -> String {
    format!("ipp://{}:{}/jobs/{}", opts.host, opts.port, job_id)
}

/// The HTTP request path for a printer or job URI
/// (`ipp://host:631/printers/lp` → `/printers/lp`).
pub(crate) fn uri_path(uri: &str) -> &str {
    uri.split_once("://")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or("/")
}
