// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP/1.1 transport for IPP (RFC 8010 §3) over a raw TCP stream.
//
// Each call is one POST with `Content-Type: application/ipp`. A Print-Job
// body is the encoded IPP message immediately followed by the raw document
// bytes; with a known document length the body is length-delimited,
// otherwise it is sent chunked. Document-carrying requests send
// `Expect: 100-continue` so a `401` challenge arrives before the read-once
// document stream is consumed.
//
// Auth: a `401` with a `WWW-Authenticate` challenge is retried exactly once
// with configured credentials (Basic or Digest per the challenge). A second
// `401` surfaces as `AuthRequired`.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info, warn};

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, Result};
use druckwerk_core::types::Credentials;

use crate::auth::{self, Challenge};

/// Read/write buffer size for document streaming.
const CHUNK_SIZE: usize = 32 * 1024;

/// How long to wait for an early server verdict after `Expect: 100-continue`
/// before streaming the body anyway.
const CONTINUE_WAIT_MS: u64 = 1_000;

/// The body of one IPP POST.
pub(crate) enum RequestBody<'a> {
    /// An encoded IPP message alone.
    Ipp(Vec<u8>),
    /// An encoded IPP message followed by a read-once document stream.
    WithDocument {
        ipp: Vec<u8>,
        document: &'a mut (dyn AsyncRead + Unpin + Send),
        /// Document length when known up front; `None` forces chunked
        /// transfer encoding.
        length: Option<u64>,
    },
}

impl RequestBody<'_> {
    fn has_document(&self) -> bool {
        matches!(self, Self::WithDocument { .. })
    }
}

/// A fully-read HTTP response.
struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The first answerable challenge, preferring Digest over Basic.
    fn challenge(&self) -> Option<Challenge> {
        let parsed: Vec<Challenge> = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("www-authenticate"))
            .filter_map(|(_, v)| auth::parse_challenge(v))
            .collect();
        parsed
            .iter()
            .find(|c| matches!(c, Challenge::Digest { .. }))
            .or_else(|| parsed.first())
            .cloned()
    }
}

struct ResponseHead {
    status: u16,
    headers: Vec<(String, String)>,
}

/// POST an IPP request to `http://host:port{path}` and return the response
/// body. The whole exchange is bounded by `timeout_secs`.
pub(crate) async fn post_ipp(
    opts: &ClientOptions,
    path: &str,
    mut body: RequestBody<'_>,
    creds: Option<&Credentials>,
    timeout_secs: u64,
) -> Result<Vec<u8>> {
    if opts.secure {
        return Err(CupsError::Transport(
            "TLS target configured but this transport speaks plain HTTP; \
             point the client at an http:// CUPS URL"
                .into(),
        ));
    }

    tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        exchange(opts, path, &mut body, creds),
    )
    .await
    .map_err(|_| CupsError::Timeout(timeout_secs))?
}

async fn exchange(
    opts: &ClientOptions,
    path: &str,
    body: &mut RequestBody<'_>,
    creds: Option<&Credentials>,
) -> Result<Vec<u8>> {
    let (response, document_consumed) = attempt(opts, path, body, None).await?;

    if response.status != 401 {
        return finish(response);
    }

    let Some(creds) = creds else {
        debug!(path, "401 with no credentials configured");
        return Err(CupsError::AuthRequired);
    };
    let Some(challenge) = response.challenge() else {
        warn!(path, "401 carried no answerable WWW-Authenticate challenge");
        return Err(CupsError::AuthRequired);
    };
    if document_consumed {
        // The read-once document stream is spent; a replay would send an
        // empty body.
        warn!(path, "401 after document stream was consumed");
        return Err(CupsError::AuthRequired);
    }

    info!(path, user = %creds.user, "retrying request with credentials");
    let authorization = auth::authorization(&challenge, creds, "POST", path);
    let (response, _) = attempt(opts, path, body, Some(&authorization)).await?;

    if response.status == 401 {
        return Err(CupsError::AuthRequired);
    }
    finish(response)
}

fn finish(response: HttpResponse) -> Result<Vec<u8>> {
    if response.status != 200 {
        return Err(CupsError::Http(response.status));
    }
    Ok(response.body)
}

/// One request/response round trip. Returns the response and whether the
/// document stream (if any) was read.
async fn attempt(
    opts: &ClientOptions,
    path: &str,
    body: &mut RequestBody<'_>,
    authorization: Option<&str>,
) -> Result<(HttpResponse, bool)> {
    let addr = format!("{}:{}", opts.host, opts.port);
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| CupsError::Transport(format!("connect {addr}: {e}")))?;
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Request head.
    let mut head = format!("POST {path} HTTP/1.1\r\n");
    head.push_str(&format!("Host: {addr}\r\n"));
    head.push_str("Content-Type: application/ipp\r\n");
    head.push_str("Accept: application/ipp\r\n");
    head.push_str("Connection: close\r\n");
    if let Some(authorization) = authorization {
        head.push_str(&format!("Authorization: {authorization}\r\n"));
    }

    let chunked = match body {
        RequestBody::Ipp(ipp) => {
            head.push_str(&format!("Content-Length: {}\r\n", ipp.len()));
            false
        }
        RequestBody::WithDocument {
            ipp,
            length: Some(length),
            ..
        } => {
            head.push_str(&format!(
                "Content-Length: {}\r\n",
                ipp.len() as u64 + *length
            ));
            head.push_str("Expect: 100-continue\r\n");
            false
        }
        RequestBody::WithDocument { length: None, .. } => {
            head.push_str("Transfer-Encoding: chunked\r\n");
            head.push_str("Expect: 100-continue\r\n");
            true
        }
    };
    head.push_str("\r\n");

    writer
        .write_all(head.as_bytes())
        .await
        .map_err(|e| CupsError::Transport(format!("write request head: {e}")))?;

    if body.has_document() {
        // Give the server a chance to reject (typically 401) before the
        // read-once document is touched.
        match tokio::time::timeout(
            Duration::from_millis(CONTINUE_WAIT_MS),
            read_head(&mut reader),
        )
        .await
        {
            // Silence: the server wants the body.
            Err(_) => {}
            Ok(Ok(interim)) if interim.status == 100 => {
                debug!(path, "server sent 100 Continue");
            }
            Ok(Ok(early)) => {
                let response = read_body(&mut reader, early).await?;
                return Ok((response, false));
            }
            Ok(Err(e)) => return Err(e),
        }
    }

    let document_consumed = write_body(&mut writer, body, chunked).await?;

    writer
        .flush()
        .await
        .map_err(|e| CupsError::Transport(format!("flush request: {e}")))?;

    // Skip any interim responses, then read the final one.
    let head = loop {
        let head = read_head(&mut reader).await?;
        if head.status != 100 {
            break head;
        }
    };
    let response = read_body(&mut reader, head).await?;

    debug!(
        path,
        status = response.status,
        bytes = response.body.len(),
        "IPP response received"
    );
    Ok((response, document_consumed))
}

/// Write the request body in the chosen framing. Returns whether a document
/// stream was consumed.
async fn write_body(
    writer: &mut OwnedWriteHalf,
    body: &mut RequestBody<'_>,
    chunked: bool,
) -> Result<bool> {
    match body {
        RequestBody::Ipp(ipp) => {
            writer
                .write_all(ipp)
                .await
                .map_err(|e| CupsError::Transport(format!("write IPP body: {e}")))?;
            Ok(false)
        }
        RequestBody::WithDocument { ipp, document, .. } => {
            if chunked {
                write_chunk(writer, ipp).await?;
            } else {
                writer
                    .write_all(ipp)
                    .await
                    .map_err(|e| CupsError::Transport(format!("write IPP body: {e}")))?;
            }

            let mut buf = vec![0u8; CHUNK_SIZE];
            let mut total: u64 = 0;
            loop {
                let n = document
                    .read(&mut buf)
                    .await
                    .map_err(|e| CupsError::Transport(format!("read document: {e}")))?;
                if n == 0 {
                    break;
                }
                if chunked {
                    write_chunk(writer, &buf[..n]).await?;
                } else {
                    writer
                        .write_all(&buf[..n])
                        .await
                        .map_err(|e| CupsError::Transport(format!("write document: {e}")))?;
                }
                total += n as u64;
            }
            if chunked {
                writer
                    .write_all(b"0\r\n\r\n")
                    .await
                    .map_err(|e| CupsError::Transport(format!("write final chunk: {e}")))?;
            }
            debug!(bytes = total, chunked, "document streamed");
            Ok(true)
        }
    }
}

async fn write_chunk(writer: &mut OwnedWriteHalf, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    writer
        .write_all(format!("{:x}\r\n", data.len()).as_bytes())
        .await
        .map_err(|e| CupsError::Transport(format!("write chunk size: {e}")))?;
    writer
        .write_all(data)
        .await
        .map_err(|e| CupsError::Transport(format!("write chunk: {e}")))?;
    writer
        .write_all(b"\r\n")
        .await
        .map_err(|e| CupsError::Transport(format!("write chunk terminator: {e}")))?;
    Ok(())
}

/// Read and parse a status line plus headers.
async fn read_head(reader: &mut BufReader<OwnedReadHalf>) -> Result<ResponseHead> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(|e| CupsError::Transport(format!("read status line: {e}")))?;
    if n == 0 {
        return Err(CupsError::Transport(
            "connection closed before a response arrived".into(),
        ));
    }

    let mut parts = line.split_whitespace();
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(CupsError::Transport(format!(
            "malformed status line: {}",
            line.trim_end()
        )));
    }
    let status: u16 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CupsError::Transport(format!("malformed status line: {}", line.trim_end())))?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| CupsError::Transport(format!("read header: {e}")))?;
        if n == 0 {
            return Err(CupsError::Transport("connection closed mid-headers".into()));
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok(ResponseHead { status, headers })
}

/// Read the response body per its framing headers.
async fn read_body(
    reader: &mut BufReader<OwnedReadHalf>,
    head: ResponseHead,
) -> Result<HttpResponse> {
    let header = |name: &str| {
        head.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    };

    let body = if header("transfer-encoding")
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false)
    {
        read_chunked(reader).await?
    } else if let Some(length) = header("content-length") {
        let length: usize = length
            .parse()
            .map_err(|_| CupsError::Transport(format!("bad Content-Length: {length}")))?;
        let mut body = vec![0u8; length];
        reader
            .read_exact(&mut body)
            .await
            .map_err(|e| CupsError::Transport(format!("read response body: {e}")))?;
        body
    } else {
        // Connection: close framing.
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| CupsError::Transport(format!("read response body: {e}")))?;
        body
    };

    Ok(HttpResponse {
        status: head.status,
        headers: head.headers,
        body,
    })
}

async fn read_chunked(reader: &mut BufReader<OwnedReadHalf>) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| CupsError::Transport(format!("read chunk size: {e}")))?;
        let size_token = line.trim().split(';').next().unwrap_or_default();
        let size = usize::from_str_radix(size_token, 16)
            .map_err(|_| CupsError::Transport(format!("bad chunk size: {size_token:?}")))?;

        if size == 0 {
            // Trailer section ends with an empty line.
            loop {
                let mut trailer = String::new();
                let n = reader
                    .read_line(&mut trailer)
                    .await
                    .map_err(|e| CupsError::Transport(format!("read trailer: {e}")))?;
                if n == 0 || trailer.trim_end().is_empty() {
                    break;
                }
            }
            break;
        }

        let start = body.len();
        body.resize(start + size, 0);
        reader
            .read_exact(&mut body[start..])
            .await
            .map_err(|e| CupsError::Transport(format!("read chunk: {e}")))?;
        let mut crlf = [0u8; 2];
        reader
            .read_exact(&mut crlf)
            .await
            .map_err(|e| CupsError::Transport(format!("read chunk terminator: {e}")))?;
    }
    Ok(body)
}
