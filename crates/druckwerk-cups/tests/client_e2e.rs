// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end client tests against a scripted in-process CUPS server.
//
// The mock accepts one TCP connection per scripted response, parses just
// enough HTTP to honour Content-Length, chunked bodies, and
// `Expect: 100-continue`, and records every request it sees for the tests
// to inspect.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, ProtocolError};
use druckwerk_core::types::{Credentials, JobState, PrintJob, PrinterState, WhichJobs};
use druckwerk_cups::message::{IppMessage, status};
use druckwerk_cups::tag::DelimiterTag;
use druckwerk_cups::value::IppValue;
use druckwerk_cups::{CupsClient, Printer};

// ---------------------------------------------------------------------------
// Mock CUPS server
// ---------------------------------------------------------------------------

/// One scripted reaction to one incoming connection.
enum Script {
    /// Read the whole request, answer 200 with this IPP body.
    Ipp(Vec<u8>),
    /// Answer with an HTTP status and extra headers. With `before_body` the
    /// reply goes out right after the request head, leaving the request
    /// body unread (the 100-continue rejection path).
    Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
        before_body: bool,
    },
    /// Read the whole request, never answer (for timeout tests).
    Stall,
}

#[derive(Debug)]
struct ReceivedRequest {
    head: String,
    body: Vec<u8>,
}

impl ReceivedRequest {
    fn has_header(&self, needle: &str) -> bool {
        self.head
            .lines()
            .any(|l| l.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
    }

    fn ipp(&self) -> IppMessage {
        druckwerk_cups::parser::decode(&self.body).expect("request body decodes as IPP")
    }
}

struct MockServer {
    port: u16,
    requests: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockServer {
    async fn start(scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        tokio::spawn(async move {
            for script in scripts {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                handle_connection(stream, script, &recorded).await;
            }
        });

        Self { port, requests }
    }

    fn client(&self) -> CupsClient {
        let mut opts = ClientOptions::new("127.0.0.1", self.port);
        opts.query_timeout_secs = 5;
        opts.print_timeout_secs = 5;
        CupsClient::with_options(opts).user("tester")
    }

    fn requests(&self) -> Vec<ReceivedRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }

    /// A printer handle pointing at this mock, bypassing enumeration.
    fn printer(&self, name: &str) -> Printer {
        Printer {
            uri: format!("ipp://127.0.0.1:{}/printers/{name}", self.port),
            name: name.into(),
            description: String::new(),
            location: String::new(),
            state: PrinterState::Idle,
            state_reasons: Default::default(),
            is_default: false,
            is_shared: true,
            printer_type: 0,
            media_supported: Vec::new(),
            resolution_supported: Vec::new(),
            mime_types_supported: Vec::new(),
            attributes: Default::default(),
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    script: Script,
    recorded: &Arc<Mutex<Vec<ReceivedRequest>>>,
) {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Request head.
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
        head.push_str(&line);
    }

    let header = |name: &str| -> Option<String> {
        head.lines()
            .find(|l| l.to_ascii_lowercase().starts_with(&format!("{name}:")))
            .and_then(|l| l.split_once(':'))
            .map(|(_, v)| v.trim().to_string())
    };

    if let Script::Reply {
        status,
        headers,
        body,
        before_body: true,
    } = &script
    {
        recorded.lock().unwrap().push(ReceivedRequest {
            head: head.clone(),
            body: Vec::new(),
        });
        write_response(&mut writer, *status, headers, body).await;
        return;
    }

    if header("expect").is_some_and(|v| v.eq_ignore_ascii_case("100-continue")) {
        writer
            .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
            .await
            .unwrap();
    }

    // Request body.
    let mut body = Vec::new();
    if header("transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).await.unwrap();
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
            if size == 0 {
                let mut blank = String::new();
                let _ = reader.read_line(&mut blank).await;
                break;
            }
            let start = body.len();
            body.resize(start + size, 0);
            reader.read_exact(&mut body[start..]).await.unwrap();
            let mut crlf = [0u8; 2];
            reader.read_exact(&mut crlf).await.unwrap();
        }
    } else if let Some(length) = header("content-length") {
        let length: usize = length.parse().unwrap();
        body.resize(length, 0);
        reader.read_exact(&mut body).await.unwrap();
    }

    recorded.lock().unwrap().push(ReceivedRequest { head, body });

    match script {
        Script::Ipp(ipp) => write_response(&mut writer, 200, &[], &ipp).await,
        Script::Reply {
            status,
            headers,
            body,
            ..
        } => write_response(&mut writer, status, &headers, &body).await,
        Script::Stall => {
            // Hold the connection open until the client gives up.
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        }
    }
}

async fn write_response(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    status: u16,
    headers: &[(&'static str, String)],
    body: &[u8],
) {
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        _ => "Whatever",
    };
    let mut response = format!("HTTP/1.1 {status} {reason}\r\n");
    response.push_str("Content-Type: application/ipp\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str(&format!("Content-Length: {}\r\n", body.len()));
    response.push_str("Connection: close\r\n\r\n");
    let _ = writer.write_all(response.as_bytes()).await;
    let _ = writer.write_all(body).await;
    let _ = writer.flush().await;
}

// ---------------------------------------------------------------------------
// Response fixtures
// ---------------------------------------------------------------------------

fn ok_response(request_id: u32) -> IppMessage {
    let mut msg = IppMessage::response(status::SUCCESSFUL_OK, request_id);
    msg.add_group(DelimiterTag::OperationAttributes)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en");
    msg
}

fn printers_response() -> Vec<u8> {
    let mut msg = ok_response(1);
    msg.add_group(DelimiterTag::PrinterAttributes)
        .name_attr("printer-name", "LaserJet")
        .uri("printer-uri-supported", "ipp://host:631/printers/LaserJet")
        .enum_attr("printer-state", 3);
    msg.encode()
}

fn print_job_response(job_id: i32) -> Vec<u8> {
    let mut msg = ok_response(1);
    msg.add_group(DelimiterTag::JobAttributes)
        .integer("job-id", job_id)
        .uri("job-uri", &format!("ipp://host:631/jobs/{job_id}"))
        .enum_attr("job-state", 3);
    msg.encode()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enumerate_printers() {
    let server = MockServer::start(vec![Script::Ipp(printers_response())]).await;
    let client = server.client();

    let printers = client.get_printers().await.expect("enumeration succeeds");
    assert_eq!(printers.len(), 1);
    assert_eq!(printers[0].name, "LaserJet");
    assert_eq!(printers[0].uri, "ipp://host:631/printers/LaserJet");
    assert_eq!(printers[0].state, PrinterState::Idle);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    // CUPS-Get-Printers posted to the server root with the exact prelude.
    assert!(requests[0].head.starts_with("POST / HTTP/1.1"));
    assert!(requests[0].has_header("content-type: application/ipp"));
    let expected_prefix: &[u8] = &[0x01, 0x01, 0x40, 0x02];
    assert_eq!(&requests[0].body[..4], expected_prefix);
    let ipp = requests[0].ipp();
    let op = ipp.group(DelimiterTag::OperationAttributes).unwrap();
    assert_eq!(op.attributes[0].name, "attributes-charset");
    assert_eq!(op.str_value("attributes-charset"), Some("utf-8"));
    assert_eq!(op.attributes[1].name, "attributes-natural-language");
    assert_eq!(op.str_value("attributes-natural-language"), Some("en"));
}

#[tokio::test]
async fn print_job_submission_with_known_length() {
    let server = MockServer::start(vec![Script::Ipp(print_job_response(42))]).await;
    let client = server.client();
    let printer = server.printer("lp");

    let job = PrintJob {
        copies: 2,
        duplex: true,
        portrait: true,
        page_format: Some("iso_a4_210x297mm".into()),
        ..PrintJob::default()
    };
    let document = vec![0xabu8; 128];

    let submitted = client
        .print_bytes(&printer, &job, &document)
        .await
        .expect("print accepted");
    assert_eq!(submitted.job_id, 42);
    assert_eq!(submitted.job_uri, "ipp://host:631/jobs/42");
    assert_eq!(submitted.state, Some(JobState::Pending));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.head.starts_with("POST /printers/lp HTTP/1.1"));
    assert!(request.has_header("expect: 100-continue"));

    // Body = encoded IPP message + the 128 document bytes, nothing between.
    let ipp = request.ipp();
    let ipp_len = ipp.encode().len();
    assert_eq!(request.body.len(), ipp_len + 128);
    assert_eq!(&request.body[ipp_len..], &document[..]);

    let attrs = ipp.group(DelimiterTag::JobAttributes).unwrap();
    assert_eq!(attrs.i32_value("copies"), Some(2));
    assert_eq!(attrs.str_value("sides"), Some("two-sided-long-edge"));
    assert_eq!(attrs.str_value("media"), Some("iso_a4_210x297mm"));
}

#[tokio::test]
async fn print_streams_chunked_when_length_unknown() {
    let server = MockServer::start(vec![Script::Ipp(print_job_response(7))]).await;
    let client = server.client();
    let printer = server.printer("lp");

    let document = vec![0x5au8; 100_000];
    let mut reader = &document[..];
    let submitted = client
        .print(&printer, &PrintJob::default(), &mut reader)
        .await
        .expect("print accepted");
    assert_eq!(submitted.job_id, 7);

    let requests = server.requests();
    let request = &requests[0];
    assert!(request.has_header("transfer-encoding: chunked"));
    let ipp = request.ipp();
    let ipp_len = ipp.encode().len();
    assert_eq!(request.body.len(), ipp_len + document.len());
    assert_eq!(&request.body[ipp_len..], &document[..]);
}

#[tokio::test]
async fn cancel_of_terminal_job_surfaces_not_possible() {
    let mut response = IppMessage::response(status::CLIENT_ERROR_NOT_POSSIBLE, 1);
    response
        .add_group(DelimiterTag::OperationAttributes)
        .charset("attributes-charset", "utf-8")
        .natural_language("attributes-natural-language", "en")
        .text("status-message", "job-canceled-at-device");

    let server = MockServer::start(vec![Script::Ipp(response.encode())]).await;
    let client = server.client();
    let printer = server.printer("lp");

    let err = client.cancel_job(&printer, 9).await.unwrap_err();
    match err {
        CupsError::IppStatus { code, message } => {
            assert_eq!(code, 0x040c);
            assert_eq!(message.as_deref(), Some("job-canceled-at-device"));
        }
        other => panic!("expected IppStatus, got {other:?}"),
    }

    // Exactly one exchange: no retry on IPP-level failure.
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn auth_challenge_retried_once_with_basic() {
    let server = MockServer::start(vec![
        Script::Reply {
            status: 401,
            headers: vec![("WWW-Authenticate", "Basic realm=\"cups\"".into())],
            body: Vec::new(),
            before_body: false,
        },
        Script::Ipp(printers_response()),
    ])
    .await;
    let client = server.client().credentials(Credentials::new("anna", "pw"));

    let printers = client.get_printers().await.expect("retry succeeds");
    assert_eq!(printers.len(), 1);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].has_header("authorization:"));
    assert!(requests[1].has_header("authorization: basic"));
}

#[tokio::test]
async fn second_challenge_is_auth_required() {
    let challenge = || Script::Reply {
        status: 401,
        headers: vec![("WWW-Authenticate", "Basic realm=\"cups\"".into())],
        body: Vec::new(),
        before_body: false,
    };
    let server = MockServer::start(vec![challenge(), challenge()]).await;
    let client = server.client().credentials(Credentials::new("anna", "pw"));

    let err = client.get_printers().await.unwrap_err();
    assert!(matches!(err, CupsError::AuthRequired), "{err:?}");
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn challenge_without_credentials_is_auth_required() {
    let server = MockServer::start(vec![Script::Reply {
        status: 401,
        headers: vec![("WWW-Authenticate", "Basic realm=\"cups\"".into())],
        body: Vec::new(),
        before_body: false,
    }])
    .await;
    let client = server.client();

    let err = client.get_printers().await.unwrap_err();
    assert!(matches!(err, CupsError::AuthRequired), "{err:?}");
}

#[tokio::test]
async fn print_auth_challenge_leaves_document_replayable() {
    // The 401 arrives before the body thanks to Expect: 100-continue, so
    // the retry still carries the full document.
    let server = MockServer::start(vec![
        Script::Reply {
            status: 401,
            headers: vec![("WWW-Authenticate", "Basic realm=\"cups\"".into())],
            body: Vec::new(),
            before_body: true,
        },
        Script::Ipp(print_job_response(3)),
    ])
    .await;
    let client = server.client().credentials(Credentials::new("anna", "pw"));
    let printer = server.printer("lp");

    let document = b"the document body".to_vec();
    let submitted = client
        .print_bytes(&printer, &PrintJob::default(), &document)
        .await
        .expect("authorized retry succeeds");
    assert_eq!(submitted.job_id, 3);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].body.is_empty());
    assert!(requests[1].has_header("authorization: basic"));
    assert!(requests[1].body.ends_with(&document));
}

#[tokio::test]
async fn move_job_success() {
    let server = MockServer::start(vec![Script::Ipp(ok_response(1).encode())]).await;
    let client = server.client();
    let target = server.printer("B");

    client.move_job(42, &target).await.expect("move succeeds");

    let requests = server.requests();
    let request = &requests[0];
    assert!(request.head.starts_with("POST /jobs HTTP/1.1"));
    let ipp = request.ipp();
    let op = ipp.group(DelimiterTag::OperationAttributes).unwrap();
    assert_eq!(
        op.str_value("job-uri"),
        Some(format!("ipp://127.0.0.1:{}/jobs/42", server.port).as_str())
    );
    let job = ipp.group(DelimiterTag::JobAttributes).unwrap();
    assert_eq!(
        job.str_value("job-printer-uri"),
        Some(format!("ipp://127.0.0.1:{}/printers/B", server.port).as_str())
    );
}

#[tokio::test]
async fn truncated_response_is_protocol_error() {
    // Valid HTTP framing, but the IPP body declares a longer value than it
    // carries.
    let mut bad_ipp = vec![0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01];
    bad_ipp.extend_from_slice(&[0x44, 0x00, 0x01, b'a', 0x00, 0x40, b'x']);

    let server = MockServer::start(vec![Script::Ipp(bad_ipp)]).await;
    let client = server.client();

    let err = client.get_printers().await.unwrap_err();
    assert!(
        matches!(err, CupsError::Protocol(ProtocolError::Truncated(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let server = MockServer::start(vec![Script::Stall]).await;
    let mut opts = ClientOptions::new("127.0.0.1", server.port);
    opts.query_timeout_secs = 1;
    let client = CupsClient::with_options(opts);

    let err = client.get_printers().await.unwrap_err();
    assert!(matches!(err, CupsError::Timeout(1)), "{err:?}");
}

#[tokio::test]
async fn no_default_printer_maps_to_none() {
    let response = IppMessage::response(status::CLIENT_ERROR_NOT_FOUND, 1);
    let server = MockServer::start(vec![Script::Ipp(response.encode())]).await;
    let client = server.client();

    let printer = client.get_default_printer().await.expect("not an error");
    assert!(printer.is_none());
}

#[tokio::test]
async fn default_printer_is_flagged() {
    let server = MockServer::start(vec![Script::Ipp(printers_response())]).await;
    let client = server.client();

    let printer = client
        .get_default_printer()
        .await
        .expect("query succeeds")
        .expect("server returned a default");
    assert_eq!(printer.name, "LaserJet");
    assert!(printer.is_default);
}

#[tokio::test]
async fn get_jobs_projects_every_group() {
    let mut response = ok_response(1);
    for (id, state) in [(1, 9), (2, 5)] {
        response
            .add_group(DelimiterTag::JobAttributes)
            .integer("job-id", id)
            .name_attr("job-name", &format!("doc-{id}"))
            .enum_attr("job-state", state);
    }
    let server = MockServer::start(vec![Script::Ipp(response.encode())]).await;
    let client = server.client();
    let printer = server.printer("lp");

    let jobs = client
        .get_jobs(&printer, WhichJobs::All, true)
        .await
        .expect("query succeeds");
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].job_id, 1);
    assert_eq!(jobs[0].state, Some(JobState::Completed));
    assert_eq!(jobs[1].state, Some(JobState::Processing));

    // my-jobs demands requesting-user-name on the wire.
    let requests = server.requests();
    let request0_ipp = requests[0].ipp();
    let op = request0_ipp
        .group(DelimiterTag::OperationAttributes)
        .unwrap();
    assert_eq!(op.str_value("requesting-user-name"), Some("tester"));
    assert_eq!(op.str_value("which-jobs"), Some("all"));
    assert_eq!(op.bool_value("my-jobs"), Some(true));
    assert_eq!(
        op.get("my-jobs").unwrap().value(),
        &IppValue::Boolean(true)
    );
}
