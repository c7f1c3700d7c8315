// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job queries and job control:
//   - Get-Job-Attributes  (0x0009)  RFC 8011 §4.3.4
//   - Get-Jobs            (0x000A)  RFC 8011 §4.2.6
//   - Cancel-Job          (0x0008)  RFC 8011 §4.3.3
//   - Hold-Job            (0x000C)  RFC 8011 §4.3.5
//   - Release-Job         (0x000D)  RFC 8011 §4.3.6
//   - CUPS-Move-Job       (0x400D)
//
// Cancel/hold/release succeed iff the status is below 0x0100; a terminal
// job answers client-error-not-possible, which surfaces as `IppStatus`
// rather than being swallowed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, ProtocolError, Result};
use druckwerk_core::types::{Credentials, JobState, WhichJobs};

use crate::message::{AttributeGroup, Operation};
use crate::operations::{check_status, job_uri, new_request, send, uri_path};
use crate::tag::DelimiterTag;
use crate::value::IppValue;

/// A job as projected from a job-attributes group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJobAttributes {
    pub job_id: i32,
    pub job_uri: String,
    /// `job-printer-uri`: the queue the job sits on.
    pub printer_uri: String,
    /// `job-originating-user-name`.
    pub user_name: String,
    pub job_name: String,
    pub state: Option<JobState>,
    pub state_reasons: Vec<String>,
    /// Every attribute of the group for callers that need more.
    pub attributes: HashMap<String, Vec<IppValue>>,
}

impl PrintJobAttributes {
    pub(crate) fn from_group(group: &AttributeGroup) -> Self {
        Self {
            job_id: group.i32_value("job-id").unwrap_or(0),
            job_uri: group.str_value("job-uri").unwrap_or_default().to_string(),
            printer_uri: group
                .str_value("job-printer-uri")
                .unwrap_or_default()
                .to_string(),
            user_name: group
                .str_value("job-originating-user-name")
                .unwrap_or_default()
                .to_string(),
            job_name: group.str_value("job-name").unwrap_or_default().to_string(),
            state: group.i32_value("job-state").and_then(JobState::from_wire),
            state_reasons: group.strings("job-state-reasons"),
            attributes: group
                .attributes
                .iter()
                .map(|a| (a.name.clone(), a.values.clone()))
                .collect(),
        }
    }
}

/// Get-Job-Attributes for one job, addressed by its job URI.
pub(crate) async fn get_job_attributes(
    opts: &ClientOptions,
    job_id: i32,
    requesting_user_name: &str,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<PrintJobAttributes> {
    let uri = job_uri(opts, job_id);
    let mut message = new_request(Operation::GetJobAttributes, request_id);
    message
        .groups
        .last_mut()
        .expect("prelude group present")
        .uri("job-uri", &uri)
        .name_attr("requesting-user-name", requesting_user_name);

    let response = send(opts, uri_path(&uri), &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    response
        .groups_of(DelimiterTag::JobAttributes)
        .next()
        .map(PrintJobAttributes::from_group)
        .ok_or_else(|| {
            CupsError::Protocol(ProtocolError::BadOrder(
                "response carried no job-attributes group".into(),
            ))
        })
}

/// Get-Jobs on a printer. One job-attributes group per job comes back.
///
/// With `my_jobs` the server filters on `requesting-user-name`, so that
/// attribute is always sent.
pub(crate) async fn get_jobs(
    opts: &ClientOptions,
    printer_uri: &str,
    which: WhichJobs,
    requesting_user_name: &str,
    my_jobs: bool,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<Vec<PrintJobAttributes>> {
    let mut message = new_request(Operation::GetJobs, request_id);
    message
        .groups
        .last_mut()
        .expect("prelude group present")
        .uri("printer-uri", printer_uri)
        .name_attr("requesting-user-name", requesting_user_name)
        .keyword("which-jobs", which.keyword())
        .boolean("my-jobs", my_jobs);

    let response = send(opts, uri_path(printer_uri), &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    let jobs: Vec<PrintJobAttributes> = response
        .groups_of(DelimiterTag::JobAttributes)
        .map(PrintJobAttributes::from_group)
        .collect();
    debug!(count = jobs.len(), which = which.keyword(), "job list received");
    Ok(jobs)
}

/// Cancel-Job, Hold-Job, or Release-Job against a printer-uri + job-id.
pub(crate) async fn job_control(
    operation: Operation,
    opts: &ClientOptions,
    printer_uri: &str,
    job_id: i32,
    requesting_user_name: &str,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<()> {
    debug_assert!(matches!(
        operation,
        Operation::CancelJob | Operation::HoldJob | Operation::ReleaseJob
    ));

    let mut message = new_request(operation, request_id);
    message
        .groups
        .last_mut()
        .expect("prelude group present")
        .uri("printer-uri", printer_uri)
        .integer("job-id", job_id)
        .name_attr("requesting-user-name", requesting_user_name);

    let response = send(opts, uri_path(printer_uri), &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    info!(operation = operation.name(), job_id, "job control accepted");
    Ok(())
}

/// CUPS-Move-Job: re-queue a job onto another printer.
///
/// The source job is addressed by `job-uri` in the operation attributes;
/// the destination goes into the job-attributes group as
/// `job-printer-uri`.
pub(crate) async fn move_job(
    opts: &ClientOptions,
    job_id: i32,
    target_printer_uri: &str,
    requesting_user_name: &str,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<()> {
    let uri = job_uri(opts, job_id);
    let mut message = new_request(Operation::CupsMoveJob, request_id);
    message
        .groups
        .last_mut()
        .expect("prelude group present")
        .uri("job-uri", &uri)
        .name_attr("requesting-user-name", requesting_user_name);
    message
        .add_group(DelimiterTag::JobAttributes)
        .uri("job-printer-uri", target_printer_uri);

    let response = send(opts, "/jobs", &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    info!(job_id, target = target_printer_uri, "job moved");
    Ok(())
}
