// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print-Job (0x0002, RFC 8011 §4.2.1).
//
// The request body is the encoded IPP message immediately followed by the
// raw document bytes; the only separator is the end-of-attributes tag
// inside the IPP section. Job parameters map onto IPP job attributes as:
//
//   copies       -> copies (integer, clamped to >= 1)
//   page_ranges  -> page-ranges (1setOf rangeOfInteger, disjoint ascending)
//   duplex       -> sides (keyword, edge chosen by orientation)
//   portrait     -> orientation-requested (enum 3/4)
//   color        -> output-mode (keyword color/monochrome)
//   page_format  -> media (keyword, verbatim)
//   resolution   -> printer-resolution (resolution)

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;
use tracing::info;

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, ProtocolError, Result};
use druckwerk_core::types::{Credentials, JobAttribute, JobState, PrintJob};

use crate::message::{IppMessage, Operation};
use crate::operations::{check_status, new_request, uri_path};
use crate::parser;
use crate::tag::DelimiterTag;
use crate::transport::{RequestBody, post_ipp};
use crate::value::{IppValue, ResolutionUnit};

/// The server's answer to an accepted Print-Job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedJob {
    pub job_id: i32,
    pub job_uri: String,
    pub state: Option<JobState>,
}

/// Submit a document to a printer.
///
/// The document stream is read to EOF and not closed; the caller keeps
/// ownership. With `document_length` known the body goes out
/// length-delimited, otherwise chunked.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn print(
    opts: &ClientOptions,
    printer_uri: &str,
    job: &PrintJob,
    document: &mut (dyn AsyncRead + Unpin + Send),
    document_length: Option<u64>,
    default_user: &str,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<SubmittedJob> {
    let message = build_request(printer_uri, job, default_user, request_id)?;

    let body = RequestBody::WithDocument {
        ipp: message.encode(),
        document,
        length: document_length,
    };
    let response_bytes = post_ipp(
        opts,
        uri_path(printer_uri),
        body,
        creds,
        opts.print_timeout_secs,
    )
    .await?;
    let response = parser::decode(&response_bytes)?;
    check_status(&response)?;

    let job_group = response
        .groups_of(DelimiterTag::JobAttributes)
        .next()
        .ok_or_else(|| {
            CupsError::Protocol(ProtocolError::BadOrder(
                "Print-Job response carried no job-attributes group".into(),
            ))
        })?;
    let job_id = job_group.i32_value("job-id").ok_or_else(|| {
        CupsError::Protocol(ProtocolError::BadOrder(
            "Print-Job response carried no job-id".into(),
        ))
    })?;
    let job_uri = job_group
        .str_value("job-uri")
        .map(str::to_string)
        .unwrap_or_else(|| super::job_uri(opts, job_id));
    let state = job_group
        .i32_value("job-state")
        .and_then(JobState::from_wire);

    info!(job_id, printer = printer_uri, "print job accepted");
    Ok(SubmittedJob {
        job_id,
        job_uri,
        state,
    })
}

/// Build the full Print-Job request message (without the document).
pub(crate) fn build_request(
    printer_uri: &str,
    job: &PrintJob,
    default_user: &str,
    request_id: u32,
) -> Result<IppMessage> {
    let mut message = new_request(Operation::PrintJob, request_id);

    // Operation attributes.
    {
        let group = message.groups.last_mut().expect("prelude group present");
        group.uri("printer-uri", printer_uri).name_attr(
            "requesting-user-name",
            job.user_name.as_deref().unwrap_or(default_user),
        );
        if let Some(job_name) = &job.job_name {
            group.name_attr("job-name", job_name);
        }

        let mut format_sent = false;
        for (name, value) in &job.operation_attributes {
            // The job-attributes entry is a bundle of typed job
            // attributes, not an operation attribute.
            if name == "job-attributes" {
                continue;
            }
            if name == "document-format" {
                format_sent = true;
            }
            group.attr(name, operation_attr_value(name, value));
        }
        if !format_sent {
            group.mime_media_type("document-format", "application/octet-stream");
        }
    }

    // Job attributes.
    let mut group = crate::message::AttributeGroup::new(DelimiterTag::JobAttributes);
    group.integer("copies", job.copies.max(1) as i32);

    if let Some(ranges) = &job.page_ranges {
        let ranges = parse_page_ranges(ranges)?;
        let mut values = ranges
            .into_iter()
            .map(|(lower, upper)| IppValue::RangeOfInteger { lower, upper });
        let first = values.next().expect("parser rejects empty range lists");
        group.attr("page-ranges", first);
        for value in values {
            group.additional(value);
        }
    }

    let sides = if job.duplex {
        if job.portrait {
            "two-sided-long-edge"
        } else {
            "two-sided-short-edge"
        }
    } else {
        "one-sided"
    };
    group.keyword("sides", sides);
    group.enum_attr("orientation-requested", if job.portrait { 3 } else { 4 });
    group.keyword("output-mode", if job.color { "color" } else { "monochrome" });

    if let Some(media) = &job.page_format {
        group.keyword("media", media);
    }
    if let Some(resolution) = &job.resolution {
        group.attr("printer-resolution", parse_resolution(resolution)?);
    }

    for attribute in &job.job_attributes {
        group.attr(
            &attribute.name,
            job_attribute_value(&attribute.syntax, &attribute.value)?,
        );
    }
    if let Some(bundle) = job.operation_attributes.get("job-attributes") {
        for attribute in parse_job_attributes(bundle)? {
            group.attr(
                &attribute.name,
                job_attribute_value(&attribute.syntax, &attribute.value)?,
            );
        }
    }

    message.groups.push(group);
    Ok(message)
}

/// The value syntax for a pass-through operation attribute.
fn operation_attr_value(name: &str, value: &str) -> IppValue {
    match name {
        "document-format" => IppValue::MimeMediaType(value.into()),
        "document-natural-language" => IppValue::NaturalLanguage(value.into()),
        "job-name" | "requesting-user-name" | "document-name" => IppValue::Name(value.into()),
        _ => IppValue::Keyword(value.into()),
    }
}

/// Parse `"1-3,5,8,10-13"` into disjoint ascending ranges.
///
/// Single pages become degenerate ranges. Overlapping or adjacent segments
/// are merged; a descending segment like `"2-1"` is rejected.
pub(crate) fn parse_page_ranges(input: &str) -> Result<Vec<(i32, i32)>> {
    let mut ranges: Vec<(i32, i32)> = Vec::new();

    for segment in input.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(CupsError::InvalidArgument(format!(
                "empty segment in page ranges {input:?}"
            )));
        }

        let (lower, upper) = match segment.split_once('-') {
            Some((lower, upper)) => (parse_page(lower)?, parse_page(upper)?),
            None => {
                let page = parse_page(segment)?;
                (page, page)
            }
        };
        if lower > upper {
            return Err(CupsError::InvalidArgument(format!(
                "descending page range {segment:?}"
            )));
        }
        ranges.push((lower, upper));
    }

    ranges.sort_unstable();
    let mut merged: Vec<(i32, i32)> = Vec::with_capacity(ranges.len());
    for (lower, upper) in ranges {
        match merged.last_mut() {
            Some((_, last_upper)) if lower <= *last_upper + 1 => {
                *last_upper = (*last_upper).max(upper);
            }
            _ => merged.push((lower, upper)),
        }
    }
    Ok(merged)
}

fn parse_page(token: &str) -> Result<i32> {
    let page: i32 = token
        .trim()
        .parse()
        .map_err(|_| CupsError::InvalidArgument(format!("bad page number {token:?}")))?;
    if page < 1 {
        return Err(CupsError::InvalidArgument(format!(
            "page numbers start at 1, got {page}"
        )));
    }
    Ok(page)
}

/// Parse `"600dpi"`, `"600x600dpi"`, or the `dpc` (dots per centimetre)
/// variants into a resolution value.
pub(crate) fn parse_resolution(input: &str) -> Result<IppValue> {
    let input = input.trim();
    let (digits, unit) = if let Some(rest) = input.strip_suffix("dpi") {
        (rest, ResolutionUnit::Dpi)
    } else if let Some(rest) = input.strip_suffix("dpcm") {
        (rest, ResolutionUnit::Dpcm)
    } else if let Some(rest) = input.strip_suffix("dpc") {
        (rest, ResolutionUnit::Dpcm)
    } else {
        return Err(CupsError::InvalidArgument(format!(
            "resolution {input:?} must end in dpi or dpc"
        )));
    };

    let (x, y) = match digits.split_once('x') {
        Some((x, y)) => (parse_resolution_axis(x, input)?, parse_resolution_axis(y, input)?),
        None => {
            let v = parse_resolution_axis(digits, input)?;
            (v, v)
        }
    };

    Ok(IppValue::Resolution { x, y, unit })
}

fn parse_resolution_axis(token: &str, input: &str) -> Result<u32> {
    let value: u32 = token
        .trim()
        .parse()
        .map_err(|_| CupsError::InvalidArgument(format!("bad resolution {input:?}")))?;
    if value == 0 {
        return Err(CupsError::InvalidArgument(format!(
            "zero resolution in {input:?}"
        )));
    }
    Ok(value)
}

/// Parse the `name:syntax:value#name:syntax:value` job-attributes bundle.
pub(crate) fn parse_job_attributes(input: &str) -> Result<Vec<JobAttribute>> {
    let mut attributes = Vec::new();
    for entry in input.split('#') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        // The value may itself contain ':' (URIs), so split twice only.
        let mut parts = entry.splitn(3, ':');
        let (name, syntax, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(syntax), Some(value))
                if !name.is_empty() && !syntax.is_empty() =>
            {
                (name, syntax, value)
            }
            _ => {
                return Err(CupsError::InvalidArgument(format!(
                    "job attribute entry {entry:?} is not name:syntax:value"
                )));
            }
        };
        attributes.push(JobAttribute {
            name: name.to_string(),
            syntax: syntax.to_string(),
            value: value.to_string(),
        });
    }
    Ok(attributes)
}

/// Build a typed value from a syntax token. Unknown tokens map to keyword.
pub(crate) fn job_attribute_value(syntax: &str, value: &str) -> Result<IppValue> {
    match syntax.to_ascii_lowercase().as_str() {
        "integer" => value
            .parse()
            .map(IppValue::Integer)
            .map_err(|_| CupsError::InvalidArgument(format!("bad integer {value:?}"))),
        "enum" => value
            .parse()
            .map(IppValue::Enum)
            .map_err(|_| CupsError::InvalidArgument(format!("bad enum {value:?}"))),
        "boolean" => Ok(IppValue::Boolean(value == "true" || value == "1")),
        "name" => Ok(IppValue::Name(value.into())),
        "text" => Ok(IppValue::Text(value.into())),
        "uri" => Ok(IppValue::Uri(value.into())),
        "resolution" => parse_resolution(value),
        "rangeofinteger" => {
            let (lower, upper) = value
                .split_once('-')
                .ok_or_else(|| CupsError::InvalidArgument(format!("bad range {value:?}")))?;
            let lower: i32 = lower.trim().parse().map_err(|_| {
                CupsError::InvalidArgument(format!("bad range {value:?}"))
            })?;
            let upper: i32 = upper.trim().parse().map_err(|_| {
                CupsError::InvalidArgument(format!("bad range {value:?}"))
            })?;
            if lower > upper {
                return Err(CupsError::InvalidArgument(format!(
                    "descending range {value:?}"
                )));
            }
            Ok(IppValue::RangeOfInteger { lower, upper })
        }
        _ => Ok(IppValue::Keyword(value.into())),
    }
}
