// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer enumeration and attribute queries:
//   - CUPS-Get-Printers       (0x4002)  one printer-attributes group per printer
//   - CUPS-Get-Default        (0x4001)  exactly one printer-attributes group
//   - Get-Printer-Attributes  (0x000B)  RFC 8011 §4.2.5, targets one printer-uri

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use druckwerk_core::config::ClientOptions;
use druckwerk_core::error::{CupsError, Result};
use druckwerk_core::types::{Credentials, PrinterState};

use crate::message::{AttributeGroup, Operation};
use crate::operations::{check_status, new_request, send, uri_path};
use crate::tag::DelimiterTag;
use crate::value::IppValue;

/// CUPS `printer-type` bit marking an implicit class.
const PRINTER_TYPE_IMPLICIT_CLASS: u32 = 0x0000_0004;

/// A printer as projected from a printer-attributes group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    /// The printer's IPP URI (`printer-uri-supported`).
    pub uri: String,
    pub name: String,
    /// `printer-info`.
    pub description: String,
    /// `printer-location`.
    pub location: String,
    pub state: PrinterState,
    pub state_reasons: HashSet<String>,
    /// Set only on the printer returned by CUPS-Get-Default.
    pub is_default: bool,
    /// `printer-is-shared`; CUPS omits it for raw queues.
    pub is_shared: bool,
    /// Raw CUPS `printer-type` capability bits.
    pub printer_type: u32,
    pub media_supported: Vec<String>,
    pub resolution_supported: Vec<String>,
    pub mime_types_supported: Vec<String>,
    /// Every attribute of the group, in rendered form, for callers that
    /// need more than the projected fields.
    pub attributes: HashMap<String, Vec<IppValue>>,
}

impl Printer {
    /// Project a printer-attributes group into a `Printer`.
    pub(crate) fn from_group(group: &AttributeGroup, opts: &ClientOptions) -> Self {
        let name = group
            .str_value("printer-name")
            .unwrap_or_default()
            .to_string();
        let uri = group
            .str_value("printer-uri-supported")
            .map(str::to_string)
            .unwrap_or_else(|| super::printer_uri(opts, &name));

        let state = group
            .i32_value("printer-state")
            .and_then(PrinterState::from_wire)
            .unwrap_or(PrinterState::Idle);

        let attributes = group
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.values.clone()))
            .collect();

        Self {
            uri,
            name,
            description: group
                .str_value("printer-info")
                .unwrap_or_default()
                .to_string(),
            location: group
                .str_value("printer-location")
                .unwrap_or_default()
                .to_string(),
            state,
            state_reasons: group
                .strings("printer-state-reasons")
                .into_iter()
                .collect(),
            is_default: false,
            is_shared: group.bool_value("printer-is-shared").unwrap_or(true),
            printer_type: group.i32_value("printer-type").unwrap_or(0) as u32,
            media_supported: group.strings("media-supported"),
            resolution_supported: group.strings("printer-resolution-supported"),
            mime_types_supported: group.strings("document-format-supported"),
            attributes,
        }
    }

    /// The HTTP request path for this printer.
    pub fn path(&self) -> &str {
        uri_path(&self.uri)
    }
}

/// CUPS-Get-Printers: enumerate every queue the server exposes.
pub(crate) async fn get_printers(
    opts: &ClientOptions,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<Vec<Printer>> {
    let message = new_request(Operation::CupsGetPrinters, request_id);
    let response = send(opts, "/", &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    let printers: Vec<Printer> = response
        .groups_of(DelimiterTag::PrinterAttributes)
        .map(|group| Printer::from_group(group, opts))
        .collect();
    debug!(count = printers.len(), "enumerated printers");
    Ok(printers)
}

/// CUPS-Get-Default: the server-wide default queue, `None` when the server
/// has none configured.
pub(crate) async fn get_default(
    opts: &ClientOptions,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<Option<Printer>> {
    let message = new_request(Operation::CupsGetDefault, request_id);
    let response = send(opts, "/", &message, creds, opts.query_timeout_secs).await?;

    match check_status(&response) {
        Ok(()) => {}
        // No default printer configured.
        Err(CupsError::IppStatus { code: 0x0406, .. }) => return Ok(None),
        Err(e) => return Err(e),
    }

    Ok(response
        .groups_of(DelimiterTag::PrinterAttributes)
        .next()
        .map(|group| {
            let mut printer = Printer::from_group(group, opts);
            printer.is_default = true;
            printer
        }))
}

/// Get-Printer-Attributes against one printer URI.
pub(crate) async fn get_printer_attributes(
    opts: &ClientOptions,
    printer_uri: &str,
    requesting_user_name: &str,
    creds: Option<&Credentials>,
    request_id: u32,
) -> Result<Printer> {
    let mut message = new_request(Operation::GetPrinterAttributes, request_id);
    message
        .groups
        .last_mut()
        .expect("prelude group present")
        .uri("printer-uri", printer_uri)
        .name_attr("requesting-user-name", requesting_user_name);

    let response = send(opts, uri_path(printer_uri), &message, creds, opts.query_timeout_secs).await?;
    check_status(&response)?;

    response
        .groups_of(DelimiterTag::PrinterAttributes)
        .next()
        .map(|group| Printer::from_group(group, opts))
        .ok_or_else(|| {
            CupsError::Protocol(druckwerk_core::error::ProtocolError::BadOrder(
                "response carried no printer-attributes group".into(),
            ))
        })
}

/// Drop the CUPS implicit default entry from an enumeration.
///
/// An entry is suppressed only when its `printer-type` carries the
/// implicit-class bit and another entry with the same name remains, so a
/// queue is never filtered into nothingness.
pub(crate) fn without_implicit_default(printers: Vec<Printer>) -> Vec<Printer> {
    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for printer in &printers {
        *name_counts.entry(printer.name.clone()).or_insert(0) += 1;
    }

    printers
        .into_iter()
        .filter(|p| {
            let implicit = p.printer_type & PRINTER_TYPE_IMPLICIT_CLASS != 0;
            let duplicated = name_counts.get(&p.name).copied().unwrap_or(0) > 1;
            !(implicit && duplicated)
        })
        .collect()
}
