// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk CUPS — IPP/1.1 client (RFC 8010 framing, RFC 8011 semantics)
// with the CUPS extensions for printer enumeration, job control, and job
// moves. This crate holds the binary codec, the HTTP transport, the
// per-operation request builders, and the `CupsClient` facade over the
// domain types defined in `druckwerk-core`.

pub mod client;
pub mod message;
pub mod operations;
pub mod parser;
pub mod tag;
pub mod value;

mod auth;
mod transport;

pub use client::CupsClient;
pub use message::{IppAttribute, IppMessage, Operation};
pub use operations::jobs::PrintJobAttributes;
pub use operations::print_job::SubmittedJob;
pub use operations::printers::Printer;
pub use value::IppValue;
