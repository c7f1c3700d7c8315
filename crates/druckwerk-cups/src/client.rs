// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS client facade.
//
// A stateless handle bundling the target server, the default user identity,
// and optional credentials. Distinct handles can be used from distinct
// threads freely; a shared handle is safe too, since the request-id counter
// is atomic and every call opens its own connection.

use std::sync::atomic::{AtomicU32, Ordering};

use tokio::io::AsyncRead;

use druckwerk_core::config::{ClientOptions, default_user};
use druckwerk_core::error::Result;
use druckwerk_core::types::{Credentials, PrintJob, WhichJobs};

use crate::message::Operation;
use crate::operations::{jobs, print_job, printers};

pub use crate::operations::jobs::PrintJobAttributes;
pub use crate::operations::print_job::SubmittedJob;
pub use crate::operations::printers::Printer;

/// Client for one CUPS server.
///
/// The default user is resolved from the environment once, here, and reused
/// for every request that does not override it.
pub struct CupsClient {
    opts: ClientOptions,
    user: String,
    creds: Option<Credentials>,
    next_request_id: AtomicU32,
}

impl CupsClient {
    /// A client for `localhost:631` with the environment user.
    pub fn new() -> Self {
        Self::with_options(ClientOptions::default())
    }

    /// A client for an explicit host and port.
    pub fn with_host(host: impl Into<String>, port: u16) -> Self {
        Self::with_options(ClientOptions::new(host, port))
    }

    pub fn with_options(opts: ClientOptions) -> Self {
        Self {
            opts,
            user: default_user(),
            creds: None,
            next_request_id: AtomicU32::new(1),
        }
    }

    /// Override the default `requesting-user-name`.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Attach credentials for HTTP auth challenges.
    pub fn credentials(mut self, creds: Credentials) -> Self {
        self.creds = Some(creds);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.opts
    }

    /// Request ids are unique per client and monotonically increasing.
    fn next_id(&self) -> u32 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    // -- Printer enumeration ------------------------------------------------

    /// All queues the server exposes (CUPS-Get-Printers).
    pub async fn get_printers(&self) -> Result<Vec<Printer>> {
        printers::get_printers(&self.opts, self.creds.as_ref(), self.next_id()).await
    }

    /// All queues except the CUPS implicit default entry.
    pub async fn get_printers_without_default(&self) -> Result<Vec<Printer>> {
        let all = self.get_printers().await?;
        Ok(printers::without_implicit_default(all))
    }

    /// The printer with the given queue name, if any.
    pub async fn get_printer(&self, name: &str) -> Result<Option<Printer>> {
        let printers = self.get_printers().await?;
        Ok(printers.into_iter().find(|p| p.name == name))
    }

    /// The printer with the given URI, if any.
    pub async fn get_printer_by_uri(&self, uri: &str) -> Result<Option<Printer>> {
        let printers = self.get_printers().await?;
        Ok(printers.into_iter().find(|p| p.uri == uri))
    }

    /// The server-wide default printer (CUPS-Get-Default).
    pub async fn get_default_printer(&self) -> Result<Option<Printer>> {
        printers::get_default(&self.opts, self.creds.as_ref(), self.next_id()).await
    }

    /// Fresh attributes for one printer (Get-Printer-Attributes).
    pub async fn get_printer_attributes(&self, printer: &Printer) -> Result<Printer> {
        printers::get_printer_attributes(
            &self.opts,
            &printer.uri,
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    // -- Printing -----------------------------------------------------------

    /// Submit a document stream of unknown length (chunked transfer).
    ///
    /// The stream is read to EOF and left open; the caller releases it.
    pub async fn print(
        &self,
        printer: &Printer,
        job: &PrintJob,
        document: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<SubmittedJob> {
        print_job::print(
            &self.opts,
            &printer.uri,
            job,
            document,
            None,
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    /// Submit an in-memory document (length-delimited body).
    pub async fn print_bytes(
        &self,
        printer: &Printer,
        job: &PrintJob,
        document: &[u8],
    ) -> Result<SubmittedJob> {
        let length = document.len() as u64;
        let mut reader = document;
        print_job::print(
            &self.opts,
            &printer.uri,
            job,
            &mut reader,
            Some(length),
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    // -- Job queries and control --------------------------------------------

    /// Attributes of one job (Get-Job-Attributes).
    pub async fn get_job_attributes(&self, job_id: i32) -> Result<PrintJobAttributes> {
        jobs::get_job_attributes(
            &self.opts,
            job_id,
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    /// Jobs on a printer (Get-Jobs). With `my_jobs` the server filters on
    /// this client's user name.
    pub async fn get_jobs(
        &self,
        printer: &Printer,
        which: WhichJobs,
        my_jobs: bool,
    ) -> Result<Vec<PrintJobAttributes>> {
        jobs::get_jobs(
            &self.opts,
            &printer.uri,
            which,
            &self.user,
            my_jobs,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    pub async fn cancel_job(&self, printer: &Printer, job_id: i32) -> Result<()> {
        self.job_control(Operation::CancelJob, printer, job_id).await
    }

    pub async fn hold_job(&self, printer: &Printer, job_id: i32) -> Result<()> {
        self.job_control(Operation::HoldJob, printer, job_id).await
    }

    pub async fn release_job(&self, printer: &Printer, job_id: i32) -> Result<()> {
        self.job_control(Operation::ReleaseJob, printer, job_id).await
    }

    async fn job_control(
        &self,
        operation: Operation,
        printer: &Printer,
        job_id: i32,
    ) -> Result<()> {
        jobs::job_control(
            operation,
            &self.opts,
            &printer.uri,
            job_id,
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }

    /// Move a job to another printer (CUPS-Move-Job).
    pub async fn move_job(&self, job_id: i32, target: &Printer) -> Result<()> {
        jobs::move_job(
            &self.opts,
            job_id,
            &target.uri,
            &self.user,
            self.creds.as_ref(),
            self.next_id(),
        )
        .await
    }
}

impl Default for CupsClient {
    fn default() -> Self {
        Self::new()
    }
}
