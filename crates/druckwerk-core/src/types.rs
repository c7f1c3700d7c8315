// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckwerk CUPS client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Credentials for HTTP authentication challenges (Basic or Digest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Some(password.into()),
        }
    }
}

/// Printer states per RFC 8011 §5.4.11 (`printer-state` enum values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterState {
    Idle,
    Processing,
    Stopped,
}

impl PrinterState {
    /// Decode the wire enum value; anything outside 3..=5 is `None`.
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            3 => Some(Self::Idle),
            4 => Some(Self::Processing),
            5 => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> i32 {
        match self {
            Self::Idle => 3,
            Self::Processing => 4,
            Self::Stopped => 5,
        }
    }
}

/// Job states per RFC 8011 §5.3.7 (`job-state` enum values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    PendingHeld,
    Processing,
    ProcessingStopped,
    Canceled,
    Aborted,
    Completed,
}

impl JobState {
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            3 => Some(Self::Pending),
            4 => Some(Self::PendingHeld),
            5 => Some(Self::Processing),
            6 => Some(Self::ProcessingStopped),
            7 => Some(Self::Canceled),
            8 => Some(Self::Aborted),
            9 => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> i32 {
        match self {
            Self::Pending => 3,
            Self::PendingHeld => 4,
            Self::Processing => 5,
            Self::ProcessingStopped => 6,
            Self::Canceled => 7,
            Self::Aborted => 8,
            Self::Completed => 9,
        }
    }

    /// Whether the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Aborted | Self::Completed)
    }
}

/// Job selection for Get-Jobs (`which-jobs` keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhichJobs {
    Completed,
    NotCompleted,
    All,
}

impl WhichJobs {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NotCompleted => "not-completed",
            Self::All => "all",
        }
    }
}

/// One caller-supplied job attribute as a raw `name:syntax:value` triple.
///
/// The syntax token selects the IPP value syntax at serialization time;
/// unrecognized tokens are sent as keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAttribute {
    pub name: String,
    pub syntax: String,
    pub value: String,
}

/// Parameters for a Print-Job submission.
///
/// The document itself is not part of this struct; it is a read-once byte
/// stream owned by the caller and passed to the client alongside the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    /// Number of copies; 0 and 1 are both treated as one copy.
    pub copies: u32,
    /// Page selection like `"1-3,5,8,10-13"`.
    pub page_ranges: Option<String>,
    /// `requesting-user-name` override; falls back to the client default.
    pub user_name: Option<String>,
    /// Human-readable name shown in the printer queue.
    pub job_name: Option<String>,
    pub duplex: bool,
    /// Portrait when true, landscape otherwise.
    pub portrait: bool,
    pub color: bool,
    /// IPP `media` keyword, e.g. `iso_a4_210x297mm`.
    pub page_format: Option<String>,
    /// Print resolution like `"600dpi"` or `"600x600dpi"`.
    pub resolution: Option<String>,
    /// Extra operation attributes sent verbatim (e.g. `compression`,
    /// `document-format`). A `job-attributes` entry is split on `#` and
    /// parsed into [`JobAttribute`] triples instead of being sent directly.
    pub operation_attributes: HashMap<String, String>,
    /// Typed job attributes appended to the job-attributes group.
    pub job_attributes: Vec<JobAttribute>,
}

impl Default for PrintJob {
    fn default() -> Self {
        Self {
            copies: 1,
            page_ranges: None,
            user_name: None,
            job_name: None,
            duplex: false,
            portrait: true,
            color: false,
            page_format: None,
            resolution: None,
            operation_attributes: HashMap::new(),
            job_attributes: Vec::new(),
        }
    }
}
