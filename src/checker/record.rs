// src/checker/record.rs
// =============================================================================
// This module turns probe outcomes into the records a caller sees.
//
// The outcome of a URL is shared by every file linking to it; a record is
// one (severity, message, file) triple per reference. Severity is derived
// from the outcome and the run's flags, never stored in the cache.
// =============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use super::http::ProbeOutcome;

/// One problem found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    /// Severe records make the run fail, the rest are warnings
    pub severe: bool,
    pub message: String,
    pub file: PathBuf,
}

impl ValidationRecord {
    pub fn error(message: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            severe: true,
            message: message.into(),
            file: file.into(),
        }
    }

    pub fn warning(message: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            severe: false,
            message: message.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for ValidationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.severe { "Error" } else { "Warning" };
        write!(
            f,
            "{}: File '{}' had issues: {}",
            kind,
            self.file.display(),
            self.message
        )
    }
}

// Builds the record for one reference to `url` from `file`
//
// Ok outcomes produce nothing. A 5xx is only severe with `fail_on_5xx`.
pub fn record_for(
    url: &Url,
    outcome: &ProbeOutcome,
    file: &Path,
    fail_on_5xx: bool,
) -> Option<ValidationRecord> {
    match outcome {
        ProbeOutcome::Ok => None,
        ProbeOutcome::PermanentRedirect { target } => Some(ValidationRecord::warning(
            format!(
                "Link '{}' was redirected permanently to '{}'. Consider updating this link",
                url, target
            ),
            file,
        )),
        ProbeOutcome::StatusError { code } => {
            let message = format!("Link '{}' returned code {}", url, code);
            let server_error = (500..600).contains(code);
            if server_error && !fail_on_5xx {
                Some(ValidationRecord::warning(message, file))
            } else {
                Some(ValidationRecord::error(message, file))
            }
        }
        ProbeOutcome::TransportError { message } => Some(ValidationRecord::error(
            format!("Error while trying to access '{}': {}", url, message),
            file,
        )),
    }
}
