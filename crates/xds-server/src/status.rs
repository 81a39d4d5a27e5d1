//! Control-plane status reporting.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use xds_cache::{ControlPlaneStatus, StatusSource};
use xds_core::XdsError;

/// Body of the status route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Error from the last refresh attempt, empty when it succeeded.
    pub last_error: String,
    /// When the last refresh attempt finished.
    pub last_update: DateTime<Utc>,
}

impl StatusReport {
    /// The refresh failure this report carries, if any.
    pub fn error(&self) -> Option<XdsError> {
        (!self.last_error.is_empty()).then(|| XdsError::RefreshError {
            message: self.last_error.clone(),
        })
    }

    /// HTTP status code for this report.
    pub fn status_code(&self) -> StatusCode {
        self.error().map_or(StatusCode::OK, |err| err.status_code())
    }
}

impl From<&ControlPlaneStatus> for StatusReport {
    fn from(status: &ControlPlaneStatus) -> Self {
        Self {
            last_error: status.last_error.clone().unwrap_or_default(),
            last_update: status.last_update,
        }
    }
}

/// Reads the refresh status for the status route.
#[derive(Clone)]
pub struct StatusReporter {
    source: Arc<dyn StatusSource>,
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter").finish_non_exhaustive()
    }
}

impl StatusReporter {
    /// Create a reporter over a status source.
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self { source }
    }

    /// Current status, from a single read of the source.
    pub fn report(&self) -> StatusReport {
        StatusReport::from(self.source.current_status().as_ref())
    }
}
