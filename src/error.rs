use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::CatalogKind;

#[derive(Debug, Error, Diagnostic)]
pub enum Dhis2Error {
    #[error("Unauthorized: check your DHIS2 username/password")]
    Unauthorized,

    #[error("Server error: DHIS2 returned status {status}, it might be down or overloaded")]
    ServerUnavailable { status: u16 },

    #[error("request to {url} timed out")]
    RequestTimedOut { url: String },

    #[error("Failed to connect to {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("DHIS2 returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("DHIS2 request failed: {0}")]
    Http(String),

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Failed to fetch {kind}: {cause}")]
    CatalogFetch {
        kind: CatalogKind,
        cause: Box<Dhis2Error>,
    },

    #[error("Failed to fetch dataset {dataset_id} for period {period}: {cause}")]
    DatasetFetch {
        dataset_id: String,
        period: String,
        cause: Box<Dhis2Error>,
    },

    #[error("Failed to fetch datasets: {cause}")]
    DatasetListFetch { cause: Box<Dhis2Error> },

    #[error("missing config file dhis2.json (current directory or user config directory)")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Dhis2Error {
    pub fn malformed(endpoint: &str, reason: impl Into<String>) -> Self {
        Dhis2Error::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Innermost error beneath any operation context.
    pub fn root_cause(&self) -> &Dhis2Error {
        match self {
            Dhis2Error::CatalogFetch { cause, .. }
            | Dhis2Error::DatasetFetch { cause, .. }
            | Dhis2Error::DatasetListFetch { cause } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self.root_cause(),
            Dhis2Error::Unauthorized
                | Dhis2Error::ServerUnavailable { .. }
                | Dhis2Error::RequestTimedOut { .. }
                | Dhis2Error::ConnectionFailed { .. }
                | Dhis2Error::HttpStatus { .. }
                | Dhis2Error::Http(_)
                | Dhis2Error::MalformedResponse { .. }
        )
    }
}
