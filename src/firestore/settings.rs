//! Firestore Settings and Credential types
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest#service-endpoint`

use std::time::Duration;

/// Default REST host
pub const DEFAULT_HOST: &str = "firestore.googleapis.com";

/// Default database id
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Project and optional access token used for every request
///
/// A token is sent as `authorization: Bearer <token>`; without one the
/// header is omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Google Cloud project id
    pub project_id: String,
    /// OAuth2 access token or Firebase ID token
    pub token: Option<String>,
}

impl Credential {
    /// Credential without a token (emulators, public rules)
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            token: None,
        }
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Settings for configuring the REST client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Host of the Firestore backend to connect to
    ///
    /// Default: "firestore.googleapis.com"
    pub host: String,

    /// Whether to use SSL for communication
    ///
    /// Default: true
    pub ssl_enabled: bool,

    /// Database within the project
    ///
    /// Default: "(default)"
    pub database_id: String,

    /// Per-request timeout of the default transport
    ///
    /// Default: 30 seconds
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ssl_enabled: true,
            database_id: DEFAULT_DATABASE_ID.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for a local emulator (`localhost:8080`, no TLS)
    pub fn emulator(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ssl_enabled: false,
            ..Self::default()
        }
    }

    /// Resource name of the documents root: `projects/{p}/databases/{d}/documents`
    pub fn documents_name(&self, project_id: &str) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            project_id, self.database_id
        )
    }

    /// URL of the documents root
    ///
    /// `{scheme}://{host}/v1/projects/{p}/databases/{d}/documents`
    pub fn root_url(&self, project_id: &str) -> String {
        let scheme = if self.ssl_enabled { "https" } else { "http" };
        format!(
            "{}://{}/v1/{}",
            scheme,
            self.host,
            self.documents_name(project_id)
        )
    }
}
