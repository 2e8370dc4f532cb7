//! REST request construction and response handling
//!
//! [`RequestBuilder`] produces the [`HttpRequest`] for each operation;
//! [`send`] runs it and maps the backend's error payloads.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/projects.databases.documents`

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::debug;
use url::Url;

use super::field_value::Value;
use super::query::RunQueryRequest;
use super::transport::{HttpMethod, HttpRequest, HttpTransport};
use super::write::CommitRequest;
use crate::error::{FirebaseError, FirestoreError, CODE_NOT_FOUND};

/// Options for reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Only return these field paths (`mask.fieldPaths` / `select.fields`)
    pub picks: Option<Vec<String>>,
}

impl FindOptions {
    /// Return only the given field paths
    pub fn picks<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            picks: Some(fields.into_iter().map(Into::into).collect()),
        }
    }
}

/// Builds the HTTP requests of one client (or one transaction)
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    root_url: String,
    headers: Vec<(String, String)>,
    transaction: Option<String>,
}

impl RequestBuilder {
    /// Builder for the documents root `root_url`, authenticating with `token` when present
    pub fn new(root_url: impl Into<String>, token: Option<&str>) -> Self {
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {}", token)));
        }

        Self {
            root_url: root_url.into(),
            headers,
            transaction: None,
        }
    }

    /// Reads made by this builder run inside `transaction`
    ///
    /// The client never opens server-side transactions itself. Callers that
    /// obtain an id from `:beginTransaction` can pass it here and to
    /// [`WriteBuilder::with_transaction`](super::write::WriteBuilder::with_transaction)
    /// and send the requests through their own [`HttpTransport`](super::transport::HttpTransport).
    pub fn with_transaction(mut self, transaction: Option<String>) -> Self {
        self.transaction = transaction;
        self
    }

    /// `GET {document_url}[?transaction=..][&mask.fieldPaths=..]`
    pub fn for_find(&self, document_url: &str, options: &FindOptions) -> Result<HttpRequest, FirebaseError> {
        self.read(document_url, options)
    }

    /// `GET {collection_url}[?transaction=..][&mask.fieldPaths=..]`
    pub fn for_find_all(&self, collection_url: &str, options: &FindOptions) -> Result<HttpRequest, FirebaseError> {
        self.read(collection_url, options)
    }

    /// `POST {parent_url}:runQuery` with the compiled query
    pub fn for_query(&self, parent_url: &str, query: &RunQueryRequest) -> Result<HttpRequest, FirebaseError> {
        Ok(self.request(
            HttpMethod::Post,
            format!("{}:runQuery", parent_url),
            Some(serde_json::to_value(query)?),
        ))
    }

    /// `POST {collection_url}?documentId={id}` with `{fields}`
    pub fn for_create(
        &self,
        collection_url: &str,
        fields: &IndexMap<String, Value>,
        document_id: &str,
    ) -> Result<HttpRequest, FirebaseError> {
        let mut url = parse_url(collection_url)?;
        url.query_pairs_mut().append_pair("documentId", document_id);

        Ok(self.request(
            HttpMethod::Post,
            url.into(),
            Some(json!({ "fields": fields })),
        ))
    }

    /// `POST {root}:commit` with `{writes, transaction?}`
    pub fn for_commit(&self, commit: &CommitRequest) -> Result<HttpRequest, FirebaseError> {
        Ok(self.request(
            HttpMethod::Post,
            format!("{}:commit", self.root_url),
            Some(serde_json::to_value(commit)?),
        ))
    }

    fn read(&self, url: &str, options: &FindOptions) -> Result<HttpRequest, FirebaseError> {
        let picks = options.picks.as_deref().unwrap_or_default();

        // Only touch the query string when there is something to add
        if self.transaction.is_none() && picks.is_empty() {
            return Ok(self.request(HttpMethod::Get, url.to_string(), None));
        }

        let mut url = parse_url(url)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(transaction) = &self.transaction {
                query.append_pair("transaction", transaction);
            }
            for field in picks {
                query.append_pair("mask.fieldPaths", field);
            }
        }

        Ok(self.request(HttpMethod::Get, url.into(), None))
    }

    fn request(&self, method: HttpMethod, url: String, body: Option<JsonValue>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        }
    }
}

fn parse_url(url: &str) -> Result<Url, FirebaseError> {
    Url::parse(url).map_err(|e| {
        FirestoreError::InvalidArgument(format!("invalid request url {}: {}", url, e)).into()
    })
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Single(ErrorEnvelope),
    List(Vec<ErrorEnvelope>),
}

/// Map a non-2xx response to a remote error
///
/// Reads `{error: {code, message}}` or the first element of
/// `[{error: ...}]`; falls back to the HTTP status and raw body.
pub fn parse_error(status: u16, body: &str) -> FirestoreError {
    let detail = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload::Single(envelope)) => Some(envelope.error),
        Ok(ErrorPayload::List(envelopes)) => envelopes.into_iter().next().map(|e| e.error),
        Err(_) => None,
    };

    match detail {
        Some(detail) => FirestoreError::Remote {
            code: detail.code.unwrap_or(i64::from(status)),
            message: detail.message,
            status: detail.status,
        },
        None => FirestoreError::Remote {
            code: i64::from(status),
            message: body.to_string(),
            status: None,
        },
    }
}

/// Send `request` and parse the JSON response
///
/// With `disable_404`, a not-found error yields `Ok(None)`. An empty 2xx
/// body is JSON `null`.
pub async fn send(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    disable_404: bool,
) -> Result<Option<JsonValue>, FirebaseError> {
    debug!(method = %request.method, url = %request.url, "Sending Firestore request");

    let response = transport.send(request).await?;

    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Some(JsonValue::Null));
        }
        return Ok(Some(serde_json::from_str(&response.body)?));
    }

    let error = parse_error(response.status, &response.body);
    if disable_404 && error.code() == Some(CODE_NOT_FOUND) {
        debug!(status = response.status, "Treating not-found response as absent");
        return Ok(None);
    }

    Err(error.into())
}
