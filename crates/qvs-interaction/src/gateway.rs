//! Authenticated request gateway.
//!
//! Every domain request goes through [`Gateway::request`]. The gateway refuses
//! to send anything without the credentials the endpoint family needs, checks
//! the HTTP status before looking at the body and, for the QVS JSON API,
//! unwraps the `{status, data, detail}` envelope.

use qvs_core::session::EndpointFamily;
use qvs_core::{QvsError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session_manager::SessionManager;

const CSRF_HEADER: &str = "X-CSRFToken";
const JSON_MIME: &str = "application/json";

/// Request payload.
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(reqwest::multipart::Form),
}

/// A response that passed the HTTP status check. The body has been read once.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// QVS response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub detail: Value,
}

impl Envelope {
    pub const OK: i64 = 0;
    /// Accepted for asynchronous processing.
    pub const DEFERRED: i64 = 8;

    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn is_success(&self) -> bool {
        self.status == Self::OK || self.status == Self::DEFERRED
    }

    /// Backend detail as text; strings are returned without JSON quoting.
    pub fn detail_text(&self) -> String {
        match &self.detail {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn into_data(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(QvsError::ApplicationError {
                code: self.status,
                detail: self.detail_text(),
            })
        }
    }
}

enum Attachment<'s> {
    Csrf(&'s str),
    Sid(&'s str),
}

/// Borrowing view over an active [`SessionManager`].
#[derive(Clone, Copy)]
pub struct Gateway<'a> {
    session: &'a SessionManager,
}

impl<'a> Gateway<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &'a SessionManager {
        self.session
    }

    /// Sends one request and checks the HTTP status.
    ///
    /// Legacy families get the QTS `sid` as first query parameter; the QVS
    /// family gets the JSON and CSRF headers. The session cookies come from
    /// the manager's jar in both cases.
    pub async fn request(
        &self,
        family: EndpointFamily,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<RawResponse> {
        let attachment = self.attachment(family)?;
        let url = self.session.endpoint(path);

        let mut builder = self.session.http().request(method.clone(), &url);
        match attachment {
            Attachment::Csrf(token) => {
                builder = builder
                    .header(CONTENT_TYPE, JSON_MIME)
                    .header(ACCEPT, JSON_MIME)
                    .header(REFERER, self.session.base_url())
                    .header(CSRF_HEADER, token);
                if !query.is_empty() {
                    builder = builder.query(query);
                }
            }
            Attachment::Sid(sid) => {
                let mut params = Vec::with_capacity(query.len() + 1);
                params.push(("sid", sid));
                params.extend_from_slice(query);
                builder = builder.query(&params);
            }
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!("{} {}", method, url);
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("{} {} -> {}", method, path, status);

        if status != StatusCode::OK {
            return Err(QvsError::RequestFailed {
                status_code: status.as_u16(),
            });
        }

        let body = response.bytes().await?.to_vec();
        tracing::trace!("response body: {}", String::from_utf8_lossy(&body));

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// QVS request returning the envelope's `data` untouched.
    pub async fn qvs_value(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let body = body.map_or(RequestBody::Empty, RequestBody::Json);
        let raw = self
            .request(EndpointFamily::Qvs, method, path, &[], body)
            .await?;
        Envelope::from_slice(&raw.body)?.into_data()
    }

    /// QVS request with `data` decoded into `T`.
    pub async fn qvs<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let data = self.qvs_value(method, path, body).await?;
        Ok(serde_json::from_value(data)?)
    }

    fn attachment(&self, family: EndpointFamily) -> Result<Attachment<'a>> {
        let session = self.session;
        if family.is_modern() {
            session
                .active_modern()
                .map(|modern| Attachment::Csrf(modern.csrf_token.as_str()))
                .ok_or(QvsError::NotLoggedIn)
        } else {
            session.legacy_sid().map(Attachment::Sid).ok_or(QvsError::NotLoggedIn)
        }
    }
}
