use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::request::{RequestBody, RequestDescriptor};
use super::{bearer_headers, status_to_error, REQUEST_ID_HEADER};
use crate::error::SokoError;

/// Status and decoded body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// `Ok(body)` for 2xx, otherwise a `{status, data}` error.
    pub fn into_result(self) -> Result<Value, SokoError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(status_to_error(self.status, self.body))
        }
    }
}

/// Sends a single request; knows nothing about refresh or caching.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExecutor {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute `request`, attaching `bearer` when given.
    ///
    /// Transport failures are errors; any HTTP status (including 4xx/5xx) is
    /// returned as a [`RawResponse`]. Empty bodies decode to `null`; a
    /// non-JSON error body is kept as a string.
    pub async fn send(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<RawResponse, SokoError> {
        let request_id = Uuid::new_v4().to_string();
        let url = request.url(&self.base_url);
        debug!(
            request_id = %request_id,
            method = %request.method,
            url = %url,
            authenticated = bearer.is_some(),
            "Sending request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(bearer_headers(bearer))
            .header(REQUEST_ID_HEADER, &request_id);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => {
                builder.multipart(RequestDescriptor::build_form(parts)?)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(request_id = %request_id, status, "Received response");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(err) if (200..300).contains(&status) => return Err(err.into()),
                Err(_) => Value::String(text),
            }
        };
        Ok(RawResponse { status, body })
    }
}
