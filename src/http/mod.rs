//! HTTP plumbing: client construction, request descriptors, raw execution,
//! and the 401 refresh-and-replay wrapper.

pub mod executor;
pub mod refresh;
pub mod request;

pub use executor::{HttpExecutor, RawResponse};
pub use refresh::RefreshCoordinator;
pub use request::{FormPart, FormValue, RequestBody, RequestDescriptor};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;

use crate::error::SokoError;

/// Correlates a request with its log lines on both ends.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the reqwest client used for every API call.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SokoError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Default headers, with a bearer token when one is available.
pub fn bearer_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-2xx response to a `{status, data}` error.
pub fn status_to_error(status: u16, data: Value) -> SokoError {
    SokoError::api(status, data)
}

/// Strip the backend's optional `{"data": ...}` envelope.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
