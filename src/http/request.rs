use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::SokoError;

/// A request that can be sent more than once (original attempt and replay).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Attach the bearer token and take part in refresh-and-replay.
    /// Cleared for login, registration, and the refresh call itself.
    pub authenticated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.to_string()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Send without credentials and never enter the refresh flow.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, SokoError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    /// Append the fields of `params` as query pairs. `null` fields are skipped.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, SokoError> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(text) => self.query.push((key, text)),
                        other => self.query.push((key, other.to_string())),
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(SokoError::InvalidState(format!(
                "query parameters must serialize to an object, got {other}"
            ))),
        }
    }

    /// Resolve the path against `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    /// Materialise a fresh multipart form (forms are single-use in reqwest).
    pub(crate) fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, SokoError> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            form = match &part.value {
                FormValue::Text(text) => form.text(part.name.clone(), text.clone()),
                FormValue::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let file = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime)?;
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}
