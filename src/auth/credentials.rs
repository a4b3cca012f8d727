use std::fmt;

use serde::{Deserialize, Serialize};

/// Access/refresh token pair.
///
/// Serialised with the persisted key names `accessToken` / `refreshToken`.
/// `Debug` output redacts both tokens.
///
/// # Example
/// ```
/// use soko::auth::Credentials;
///
/// let creds = Credentials::new("access", Some("refresh".to_string()));
/// assert!(creds.has_refresh_token());
/// assert!(format!("{creds:?}").contains("(6 chars)"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(redact),
            )
            .finish()
    }
}

fn redact(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{visible}… ({} chars)", token.chars().count())
}
