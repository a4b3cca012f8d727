use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EntityId;

/// Authenticated marketplace user as returned by `/users/auth/user/`.
///
/// Fields the client does not model are kept in `extra` so callers can
/// still read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "firstname")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastname")]
    pub last_name: Option<String>,
    #[serde(default, alias = "phonenumber")]
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /users/auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of `POST /users/auth/register/`. Field names match the backend form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub firstname: String,
    pub phonenumber: String,
    pub password1: String,
    pub password2: String,
}

/// Partial profile update sent with `PATCH /users/auth/profile/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Body of `POST /users/auth/password/change/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Response of `POST /users/auth/token/refresh/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}
