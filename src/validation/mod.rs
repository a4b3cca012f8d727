//! Pre-submission validation of user-entered forms.
//!
//! Each form keeps the first failing rule per field, so callers can render one
//! message next to each input. [`ValidationErrors::from_api`] maps a
//! structured 400 response back onto the same shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SokoError;
use crate::types::{ChangePasswordRequest, LoginRequest, ProductDraft, RegisterRequest};

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed.
    pub fn into_result(self) -> Result<(), SokoError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SokoError::Validation(self))
        }
    }

    /// Map a structured error body such as `{"email": ["Already taken."]}`
    /// to per-field messages. List values are joined with spaces; non-object
    /// bodies produce no field errors.
    pub fn from_api(data: &Value) -> Self {
        let mut errors = Self::new();
        let Some(map) = data.as_object() else {
            return errors;
        };
        for (field, value) in map {
            let message = match value {
                Value::String(text) => text.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            errors.add(field.clone(), message);
        }
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

/// A form that can be checked before it is sent.
pub trait Validate {
    fn validate(&self) -> Result<(), SokoError>;
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), SokoError> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "email", &self.email, "Email is required");
        require(&mut errors, "password", &self.password, "Password is required");
        errors.into_result()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), SokoError> {
        let mut errors = ValidationErrors::new();

        if require(&mut errors, "email", &self.email, "Email is required")
            && !email_regex().is_match(self.email.trim())
        {
            errors.add("email", "Enter a valid email");
        }

        if require(&mut errors, "username", &self.username, "Username is required")
            && self.username.trim().chars().count() < 3
        {
            errors.add("username", "Username must be at least 3 characters");
        }

        require(&mut errors, "firstname", &self.firstname, "First name is required");

        if require(
            &mut errors,
            "phonenumber",
            &self.phonenumber,
            "Phone number is required",
        ) {
            if !self.phonenumber.chars().all(|c| c.is_ascii_digit()) {
                errors.add("phonenumber", "Must be only digits");
            } else if self.phonenumber.len() < 10 {
                errors.add("phonenumber", "Must be at least 10 digits");
            }
        }

        if require(&mut errors, "password1", &self.password1, "Password is required") {
            if let Some(message) = password_problem(&self.password1) {
                errors.add("password1", message);
            }
        }

        if require(
            &mut errors,
            "password2",
            &self.password2,
            "Confirm password is required",
        ) && self.password2 != self.password1
        {
            errors.add("password2", "Passwords must match");
        }

        errors.into_result()
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), SokoError> {
        let mut errors = ValidationErrors::new();
        require(
            &mut errors,
            "old_password",
            &self.old_password,
            "Current password is required",
        );
        if require(
            &mut errors,
            "new_password1",
            &self.new_password1,
            "Password is required",
        ) {
            if let Some(message) = password_problem(&self.new_password1) {
                errors.add("new_password1", message);
            }
        }
        if self.new_password2 != self.new_password1 {
            errors.add("new_password2", "Passwords must match");
        }
        errors.into_result()
    }
}

impl Validate for ProductDraft {
    fn validate(&self) -> Result<(), SokoError> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "name", &self.name, "Product name is required");
        require(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );
        require(&mut errors, "brand", &self.brand, "Brand is required");
        require(&mut errors, "category", &self.category, "Category is required");

        if self.product_lines.is_empty() {
            errors.add("product_lines", "At least one product line is required");
        }
        for (index, line) in self.product_lines.iter().enumerate() {
            let prefix = format!("product_lines[{index}]");
            if line.price.trim().is_empty() {
                errors.add(format!("{prefix}[price]"), "Price is required");
            } else if line.price.trim().parse::<f64>().is_err() {
                errors.add(format!("{prefix}[price]"), "Price must be a number");
            }
            require(
                &mut errors,
                &format!("{prefix}[sku]"),
                &line.sku,
                "SKU is required",
            );
        }

        errors.into_result()
    }
}

/// Records `message` when `value` is blank. Returns whether the value was present.
fn require(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, message);
        false
    } else {
        true
    }
}

fn password_problem(password: &str) -> Option<&'static str> {
    if password.chars().count() < 8 {
        return Some("Password must be at least 8 characters");
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if has_lower && has_upper && has_digit && has_special {
        None
    } else {
        Some("Must contain uppercase, lowercase, number and special character")
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email validation regex must compile")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductLineDraft;
    use serde_json::json;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            username: "amina".to_string(),
            email: "amina@example.co.tz".to_string(),
            firstname: "Amina".to_string(),
            phonenumber: "0712345678".to_string(),
            password1: "Sokoni#2024".to_string(),
            password2: "Sokoni#2024".to_string(),
        }
    }

    fn errors_of(result: Result<(), SokoError>) -> ValidationErrors {
        match result {
            Err(SokoError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_passes() {
        registration().validate().unwrap();
    }

    #[test]
    fn registration_reports_first_failure_per_field() {
        let form = RegisterRequest {
            email: "not-an-email".to_string(),
            username: "ab".to_string(),
            phonenumber: "07123".to_string(),
            password1: "weakpassword".to_string(),
            password2: "different".to_string(),
            ..registration()
        };
        let errors = errors_of(form.validate());

        assert_eq!(errors.get("email"), Some("Enter a valid email"));
        assert_eq!(
            errors.get("username"),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(errors.get("phonenumber"), Some("Must be at least 10 digits"));
        assert_eq!(
            errors.get("password1"),
            Some("Must contain uppercase, lowercase, number and special character")
        );
        assert_eq!(errors.get("password2"), Some("Passwords must match"));
        assert_eq!(errors.get("firstname"), None);
    }

    #[test]
    fn phone_number_must_be_digits() {
        let form = RegisterRequest {
            phonenumber: "+255712345678".to_string(),
            ..registration()
        };
        let errors = errors_of(form.validate());
        assert_eq!(errors.get("phonenumber"), Some("Must be only digits"));
    }

    #[test]
    fn product_draft_requires_fields_and_lines() {
        let errors = errors_of(ProductDraft::default().validate());
        assert_eq!(errors.get("name"), Some("Product name is required"));
        assert_eq!(
            errors.get("product_lines"),
            Some("At least one product line is required")
        );

        let draft = ProductDraft {
            name: "Kitenge".to_string(),
            description: "Cotton".to_string(),
            brand: "1".to_string(),
            category: "2".to_string(),
            product_lines: vec![ProductLineDraft {
                price: "abc".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let errors = errors_of(draft.validate());
        assert_eq!(
            errors.get("product_lines[0][price]"),
            Some("Price must be a number")
        );
        assert_eq!(errors.get("product_lines[0][sku]"), Some("SKU is required"));
    }

    #[test]
    fn api_errors_join_list_messages() {
        let errors = ValidationErrors::from_api(&json!({
            "email": ["A user with that email already exists.", "Try another."],
            "username": "Taken."
        }));
        assert_eq!(
            errors.get("email"),
            Some("A user with that email already exists. Try another.")
        );
        assert_eq!(errors.get("username"), Some("Taken."));
        assert!(ValidationErrors::from_api(&json!("boom")).is_empty());
    }
}
