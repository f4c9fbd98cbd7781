//! Client-side form validation.
//!
//! Every form is checked before a request is built. A non-empty [`FieldErrors`]
//! means nothing is sent.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{4,}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

pub const USERNAME_ERROR: &str = "Username must be at least 4 alphanumeric characters";
pub const PASSWORD_ERROR: &str =
    "Password must be 6-16 chars with uppercase, lowercase, number and special";
pub const PASSWORD_REQUIRED_ERROR: &str = "Password is required";
pub const EMAIL_ERROR: &str = "Invalid email format";

/// Per-field error messages, keyed by the field's wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when there are no errors, otherwise the errors themselves.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}

/// Whether the auth form is used to create an account or to sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Credentials entered on the auth page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthForm {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

impl AuthForm {
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password: password.into(),
        }
    }

    pub fn register(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: Some(email.into()),
            password: password.into(),
        }
    }

    pub fn validate(&self, mode: AuthMode) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if !is_valid_username(&self.username) {
            errors.add("username", USERNAME_ERROR);
        }

        match mode {
            AuthMode::Register => {
                if !is_valid_password(&self.password) {
                    errors.add("password", PASSWORD_ERROR);
                }
                if !self.email.as_deref().is_some_and(is_valid_email) {
                    errors.add("email", EMAIL_ERROR);
                }
            }
            AuthMode::Login => {
                if self.password.is_empty() {
                    errors.add("password", PASSWORD_REQUIRED_ERROR);
                }
            }
        }

        errors
    }
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 6 to 16 characters with at least one lowercase, uppercase, digit and
/// non-alphanumeric character.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    if !(6..=16).contains(&len) {
        return false;
    }

    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}
