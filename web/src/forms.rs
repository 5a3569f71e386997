//! Submitted HTML forms and their field checks.
//!
//! Every field defaults to empty so a hand-crafted POST missing a field
//! still reaches validation instead of a 422 from the extractor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use simpledo_core::{
    validate_email, validate_new_password, LoginRequest, RegisterRequest, TodoStatus, UpdateTodo,
};

/// Per-field messages rendered next to the inputs. Empty means valid.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Record a message; the first one recorded for a field wins.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub remember: Option<String>,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FieldErrors> {
        if !validate_email(&self.email) {
            return Err(FieldErrors::single("email", "Email is invalid"));
        }
        if self.password.is_empty() {
            return Err(FieldErrors::single("password", "Password is required"));
        }
        Ok(LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }

    /// Checkbox semantics: only the literal `on` counts.
    pub fn remember(&self) -> bool {
        self.remember.as_deref() == Some("on")
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JoinForm {
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

impl JoinForm {
    pub fn validate(&self) -> Result<RegisterRequest, FieldErrors> {
        if self.fullname.trim().is_empty() {
            return Err(FieldErrors::single("fullname", "Full Name is required"));
        }
        if !validate_email(&self.email) {
            return Err(FieldErrors::single("email", "Email is invalid"));
        }
        if let Err(err) = validate_new_password(&self.password1, &self.password2) {
            let field = if err.is_confirmation() { "password2" } else { "password1" };
            return Err(FieldErrors::single(field, err.to_string()));
        }
        Ok(RegisterRequest {
            fullname: self.fullname.trim().to_string(),
            email: self.email.clone(),
            password1: self.password1.clone(),
            password2: self.password2.clone(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewTodoForm {
    pub title: String,
    pub body: String,
}

/// Fields accepted by `PATCH /todos/{id}` and the `POST` fallback.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TodoForm {
    #[serde(rename = "_method")]
    pub method: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// What a `POST /todos/{id}` form asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Patch,
    Delete,
}

impl TodoForm {
    pub fn method(&self) -> Option<FormMethod> {
        match self.method.as_deref().map(str::trim) {
            None | Some("") => Some(FormMethod::Patch),
            Some(m) if m.eq_ignore_ascii_case("patch") => Some(FormMethod::Patch),
            Some(m) if m.eq_ignore_ascii_case("delete") => Some(FormMethod::Delete),
            Some(_) => None,
        }
    }

    /// Build the partial update. Blank titles and unknown statuses are
    /// dropped rather than sent.
    pub fn update(&self) -> UpdateTodo {
        UpdateTodo {
            title: self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            body: self.body.clone(),
            status: self.status.as_deref().and_then(TodoStatus::parse),
        }
    }
}
