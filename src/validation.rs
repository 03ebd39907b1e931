//! Request field validation.
//!
//! Every flow collects problems into one `ValidationErrors` list so the client
//! sees all failing fields at once, in the order they were checked.

use serde::Serialize;

/// Minimum password length accepted anywhere a password is set or checked.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// Record an error if `value` is missing or blank. Returns the trimmed
    /// value when present.
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a str>, message: &str) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, message);
                None
            }
        }
    }

    /// Require a well-formed email address.
    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = self.require(field, value, "Email is required") {
            if !is_valid_email(v) {
                self.add(field, "Email is invalid");
            }
        }
    }

    /// Require a password of at least `MIN_PASSWORD_LEN` characters.
    pub fn password(&mut self, field: &str, value: Option<&str>) {
        match value {
            None | Some("") => self.add(field, "Password is required"),
            Some(v) if v.chars().count() < MIN_PASSWORD_LEN => self.add(
                field,
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ),
            Some(_) => {}
        }
    }

    /// `Ok(())` if nothing was recorded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Syntactic email check: one `@`, a non-empty local part, and a dotted
/// domain without empty labels. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
