//! Argument validation for tool calls.
//!
//! Errors are collected and reported together so the agent can fix every
//! problem in one round trip. Validation runs before any remote call.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Validation error for a single argument.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str) -> Self {
        Self::new(field, format!("{} must not be empty", field))
    }

    pub fn invalid_url(field: &str, value: &str) -> Self {
        Self::new(field, format!("'{}' is not an http(s) URL", value))
            .with_suggestion("Pass a full URL such as https://example.com/article")
    }

    pub fn out_of_range(field: &str, min: u64, max: u64) -> Self {
        Self::new(field, format!("{} must be between {} and {}", field, min, max))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message suitable for a tool error result.
    pub fn to_mcp_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!(
            "Invalid arguments: {} problem(s) found",
            self.errors.len()
        )];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.join("\n")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_mcp_message())
        }
    }
}

/// Implemented by every typed tool argument struct.
pub trait Validator {
    fn validate(&self) -> Result<(), String>;
}

pub fn validate_required(value: &str, field: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field));
    }
}

pub fn validate_required_opt(value: Option<&str>, field: &str, errors: &mut ValidationErrors) {
    if let Some(value) = value {
        validate_required(value, field, errors);
    }
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid URL pattern"))
}

pub fn validate_url(value: &str, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field));
    } else if !url_pattern().is_match(trimmed) {
        errors.add(ValidationError::invalid_url(field, trimmed));
    }
}

pub fn validate_ids(values: &[String], field: &str, min: usize, errors: &mut ValidationErrors) {
    if values.len() < min {
        errors.add(ValidationError::new(
            field,
            format!("at least {} id(s) are required, got {}", min, values.len()),
        ));
    }
    if values.iter().any(|value| value.trim().is_empty()) {
        errors.add(ValidationError::new(field, "ids must not be empty"));
    }
}

pub fn validate_range(value: Option<u64>, field: &str, min: u64, max: u64, errors: &mut ValidationErrors) {
    if let Some(value) = value {
        if value < min || value > max {
            errors.add(ValidationError::out_of_range(field, min, max));
        }
    }
}
