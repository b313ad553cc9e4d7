//! Validation of contact and newsletter submissions.
//!
//! Request bodies arrive as loose JSON. A field counts as present only when
//! it is a string with non-whitespace content. Accepted values are
//! sanitized before they are logged or forwarded.

use bkhrease_cms::{ContactForm, NewsletterList};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::error::{BodyError, ValidationError};

/// Fields a contact submission must carry, in reporting order
pub const CONTACT_REQUIRED_FIELDS: [&str; 5] = ["name", "email", "subject", "serviceType", "message"];

/// Shortest accepted contact message, in characters
pub const MIN_MESSAGE_LENGTH: usize = 10;

/// Newsletter source recorded when the client sends none
pub const DEFAULT_NEWSLETTER_SOURCE: &str = "website";

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Strip angle brackets and surrounding whitespace.
pub fn sanitize_input(input: &str) -> String {
    input.replace(['<', '>'], "").trim().to_string()
}

/// Names of `fields` that are absent, not strings, or blank.
pub fn missing_fields(data: &Map<String, Value>, fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .filter(|field| text_field(data, field).is_none())
        .map(|field| (*field).to_string())
        .collect()
}

/// Parse a request body into a JSON object.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, BodyError> {
    match serde_json::from_slice(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(BodyError::NotAnObject),
    }
}

/// Validate a contact submission and return its sanitized form.
///
/// Checks run in order: required fields, email format, message length.
pub fn validate_contact(data: &Map<String, Value>) -> Result<ContactForm, ValidationError> {
    let missing = missing_fields(data, &CONTACT_REQUIRED_FIELDS);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let email = text_field(data, "email").unwrap_or_default();
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }

    let message = text_field(data, "message").unwrap_or_default();
    if message.chars().count() < MIN_MESSAGE_LENGTH {
        return Err(ValidationError::MessageTooShort {
            min: MIN_MESSAGE_LENGTH,
        });
    }

    let clean = |field: &str| text_field(data, field).map(sanitize_input);
    Ok(ContactForm {
        name: clean("name").unwrap_or_default(),
        email: email.trim().to_string(),
        phone: clean("phone").filter(|p| !p.is_empty()),
        subject: clean("subject"),
        service_type: clean("serviceType"),
        message: clean("message").unwrap_or_default(),
    })
}

/// Accepted newsletter signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterSignup {
    pub email: String,
    pub source: String,
    pub list: NewsletterList,
}

/// Validate a newsletter signup. Only the presence of `@` is checked.
pub fn validate_newsletter(data: &Map<String, Value>) -> Result<NewsletterSignup, ValidationError> {
    let email = text_field(data, "email")
        .filter(|email| email.contains('@'))
        .ok_or(ValidationError::InvalidEmail)?;

    let source = text_field(data, "source")
        .map_or_else(|| DEFAULT_NEWSLETTER_SOURCE.to_string(), sanitize_input);
    let list = data
        .get("type")
        .and_then(|kind| serde_json::from_value(kind.clone()).ok())
        .unwrap_or_default();

    Ok(NewsletterSignup {
        email: email.trim().to_string(),
        source,
        list,
    })
}

fn text_field<'a>(data: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}
