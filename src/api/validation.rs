//! Request body schemas for the write endpoints.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::core::models::NewContact;
use crate::errors::{FieldErrors, PortfolioError};

pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 100;
pub const PROJECT_NAME_MAX: usize = 100;
pub const USER_IP_MAX: usize = 45;

const MISSING: &str = "Missing data for required field.";
const NULL: &str = "Field may not be null.";
const NOT_STRING: &str = "Not a valid string.";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("static regex compile")
});

/// Body of `POST /api/projects/{id}/view` after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub project_name: String,
    pub user_ip: Option<String>,
}

struct Validator<'a> {
    body: &'a serde_json::Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    fn new(body: &'a Value) -> Result<Self, PortfolioError> {
        let body = body
            .as_object()
            .ok_or_else(|| PortfolioError::invalid_field("_schema", "Invalid input type."))?;
        Ok(Self {
            body,
            errors: FieldErrors::new(),
        })
    }

    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// A string field. Required fields must be present and non-null;
    /// optional fields may be absent or null.
    fn string(&mut self, field: &str, required: bool) -> Option<String> {
        match self.body.get(field) {
            None if required => {
                self.fail(field, MISSING);
                None
            }
            Some(Value::Null) if required => {
                self.fail(field, NULL);
                None
            }
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(field, NOT_STRING);
                None
            }
        }
    }

    fn length(&mut self, field: &str, value: &str, min: Option<usize>, max: Option<usize>) -> bool {
        let len = value.chars().count();
        let message = match (min, max) {
            (Some(lo), Some(hi)) if len < lo || len > hi => {
                format!("Length must be between {lo} and {hi}.")
            }
            (Some(lo), None) if len < lo => format!("Shorter than minimum length {lo}."),
            (None, Some(hi)) if len > hi => format!("Longer than maximum length {hi}."),
            _ => return true,
        };
        self.fail(field, message);
        false
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, PortfolioError> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(PortfolioError::Validation(self.errors)),
        }
    }
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validates a contact-form body: `name` (1..=100 chars), `email` (valid
/// address, at most 100 chars), `message` (non-empty).
///
/// # Errors
///
/// Returns a `Validation` error listing every failing field.
pub fn validate_contact(body: &Value) -> Result<NewContact, PortfolioError> {
    let mut v = Validator::new(body)?;

    let name = v
        .string("name", true)
        .filter(|name| v.length("name", name, Some(1), Some(NAME_MAX)));

    let email = v.string("email", true).filter(|email| {
        let mut ok = true;
        if !is_valid_email(email) {
            v.fail("email", "Not a valid email address.");
            ok = false;
        }
        ok && v.length("email", email, None, Some(EMAIL_MAX))
    });

    let message = v
        .string("message", true)
        .filter(|message| v.length("message", message, Some(1), None));

    let contact = match (name, email, message) {
        (Some(name), Some(email), Some(message)) => Some(NewContact {
            name,
            email,
            message,
        }),
        _ => None,
    };
    v.finish(contact)
}

/// Validates a view-tracking body: `project_name` (1..=100 chars) and an
/// optional `user_ip` (at most 45 chars).
///
/// # Errors
///
/// Returns a `Validation` error listing every failing field.
pub fn validate_view(body: &Value) -> Result<ViewRequest, PortfolioError> {
    let mut v = Validator::new(body)?;

    let project_name = v
        .string("project_name", true)
        .filter(|name| v.length("project_name", name, Some(1), Some(PROJECT_NAME_MAX)));

    let had_ip = !matches!(v.body.get("user_ip"), None | Some(Value::Null));
    let user_ip = v
        .string("user_ip", false)
        .filter(|ip| v.length("user_ip", ip, None, Some(USER_IP_MAX)));
    let ip_ok = !had_ip || user_ip.is_some();

    let request = project_name
        .filter(|_| ip_ok)
        .map(|project_name| ViewRequest {
            project_name,
            user_ip,
        });
    v.finish(request)
}
