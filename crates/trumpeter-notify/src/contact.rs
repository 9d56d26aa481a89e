//! Contact Form Handling
//!
//! Validates contact submissions before they reach a [`Mailer`]. The endpoint
//! itself performs no real delivery in the current scope; validation and the
//! log preview live here so the server handler stays thin.
//!
//! [`Mailer`]: crate::mailer::Mailer

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};

/// Where contact submissions are addressed when no inbox is configured.
pub const DEFAULT_CONTACT_EMAIL: &str = "alertbaytrumpeter@icloud.com";

/// A contact-form submission.
///
/// All fields default to empty so a partial payload validates (and fails)
/// instead of failing deserialization with an opaque error.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Validate required fields and the sender address shape.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty()
            || self.email.is_empty()
            || self.subject.is_empty()
            || self.message.is_empty()
        {
            return Err(NotifyError::InvalidContact("All fields are required".into()));
        }

        if !is_valid_email(&self.email) {
            return Err(NotifyError::InvalidContact("Invalid email format".into()));
        }

        Ok(())
    }

    /// First 100 characters of the message body, for logging.
    pub fn preview(&self) -> String {
        let mut preview: String = self.message.chars().take(100).collect();
        if self.message.chars().count() > 100 {
            preview.push_str("...");
        }
        preview
    }
}

/// Minimal address shape check: no whitespace, exactly one `@`, and a dot
/// with characters on both sides somewhere in the domain part.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rfind('.') {
        Some(i) => i > 0 && i + 1 < domain.len(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Pat Fan".into(),
            email: "pat@example.com".into(),
            subject: "Loved the set".into(),
            message: "Heard you by the ferry dock today.".into(),
        }
    }

    #[test]
    fn test_valid_message_passes() {
        assert!(message().validate().is_ok());
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut m = message();
        m.subject = String::new();

        let err = m.validate().unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.com"));

        assert!(!is_valid_email("no-at.example.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaced name@example.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@domain."));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut m = message();
        m.email = "not-an-address".into();

        let err = m.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[test]
    fn test_preview_truncates_long_messages() {
        let mut m = message();
        m.message = "x".repeat(150);

        let preview = m.preview();
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_preview_keeps_short_messages() {
        let m = message();
        assert_eq!(m.preview(), m.message);
    }

    #[test]
    fn test_partial_payload_deserializes_then_fails_validation() {
        let m: ContactMessage = serde_json::from_str(r#"{"name":"Pat"}"#).unwrap();
        assert!(m.validate().is_err());
    }
}
