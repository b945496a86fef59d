//! Canonical identity claims.
//!
//! Every provider adapter maps its own profile representation into [`Claims`].
//! Optional values are plain strings where the empty string means "absent";
//! adapters never substitute defaults for values the upstream did not send.

use serde::{Deserialize, Serialize};

/// The provider-agnostic identity record produced by every adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Stable, provider-scoped user identifier.
    #[serde(rename = "sub")]
    pub subject: String,

    /// Issuer URL of the provider that authenticated the user.
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Email address, empty when the provider did not return one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    /// Whether the provider asserts the email address is verified.
    #[serde(default)]
    pub email_verified: bool,

    /// Given (first) name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub given_name: String,

    /// Family (last) name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,

    /// URL of the user's profile picture.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picture: String,

    /// Preferred locale, e.g. `en-US`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
}

/// Reasons a mapped [`Claims`] value cannot identify a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsValidationError {
    /// The upstream returned no subject identifier.
    #[error("subject is empty")]
    MissingSubject,

    /// No issuer was assigned.
    #[error("issuer is empty")]
    MissingIssuer,
}

impl Claims {
    /// Creates claims for a subject at an issuer with all optional fields absent.
    #[must_use]
    pub fn new(subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// Sets the email address and its verification state.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = email.into();
        self.email_verified = verified;
        self
    }

    /// Sets the given and last names.
    #[must_use]
    pub fn with_name(mut self, given_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.given_name = given_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Sets the picture URL.
    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = picture.into();
        self
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Checks that the claims identify a principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the subject or the issuer is empty.
    pub fn validate(&self) -> Result<(), ClaimsValidationError> {
        if self.subject.trim().is_empty() {
            return Err(ClaimsValidationError::MissingSubject);
        }
        if self.issuer.trim().is_empty() {
            return Err(ClaimsValidationError::MissingIssuer);
        }
        Ok(())
    }

    /// Returns `true` if an email is present and the provider verified it.
    #[must_use]
    pub fn has_verified_email(&self) -> bool {
        !self.email.is_empty() && self.email_verified
    }

    /// Returns the locale, or `None` when the provider did not send one.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        non_empty(&self.locale)
    }

    /// Returns a display name (full name, email, or subject).
    #[must_use]
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.given_name, self.last_name);
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            return full_name.to_string();
        }
        non_empty(&self.email)
            .unwrap_or(&self.subject)
            .to_string()
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_builder() {
        let claims = Claims::new("abc123", "https://login.linkedin.com/")
            .with_email("a@example.com", true)
            .with_name("Ann", "Lee")
            .with_picture("http://img")
            .with_locale("en-US");

        assert_eq!(claims.subject, "abc123");
        assert_eq!(claims.issuer, "https://login.linkedin.com/");
        assert!(claims.has_verified_email());
        assert_eq!(claims.locale(), Some("en-US"));
        assert_eq!(claims.display_name(), "Ann Lee");
        assert!(claims.validate().is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        assert_eq!(
            Claims::new("", "https://issuer").validate(),
            Err(ClaimsValidationError::MissingSubject)
        );
        assert_eq!(
            Claims::new("abc", "").validate(),
            Err(ClaimsValidationError::MissingIssuer)
        );
    }

    #[test]
    fn test_absent_values_stay_empty() {
        let claims = Claims::new("abc", "https://issuer");
        assert_eq!(claims.locale(), None);
        assert_eq!(claims.email, "");
        assert!(!claims.has_verified_email());
        assert_eq!(claims.display_name(), "abc");

        let claims = claims.with_email("a@example.com", false);
        assert!(!claims.has_verified_email());
        assert_eq!(claims.display_name(), "a@example.com");
    }

    #[test]
    fn test_claims_serialization() {
        let claims = Claims::new("abc", "https://issuer").with_email("a@example.com", true);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], "abc");
        assert_eq!(json["iss"], "https://issuer");
        assert_eq!(json["email_verified"], true);
        assert!(json.get("locale").is_none());

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }
}
