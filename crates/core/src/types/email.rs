//! Email addresses.

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email must be at most {max} characters")]
    TooLong { max: usize },

    #[error("email cannot contain whitespace")]
    Whitespace,

    #[error("email must contain exactly one @ symbol")]
    AtSymbol,

    #[error("email local part cannot be empty")]
    EmptyLocalPart,

    #[error("email domain must look like example.com")]
    InvalidDomain,
}

/// A structurally valid email address.
///
/// Only the shape is checked: one `@`, a non-empty local part and a dotted
/// domain. Surrounding whitespace is trimmed.
///
/// ```
/// use ryj_core::Email;
///
/// assert!(Email::parse("ventas@ryjcomputer.pe").is_ok());
/// assert!(Email::parse("  rosa.q+pedidos@gmail.com ").is_ok());
///
/// assert!(Email::parse("sin-arroba").is_err());
/// assert!(Email::parse("a@b@c.pe").is_err());
/// assert!(Email::parse("rosa@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first structural problem found.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        let dotted = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if !dotted {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_keeps_case() {
        let email = Email::parse("  Rosa@RYJ.pe ").unwrap();
        assert_eq!(email.as_str(), "Rosa@RYJ.pe");
        assert_eq!(email.domain(), "RYJ.pe");
    }

    #[test]
    fn test_errors() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("rosa ryj@x.pe"), Err(EmailError::Whitespace));
        assert_eq!(Email::parse("rosa.ryj.pe"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.pe"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@ryj.pe"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("rosa@"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("rosa@ryj."), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("rosa@.pe"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@ryj.pe", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { max: 254 })));
    }

    #[test]
    fn test_serde_validates() {
        let email: Email = serde_json::from_str("\"ventas@ryjcomputer.pe\"").unwrap();
        assert_eq!(email.to_string(), "ventas@ryjcomputer.pe");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
