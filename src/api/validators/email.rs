use regex::Regex;
use std::sync::LazyLock;

use super::{ValidationError, Validator};

/// Practical address shape: local part, `@`, dotted domain with a 2+ letter TLD.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex")
});

/// RFC 5321 path limit
const MAX_EMAIL_LEN: usize = 254;

pub struct EmailValidator;

impl EmailValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for EmailValidator {
    fn validate(&self, input: &str) -> Result<(), ValidationError> {
        let s = input.trim();

        if s.is_empty() {
            return Err(ValidationError::new("E101", "email", "Email cannot be empty"));
        }

        if s.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::new(
                "E102",
                "email",
                format!("Email exceeds {} characters", MAX_EMAIL_LEN),
            ));
        }

        if s.contains("..") || !EMAIL_RE.is_match(s) {
            return Err(ValidationError::new(
                "E103",
                "email",
                format!("Invalid email address: {}", s),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        let v = EmailValidator::new();
        for addr in ["ops@freightthis.com", "jane.doe+loads@carrier.co.uk", " dispatch@acme-logistics.io "] {
            assert!(v.validate(addr).is_ok(), "{} should be valid", addr);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        let v = EmailValidator::new();
        for addr in ["", "plainaddress", "@no-local.com", "a@b", "a@b.c", "a@@b.com", "a..b@c.com", "a b@c.com"] {
            assert!(v.validate(addr).is_err(), "{} should be invalid", addr);
        }
    }

    #[test]
    fn test_error_codes() {
        let v = EmailValidator::new();
        assert_eq!(v.validate("").unwrap_err().code, "E101");
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(v.validate(&long).unwrap_err().code, "E102");
        assert_eq!(v.validate("nope").unwrap_err().code, "E103");
    }
}
