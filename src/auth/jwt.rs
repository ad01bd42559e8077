use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use chrono::Utc;

const RESET_PURPOSE: &str = "password_reset";

/// Session token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,       // user_id
    pub email: String,
    pub role: String,
    pub exp: usize,        // expiry timestamp
    pub iat: usize,        // issued at
}

/// Password reset token claims. Carries no user id, only the account email.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn generate(user_id: &str, email: &str, role: &str, secret: &str, expiry_hours: u64) -> Result<String> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: now + (expiry_hours as usize * 3600),
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

pub fn generate_reset(email: &str, secret: &str, expiry_minutes: u64) -> Result<String> {
    let now = Utc::now().timestamp() as usize;
    let claims = ResetClaims {
        email: email.to_string(),
        purpose: RESET_PURPOSE.to_string(),
        exp: now + (expiry_minutes as usize * 60),
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Returns the email a reset token was issued for.
pub fn verify_reset(token: &str, secret: &str) -> Result<String> {
    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    if data.claims.purpose != RESET_PURPOSE || data.claims.email.is_empty() {
        anyhow::bail!("Invalid token payload");
    }
    Ok(data.claims.email)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-for-unit-tests-only";

    #[test]
    fn test_generate_and_verify_token() {
        let token = generate("user-123", "admin@freightthis.com", "ADMIN", TEST_SECRET, 24)
            .expect("Should generate token");
        assert!(!token.is_empty());

        let claims = verify(&token, TEST_SECRET)
            .expect("Should verify valid token");
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "admin@freightthis.com");
        assert_eq!(claims.role, "ADMIN");
    }

    #[test]
    fn test_verify_wrong_secret_fails() {
        let token = generate("user-123", "a@b.com", "USER", TEST_SECRET, 24)
            .expect("Should generate token");

        let result = verify(&token, "wrong-secret");
        assert!(result.is_err(), "Verification with wrong secret should fail");
    }

    #[test]
    fn test_verify_malformed_token_fails() {
        assert!(verify("not.a.valid.jwt", TEST_SECRET).is_err());
        assert!(verify("", TEST_SECRET).is_err());
    }

    #[test]
    fn test_token_expiry_set_correctly() {
        let before = Utc::now().timestamp() as usize;
        let token = generate("u1", "a@b.com", "USER", TEST_SECRET, 2)
            .expect("Should generate token");
        let after = Utc::now().timestamp() as usize;

        let claims = verify(&token, TEST_SECRET).expect("Should verify");
        assert!(claims.exp >= before + 2 * 3600);
        assert!(claims.exp <= after + 2 * 3600);
    }

    #[test]
    fn test_reset_token_round_trip() {
        let token = generate_reset("driver@example.com", TEST_SECRET, 60)
            .expect("Should generate reset token");
        let email = verify_reset(&token, TEST_SECRET).expect("Should verify reset token");
        assert_eq!(email, "driver@example.com");
    }

    #[test]
    fn test_session_token_is_not_a_reset_token() {
        let token = generate("u1", "a@b.com", "USER", TEST_SECRET, 1)
            .expect("Should generate token");
        assert!(verify_reset(&token, TEST_SECRET).is_err());
    }

    #[test]
    fn test_reset_token_is_not_a_session_token() {
        let token = generate_reset("a@b.com", TEST_SECRET, 60).expect("Should generate");
        assert!(verify(&token, TEST_SECRET).is_err());
    }
}
