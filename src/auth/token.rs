use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of the tokens handed out on login, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Lifetime of the tokens handed out on login.
pub fn token_ttl() -> Duration {
    Duration::seconds(TOKEN_TTL_SECS)
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id as issued by the user store.
    pub sub: String,
    /// Username at the time of issuance.
    pub username: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
}

/// Reasons a token could not be issued or accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
    #[error("token signing method is not supported")]
    UnsupportedAlgorithm,
    #[error("failed to sign token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnsupportedAlgorithm
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies HS256-signed identity tokens.
///
/// The secret is fixed at construction; there is no fallback to the process
/// environment.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is dead from the second its `exp` is reached.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &str, username: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Encoding("expiry out of range".into()))?;

        let claims = Claims {
            sub: subject.to_owned(),
            username: username.to_owned(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verifies the signature, algorithm and expiry of `token` and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        let now = Utc::now().timestamp().max(0) as usize;
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_for_gen_verify";

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = TokenService::new(SECRET);
        let token = tokens.issue("64b0c0ffee", "alice", token_ttl()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "64b0c0ffee");
        assert_eq!(claims.username, "alice");

        let expected = (Utc::now() + token_ttl()).timestamp() as usize;
        assert!(claims.exp <= expected && claims.exp + 5 >= expected);
        assert!(claims.iat <= claims.exp);
    }

    #[test]
    fn test_token_expiration() {
        let tokens = TokenService::new(SECRET);
        let expired = tokens.issue("42", "bob", Duration::hours(-2)).unwrap();

        assert_eq!(tokens.verify(&expired), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let tokens = TokenService::new(SECRET);
        let token = tokens.issue("42", "bob", Duration::zero()).unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let issuer = TokenService::new("a_completely_different_secret");
        let token = issuer.issue("42", "mallory", token_ttl()).unwrap();

        let verifier = TokenService::new(SECRET);
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_with_foreign_signature_reports_signature() {
        let issuer = TokenService::new("a_completely_different_secret");
        let token = issuer.issue("42", "mallory", Duration::hours(-1)).unwrap();

        let verifier = TokenService::new(SECRET);
        assert_eq!(verifier.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token() {
        let tokens = TokenService::new(SECRET);
        assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_other_signing_methods_are_rejected() {
        let claims = Claims {
            sub: "42".into(),
            username: "mallory".into(),
            exp: (Utc::now() + token_ttl()).timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let tokens = TokenService::new(SECRET);
        assert_eq!(tokens.verify(&token), Err(TokenError::UnsupportedAlgorithm));
    }
}
