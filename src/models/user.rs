use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A registered user.
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
}

/// A user about to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Request body shared by `/register` and `/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(
        length(min = 1, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(
        length(min = 1, max = 72),
        custom = "validate_password_bytes"
    )]
    pub password: String,
}

/// bcrypt only reads the first 72 bytes of a password.
const MAX_PASSWORD_BYTES: usize = 72;

fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("password_bytes");
        error.message = Some("password must not exceed 72 bytes".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_credentials_validation() {
        assert!(credentials("alice", "pw1").validate().is_ok());
        assert!(credentials("test_user-123", "password123").validate().is_ok());

        assert!(credentials("", "pw1").validate().is_err());
        assert!(credentials("alice", "").validate().is_err());
        assert!(credentials("test user!", "pw1").validate().is_err());
        assert!(credentials(&"a".repeat(33), "pw1").validate().is_err());
    }

    #[test]
    fn test_password_limit_counts_bytes() {
        assert!(credentials("alice", &"a".repeat(72)).validate().is_ok());
        assert!(credentials("alice", &"a".repeat(73)).validate().is_err());

        // 40 characters, 80 bytes.
        let multibyte = "é".repeat(40);
        assert_eq!(multibyte.chars().count(), 40);
        assert!(credentials("alice", &multibyte).validate().is_err());
        assert!(credentials("alice", &"é".repeat(36)).validate().is_ok());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: "1".into(),
            username: "alice".into(),
            password_hash: "$2b$04$secret".into(),
            is_admin: true,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "1", "username": "alice", "is_admin": true })
        );
    }
}
