pub mod jwt;
pub mod password;

pub use jwt::{AuthUser, Claims, JwtKeys};
pub use password::{hash_password, verify_password};

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Trims the username and checks both credentials meet the registration rules.
pub fn validate_credentials(username: &str, password: &str) -> Result<String, AppError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err(AppError::Validation(
            "username must be between 3 and 64 characters".to_string(),
        ));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "username must not contain whitespace".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(username.to_string())
}
