//! Field validation for the login and signup forms.
//!
//! Validation runs before any network call; a form that fails here never
//! reaches the remote API.

/// Characters that satisfy the "special character" password rule.
pub const SPECIAL_CHARS: &[char] = &['!', '@', '#', '$', '%', '&', '*'];

pub const MIN_PASSWORD_LEN: usize = 8;

/// Loose email sanity check: longer than 3 characters and contains `@`.
/// The remote API remains the authority on real validity.
pub fn validate_email(email: &str) -> bool {
    email.len() > 3 && email.contains('@')
}

/// A failed password rule. `Display` is the message shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("Password is required")]
    Required,
    #[error("Password should contain at least 1 special character (! @ # $ % & *)")]
    MissingSpecial,
    #[error("Password should contain at least 1 lowercase letter")]
    MissingLowercase,
    #[error("Password should contain at least 1 uppercase letter")]
    MissingUppercase,
    #[error("Password should contain at least 1 number")]
    MissingDigit,
    #[error("Password is too short - should be 8 chars minimum.")]
    TooShort,
    #[error("Passwords don't match")]
    Mismatch,
}

impl PasswordError {
    /// Whether the message belongs on the confirmation field rather than the
    /// password field.
    pub fn is_confirmation(self) -> bool {
        self == PasswordError::Mismatch
    }
}

/// Check a new password and its confirmation. Rules are evaluated in a fixed
/// order and the first failure is reported.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Required);
    }
    if !password.contains(SPECIAL_CHARS) {
        return Err(PasswordError::MissingSpecial);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}
