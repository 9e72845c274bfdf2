//! Local password policy check.
//!
//! Mirrors the user pool's password format so obviously weak passwords are
//! rejected before a sign-up request is sent.

use crate::error::AuthError;

/// Password requirements for new accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum number of characters.
    pub min_length: usize,
    /// Require at least one lowercase letter.
    pub require_lowercase: bool,
    /// Require at least one uppercase letter.
    pub require_uppercase: bool,
    /// Require at least one digit.
    pub require_numbers: bool,
    /// Require at least one non-alphanumeric character.
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_numbers: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Checks a candidate password against the policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPassword` naming the first unmet requirement.
    pub fn validate(&self, password: &str) -> Result<(), AuthError> {
        let failure = if password.chars().count() < self.min_length {
            Some(format!("must be at least {} characters", self.min_length))
        } else if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            Some("must contain a lowercase letter".to_string())
        } else if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            Some("must contain an uppercase letter".to_string())
        } else if self.require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            Some("must contain a number".to_string())
        } else if self.require_special
            && !password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            Some("must contain a special character".to_string())
        } else {
            None
        };

        match failure {
            Some(reason) => Err(AuthError::InvalidPassword { reason }),
            None => Ok(()),
        }
    }
}
