// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Minimum accepted password length. Documented policy: passwords must be
/// at least 6 characters and contain at least one letter and one digit.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validates the password policy (length plus letter/digit mix)
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("password must be at least 6 characters".into());
        return Err(err);
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        let mut err = ValidationError::new("password_too_weak");
        err.message = Some("password must contain at least one letter and one digit".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a password field is not blank (sign-in only checks
/// presence; the strength policy applies when a password is set)
pub fn validate_password_present(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        let mut err = ValidationError::new("password_required");
        err.message = Some("password must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_passwords_pass() {
        assert!(validate_password_strength("hunter2hunter2").is_ok());
        assert!(validate_password_strength("passw0rd").is_ok());
    }

    #[test]
    fn six_char_mixed_passwords_are_admitted() {
        // Shortest accepted shape: minimum length with the letter/digit mix.
        assert!(validate_password_strength("secret1").is_ok());
        assert!(validate_password_strength("abcde1").is_ok());
    }

    #[test]
    fn short_passwords_fail() {
        assert!(validate_password_strength("abc1").is_err());
        assert!(validate_password_strength("abc12").is_err()); // 5 chars
    }

    #[test]
    fn passwords_without_mix_fail() {
        assert!(validate_password_strength("onlyletters").is_err());
        assert!(validate_password_strength("1234567890").is_err());
    }

    #[test]
    fn blank_passwords_rejected() {
        assert!(validate_password_present("").is_err());
        assert!(validate_password_present("   ").is_err());
        assert!(validate_password_present("anything").is_ok());
    }
}
