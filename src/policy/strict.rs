use thiserror::Error;

use super::rules::{self, ConsecutiveRun};
use super::similarity::{IdentityFields, normalize_text, resembles_any};

/// First rule a password breaks under the strict check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("password must be at least 8 characters long")]
    TooShort,
    #[error("password must not be longer than 20 characters")]
    TooLong,
    #[error("password must contain at least one uppercase letter")]
    NoUppercase,
    #[error("password must contain at least one lowercase letter")]
    NoLowercase,
    #[error("password must contain at least one special character (!@#$%^&*.-_+(){{}}[]:;<>?,/\\|~)")]
    NoSpecial,
    #[error("password must not contain spaces")]
    HasSpaces,
    #[error("password contains characters that are not allowed (such as emoji)")]
    InvalidCharacters,
    #[error("password must not contain three or more identical consecutive characters (e.g. aaa, 111)")]
    RepeatedCharacters,
    #[error("password must not contain consecutive alphabetic sequences (e.g. abc, xyz)")]
    ConsecutiveLetters,
    #[error("password must not contain consecutive numeric sequences (e.g. 123, 789)")]
    ConsecutiveNumbers,
    #[error("password is too similar to your username, email or name")]
    TooSimilar,
}

impl PolicyViolation {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PolicyViolation::TooShort => "password_too_short",
            PolicyViolation::TooLong => "password_too_long",
            PolicyViolation::NoUppercase => "password_no_upper",
            PolicyViolation::NoLowercase => "password_no_lower",
            PolicyViolation::NoSpecial => "password_no_special",
            PolicyViolation::HasSpaces => "password_has_spaces",
            PolicyViolation::InvalidCharacters => "password_invalid_chars",
            PolicyViolation::RepeatedCharacters => "password_consecutive_chars",
            PolicyViolation::ConsecutiveLetters => "password_consecutive_letters",
            PolicyViolation::ConsecutiveNumbers => "password_consecutive_numbers",
            PolicyViolation::TooSimilar => "password_too_similar",
        }
    }
}

/// Checks a password the way the account service does before persisting it,
/// stopping at the first violation.
pub fn enforce(password: &str, identity: Option<&IdentityFields>) -> Result<(), PolicyViolation> {
    let length = rules::char_count(password);
    if length < rules::MIN_LENGTH {
        tracing::debug!(length, "Password rejected: too short");
        return Err(PolicyViolation::TooShort);
    }
    if length > rules::MAX_LENGTH {
        tracing::debug!(length, "Password rejected: too long");
        return Err(PolicyViolation::TooLong);
    }

    if !rules::has_uppercase(password) {
        return Err(PolicyViolation::NoUppercase);
    }
    if !rules::has_lowercase(password) {
        return Err(PolicyViolation::NoLowercase);
    }
    if !rules::has_strict_special(password) {
        return Err(PolicyViolation::NoSpecial);
    }
    if password.contains(' ') {
        return Err(PolicyViolation::HasSpaces);
    }
    if !rules::is_printable_ascii(password) {
        return Err(PolicyViolation::InvalidCharacters);
    }

    if let Some(run) = rules::find_consecutive_run(password) {
        tracing::debug!(run = ?run, "Password rejected: consecutive run");
        return Err(match run {
            ConsecutiveRun::Repeated => PolicyViolation::RepeatedCharacters,
            ConsecutiveRun::Letters => PolicyViolation::ConsecutiveLetters,
            ConsecutiveRun::Digits => PolicyViolation::ConsecutiveNumbers,
        });
    }

    if let Some(identity) = identity
        && resembles_any(&normalize_text(password), &identity.strict_terms())
    {
        tracing::debug!("Password rejected: resembles identity fields");
        return Err(PolicyViolation::TooSimilar);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_compliant_password() {
        assert_eq!(enforce("Passw0rd!", None), Ok(()));
    }

    #[test]
    fn test_length_violations() {
        assert_eq!(enforce("Pa0!", None), Err(PolicyViolation::TooShort));
        assert_eq!(
            enforce("Passw0rd!Passw0rd!Pa0", None),
            Err(PolicyViolation::TooLong)
        );
    }

    #[test]
    fn test_violations_are_reported_in_order() {
        assert_eq!(enforce("passw0rd!", None), Err(PolicyViolation::NoUppercase));
        assert_eq!(enforce("PASSW0RD!", None), Err(PolicyViolation::NoLowercase));
        assert_eq!(enforce("Passw0rd1", None), Err(PolicyViolation::NoSpecial));
        assert_eq!(enforce("Pass w0rd!", None), Err(PolicyViolation::HasSpaces));
        assert_eq!(
            enforce("Contraseña!", None),
            Err(PolicyViolation::InvalidCharacters)
        );
    }

    #[test]
    fn test_inverted_exclamation_is_not_special() {
        assert_eq!(enforce("Passw0rd¡", None), Err(PolicyViolation::NoSpecial));
        assert_eq!(
            enforce("Passw0rd¡!", None),
            Err(PolicyViolation::InvalidCharacters)
        );
    }

    #[test]
    fn test_consecutive_violations() {
        assert_eq!(
            enforce("Paaassw0rd!", None),
            Err(PolicyViolation::RepeatedCharacters)
        );
        assert_eq!(
            enforce("Xabcw0rd!", None),
            Err(PolicyViolation::ConsecutiveLetters)
        );
        assert_eq!(
            enforce("Pw!x1234z", None),
            Err(PolicyViolation::ConsecutiveNumbers)
        );
    }

    #[test]
    fn test_similarity_ignores_accents() {
        let identity = IdentityFields {
            first_name: Some("Andrés".to_string()),
            ..IdentityFields::default()
        };
        assert_eq!(
            enforce("Andres!2024", Some(&identity)),
            Err(PolicyViolation::TooSimilar)
        );
    }

    #[test]
    fn test_similarity_against_full_email() {
        let identity = IdentityFields {
            email: Some("qz@ex.io".to_string()),
            ..IdentityFields::default()
        };
        assert_eq!(
            enforce("Aqz@ex.io1", Some(&identity)),
            Err(PolicyViolation::TooSimilar)
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(PolicyViolation::TooSimilar.code(), "password_too_similar");
        assert_eq!(
            PolicyViolation::RepeatedCharacters.code(),
            "password_consecutive_chars"
        );
    }
}
