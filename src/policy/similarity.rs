use serde::Deserialize;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Identity values a password must not resemble.
///
/// Every field is optional; blank or malformed values are skipped rather than
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityFields {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Identity values shorter than this never take part in the comparison.
pub(crate) const MIN_TERM_LENGTH: usize = 3;

impl IdentityFields {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Case-folded terms for the live checklist: username, first name, last
    /// name and the local part of the email.
    pub(crate) fn checklist_terms(&self) -> Vec<String> {
        [
            present(&self.username),
            present(&self.first_name),
            present(&self.last_name),
            present(&self.email).and_then(email_local_part),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() >= MIN_TERM_LENGTH)
        .collect()
    }

    /// Accent-stripped terms for the strict check, which also compares the
    /// whole email address.
    pub(crate) fn strict_terms(&self) -> Vec<String> {
        let email = present(&self.email);
        [
            present(&self.username),
            email,
            email.and_then(email_local_part),
            present(&self.first_name),
            present(&self.last_name),
        ]
        .into_iter()
        .flatten()
        .map(normalize_text)
        .filter(|term| term.chars().count() >= MIN_TERM_LENGTH)
        .collect()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn email_local_part(email: &str) -> Option<&str> {
    email
        .split_once('@')
        .map(|(local, _)| local)
        .filter(|local| !local.is_empty())
}

/// Decomposes to NFD, drops combining marks and lowercases (`Andrés` -> `andres`).
pub(crate) fn normalize_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Bidirectional containment between the candidate and any identity term.
pub(crate) fn resembles_any(candidate: &str, terms: &[String]) -> bool {
    if candidate.is_empty() {
        return false;
    }

    terms
        .iter()
        .any(|term| candidate.contains(term.as_str()) || term.contains(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_blank_fields_are_skipped() {
        let identity = IdentityFields {
            username: Some("jo".to_string()),
            first_name: Some("   ".to_string()),
            last_name: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(identity.checklist_terms().is_empty());
    }

    #[test]
    fn test_checklist_terms_use_email_local_part() {
        let identity = IdentityFields {
            email: Some("Maria.Lopez@example.com".to_string()),
            ..IdentityFields::default()
        };
        assert_eq!(identity.checklist_terms(), vec!["maria.lopez".to_string()]);
    }

    #[test]
    fn test_strict_terms_include_full_email() {
        let identity = IdentityFields {
            email: Some("ana@example.com".to_string()),
            ..IdentityFields::default()
        };
        assert_eq!(
            identity.strict_terms(),
            vec!["ana@example.com".to_string(), "ana".to_string()]
        );
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize_text("Andrés"), "andres");
        assert_eq!(normalize_text("MUÑOZ"), "munoz");
    }

    #[test]
    fn test_resemblance_is_bidirectional() {
        let terms = vec!["john".to_string()];
        assert!(resembles_any("johnjohn", &terms));
        assert!(resembles_any("ohn", &["johnny".to_string()]));
        assert!(!resembles_any("passw0rd!", &terms));
        assert!(!resembles_any("", &terms));
    }
}
