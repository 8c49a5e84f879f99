use serde::Serialize;

use super::rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => StrengthLevel::VeryWeak,
            2 => StrengthLevel::Weak,
            3 => StrengthLevel::Medium,
            4 => StrengthLevel::Strong,
            _ => StrengthLevel::VeryStrong,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "Very weak",
            StrengthLevel::Weak => "Weak",
            StrengthLevel::Medium => "Medium",
            StrengthLevel::Strong => "Strong",
            StrengthLevel::VeryStrong => "Very strong",
        }
    }

    /// Contextual colour used for the meter bar.
    pub fn tone(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "danger",
            StrengthLevel::Weak => "warning",
            StrengthLevel::Medium => "info",
            StrengthLevel::Strong | StrengthLevel::VeryStrong => "success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Strength {
    pub score: u8,
    pub level: StrengthLevel,
}

impl Strength {
    pub const MAX_SCORE: u8 = 5;

    /// Meter fill, 0-100.
    pub fn percent(&self) -> u8 {
        (u16::from(self.score) * 100 / u16::from(Self::MAX_SCORE)) as u8
    }
}

/// Scores a password on length, both letter cases, digits and symbols.
pub fn strength(password: &str) -> Strength {
    let criteria = [
        rules::char_count(password) >= rules::MIN_LENGTH,
        rules::has_lowercase(password),
        rules::has_uppercase(password),
        rules::has_digit(password),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = criteria.into_iter().filter(|met| *met).count() as u8;

    Strength {
        score,
        level: StrengthLevel::from_score(score),
    }
}
