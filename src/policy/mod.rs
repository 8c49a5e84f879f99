//! Password policy evaluation.
//!
//! [`validate`] produces one boolean per [`Rule`]; [`checklist`] turns the
//! same evaluation into the tri-state requirement list rendered next to a
//! password field, where empty input stays neutral instead of failing.
//! [`enforce`] is the strict, first-failure check used before accepting a
//! password.

mod rules;
mod similarity;
mod strength;
mod strict;

use serde::{Serialize, Serializer, ser::SerializeMap};

pub use similarity::IdentityFields;
pub use strength::{Strength, StrengthLevel, strength};
pub use strict::{PolicyViolation, enforce};

/// Requirement identifiers in checklist order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    Length,
    Uppercase,
    Lowercase,
    Special,
    NoSpaces,
    NotSimilar,
    NoConsecutive,
}

impl Rule {
    /// Checklist positions are bound to this order.
    pub const ORDERED: [Rule; 7] = [
        Rule::Length,
        Rule::Uppercase,
        Rule::Lowercase,
        Rule::Special,
        Rule::NoSpaces,
        Rule::NotSimilar,
        Rule::NoConsecutive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Length => "length",
            Rule::Uppercase => "uppercase",
            Rule::Lowercase => "lowercase",
            Rule::Special => "special",
            Rule::NoSpaces => "noSpaces",
            Rule::NotSimilar => "notSimilar",
            Rule::NoConsecutive => "noConsecutive",
        }
    }

    /// Id of the checklist item rendered for this rule.
    pub fn anchor_id(&self) -> &'static str {
        match self {
            Rule::Length => "req-length",
            Rule::Uppercase => "req-uppercase",
            Rule::Lowercase => "req-lowercase",
            Rule::Special => "req-special",
            Rule::NoSpaces => "req-no-spaces",
            Rule::NotSimilar => "req-not-similar",
            Rule::NoConsecutive => "req-no-consecutive",
        }
    }

    fn position(&self) -> usize {
        match self {
            Rule::Length => 0,
            Rule::Uppercase => 1,
            Rule::Lowercase => 2,
            Rule::Special => 3,
            Rule::NoSpaces => 4,
            Rule::NotSimilar => 5,
            Rule::NoConsecutive => 6,
        }
    }
}

/// Display state of a single requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleState {
    /// Nothing typed yet: neither met nor failed.
    Unevaluated,
    Met,
    Failed,
}

impl RuleState {
    pub fn from_check(passed: bool) -> Self {
        if passed { RuleState::Met } else { RuleState::Failed }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, RuleState::Met)
    }

    /// CSS state class for the checklist item, `None` when neutral.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            RuleState::Unevaluated => None,
            RuleState::Met => Some("requirement-met"),
            RuleState::Failed => Some("requirement-failed"),
        }
    }
}

/// Per-rule outcome of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    checks: [bool; 7],
}

impl ValidationResult {
    pub fn passed(&self, rule: Rule) -> bool {
        self.checks[rule.position()]
    }

    /// Logical AND of every rule.
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(|passed| *passed)
    }

    /// Rules with their outcome, in checklist order.
    pub fn iter(&self) -> impl Iterator<Item = (Rule, bool)> + '_ {
        Rule::ORDERED.iter().map(|rule| (*rule, self.passed(*rule)))
    }

    pub fn failed_rules(&self) -> Vec<Rule> {
        self.iter()
            .filter(|(_, passed)| !passed)
            .map(|(rule, _)| rule)
            .collect()
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.checks.len() + 1))?;
        for (rule, passed) in self.iter() {
            map.serialize_entry(rule.as_str(), &passed)?;
        }
        map.serialize_entry("isValid", &self.is_valid())?;
        map.end()
    }
}

/// Evaluates every rule independently. Never fails; absent or malformed
/// identity fields are left out of the similarity comparison.
pub fn validate(password: &str, identity: Option<&IdentityFields>) -> ValidationResult {
    let chars: Vec<char> = password.chars().collect();
    let terms = identity.map(IdentityFields::checklist_terms).unwrap_or_default();

    let mut checks = [false; 7];
    for rule in Rule::ORDERED {
        checks[rule.position()] = match rule {
            Rule::Length => rules::has_valid_length(password),
            Rule::Uppercase => rules::has_uppercase(password),
            Rule::Lowercase => rules::has_lowercase(password),
            Rule::Special => rules::has_special(password),
            Rule::NoSpaces => rules::has_no_spaces(password),
            Rule::NotSimilar => !similarity::resembles_any(&password.to_lowercase(), &terms),
            Rule::NoConsecutive => {
                !(rules::has_repeated_run(&chars)
                    || rules::has_ascending_letters(&chars)
                    || rules::has_ascending_digits(&chars))
            }
        };
    }

    ValidationResult { checks }
}

/// Passwords shorter than this keep the similarity item neutral.
const SIMILARITY_DISPLAY_MIN: usize = similarity::MIN_TERM_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub rule: Rule,
    pub state: RuleState,
}

/// Tri-state requirement list in fixed rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checklist {
    pub items: Vec<ChecklistItem>,
    pub is_valid: bool,
}

impl Checklist {
    pub fn state(&self, rule: Rule) -> RuleState {
        self.items
            .iter()
            .find(|item| item.rule == rule)
            .map(|item| item.state)
            .unwrap_or(RuleState::Unevaluated)
    }

    pub fn is_neutral(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.state == RuleState::Unevaluated)
    }
}

pub fn checklist(password: &str, identity: Option<&IdentityFields>) -> Checklist {
    let result = validate(password, identity);
    let length = rules::char_count(password);

    let items = result
        .iter()
        .map(|(rule, passed)| {
            let neutral = length == 0
                || (rule == Rule::NotSimilar && length < SIMILARITY_DISPLAY_MIN);
            let state = if neutral {
                RuleState::Unevaluated
            } else {
                RuleState::from_check(passed)
            };
            ChecklistItem { rule, state }
        })
        .collect();

    Checklist {
        items,
        is_valid: result.is_valid(),
    }
}

/// Confirmation field state: neutral until something is typed there.
pub fn confirmation_state(password: &str, confirmation: &str) -> RuleState {
    if confirmation.is_empty() {
        RuleState::Unevaluated
    } else {
        RuleState::from_check(!password.is_empty() && password == confirmation)
    }
}
