//! Character-level predicates shared by the checklist and the strict check.

pub(crate) const MIN_LENGTH: usize = 8;
pub(crate) const MAX_LENGTH: usize = 20;

/// Punctuation accepted by the `special` rule of the live checklist.
pub(crate) const SPECIAL_CHARACTERS: &str = "!¡@#$%^&*.-_+(){}[]:;<>?,/\\|~`";

/// ASCII-only punctuation accepted by the strict check.
pub(crate) const STRICT_SPECIAL_CHARACTERS: &str = "!@#$%^&*.-_+(){}[]:;<>?,/\\|~`";

const EMOJI_RANGES: [(u32, u32); 3] = [(0x1F300, 0x1F9FF), (0x2600, 0x26FF), (0x2700, 0x27BF)];

pub(crate) fn char_count(password: &str) -> usize {
    password.chars().count()
}

pub(crate) fn has_valid_length(password: &str) -> bool {
    (MIN_LENGTH..=MAX_LENGTH).contains(&char_count(password))
}

pub(crate) fn has_uppercase(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_uppercase())
}

pub(crate) fn has_lowercase(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
}

pub(crate) fn has_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit())
}

pub(crate) fn has_special(password: &str) -> bool {
    password.chars().any(is_special)
}

pub(crate) fn is_special(c: char) -> bool {
    SPECIAL_CHARACTERS.contains(c)
}

pub(crate) fn has_strict_special(password: &str) -> bool {
    password.chars().any(|c| STRICT_SPECIAL_CHARACTERS.contains(c))
}

pub(crate) fn is_emoji(c: char) -> bool {
    let code = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&code))
}

pub(crate) fn has_no_spaces(password: &str) -> bool {
    !password.chars().any(|c| c.is_whitespace() || is_emoji(c))
}

/// Printable ASCII only (0x20..=0x7E).
pub(crate) fn is_printable_ascii(password: &str) -> bool {
    password.chars().all(|c| (' '..='~').contains(&c))
}

/// Kind of forbidden run found in a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsecutiveRun {
    /// Same character three or more times in a row (`aaa`, `111`).
    Repeated,
    /// Three letters ascending by exactly one code point (`abc`, `XYZ`).
    Letters,
    /// Three digits ascending by exactly one (`123`, `789`).
    Digits,
}

pub(crate) fn has_repeated_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

pub(crate) fn has_ascending_letters(chars: &[char]) -> bool {
    chars.windows(3).any(|w| {
        let folded = [fold(w[0]), fold(w[1]), fold(w[2])];
        folded.iter().all(|c| c.is_alphabetic()) && is_ascending(&folded)
    })
}

pub(crate) fn has_ascending_digits(chars: &[char]) -> bool {
    chars
        .windows(3)
        .any(|w| w.iter().all(|c| c.is_ascii_digit()) && is_ascending(w))
}

/// First forbidden run in evaluation order: repeats, then letters, then digits.
pub(crate) fn find_consecutive_run(password: &str) -> Option<ConsecutiveRun> {
    let chars: Vec<char> = password.chars().collect();
    if has_repeated_run(&chars) {
        Some(ConsecutiveRun::Repeated)
    } else if has_ascending_letters(&chars) {
        Some(ConsecutiveRun::Letters)
    } else if has_ascending_digits(&chars) {
        Some(ConsecutiveRun::Digits)
    } else {
        None
    }
}

fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

fn is_ascending(window: &[char]) -> bool {
    window
        .windows(2)
        .all(|pair| (pair[0] as u32).checked_add(1) == Some(pair[1] as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds_are_inclusive() {
        assert!(!has_valid_length("Abcdef!"));
        assert!(has_valid_length("Abcdefg!"));
        assert!(has_valid_length(&"x".repeat(20)));
        assert!(!has_valid_length(&"x".repeat(21)));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(has_valid_length("ñññññññ!"));
    }

    #[test]
    fn test_special_set() {
        assert!(has_special("a¡"));
        assert!(has_special("a`"));
        assert!(has_special("a\\"));
        assert!(!has_special("abc123"));
        assert!(!has_special("a=b"));
    }

    #[test]
    fn test_spaces_and_emoji_rejected() {
        assert!(has_no_spaces("Passw0rd!"));
        assert!(!has_no_spaces("Pass w0rd"));
        assert!(!has_no_spaces("Pass\tword"));
        assert!(!has_no_spaces("Pass🌟word"));
        assert!(!has_no_spaces("Pass☀word"));
        assert!(!has_no_spaces("Pass✅word"));
    }

    #[test]
    fn test_repeated_run() {
        assert_eq!(find_consecutive_run("aaa1"), Some(ConsecutiveRun::Repeated));
        assert_eq!(find_consecutive_run("x111y"), Some(ConsecutiveRun::Repeated));
        assert_eq!(find_consecutive_run("aa1a"), None);
    }

    #[test]
    fn test_ascending_letters_ignore_case() {
        assert_eq!(find_consecutive_run("abc12"), Some(ConsecutiveRun::Letters));
        assert_eq!(find_consecutive_run("xaBCx"), Some(ConsecutiveRun::Letters));
        assert_eq!(find_consecutive_run("ab1"), None);
        assert_eq!(find_consecutive_run("cba"), None);
    }

    #[test]
    fn test_no_wraparound() {
        assert_eq!(find_consecutive_run("yza"), None);
        assert_eq!(find_consecutive_run("890"), None);
    }

    #[test]
    fn test_ascending_digits() {
        assert_eq!(find_consecutive_run("pw789"), Some(ConsecutiveRun::Digits));
        assert_eq!(find_consecutive_run("1357"), None);
    }

    #[test]
    fn test_printable_ascii() {
        assert!(is_printable_ascii("Passw0rd! ~"));
        assert!(!is_printable_ascii("Contraseña1!"));
        assert!(!is_printable_ascii("tab\there"));
    }
}
