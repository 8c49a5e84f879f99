//! Log-safe wrappers for personal data, plus the security event vocabulary.

use std::fmt;
use std::net::IpAddr;

macro_rules! masked_display {
    ($($name:ident),+ $(,)?) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

fn stars(count: usize) -> String {
    "*".repeat(count)
}

/// Email with the local part reduced to its first character.
#[derive(Debug, Clone)]
pub struct SanitizedEmail(String);

impl SanitizedEmail {
    pub fn new(email: impl AsRef<str>) -> Self {
        let Some((local, domain)) = email.as_ref().split_once('@') else {
            return Self("***@***".to_string());
        };
        let masked = match (local.chars().next(), local.chars().count()) {
            (Some(first), len) if len > 2 => format!("{first}***"),
            (_, len) => stars(len),
        };
        Self(format!("{masked}@{domain}"))
    }
}

#[derive(Debug, Clone)]
pub struct SanitizedUsername(String);

impl SanitizedUsername {
    pub fn new(username: impl AsRef<str>) -> Self {
        let username = username.as_ref();
        let len = username.chars().count();
        let masked = match (username.chars().next(), username.chars().next_back()) {
            (Some(first), Some(last)) if len > 4 => format!("{first}***{last}"),
            (Some(first), _) if len > 2 => format!("{first}***"),
            _ => stars(len),
        };
        Self(masked)
    }
}

/// Client address with the host portion hidden: the last IPv4 octet, or
/// everything past the /48 routing prefix of an IPv6 address.
#[derive(Debug, Clone)]
pub struct SanitizedIpAddr(String);

impl SanitizedIpAddr {
    pub fn new(ip: IpAddr) -> Self {
        let masked = match ip {
            IpAddr::V4(v4) => {
                let [a, b, c, _] = v4.octets();
                format!("{a}.{b}.{c}.***")
            }
            IpAddr::V6(v6) => {
                let [a, b, c, ..] = v6.segments();
                format!("{a:x}:{b:x}:{c:x}:****")
            }
        };
        Self(masked)
    }
}

masked_display!(SanitizedEmail, SanitizedUsername, SanitizedIpAddr);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    PasswordAccepted,
    PasswordRejected,
    CsrfTokenIssued,
    CsrfTokenMissing,
    CsrfTokenMismatch,
    RateLimitExceeded,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::PasswordAccepted => "password_accepted",
            SecurityEvent::PasswordRejected => "password_rejected",
            SecurityEvent::CsrfTokenIssued => "csrf_token_issued",
            SecurityEvent::CsrfTokenMissing => "csrf_token_missing",
            SecurityEvent::CsrfTokenMismatch => "csrf_token_mismatch",
            SecurityEvent::RateLimitExceeded => "rate_limit_exceeded",
        }
    }

    /// Events that hint at abuse are logged at `warn`.
    pub fn is_critical(&self) -> bool {
        !matches!(
            self,
            SecurityEvent::PasswordAccepted
                | SecurityEvent::PasswordRejected
                | SecurityEvent::CsrfTokenIssued
        )
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emits a structured `security` event; callers pass sanitized fields only.
#[macro_export]
macro_rules! log_security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        if event.is_critical() {
            tracing::warn!(security_event = %event, event_type = "security", $($field)*);
        } else {
            tracing::info!(security_event = %event, event_type = "security", $($field)*);
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    #[test]
    fn test_sanitize_email() {
        assert_eq!(
            SanitizedEmail::new("maria@example.com").to_string(),
            "m***@example.com"
        );
        assert_eq!(SanitizedEmail::new("jo@test.com").to_string(), "**@test.com");
        assert_eq!(SanitizedEmail::new("ñandú@test.com").to_string(), "ñ***@test.com");
        assert_eq!(SanitizedEmail::new("").to_string(), "***@***");
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(SanitizedUsername::new("mariagarcia").to_string(), "m***a");
        assert_eq!(SanitizedUsername::new("ana").to_string(), "a***");
        assert_eq!(SanitizedUsername::new("al").to_string(), "**");
        assert_eq!(SanitizedUsername::new("").to_string(), "");
    }

    #[test]
    fn test_sanitize_ip() {
        let v4 = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(SanitizedIpAddr::new(v4).to_string(), "192.168.1.***");

        let v6 = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0xa, 0, 0, 0, 0, 0x7334));
        assert_eq!(SanitizedIpAddr::new(v6).to_string(), "2001:db8:a:****");
    }

    #[test]
    fn test_abuse_events_are_critical() {
        assert!(SecurityEvent::CsrfTokenMismatch.is_critical());
        assert!(SecurityEvent::CsrfTokenMissing.is_critical());
        assert!(SecurityEvent::RateLimitExceeded.is_critical());
        assert!(!SecurityEvent::PasswordRejected.is_critical());
        assert_eq!(SecurityEvent::PasswordRejected.to_string(), "password_rejected");
    }
}
