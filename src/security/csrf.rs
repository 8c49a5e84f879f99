//! Double-submit CSRF protection.
//!
//! Pages embed the token in a hidden `csrfmiddlewaretoken` field and the same
//! value is set as the `csrftoken` cookie; every mutating request must echo
//! it back in the `X-CSRFToken` header.

use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, Method, header::COOKIE},
    middleware::Next,
    response::Response,
};
use rand_core::{OsRng, RngCore};

use crate::errors::AppError;

pub const COOKIE_NAME: &str = "csrftoken";
pub const HEADER_NAME: &str = "x-csrftoken";
pub const FORM_FIELD: &str = "csrfmiddlewaretoken";

const TOKEN_BYTES: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Accepts only the hex shape produced by [`CsrfToken::generate`].
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == TOKEN_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit()))
            .then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the token from the hidden form field of a rendered page.
    pub fn from_form(html: &str) -> Option<Self> {
        let needle = format!(r#"name="{FORM_FIELD}""#);
        let field_at = html.find(&needle)?;
        let tag_start = html[..field_at].rfind('<')?;
        let tag_end = field_at + html[field_at..].find('>')?;
        let tag = &html[tag_start..tag_end];

        let value_at = tag.find(r#"value=""#)? + r#"value=""#.len();
        let value_len = tag[value_at..].find('"')?;
        Self::parse(&tag[value_at..value_at + value_len])
    }

    /// Adds the token header to requests that change state.
    pub fn attach(&self, method: &Method, headers: &mut HeaderMap) -> bool {
        if !is_mutating(method) {
            return false;
        }
        match HeaderValue::from_str(&self.0) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(HEADER_NAME), value);
                true
            }
            Err(_) => false,
        }
    }

    /// `Set-Cookie` value pairing with the token.
    pub fn cookie(&self) -> String {
        format!("{COOKIE_NAME}={}; Path=/; SameSite=Strict", self.0)
    }

    fn matches(&self, other: &CsrfToken) -> bool {
        let (a, b) = (self.0.as_bytes(), other.0.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(***)")
    }
}

pub fn is_mutating(method: &Method) -> bool {
    !method.is_safe()
}

fn cookie_token(headers: &HeaderMap) -> Option<CsrfToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| CsrfToken::parse(value))
}

fn header_token(headers: &HeaderMap) -> Option<CsrfToken> {
    headers
        .get(HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .and_then(CsrfToken::parse)
}

/// Checks a request's headers; safe methods always pass.
pub fn verify(method: &Method, headers: &HeaderMap) -> Result<(), AppError> {
    if !is_mutating(method) {
        return Ok(());
    }

    let (Some(expected), Some(presented)) = (cookie_token(headers), header_token(headers)) else {
        return Err(AppError::CsrfMissing);
    };

    if expected.matches(&presented) {
        Ok(())
    } else {
        Err(AppError::CsrfMismatch)
    }
}

pub async fn require_csrf_token(request: Request, next: Next) -> Result<Response, AppError> {
    verify(request.method(), request.headers())?;
    Ok(next.run(request).await)
}
