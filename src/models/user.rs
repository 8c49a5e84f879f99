use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::dialog::escape_html;
use crate::surface::{NewElement, RenderSurface};

/// Shown in place of any value the record does not carry.
pub const PLACEHOLDER: &str = "N/A";

const ADMIN_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// User record as returned by the admin lookup endpoint.
///
/// Every field may be absent or null; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role_display: Option<String>,
    pub role_id: Option<i64>,
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub email_verified: Option<bool>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub date_joined: Option<NaiveDateTime>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_login: Option<NaiveDateTime>,
    pub bio: Option<String>,
    pub reviews_count: Option<u64>,
    pub favorites_count: Option<u64>,
    pub sessions_count: Option<u64>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ADMIN_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|parsed| parsed.naive_local())
        })
}

fn text(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| PLACEHOLDER.to_string(), str::to_string)
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |count| count.to_string())
}

fn timestamp(value: Option<NaiveDateTime>) -> String {
    value.map_or_else(
        || PLACEHOLDER.to_string(),
        |at| at.format(ADMIN_TIMESTAMP_FORMAT).to_string(),
    )
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            parts.join(" ")
        }
    }

    fn role(&self) -> String {
        if let Some(display) = self.role_display.as_deref().map(str::trim)
            && !display.is_empty()
        {
            return display.to_string();
        }
        match self.roles.as_deref() {
            Some(roles) if !roles.is_empty() => roles.join(", "),
            _ => PLACEHOLDER.to_string(),
        }
    }

    /// Labelled values in display order.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.map_or_else(|| PLACEHOLDER.to_string(), |id| id.to_string())),
            ("Username", text(&self.username)),
            ("Name", self.full_name()),
            ("Email", text(&self.email)),
            ("Phone", text(&self.phone_number)),
            ("Role", self.role()),
            ("Active", flag(self.is_active)),
            ("Superuser", flag(self.is_superuser)),
            ("Email verified", flag(self.email_verified)),
            ("Joined", timestamp(self.date_joined)),
            ("Last login", timestamp(self.last_login)),
            ("Bio", text(&self.bio)),
            ("Reviews", count(self.reviews_count)),
            ("Favorites", count(self.favorites_count)),
            ("Active sessions", count(self.sessions_count)),
        ]
    }

    fn markup(&self) -> String {
        let rows: String = self
            .display_rows()
            .into_iter()
            .map(|(label, value)| {
                format!(
                    r#"<dt class="col-sm-4">{label}</dt><dd class="col-sm-8">{}</dd>"#,
                    escape_html(&value)
                )
            })
            .collect();
        format!(r#"<dl class="row mb-0">{rows}</dl>"#)
    }
}

/// Replaces the content of `region_id` with the record's rows, or with an
/// inline error when the lookup failed.
pub fn render_user_panel<S: RenderSurface + ?Sized>(
    surface: &S,
    region_id: &str,
    outcome: Result<&UserRecord, &str>,
) -> bool {
    if !surface.contains(region_id) {
        tracing::debug!(region = region_id, "User panel region missing; skipping render");
        return false;
    }

    for child in surface.children(region_id) {
        surface.remove(&child);
    }

    let markup = match outcome {
        Ok(record) => record.markup(),
        Err(message) => {
            tracing::warn!(error = message, "User record lookup failed");
            format!(
                r#"<div class="alert alert-danger" role="alert">{}</div>"#,
                escape_html(message)
            )
        }
    };

    surface.append(
        region_id,
        NewElement::new(format!("{region_id}-content")).markup(markup),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::surface::{ROOT_ID, RenderTree};

    #[test]
    fn test_missing_and_null_fields_use_placeholder() {
        let record: UserRecord =
            serde_json::from_str(r#"{"username":"alice","email":null,"extra":1}"#).unwrap();
        let rows = record.display_rows();

        assert_eq!(rows[1], ("Username", "alice".to_string()));
        assert_eq!(rows[3], ("Email", PLACEHOLDER.to_string()));
        assert_eq!(record.full_name(), PLACEHOLDER);
        assert!(rows.iter().skip(4).all(|(_, value)| value == PLACEHOLDER));
    }

    #[test]
    fn test_timestamps_accept_admin_and_rfc3339_forms() {
        let record: UserRecord = serde_json::from_str(
            r#"{"date_joined":"18/10/2026 03:45 PM","last_login":"2026-10-18T15:45:00Z"}"#,
        )
        .unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|day| day.and_hms_opt(15, 45, 0))
            .unwrap();
        assert_eq!(record.date_joined, Some(expected));
        assert_eq!(record.last_login, Some(expected));
    }

    #[test]
    fn test_malformed_timestamp_counts_as_absent() {
        let record: UserRecord =
            serde_json::from_str(r#"{"date_joined":"yesterday","is_active":true}"#).unwrap();
        assert_eq!(record.date_joined, None);
        assert_eq!(record.is_active, Some(true));
    }

    #[test]
    fn test_non_string_timestamps_count_as_absent() {
        let record: UserRecord = serde_json::from_str(
            r#"{"username":"alice","date_joined":1760800000,"last_login":{"at":"now"}}"#,
        )
        .unwrap();
        assert_eq!(record.username.as_deref(), Some("alice"));
        assert_eq!(record.date_joined, None);
        assert_eq!(record.last_login, None);
    }

    #[test]
    fn test_role_falls_back_to_role_list() {
        let record = UserRecord {
            roles: Some(vec!["editor".into(), "viewer".into()]),
            ..UserRecord::default()
        };
        assert_eq!(record.role(), "editor, viewer");
    }

    #[test]
    fn test_panel_replaces_content_and_escapes() {
        let tree = RenderTree::new();
        assert!(tree.append(ROOT_ID, NewElement::new("user-detail")));
        assert!(tree.append("user-detail", NewElement::new("spinner")));

        let record = UserRecord {
            username: Some("<alice>".into()),
            ..UserRecord::default()
        };
        assert!(render_user_panel(&tree, "user-detail", Ok(&record)));

        assert!(!tree.contains("spinner"));
        let markup = tree.markup("user-detail-content").unwrap();
        assert!(markup.contains("&lt;alice&gt;"));
    }

    #[test]
    fn test_panel_renders_inline_error() {
        let tree = RenderTree::new();
        assert!(tree.append(ROOT_ID, NewElement::new("user-detail")));

        assert!(render_user_panel(&tree, "user-detail", Err("User not found")));
        let markup = tree.markup("user-detail-content").unwrap();
        assert!(markup.contains("alert-danger"));
        assert!(markup.contains("User not found"));
    }

    #[test]
    fn test_panel_skips_missing_region() {
        let tree = RenderTree::new();
        assert!(!render_user_panel(&tree, "user-detail", Err("boom")));
    }
}
