use super::{DialogId, DialogKind, DialogRequest};

/// Visual treatment for one dialog kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogStyle {
    pub icon: &'static str,
    pub text_class: &'static str,
    pub header_class: &'static str,
    pub default_title: &'static str,
    pub button_class: &'static str,
}

impl DialogKind {
    pub fn style(&self) -> DialogStyle {
        match self {
            DialogKind::Success => DialogStyle {
                icon: "fa-check-circle",
                text_class: "text-success",
                header_class: "bg-success",
                default_title: "Success",
                button_class: "btn-success",
            },
            DialogKind::Error => DialogStyle {
                icon: "fa-times-circle",
                text_class: "text-danger",
                header_class: "bg-danger",
                default_title: "Error",
                button_class: "btn-danger",
            },
            DialogKind::Warning => DialogStyle {
                icon: "fa-exclamation-triangle",
                text_class: "text-warning",
                header_class: "bg-warning",
                default_title: "Warning",
                button_class: "btn-warning",
            },
            DialogKind::Info => DialogStyle {
                icon: "fa-info-circle",
                text_class: "text-info",
                header_class: "bg-info",
                default_title: "Information",
                button_class: "btn-primary",
            },
            DialogKind::Confirm => DialogStyle {
                icon: "fa-question-circle",
                text_class: "text-primary",
                header_class: "bg-primary",
                default_title: "Confirmation",
                button_class: "btn-primary",
            },
        }
    }
}

/// Escapes text placed in element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Inner markup of the dialog fragment. The message body is trusted markup;
/// title and button labels are escaped.
pub(crate) fn render_body(id: &DialogId, request: &DialogRequest) -> String {
    let style = request.kind.style();
    let title = escape_html(request.title());
    let confirm_label = escape_html(request.confirm_label());

    let cancel_button = if request.has_cancel_path() {
        format!(
            r#"<button type="button" id="{cancel}" class="btn btn-outline-secondary">{label}</button>"#,
            cancel = id.cancel_control(),
            label = escape_html(request.cancel_label()),
        )
    } else {
        String::new()
    };

    format!(
        concat!(
            r#"<div class="modal-dialog modal-dialog-centered"><div class="modal-content">"#,
            r#"<div class="modal-header {header} text-white"><h5 class="modal-title" id="{fragment}-label">"#,
            r#"<i class="fas {icon} me-2"></i><span>{title}</span></h5></div>"#,
            r#"<div class="modal-body"><i class="fas {icon} {text}"></i><p>{message}</p></div>"#,
            r#"<div class="modal-footer">{cancel}"#,
            r#"<button type="button" id="{confirm}" class="btn {button}">{confirm_label}</button>"#,
            r#"</div></div></div>"#,
        ),
        header = style.header_class,
        fragment = id.fragment(),
        icon = style.icon,
        title = title,
        text = style.text_class,
        message = request.message,
        cancel = cancel_button,
        confirm = id.confirm_control(),
        button = style.button_class,
        confirm_label = confirm_label,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogConfig;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_error_kind_uses_danger_button() {
        assert_eq!(DialogKind::Error.style().button_class, "btn-danger");
        assert_eq!(DialogKind::Info.style().button_class, "btn-primary");
    }

    #[test]
    fn test_message_markup_passes_through_but_title_is_escaped() {
        let id = DialogId::new();
        let request = DialogRequest::new(
            DialogKind::Confirm,
            "Delete <strong>everything</strong>?",
            DialogConfig::default().title("<Danger>"),
        );
        let markup = render_body(&id, &request);
        assert!(markup.contains("<strong>everything</strong>"));
        assert!(markup.contains("&lt;Danger&gt;"));
        assert!(markup.contains(&id.cancel_control()));
    }

    #[test]
    fn test_alert_has_no_cancel_button() {
        let id = DialogId::new();
        let request = DialogRequest::new(DialogKind::Success, "Saved", DialogConfig::default());
        let markup = render_body(&id, &request);
        assert!(!markup.contains(&id.cancel_control()));
        assert!(markup.contains("Accept"));
    }
}
