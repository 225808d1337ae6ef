use tracing::debug;
use url::Url;

use crate::form::{LiveField, LiveForm};

/// Origin sentinel for file/local pages and unparseable URLs.
pub const ORIGIN_FALLBACK: &str = "local-host-or-file";
/// Local-part sentinel for forms lacking both an id and a class.
pub const LOCAL_PART_FALLBACK: &str = "no-id-or-class";

/// Registrable-domain extraction: the last two labels of the lower-cased
/// hostname, or the full hostname when it has two or fewer.
pub fn base_domain(page_url: &str) -> String {
    let host = match Url::parse(page_url) {
        Ok(url) => url.host_str().map(|h| h.to_lowercase()),
        Err(err) => {
            debug!(page_url, %err, "URL parse failed, using origin fallback");
            None
        }
    };
    match host {
        Some(host) => {
            let labels: Vec<&str> = host.split('.').collect();
            if labels.len() > 2 {
                labels[labels.len() - 2..].join(".")
            } else {
                host
            }
        }
        None => ORIGIN_FALLBACK.to_string(),
    }
}

/// Composite persistence key for a form: `<origin>/<localPart>`.
///
/// The local part is the form's id, else its first non-empty class token,
/// else a sentinel. Identical forms on one origin always resolve to the
/// same identity; the identity is not globally unique and collisions
/// across unrelated forms are accepted.
pub fn record_identity(form: &LiveForm, page_url: &str) -> String {
    let local = form
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| form.classes.iter().find(|c| !c.is_empty()).cloned())
        .unwrap_or_else(|| LOCAL_PART_FALLBACK.to_string());
    format!("{}/{}", base_domain(page_url), local)
}

/// Stable key for a field: `name` else `id`; empty strings count as absent.
/// Fields lacking both are never captured.
pub fn field_key(field: &LiveField) -> Option<String> {
    field
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or_else(|| field.id.as_deref().filter(|i| !i.is_empty()))
        .map(str::to_string)
}

/// Best-effort human label: a `<label for=id>` match, else an enclosing
/// label's text, else the placeholder, else the empty string.
pub fn field_label(form: &LiveForm, field: &LiveField) -> String {
    if let Some(id) = field.id.as_deref().filter(|i| !i.is_empty()) {
        if let Some(label) = form.labels.iter().find(|l| l.for_id == id) {
            return label.text.clone();
        }
    }
    if let Some(text) = &field.ancestor_label {
        return text.clone();
    }
    field.placeholder.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormLabel, LiveField};

    #[test]
    fn base_domain_keeps_last_two_labels() {
        assert_eq!(base_domain("https://app.shop.example.com/cart"), "example.com");
        assert_eq!(base_domain("https://example.com/"), "example.com");
        assert_eq!(base_domain("http://localhost:8080/x"), "localhost");
    }

    #[test]
    fn base_domain_falls_back_on_bad_url() {
        assert_eq!(base_domain("not a url"), ORIGIN_FALLBACK);
        assert_eq!(base_domain(""), ORIGIN_FALLBACK);
    }

    #[test]
    fn identity_prefers_id_then_class_then_sentinel() {
        let url = "https://www.example.com/signup";
        let by_id = LiveForm::new(Some("signup"), &["form", "wide"]);
        assert_eq!(record_identity(&by_id, url), "example.com/signup");

        let by_class = LiveForm::new(None, &["", "checkout-form"]);
        assert_eq!(record_identity(&by_class, url), "example.com/checkout-form");

        let bare = LiveForm::new(None, &[]);
        assert_eq!(
            record_identity(&bare, url),
            format!("example.com/{LOCAL_PART_FALLBACK}")
        );
    }

    #[test]
    fn field_key_prefers_name_over_id() {
        let field = LiveField::text("email", "").with_id("email-input");
        assert_eq!(field_key(&field), Some("email".to_string()));

        let by_id = LiveField::new(crate::form::FieldControl::Text {
            value: String::new(),
        })
        .with_id("only-id");
        assert_eq!(field_key(&by_id), Some("only-id".to_string()));

        let keyless = LiveField::new(crate::form::FieldControl::Text {
            value: String::new(),
        });
        assert_eq!(field_key(&keyless), None);
    }

    #[test]
    fn label_resolution_order() {
        let form = LiveForm::new(Some("f"), &[])
            .with_labels(vec![FormLabel::new("email-input", "Email Address")]);

        let labelled = LiveField::text("email", "").with_id("email-input");
        assert_eq!(field_label(&form, &labelled), "Email Address");

        let mut wrapped = LiveField::text("phone", "");
        wrapped.ancestor_label = Some("Phone".to_string());
        assert_eq!(field_label(&form, &wrapped), "Phone");

        let placeholder_only = LiveField::text("fax", "").with_placeholder("Fax number");
        assert_eq!(field_label(&form, &placeholder_only), "Fax number");

        let unlabelled = LiveField::text("misc", "");
        assert_eq!(field_label(&form, &unlabelled), "");
    }
}
