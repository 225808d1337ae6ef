use crate::form::{FieldControl, LiveField};
use crate::identity::field_key;
use crate::schema::{FieldPrefs, ListMode};

/// A field is visible-and-editable iff it is not a hidden input, not
/// read-only, not disabled, its computed style renders it, and its box has
/// nonzero width or height.
pub fn is_visible_and_editable(field: &LiveField) -> bool {
    if matches!(field.control, FieldControl::Hidden { .. }) || field.read_only || field.disabled {
        return false;
    }
    let style = &field.style;
    if style.display_none || style.visibility_hidden || style.opacity_zero {
        return false;
    }
    if style.box_width == 0 && style.box_height == 0 {
        return false;
    }
    true
}

/// Whether a non-visible field is still captured under the hidden-field
/// policy. Key comparison is trimmed and case-insensitive on both sides.
pub fn hidden_field_allowed(field: &LiveField, prefs: &FieldPrefs) -> bool {
    if !prefs.save_hidden {
        return false;
    }
    let Some(key) = field_key(field) else {
        return false;
    };
    let key = key.trim().to_lowercase();
    let listed = prefs
        .field_list
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| entry == key);
    match prefs.list_mode {
        ListMode::Whitelist => listed,
        ListMode::Blacklist => !listed,
        ListMode::Invalid => false,
    }
}

/// Final capture eligibility. Keyless fields are always excluded.
pub fn is_eligible(field: &LiveField, prefs: &FieldPrefs) -> bool {
    if field_key(field).is_none() {
        return false;
    }
    is_visible_and_editable(field) || hidden_field_allowed(field, prefs)
}
