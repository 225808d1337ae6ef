use tracing::debug;

use crate::classify::{is_eligible, is_visible_and_editable};
use crate::form::LiveForm;
use crate::identity::{field_key, field_label};
use crate::schema::{FieldPrefs, Primitive, SnapshotData, StoredValue};

/// Capture every eligible field of the form, keyed by field key.
///
/// Values are read with type-specific semantics and paired with the
/// resolved label. When two fields share a key the last one in document
/// order wins.
pub fn capture_all(form: &LiveForm, prefs: &FieldPrefs) -> SnapshotData {
    let mut data = SnapshotData::new();
    for field in &form.fields {
        if !is_eligible(field, prefs) {
            continue;
        }
        let Some(key) = field_key(field) else {
            continue;
        };
        let label = field_label(form, field);
        data.insert(key, StoredValue::tagged(field.read_value(), &label));
    }
    debug!(fields = data.len(), "captured form data");
    data
}

/// Capture the form's structure with every value blank, for creating an
/// empty snapshot template. A field is included iff it is
/// visible-and-editable, or `include_hidden` and it is not. Independent of
/// any stored prefs.
pub fn capture_structure(form: &LiveForm, include_hidden: bool) -> SnapshotData {
    let mut data = SnapshotData::new();
    for field in &form.fields {
        let visible = is_visible_and_editable(field);
        if !visible && !include_hidden {
            continue;
        }
        let Some(key) = field_key(field) else {
            continue;
        };
        let label = field_label(form, field);
        data.insert(
            key,
            StoredValue::tagged(Primitive::Text(String::new()), &label),
        );
    }
    data
}
