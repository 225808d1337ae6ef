use std::collections::BTreeMap;

use chrono::Utc;
use rand::Rng;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A captured scalar: checked flag for checkbox/radio, text for text-like
/// fields and single selects, a value list for multi-selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Bool(bool),
    Text(String),
    Many(Vec<String>),
}

impl Primitive {
    /// Truthiness under assignment to a checked flag.
    pub fn truthy(&self) -> bool {
        match self {
            Primitive::Bool(b) => *b,
            Primitive::Text(s) => !s.is_empty(),
            Primitive::Many(v) => !v.is_empty(),
        }
    }

    /// Text form under assignment to a value slot.
    pub fn as_text(&self) -> String {
        match self {
            Primitive::Bool(b) => b.to_string(),
            Primitive::Text(s) => s.clone(),
            Primitive::Many(v) => v.join(","),
        }
    }
}

/// Current (v2) captured field value: the primitive plus a best-effort
/// human label. The label is cosmetic and never consulted on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: Primitive,
    #[serde(default)]
    pub label: String,
}

/// A stored field value in either schema version. Legacy (v1) entries are
/// bare primitives; a value is v2 iff it is a JSON object with a `value`
/// member. Writers always produce [`StoredValue::Tagged`]; readers
/// normalize at the read boundary via [`StoredValue::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredValue {
    Tagged(FieldValue),
    Legacy(Primitive),
}

// Deserialized by hand: the derived untagged form would let a legacy array
// match `FieldValue` positionally, swallowing its first element as the
// value and the second as the label. Only an object with a `value` member
// is v2.
impl<'de> Deserialize<'de> for StoredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.as_object().is_some_and(|m| m.contains_key("value")) {
            serde_json::from_value(raw)
                .map(StoredValue::Tagged)
                .map_err(serde::de::Error::custom)
        } else {
            serde_json::from_value(raw)
                .map(StoredValue::Legacy)
                .map_err(serde::de::Error::custom)
        }
    }
}

impl StoredValue {
    pub fn tagged(value: Primitive, label: &str) -> Self {
        StoredValue::Tagged(FieldValue {
            value,
            label: label.to_string(),
        })
    }

    /// Normalize v1 → v2. Legacy entries gain an empty label.
    pub fn normalize(&self) -> FieldValue {
        match self {
            StoredValue::Tagged(v) => v.clone(),
            StoredValue::Legacy(p) => FieldValue {
                value: p.clone(),
                label: String::new(),
            },
        }
    }
}

/// Captured form data: field key → stored value.
pub type SnapshotData = BTreeMap<String, StoredValue>;

/// One saved capture of a form's field values.
///
/// Serialized field names stay camelCase so lists written by earlier
/// versions of the stored format load unchanged; the serde defaults cover
/// members those versions lacked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub uid: String,
    pub name: String,
    pub timestamp: String,
    /// Inter-field restore delay in ms; 0 means "use the global default".
    #[serde(default)]
    pub delay_override: u64,
    #[serde(default)]
    pub restore_hidden: bool,
    #[serde(default)]
    pub data: SnapshotData,
}

impl Snapshot {
    /// Build a fresh snapshot with a new uid. Without an explicit name the
    /// capture timestamp doubles as the display name.
    pub fn new(name: Option<&str>, data: SnapshotData, delay_override: u64, restore_hidden: bool) -> Self {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            uid: new_uid(),
            name: name.map(str::to_string).unwrap_or_else(|| timestamp.clone()),
            timestamp,
            delay_override,
            restore_hidden,
            data,
        }
    }
}

/// A snapshot annotated with its owning record identity, as produced by the
/// flattened cross-record listing used for global search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatSnapshot {
    pub identity: String,
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

impl FlatSnapshot {
    /// Case-insensitive match on display name or owning identity.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.snapshot.name.to_lowercase().contains(&query)
            || self.identity.to_lowercase().contains(&query)
    }
}

/// Hidden-field capture policy. Unrecognized stored values deserialize to
/// [`ListMode::Invalid`], which admits no field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    Whitelist,
    #[default]
    Blacklist,
    Invalid,
}

impl Serialize for ListMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            ListMode::Whitelist => "whitelist",
            ListMode::Blacklist => "blacklist",
            ListMode::Invalid => "invalid",
        })
    }
}

impl<'de> Deserialize<'de> for ListMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "whitelist" => ListMode::Whitelist,
            "blacklist" => ListMode::Blacklist,
            _ => ListMode::Invalid,
        })
    }
}

/// Per-identity capture preferences. Lifecycle is independent from the
/// snapshot list: prefs may exist with zero snapshots and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPrefs {
    pub save_hidden: bool,
    pub list_mode: ListMode,
    pub field_list: Vec<String>,
}

impl Default for FieldPrefs {
    fn default() -> Self {
        Self {
            save_hidden: false,
            list_mode: ListMode::Blacklist,
            field_list: Vec::new(),
        }
    }
}

pub const DEFAULT_ICON_POSITION: &str = "top-right";
pub const DEFAULT_RESTORE_DELAY_MS: u64 = 50;
pub const DEFAULT_ICON_SIZE: u32 = 30;

/// Global settings record. The engine consumes only `restore_delay`; the
/// rest belongs to the UI layer and is persisted wholesale so it
/// round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub icon_position: String,
    pub restore_delay: u64,
    pub icon_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            icon_position: DEFAULT_ICON_POSITION.to_string(),
            restore_delay: DEFAULT_RESTORE_DELAY_MS,
            icon_size: DEFAULT_ICON_SIZE,
        }
    }
}

/// Process-unique snapshot id: current time plus random entropy, base-36.
pub fn new_uid() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let noise: u64 = rand::thread_rng().gen();
    format!("{}{}", to_base36(millis), to_base36(noise))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_value_normalizes_with_empty_label() {
        let stored: StoredValue = serde_json::from_str("\"Alice\"").unwrap();
        assert_eq!(stored, StoredValue::Legacy(Primitive::Text("Alice".to_string())));
        let normalized = stored.normalize();
        assert_eq!(normalized.value, Primitive::Text("Alice".to_string()));
        assert_eq!(normalized.label, "");
    }

    #[test]
    fn tagged_value_round_trips() {
        let stored = StoredValue::tagged(Primitive::Bool(true), "Subscribe");
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(json, r#"{"value":true,"label":"Subscribe"}"#);
        let back: StoredValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.normalize().label, "Subscribe");
    }

    #[test]
    fn legacy_array_value_parses_as_many() {
        // A two-element array must stay a bare v1 list; it must not match
        // the v2 struct positionally (value="a", label="b").
        let stored: StoredValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(
            stored,
            StoredValue::Legacy(Primitive::Many(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            stored.normalize().value,
            Primitive::Many(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn only_objects_with_value_member_are_tagged() {
        let tagged: StoredValue = serde_json::from_str(r#"{"value":["a","b"]}"#).unwrap();
        assert_eq!(
            tagged,
            StoredValue::Tagged(FieldValue {
                value: Primitive::Many(vec!["a".to_string(), "b".to_string()]),
                label: String::new(),
            })
        );

        let legacy_bool: StoredValue = serde_json::from_str("true").unwrap();
        assert_eq!(legacy_bool, StoredValue::Legacy(Primitive::Bool(true)));
    }

    #[test]
    fn snapshot_tolerates_missing_legacy_members() {
        let json = r#"{"uid":"k2x","name":"old","timestamp":"2023-01-01"}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.delay_override, 0);
        assert!(!snapshot.restore_hidden);
        assert!(snapshot.data.is_empty());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = Snapshot::new(Some("draft"), SnapshotData::new(), 25, true);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["delayOverride"], 25);
        assert_eq!(json["restoreHidden"], true);
    }

    #[test]
    fn snapshot_without_name_uses_timestamp() {
        let snapshot = Snapshot::new(None, SnapshotData::new(), 0, false);
        assert_eq!(snapshot.name, snapshot.timestamp);
    }

    #[test]
    fn uids_are_unique() {
        let uids: std::collections::HashSet<String> = (0..64).map(|_| new_uid()).collect();
        assert_eq!(uids.len(), 64);
    }

    #[test]
    fn unknown_list_mode_parses_as_invalid() {
        let prefs: FieldPrefs =
            serde_json::from_str(r#"{"saveHidden":true,"listMode":"greylist","fieldList":[]}"#)
                .unwrap();
        assert_eq!(prefs.list_mode, ListMode::Invalid);
    }

    #[test]
    fn prefs_default_to_blacklist() {
        let prefs: FieldPrefs = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, FieldPrefs::default());
    }

    #[test]
    fn settings_default_round_trip() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.restore_delay, DEFAULT_RESTORE_DELAY_MS);
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["iconPosition"], "top-right");
    }

    #[test]
    fn flat_snapshot_matches_name_and_identity() {
        let flat = FlatSnapshot {
            identity: "example.com/checkout".to_string(),
            snapshot: Snapshot::new(Some("Billing draft"), SnapshotData::new(), 0, false),
        };
        assert!(flat.matches("billing"));
        assert!(flat.matches("EXAMPLE.com"));
        assert!(!flat.matches("login"));
    }
}
