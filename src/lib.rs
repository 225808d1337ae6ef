pub mod capture;
pub mod classify;
pub mod error;
pub mod form;
pub mod identity;
pub mod restore;
pub mod schema;
pub mod store;

pub use capture::{capture_all, capture_structure};
pub use error::FormVaultError;
pub use form::{
    FieldControl, FieldStyle, FormDocument, FormLabel, LiveField, LiveForm, SelectOption,
};
pub use identity::{field_key, field_label, record_identity};
pub use restore::{ChangeKind, ChangeNotifier, NullNotifier, RestoreEngine, RestoreReport};
pub use schema::{
    FieldPrefs, FieldValue, FlatSnapshot, ListMode, Primitive, Settings, Snapshot, SnapshotData,
    StoredValue,
};
pub use store::{FileStore, KeyValue, MemoryStore, SnapshotStore, MAX_SNAPSHOTS};

/// Re-export commonly used result type
pub type Result<T> = std::result::Result<T, FormVaultError>;
