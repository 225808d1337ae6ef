use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormVaultError {
    /// Backend key-value failure. Host-provided `KeyValue` implementations
    /// map their transport errors into this variant.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),
}
