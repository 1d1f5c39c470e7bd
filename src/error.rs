use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backup stream error: {0}")]
    Stream(#[from] StreamError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Failures that stop a whole pass, as opposed to the per-entity errors
/// collected in a report.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("backup file not found: {0}")]
    FileNotFound(String),
    #[error("unable to open backup stream: {0}")]
    UnableToOpenFileStream(String),
    #[error("hmac validation failed on backup file")]
    HmacValidationFailedOnEncryptedFile,
    #[error("invalid byte length delimiter: {0}")]
    InvalidByteLengthDelimiter(String),
    #[error("proto deserialization error: {0}")]
    ProtoDeserializationError(#[from] prost::DecodeError),
    #[error("backup stream does not start with a BackupInfo header")]
    MissingBackupInfo,
    #[error("frame {found} written after {current}")]
    FrameOutOfOrder {
        current: &'static str,
        found: &'static str,
    },
}
