//! Error types for smartbowl-store.

/// Result type for smartbowl-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in smartbowl-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A store was configured with a capacity it cannot honor.
    #[error("Invalid series capacity {0}: must be at least 1")]
    InvalidCapacity(usize),

    /// The time zone name is not a known IANA zone.
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// An instant could not be represented while resolving local time.
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    /// Device not found in the registry.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device already registered.
    #[error("Device already exists: {0}")]
    DeviceExists(String),

    /// CSV encoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer could not hand back its buffer.
    #[error("CSV buffer error: {0}")]
    CsvBuffer(String),
}
