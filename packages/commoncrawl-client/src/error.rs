//! Error types for the Common Crawl client.

use thiserror::Error;

/// Result type for Common Crawl client operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Common Crawl client errors.
///
/// Only failures the client cannot degrade around become errors. A URL with
/// no capture is `Ok(None)` from the lookup methods, and a partition that
/// answers badly simply contributes no candidates.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The partition catalog could not be fetched within the attempt budget.
    /// Fatal: nothing works without the partition list.
    #[error("partition catalog unreachable after {attempts} attempts")]
    ServiceUnavailable { attempts: u32 },

    /// Transport failure that no retry rule covers.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Byte-range read from blob storage failed.
    #[error("blob storage read of {key} failed: {message}")]
    Storage { key: String, message: String },

    /// The stored gzip member could not be decompressed.
    #[error("failed to decompress archive record: {0}")]
    Decompress(#[from] std::io::Error),

    /// A resolved location cannot describe a valid fetch (e.g. zero length).
    #[error("malformed location record: {0}")]
    MalformedRecord(String),
}
