//! Blob storage seam.
//!
//! Archive payloads live in a public bucket and are read with byte-range
//! GETs. The trait keeps the client testable and leaves the choice of
//! transport open; the production implementation is a plain anonymous HTTP
//! range request, which is all public-bucket access requires.

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::RANGE;

use crate::error::{CrawlError, Result};

/// Capability to read a byte range out of a named stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read `range` (start inclusive, end exclusive) from the object `key`.
    async fn get_range(&self, key: &str, range: Range<u64>) -> Result<Bytes>;
}

/// Anonymous byte-range reads against a public bucket over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn get_range(&self, key: &str, range: Range<u64>) -> Result<Bytes> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        let resp = self
            .client
            .get(&url)
            .header(RANGE, format!("bytes={}-{}", range.start, range.end - 1))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlError::Storage {
                key: key.to_string(),
                message: format!("range GET returned {}", status),
            });
        }

        Ok(resp.bytes().await?)
    }
}
