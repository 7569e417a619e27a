//! Pure Common Crawl retrieval client.
//!
//! Locates and fetches historical page captures from the Common Crawl
//! archive: discovers the available index partitions, queries them for a
//! domain's known URLs or a single URL's capture location, and reads the
//! captured bytes (WARC header, HTTP header, HTML) out of public blob
//! storage with byte-range GETs. One level of HTTP redirection is resolved
//! transparently.
//!
//! # Example
//!
//! ```rust,ignore
//! use commoncrawl_client::{CommonCrawlClient, CrawlConfig};
//!
//! let client = CommonCrawlClient::connect(CrawlConfig::default()).await?;
//!
//! let urls = client.find_domain_urls("example.com").await?;
//! if let Some(page) = client.load_page_data("example.com/about", true).await? {
//!     println!("{}", page.slice.html.as_deref().unwrap_or("(no body)"));
//! }
//! ```

pub mod archive;
pub mod blob;
pub mod catalog;
pub mod error;
pub mod index;
pub mod locate;
pub mod retry;
pub mod types;
pub mod urlkey;

pub use blob::{BlobStore, HttpBlobStore};
pub use error::{CrawlError, Result};
pub use retry::RetryPolicy;
pub use types::{ArchiveSlice, LocationRecord, PageRecord, Partition};

use std::time::Duration;

use tracing::info;

const DEFAULT_INDEX_HOST: &str = "http://index.commoncrawl.org";
const DEFAULT_STORAGE_URL: &str = "https://commoncrawl.s3.amazonaws.com";

/// Client configuration. The defaults target the public Common Crawl
/// service and search only the most recent crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Host publishing the partition catalog (`collinfo.json`).
    pub index_host: String,
    /// Base URL of the blob storage bucket holding the WARC files.
    pub storage_url: String,
    /// How many of the most recent partitions to search (0 = all).
    pub recent_partitions: usize,
    /// Per-request timeout on the shared HTTP client.
    pub timeout: Duration,
    /// Retry budget and backoff jitter.
    pub retry: RetryPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_host: DEFAULT_INDEX_HOST.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            recent_partitions: 1,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl CrawlConfig {
    pub fn with_index_host(mut self, host: impl Into<String>) -> Self {
        self.index_host = host.into();
        self
    }

    pub fn with_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = url.into();
        self
    }

    pub fn with_recent_partitions(mut self, recent: usize) -> Self {
        self.recent_partitions = recent;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Common Crawl client. Holds one pooled HTTP client, the partition list
/// loaded at construction, and the blob storage handle; all of it is
/// read-only after construction and safe to share across tasks.
pub struct CommonCrawlClient<S: BlobStore = HttpBlobStore> {
    http: reqwest::Client,
    partitions: Vec<Partition>,
    store: S,
    retry: RetryPolicy,
}

impl CommonCrawlClient<HttpBlobStore> {
    /// Connect to the service: build the shared HTTP client and load the
    /// partition catalog. Fails with [`CrawlError::ServiceUnavailable`] when
    /// the catalog stays unreachable.
    pub async fn connect(config: CrawlConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let store = HttpBlobStore::new(http.clone(), config.storage_url.clone());
        Self::with_store(config, http, store).await
    }
}

impl<S: BlobStore> CommonCrawlClient<S> {
    /// Connect with a caller-supplied blob store (alternative transports,
    /// test doubles).
    pub async fn with_store(config: CrawlConfig, http: reqwest::Client, store: S) -> Result<Self> {
        let partitions = catalog::load_partitions(
            &http,
            &config.index_host,
            config.recent_partitions,
            &config.retry,
        )
        .await?;
        info!(partitions = partitions.len(), "Loaded partition catalog");

        Ok(Self {
            http,
            partitions,
            store,
            retry: config.retry,
        })
    }

    /// The loaded partitions, most recent first.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// All known HTML URLs for a domain, unique, in discovery order.
    pub async fn find_domain_urls(&self, domain: &str) -> Result<Vec<String>> {
        index::find_domain_urls(&self.http, &self.partitions, domain, &self.retry).await
    }

    /// The most relevant capture location for a URL, or `None` when no
    /// partition has it.
    pub async fn resolve_location(&self, url: &str) -> Result<Option<LocationRecord>> {
        locate::resolve(&self.http, &self.partitions, url, &self.retry).await
    }

    /// Fetch and parse the archive record at a known location.
    pub async fn fetch_slice(
        &self,
        filename: &str,
        offset: u64,
        length: u64,
    ) -> Result<ArchiveSlice> {
        archive::fetch_slice(&self.store, filename, offset, length).await
    }

    /// Load a URL's most recent capture. With `follow_redirect`, a capture
    /// whose stored status is a redirect is chased one hop: the target from
    /// its HTTP header is resolved and returned in its place when that
    /// succeeds. Never more than one hop.
    pub async fn load_page_data(
        &self,
        url: &str,
        follow_redirect: bool,
    ) -> Result<Option<PageRecord>> {
        let Some(page) = self.load_once(url).await? else {
            return Ok(None);
        };

        if follow_redirect {
            if let Some(target) = redirect_target(&page.location.status, &page.slice.http_header) {
                info!(url, target = %target, "Following stored redirect");
                if let Some(followed) = self.load_once(&target).await? {
                    return Ok(Some(followed));
                }
            }
        }

        Ok(Some(page))
    }

    /// Resolve-and-fetch for a single URL, no redirect handling.
    async fn load_once(&self, url: &str) -> Result<Option<PageRecord>> {
        let Some(location) = self.resolve_location(url).await? else {
            return Ok(None);
        };
        let slice = self
            .fetch_slice(&location.filename, location.offset, location.length)
            .await?;
        Ok(Some(PageRecord { location, slice }))
    }
}

/// Redirect target of a capture, when its stored status is a single-hop
/// redirect and its HTTP header names one.
fn redirect_target(status: &str, http_header: &str) -> Option<String> {
    if status == "301" || status == "302" {
        archive::location_header(http_header)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_overrides_defaults() {
        let config = CrawlConfig::default()
            .with_index_host("http://127.0.0.1:8080")
            .with_recent_partitions(3);
        assert_eq!(config.index_host, "http://127.0.0.1:8080");
        assert_eq!(config.recent_partitions, 3);
        assert_eq!(config.storage_url, DEFAULT_STORAGE_URL);
    }

    #[test]
    fn redirect_target_requires_redirect_status() {
        let header = "HTTP/1.1 301 Moved Permanently\r\nLocation: http://x/y";
        assert_eq!(redirect_target("301", header).as_deref(), Some("http://x/y"));
        assert_eq!(redirect_target("302", header).as_deref(), Some("http://x/y"));
        assert_eq!(redirect_target("200", header), None);
        assert_eq!(redirect_target("303", header), None);
    }

    #[test]
    fn redirect_target_requires_location_field() {
        let header = "HTTP/1.1 301 Moved Permanently\r\nServer: nginx";
        assert_eq!(redirect_target("301", header), None);
    }
}
