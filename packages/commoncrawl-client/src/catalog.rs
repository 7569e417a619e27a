//! Partition catalog discovery.
//!
//! The index host publishes `collinfo.json`, an array of crawl collections
//! ordered most-recent-first, each carrying its CDX query endpoint. The
//! catalog endpoint is flaky, so the load retries on a jittered schedule and
//! gives up with a fatal error once the budget is spent.

use tracing::warn;

use crate::error::{CrawlError, Result};
use crate::retry::RetryPolicy;
use crate::types::Partition;

/// Fetch the partition list, capped to the `recent` most recent entries
/// (0 = all). The service's own ordering is preserved.
pub async fn load_partitions(
    http: &reqwest::Client,
    index_host: &str,
    recent: usize,
    retry: &RetryPolicy,
) -> Result<Vec<Partition>> {
    let url = format!("{}/collinfo.json", index_host.trim_end_matches('/'));

    for attempt in 1..=retry.catalog_attempts {
        match http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let mut partitions: Vec<Partition> = resp.json().await?;
                if recent > 0 {
                    partitions.truncate(recent);
                }
                return Ok(partitions);
            }
            Ok(resp) => {
                warn!(
                    url = %url,
                    status = %resp.status(),
                    attempt,
                    "Partition catalog answered badly, backing off"
                );
            }
            Err(e) => {
                warn!(url = %url, error = %e, attempt, "Partition catalog unreachable, backing off");
            }
        }
        if attempt < retry.catalog_attempts {
            retry.catalog_backoff().await;
        }
    }

    Err(CrawlError::ServiceUnavailable {
        attempts: retry.catalog_attempts,
    })
}
