//! Domain enumeration over the partition indexes.
//!
//! Each partition is asked how many result pages it holds for the domain,
//! then every page is fetched as newline-delimited urlkeys. Keys are
//! converted back to plain URLs and deduplicated by first occurrence, in
//! partition-then-page-then-line order.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::types::{PageCount, Partition};
use crate::urlkey::{decode_url, urlkey_to_url};

/// All known HTML URLs for `domain`, unique, in discovery order.
pub async fn find_domain_urls(
    http: &reqwest::Client,
    partitions: &[Partition],
    domain: &str,
    retry: &RetryPolicy,
) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for partition in partitions {
        let pages = match page_count(http, partition, domain).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!(
                    partition = %partition.cdx_api,
                    error = %e,
                    "Page-count query failed, skipping partition"
                );
                continue;
            }
        };

        for page in 0..pages {
            match fetch_urlkey_page(http, partition, domain, page, retry).await {
                Some(body) => collect_urls(&body, &mut seen, &mut urls),
                None => warn!(
                    partition = %partition.cdx_api,
                    page,
                    "Giving up on index page after all attempts"
                ),
            }
        }
    }

    info!(domain, urls = urls.len(), "Domain enumeration finished");
    Ok(urls)
}

/// Number of result pages a partition holds for the domain.
async fn page_count(
    http: &reqwest::Client,
    partition: &Partition,
    domain: &str,
) -> Result<u32> {
    let params = [
        ("url", domain),
        ("matchType", "domain"),
        ("output", "json"),
        ("showNumPages", "true"),
        ("filter", "mime:text/html"),
    ];
    let count: PageCount = http
        .get(&partition.cdx_api)
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(count.pages)
}

/// Fetch one page of urlkeys. The index intermittently aborts mid-body
/// (chunked-transfer decode failures), so transport errors are retried on a
/// jittered schedule; `None` once the budget is spent.
async fn fetch_urlkey_page(
    http: &reqwest::Client,
    partition: &Partition,
    domain: &str,
    page: u32,
    retry: &RetryPolicy,
) -> Option<String> {
    let page_param = page.to_string();
    let params = [
        ("url", domain),
        ("matchType", "domain"),
        ("output", "text"),
        ("filter", "mime:text/html"),
        ("fl", "urlkey"),
        ("page", page_param.as_str()),
    ];

    for attempt in 1..=retry.query_attempts {
        let result = async {
            http.get(&partition.cdx_api)
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await;

        match result {
            Ok(body) => return Some(body),
            Err(e) => {
                warn!(
                    partition = %partition.cdx_api,
                    page,
                    attempt,
                    error = %e,
                    "Index page fetch failed, backing off"
                );
                if attempt < retry.query_attempts {
                    retry.query_backoff().await;
                }
            }
        }
    }
    None
}

/// Convert one response body's urlkey lines to URLs, appending first-seen
/// entries to `urls`. Malformed keys are dropped.
fn collect_urls(body: &str, seen: &mut HashSet<String>, urls: &mut Vec<String>) {
    for line in body.lines() {
        let Some(url) = urlkey_to_url(line) else {
            continue;
        };
        let url = decode_url(&url);
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_seen_order_across_pages() {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        // Two partitions' pages, visited in catalog order.
        collect_urls(
            "com,example)/a\ncom,example)/b\ncom,example)/a\n",
            &mut seen,
            &mut urls,
        );
        collect_urls(
            "com,example)/c\ncom,example)/b\n",
            &mut seen,
            &mut urls,
        );

        assert_eq!(
            urls,
            vec!["example.com/a", "example.com/b", "example.com/c"]
        );
    }

    #[test]
    fn malformed_keys_are_dropped_silently() {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        collect_urls("bogus-key\ncom,example)/ok\n", &mut seen, &mut urls);
        assert_eq!(urls, vec!["example.com/ok"]);
    }

    #[test]
    fn keys_are_percent_decoded_and_trimmed() {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        collect_urls("com,example)/a%20b \n", &mut seen, &mut urls);
        assert_eq!(urls, vec!["example.com/a b"]);
    }

    #[test]
    fn bare_domain_key_maps_to_domain_only() {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        collect_urls("com,example)/\n", &mut seen, &mut urls);
        assert_eq!(urls, vec!["example.com"]);
    }
}
