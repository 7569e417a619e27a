//! Capture location lookup across partitions.
//!
//! Every loaded partition is asked for the URL's captures closest to the
//! current time, the answers are merged in partition order, and one record
//! is picked: the first `200` if any partition produced one, otherwise the
//! first record of any status. Partitions that answer badly contribute
//! nothing; the index sheds load with 503s, which are retried on a jittered
//! schedule up to the policy budget.

use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::types::{LocationRecord, Partition};

/// Current time in the index's `closest` timestamp format.
pub fn current_timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

/// Resolve `url` to the most relevant capture location, or `None` when no
/// partition knows the URL.
pub async fn resolve(
    http: &reqwest::Client,
    partitions: &[Partition],
    url: &str,
    retry: &RetryPolicy,
) -> Result<Option<LocationRecord>> {
    let closest = current_timestamp();
    let mut candidates = Vec::new();

    for partition in partitions {
        candidates.extend(locate_in_partition(http, partition, url, &closest, retry).await?);
    }

    debug!(url, candidates = candidates.len(), "Merged location candidates");
    Ok(most_relevant(candidates))
}

/// Query one partition for capture locations. A non-2xx, non-503 answer or
/// an exhausted 503 budget degrades to zero candidates.
async fn locate_in_partition(
    http: &reqwest::Client,
    partition: &Partition,
    url: &str,
    closest: &str,
    retry: &RetryPolicy,
) -> Result<Vec<LocationRecord>> {
    let params = [
        ("url", url),
        ("output", "json"),
        ("closest", closest),
        ("filter", "!status:404"),
        ("fl", "filename,length,offset,status,timestamp"),
    ];

    for attempt in 1..=retry.query_attempts {
        let resp = http.get(&partition.cdx_api).query(&params).send().await?;
        let status = resp.status();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            warn!(
                partition = %partition.cdx_api,
                attempt,
                "Partition shedding load, backing off"
            );
            if attempt < retry.query_attempts {
                retry.query_backoff().await;
            }
            continue;
        }

        if !status.is_success() {
            debug!(
                partition = %partition.cdx_api,
                status = %status,
                "Partition contributed no locations"
            );
            return Ok(Vec::new());
        }

        let body = resp.text().await?;
        return Ok(parse_locations(&body, &partition.cdx_api));
    }

    warn!(
        partition = %partition.cdx_api,
        attempts = retry.query_attempts,
        "Partition still shedding load after all attempts, skipping"
    );
    Ok(Vec::new())
}

/// Parse newline-delimited JSON location records, tagging each with the
/// partition it came from. Unparseable lines are dropped.
fn parse_locations(body: &str, partition: &str) -> Vec<LocationRecord> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<LocationRecord>(line) {
            Ok(mut record) => {
                record.partition = partition.to_string();
                Some(record)
            }
            Err(e) => {
                debug!(partition, error = %e, "Dropping unparseable location line");
                None
            }
        })
        .collect()
}

/// First candidate with status `200`, else the first candidate of any
/// status. Input order is partition-query order and is never re-sorted.
fn most_relevant(candidates: Vec<LocationRecord>) -> Option<LocationRecord> {
    if let Some(pos) = candidates.iter().position(|c| c.status == "200") {
        return candidates.into_iter().nth(pos);
    }
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, timestamp: &str) -> LocationRecord {
        LocationRecord {
            filename: "seg/x.warc.gz".into(),
            offset: 100,
            length: 50,
            status: status.into(),
            timestamp: timestamp.into(),
            partition: "https://index.example/a-index".into(),
        }
    }

    #[test]
    fn first_two_hundred_wins_in_input_order() {
        let picked = most_relevant(vec![
            record("404", "20240101000008"),
            record("200", "20240101000005"),
            record("200", "20240101000009"),
        ])
        .unwrap();
        assert_eq!(picked.status, "200");
        // Never reordered by timestamp: the later-listed ts:9 entry loses.
        assert_eq!(picked.timestamp, "20240101000005");
    }

    #[test]
    fn all_non_two_hundred_falls_back_to_first() {
        let picked = most_relevant(vec![record("302", "1"), record("404", "2")]).unwrap();
        assert_eq!(picked.status, "302");
    }

    #[test]
    fn empty_candidate_list_yields_none() {
        assert_eq!(most_relevant(Vec::new()).map(|c| c.status), None);
    }

    #[test]
    fn parse_tags_records_with_their_partition() {
        let body = concat!(
            r#"{"filename":"a.warc.gz","length":"10","offset":"0","status":"200","timestamp":"20240101000000"}"#,
            "\n",
            "not json at all\n",
            r#"{"filename":"b.warc.gz","length":"20","offset":"5","status":"301","timestamp":"20240102000000"}"#,
            "\n",
        );
        let records = parse_locations(body, "https://index.example/a-index");
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.partition == "https://index.example/a-index"));
        assert_eq!(records[1].filename, "b.warc.gz");
    }

    #[test]
    fn timestamp_format_is_fourteen_digits() {
        let ts = current_timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.bytes().all(|b| b.is_ascii_digit()));
    }
}
