//! Archive record fetch and parse.
//!
//! A capture is stored as one gzip member inside a much larger WARC file;
//! the index gives its byte offset and length. Decompressed, the record is
//! text in three `\r\n\r\n`-separated segments: WARC header, HTTP header,
//! and the payload. The payload segment is missing for bodyless captures,
//! which is a valid record, not an error.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::blob::BlobStore;
use crate::error::{CrawlError, Result};
use crate::types::ArchiveSlice;

/// Fetch and parse the record at `(filename, offset, length)` in blob
/// storage.
pub async fn fetch_slice(
    store: &impl BlobStore,
    filename: &str,
    offset: u64,
    length: u64,
) -> Result<ArchiveSlice> {
    if length == 0 {
        return Err(CrawlError::MalformedRecord(format!(
            "{} at offset {} has zero length",
            filename, offset
        )));
    }
    // offset and length come straight from index-supplied JSON; a corrupt
    // line must not overflow the range arithmetic.
    let end = offset.checked_add(length).ok_or_else(|| {
        CrawlError::MalformedRecord(format!(
            "{} at offset {} with length {} overflows the object range",
            filename, offset, length
        ))
    })?;

    debug!(filename, offset, length, "Fetching archive record");
    let compressed = store.get_range(filename, offset..end).await?;

    let mut decoder = GzDecoder::new(compressed.as_ref());
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;

    // Captured bytes are not guaranteed to be valid UTF-8; replace rather
    // than fail.
    let text = String::from_utf8_lossy(&raw);
    split_record(&text)
}

/// Split a decompressed record into its WARC header, HTTP header and
/// optional payload segments.
pub fn split_record(text: &str) -> Result<ArchiveSlice> {
    let mut parts = text.trim().splitn(3, "\r\n\r\n");
    let warc_header = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CrawlError::MalformedRecord("empty archive record".into()))?;
    let http_header = parts.next().ok_or_else(|| {
        CrawlError::MalformedRecord("archive record has no protocol header segment".into())
    })?;

    Ok(ArchiveSlice {
        warc_header: warc_header.to_string(),
        http_header: http_header.to_string(),
        html: parts.next().map(str::to_string),
    })
}

/// Extract the `Location` field from a raw HTTP header block, discarding the
/// status line. Field name matching is case-insensitive. Returns `None` when
/// the header carries no target (or is too mangled to have one).
pub fn location_header(http_header: &str) -> Option<String> {
    let (_status_line, fields) = http_header.split_once("\r\n")?;
    for line in fields.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("location") {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}
