//! Data model for index partitions, location records and archive slices.

use serde::{Deserialize, Deserializer, Serialize};

/// One time-bounded slice of the archive index, identified by its CDX query
/// endpoint. The list loaded at construction is never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Partition {
    #[serde(rename = "cdx-api")]
    pub cdx_api: String,
}

/// Where a capture's bytes live, as reported by one partition's index.
///
/// `offset`/`length` arrive from the CDX API as JSON strings; they are
/// deserialized into integers here so a negative or non-numeric value is
/// rejected at the wire boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub filename: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub offset: u64,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub length: u64,
    pub status: String,
    pub timestamp: String,
    /// Query endpoint of the partition this record came from. Provenance
    /// only; serialized as `index` to match the CDX-era output schema.
    #[serde(rename = "index", default)]
    pub partition: String,
}

/// The three segments of a stored capture after decompression: WARC header,
/// HTTP header, and the payload when one exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveSlice {
    pub warc_header: String,
    pub http_header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// A fully resolved capture: index metadata plus the fetched slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(flatten)]
    pub location: LocationRecord,
    #[serde(flatten)]
    pub slice: ArchiveSlice,
}

/// Answer to a `showNumPages` metadata query.
#[derive(Debug, Clone, Deserialize)]
pub struct PageCount {
    pub pages: u32,
}

fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
