//! Wire DTOs for the Make API.
//!
//! # Design
//! The server owns the Make schema; every attribute besides the identifier
//! defaults when absent or `null` so partially populated records still parse. Field
//! names follow the server's camelCase, and the identifier travels as `_id`.

use serde::{Deserialize, Deserializer, Serialize};

/// A single Make record as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MakeData {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editurl: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a search response. Both fields may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub makes: Option<Vec<MakeData>>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Request body of like, unlike, report and cancelReport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MakerBody {
    pub maker: String,
}

/// Response body of `remixCount`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemixCount {
    pub count: u64,
}

/// Optional time bounds for `remixCount`, in milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemixRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// One tag suggestion from the `tags` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub term: String,
    #[serde(default)]
    pub count: u64,
}

/// Response body of the `tags` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagSuggestions {
    #[serde(default)]
    pub tags: Vec<TagCount>,
    #[serde(default)]
    pub total: u64,
}
