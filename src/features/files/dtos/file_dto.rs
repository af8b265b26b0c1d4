use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

/// Response DTO for an uploaded file. Extracted text content is never
/// echoed back; it is only reachable through the content search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    pub id: i32,
    pub filename: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub owner_id: i32,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
    pub tags: Vec<String>,
}

/// Typed partial update for a file's metadata and tags. Metadata keys are
/// merged into the existing map; tags replace the existing set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateFileMetadataDto {
    pub metadata: Option<HashMap<String, String>>,
    pub tags: Option<Vec<String>>,
}

impl UpdateFileMetadataDto {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_none() && self.tags.is_none()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TagSearchQuery {
    /// Comma-separated list of tags; any overlap matches
    pub tags: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MetadataSearchQuery {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ContentSearchQuery {
    /// Case-insensitive substring matched against extracted text
    pub q: String,
}

/// Parse a multipart `tags` field: a JSON array of strings or a comma list.
pub fn parse_tags(raw: &str) -> Result<Vec<String>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw)
            .map_err(|_| "Tags must be a JSON array of strings".to_string());
    }

    Ok(raw
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// Parse a multipart `metadata` field: a JSON object with string values.
pub fn parse_metadata(raw: &str) -> Result<HashMap<String, String>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(HashMap::new());
    }

    serde_json::from_str::<HashMap<String, String>>(raw)
        .map_err(|_| "Metadata must be a JSON object with string values".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_json_array() {
        let tags = parse_tags(r#"["q1", "budget"]"#).unwrap();
        assert_eq!(tags, vec!["q1", "budget"]);
    }

    #[test]
    fn test_parse_tags_comma_list() {
        let tags = parse_tags("q1, budget , fiscal").unwrap();
        assert_eq!(tags, vec!["q1", "budget", "fiscal"]);
    }

    #[test]
    fn test_parse_tags_empty() {
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tags_rejects_malformed_json() {
        assert!(parse_tags(r#"["unclosed"#).is_err());
        assert!(parse_tags(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_parse_metadata() {
        let meta = parse_metadata(r#"{"department": "finance", "year": "2025"}"#).unwrap();
        assert_eq!(meta.get("department").map(String::as_str), Some("finance"));
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_parse_metadata_rejects_non_string_values() {
        assert!(parse_metadata(r#"{"count": 3}"#).is_err());
        assert!(parse_metadata(r#"["not", "a", "map"]"#).is_err());
    }

    #[test]
    fn test_update_dto_empty_detection() {
        let empty = UpdateFileMetadataDto {
            metadata: None,
            tags: None,
        };
        assert!(empty.is_empty());

        let tags_only = UpdateFileMetadataDto {
            metadata: None,
            tags: Some(vec!["q1".to_string()]),
        };
        assert!(!tags_only.is_empty());
    }
}
