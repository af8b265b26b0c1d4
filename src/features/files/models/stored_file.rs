use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::features::files::dtos::FileResponseDto;

/// A files table row. `metadata` is a free-form string map (JSONB) and
/// `tags` a text array; neither carries a schema beyond shape validation.
#[derive(Debug, Clone, FromRow)]
pub struct StoredFile {
    pub id: i32,
    pub filename: String,
    pub original_name: String,
    pub size: i64,
    pub mime_type: String,
    pub owner_id: i32,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: Json<HashMap<String, String>>,
    pub content: Option<String>,
    pub tags: Vec<String>,
}

impl From<StoredFile> for FileResponseDto {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            original_name: file.original_name,
            size: file.size,
            mime_type: file.mime_type,
            owner_id: file.owner_id,
            uploaded_at: file.uploaded_at,
            metadata: file.metadata.0,
            tags: file.tags,
        }
    }
}
