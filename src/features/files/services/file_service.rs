use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{FileResponseDto, UpdateFileMetadataDto};
use crate::features::files::models::StoredFile;
use crate::modules::cache::{self, CacheClient};
use crate::modules::metrics;
use crate::shared::constants::CACHE_KIND_FILES;
use crate::shared::validation::validate_tags;

const FILE_COLUMNS: &str =
    "id, filename, original_name, size, mime_type, owner_id, uploaded_at, metadata, content, tags";

/// Service for file upload, search and download. Bytes live on local disk
/// under the configured upload directory; everything else lives in the row.
pub struct FileService {
    pool: PgPool,
    cache: CacheClient,
    storage: StorageConfig,
}

impl FileService {
    pub fn new(pool: PgPool, cache: CacheClient, storage: StorageConfig) -> Self {
        Self {
            pool,
            cache,
            storage,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.storage.max_file_size
    }

    /// Persist an upload: bytes to disk under a generated name, the record
    /// to the store. `text/*` payloads are also kept as searchable content.
    pub async fn store_upload(
        &self,
        owner_id: i32,
        original_name: &str,
        mime_type: &str,
        bytes: &[u8],
        metadata: HashMap<String, String>,
        tags: Vec<String>,
    ) -> Result<FileResponseDto> {
        if bytes.len() > self.storage.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File exceeds maximum size of {} bytes",
                self.storage.max_file_size
            )));
        }
        validate_tags(&tags).map_err(AppError::Validation)?;

        let filename = generated_filename(original_name);
        let path = PathBuf::from(&self.storage.upload_dir).join(&filename);

        tokio::fs::create_dir_all(&self.storage.upload_dir)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create upload directory: {:?}", e);
                AppError::Internal("Failed to store file".to_string())
            })?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write uploaded file: {:?}", e);
            AppError::Internal("Failed to store file".to_string())
        })?;

        let content = if mime_type.starts_with("text/") {
            Some(String::from_utf8_lossy(bytes).into_owned())
        } else {
            None
        };

        let file = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            INSERT INTO files (filename, original_name, size, mime_type, owner_id, metadata, content, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(&filename)
        .bind(original_name)
        .bind(bytes.len() as i64)
        .bind(mime_type)
        .bind(owner_id)
        .bind(Json(metadata))
        .bind(content.as_deref())
        .bind(&tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert file record: {:?}", e);
            AppError::Database(e)
        })?;

        metrics::record_file_upload(mime_type);
        tracing::info!(
            file_id = file.id,
            owner_id,
            size = file.size,
            "File uploaded"
        );
        Ok(file.into())
    }

    /// List the owner's files, newest first, through the read-through cache.
    pub async fn list(&self, owner_id: i32) -> Result<Vec<FileResponseDto>> {
        let key = cache::owner_key(CACHE_KIND_FILES, owner_id);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                if let Ok(files) = serde_json::from_str::<Vec<FileResponseDto>>(&cached) {
                    metrics::record_cache_hit();
                    return Ok(files);
                }
                tracing::warn!(key, "Discarding corrupt cache entry");
            }
            Ok(None) => metrics::record_cache_miss(),
            Err(e) => tracing::warn!(key, error = %e, "Cache read failed, querying store"),
        }

        let files = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner_id = $1
            ORDER BY uploaded_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list files: {:?}", e);
            AppError::Database(e)
        })?;

        let files: Vec<FileResponseDto> = files.into_iter().map(|f| f.into()).collect();

        if let Ok(serialized) = serde_json::to_string(&files) {
            if let Err(e) = self.cache.set(&key, &serialized).await {
                tracing::warn!(key, error = %e, "Cache write failed");
            }
        }

        Ok(files)
    }

    /// Files carrying at least one of the given tags (array overlap).
    pub async fn search_by_tags(
        &self,
        owner_id: i32,
        tags: &[String],
    ) -> Result<Vec<FileResponseDto>> {
        let files = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner_id = $1 AND tags && $2
            ORDER BY uploaded_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(tags)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to search files by tags: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(files.into_iter().map(|f| f.into()).collect())
    }

    /// Files whose metadata contains the exact `{key: value}` pair.
    pub async fn search_by_metadata(
        &self,
        owner_id: i32,
        key: &str,
        value: &str,
    ) -> Result<Vec<FileResponseDto>> {
        let needle = serde_json::json!({ key: value });

        let files = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner_id = $1 AND metadata @> $2
            ORDER BY uploaded_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(needle)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to search files by metadata: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(files.into_iter().map(|f| f.into()).collect())
    }

    /// Files whose extracted text contains the query, case-insensitively.
    pub async fn search_by_content(
        &self,
        owner_id: i32,
        query: &str,
    ) -> Result<Vec<FileResponseDto>> {
        let pattern = format!("%{}%", escape_like(query));

        let files = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner_id = $1 AND content ILIKE $2
            ORDER BY uploaded_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to search files by content: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(files.into_iter().map(|f| f.into()).collect())
    }

    /// Amend a file record: metadata keys merge into the existing map, tags
    /// replace the existing set. Zero rows means not found for this owner.
    pub async fn update_metadata(
        &self,
        owner_id: i32,
        id: i32,
        dto: UpdateFileMetadataDto,
    ) -> Result<FileResponseDto> {
        if let Some(tags) = &dto.tags {
            validate_tags(tags).map_err(AppError::Validation)?;
        }

        let file = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            UPDATE files
            SET metadata = CASE WHEN $3::jsonb IS NULL THEN metadata ELSE metadata || $3 END,
                tags = COALESCE($4, tags)
            WHERE id = $1 AND owner_id = $2
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(dto.metadata.map(Json))
        .bind(dto.tags.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update file metadata: {:?}", e);
            AppError::Database(e)
        })?;

        file.map(|f| f.into())
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Resolve a stored filename to its record and on-disk path, scoped to
    /// the owner. A foreign-owned filename is indistinguishable from a
    /// missing one.
    pub async fn open_download(
        &self,
        owner_id: i32,
        filename: &str,
    ) -> Result<(FileResponseDto, PathBuf)> {
        let file = sqlx::query_as::<_, StoredFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
            FROM files
            WHERE owner_id = $1 AND filename = $2
            "#
        ))
        .bind(owner_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up file: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let path = PathBuf::from(&self.storage.upload_dir).join(&file.filename);
        Ok((file.into(), path))
    }
}

/// Disk name for an upload: a fresh UUID, keeping the original extension.
fn generated_filename(original_name: &str) -> String {
    match Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_filename_keeps_extension() {
        let name = generated_filename("report.pdf");
        assert!(name.ends_with(".pdf"));
        assert_ne!(name, "report.pdf");
    }

    #[test]
    fn test_generated_filename_without_extension() {
        let name = generated_filename("README");
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_generated_filenames_are_unique() {
        assert_ne!(generated_filename("a.txt"), generated_filename("a.txt"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
