use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::items::dtos::{CreateItemDto, ItemResponseDto, UpdateItemDto};
use crate::features::items::models::Item;
use crate::modules::cache::{self, CacheClient};
use crate::modules::metrics;
use crate::shared::constants::CACHE_KIND_ITEMS;

/// Service for item operations. Every query is scoped by `owner_id`, which
/// is the only isolation mechanism between tenants.
pub struct ItemService {
    pool: PgPool,
    cache: CacheClient,
}

impl ItemService {
    pub fn new(pool: PgPool, cache: CacheClient) -> Self {
        Self { pool, cache }
    }

    /// List the owner's items, newest first, through the read-through cache.
    /// A cache outage degrades to a direct store query, never an error.
    pub async fn list(&self, owner_id: i32) -> Result<Vec<ItemResponseDto>> {
        let key = cache::owner_key(CACHE_KIND_ITEMS, owner_id);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                if let Ok(items) = serde_json::from_str::<Vec<ItemResponseDto>>(&cached) {
                    metrics::record_cache_hit();
                    return Ok(items);
                }
                // Unparseable entry: fall through to the store
                tracing::warn!(key, "Discarding corrupt cache entry");
            }
            Ok(None) => metrics::record_cache_miss(),
            Err(e) => tracing::warn!(key, error = %e, "Cache read failed, querying store"),
        }

        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM items
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list items: {:?}", e);
            AppError::Database(e)
        })?;

        let items: Vec<ItemResponseDto> = items.into_iter().map(|i| i.into()).collect();

        if let Ok(serialized) = serde_json::to_string(&items) {
            if let Err(e) = self.cache.set(&key, &serialized).await {
                tracing::warn!(key, error = %e, "Cache write failed");
            }
        }

        Ok(items)
    }

    pub async fn create(&self, owner_id: i32, dto: CreateItemDto) -> Result<ItemResponseDto> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(dto.name.trim())
        .bind(dto.description.as_deref())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create item: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(item_id = item.id, owner_id, "Item created");
        Ok(item.into())
    }

    /// Partial update through fixed COALESCE assignments. Zero rows touched
    /// means the id does not exist for this owner: not-found, not an error.
    pub async fn update(
        &self,
        owner_id: i32,
        id: i32,
        dto: UpdateItemDto,
    ) -> Result<ItemResponseDto> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(dto.name.as_deref())
        .bind(dto.description.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update item: {:?}", e);
            AppError::Database(e)
        })?;

        item.map(|i| i.into())
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    pub async fn delete(&self, owner_id: i32, id: i32) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM items
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete item: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        tracing::info!(item_id = id, owner_id, "Item deleted");
        Ok(())
    }
}
