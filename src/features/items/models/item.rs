use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::items::dtos::ItemResponseDto;

/// Database model for an owner-scoped item
#[derive(Debug, Clone, FromRow)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemResponseDto {
    fn from(i: Item) -> Self {
        Self {
            id: i.id,
            name: i.name,
            description: i.description,
            owner_id: i.owner_id,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}
