use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verified token claims carried through request extensions. The id is the
/// owner identity scoping every item/file row, cache key and realtime group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub name: String,
}
