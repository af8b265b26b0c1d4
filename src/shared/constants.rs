/// TTL for read-through cache entries (seconds)
pub const CACHE_TTL_SECS: u64 = 60;

/// Durable queue that receives every fan-out event
pub const QUEUE_NAME: &str = "app_messages";

/// Fixed delay between broker reconnection attempts (seconds)
pub const QUEUE_RECONNECT_DELAY_SECS: u64 = 5;

/// Cache key prefix for item lists
pub const CACHE_KIND_ITEMS: &str = "items";

/// Cache key prefix for file lists
pub const CACHE_KIND_FILES: &str = "files";
