use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed edge: `follower` receives `followed`'s posts in their feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
}
