//! Node translation model: language-specific presentation data for a node.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node translation record. One per (node, language).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NodeTranslation {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Node this translation belongs to.
    pub node_id: Uuid,

    /// Language code (e.g., "en", "nl").
    pub lang: String,

    /// Display title.
    pub title: String,

    /// This node's own path segment.
    pub slug: Option<String>,

    /// Full slug path from the top of the tree.
    pub url: Option<String>,

    /// Sort weight among siblings (lower = earlier).
    pub weight: i32,

    /// Whether the translation is published.
    pub online: bool,

    /// Currently published version, if any.
    pub public_node_version_id: Option<Uuid>,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl NodeTranslation {
    /// The full slug used as this translation's url.
    pub fn full_slug(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether the translation is visible given the offline policy.
    pub fn is_visible(&self, include_offline: bool) -> bool {
        self.online || include_offline
    }
}

/// Input for creating a node translation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNodeTranslation {
    pub node_id: Uuid,
    pub lang: String,
    pub title: String,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub weight: i32,
    pub online: bool,
}
