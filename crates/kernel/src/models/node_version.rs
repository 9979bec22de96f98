//! Node version model and the polymorphic content reference.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version type of the revision currently shown to visitors.
pub const VERSION_TYPE_PUBLIC: &str = "public";

/// Version type of a work-in-progress revision.
pub const VERSION_TYPE_DRAFT: &str = "draft";

/// Handle to a content entity of any registered type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    /// Fully qualified type tag (e.g., "app::entity::Page").
    pub entity_name: String,

    /// Identity of the content within its type.
    pub id: Uuid,
}

impl ContentRef {
    pub fn new(entity_name: impl Into<String>, id: Uuid) -> Self {
        Self {
            entity_name: entity_name.into(),
            id,
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_name, self.id)
    }
}

/// Node version record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NodeVersion {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Translation this version belongs to.
    pub node_translation_id: Uuid,

    /// "public" or "draft".
    pub version_type: String,

    /// Who created the version.
    pub owner: String,

    /// Identity of the referenced content.
    pub ref_id: Uuid,

    /// Type tag of the referenced content.
    pub ref_entity_name: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl NodeVersion {
    /// The content this version points at.
    pub fn content_ref(&self) -> ContentRef {
        ContentRef::new(self.ref_entity_name.clone(), self.ref_id)
    }

    pub fn is_public(&self) -> bool {
        self.version_type == VERSION_TYPE_PUBLIC
    }
}

/// Input for creating a node version.
#[derive(Debug, Clone)]
pub struct NewNodeVersion {
    pub version_type: String,
    pub owner: String,
    pub content: ContentRef,
}

impl NewNodeVersion {
    /// A public version of `content` owned by `owner`.
    pub fn public(owner: impl Into<String>, content: ContentRef) -> Self {
        Self {
            version_type: VERSION_TYPE_PUBLIC.to_string(),
            owner: owner.into(),
            content,
        }
    }
}
