//! Node model: one position in the nested-set content tree.
//!
//! Every node carries `lft`/`rgt` bounds. A node's descendants are exactly the
//! nodes whose bounds lie strictly inside its own, so ancestor and descendant
//! lookups are range checks rather than recursive walks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Node {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Parent node, `None` for top-level nodes.
    pub parent_id: Option<Uuid>,

    /// Left nested-set bound.
    pub lft: i32,

    /// Right nested-set bound.
    pub rgt: i32,

    /// Depth in the tree (top-level nodes are 0).
    pub lvl: i32,

    /// Soft-delete flag; deleted nodes never show up in filtered queries.
    pub deleted: bool,

    /// Keep the node reachable but out of navigation menus.
    pub hidden_from_nav: bool,

    /// Role tag used to look nodes up by purpose instead of position.
    pub internal_name: Option<String>,

    /// Type tag of the content this node points at.
    pub ref_entity_name: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl Node {
    /// Whether this node is a top-level node.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        self.lft <= other.lft && self.rgt >= other.rgt
    }

    /// Number of descendants, derived from the bounds.
    pub fn descendant_count(&self) -> i32 {
        (self.rgt - self.lft - 1) / 2
    }
}

/// Input for creating a node.
///
/// Bounds and depth are assigned by the store when the node is appended.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNode {
    pub parent_id: Option<Uuid>,
    pub internal_name: Option<String>,
    pub ref_entity_name: String,
    pub hidden_from_nav: bool,
}

/// Flattened per-node row used to assemble a whole menu in one query.
///
/// Weight and title come from the requested language when present, otherwise
/// from another translation of the same node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuNode {
    pub id: Uuid,
    pub parent: Option<Uuid>,
    pub weight: Option<i32>,
    pub title: Option<String>,
    pub online: bool,
}
