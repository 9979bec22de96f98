//! Storage backend trait for the node tree.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::acl::AccessScope;
use crate::models::{
    ContentRef, MenuNode, NewNode, NewNodeTranslation, NewNodeVersion, Node, NodeTranslation,
    NodeVersion,
};

/// Which parents a query accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    /// Any parent, top-level nodes included.
    #[default]
    Any,
    /// Top-level nodes only.
    Root,
    /// Children of this node only.
    Node(Uuid),
}

impl From<Option<Uuid>> for ParentFilter {
    fn from(parent_id: Option<Uuid>) -> Self {
        match parent_id {
            Some(id) => Self::Node(id),
            None => Self::Root,
        }
    }
}

/// Node tree storage backend.
///
/// Every query except the `find_*` lookups skips deleted nodes.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Find a node by id, deleted or not.
    async fn find_node(&self, id: Uuid) -> Result<Option<Node>>;

    /// Children of `parent_id` (top level for `None`), left-joined with their
    /// `lang` translation and ordered by its weight then title.
    async fn child_nodes(
        &self,
        parent_id: Option<Uuid>,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<Node>>;

    /// All top-level nodes, unfiltered by language or permission.
    async fn top_level_nodes(&self) -> Result<Vec<Node>>;

    /// Nodes whose bounds contain `[lft, rgt]`, ordered by `lft`.
    /// With `lang`, nodes lacking that translation are dropped.
    async fn containing_nodes(&self, lft: i32, rgt: i32, lang: Option<&str>) -> Result<Vec<Node>>;

    async fn nodes_by_internal_name(
        &self,
        internal_name: &str,
        lang: &str,
        parent: ParentFilter,
        include_offline: bool,
    ) -> Result<Vec<Node>>;

    /// First node (by `lft`) with a translation whose slug is `slug`.
    async fn find_by_slug(&self, parent: ParentFilter, slug: &str) -> Result<Option<Node>>;

    /// Flattened menu rows with per-language fallback.
    async fn menu_nodes(
        &self,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<MenuNode>>;

    async fn find_translation(&self, id: Uuid) -> Result<Option<NodeTranslation>>;

    /// Translation of a node in `lang`, regardless of online state.
    async fn translation_for(&self, node_id: Uuid, lang: &str) -> Result<Option<NodeTranslation>>;

    async fn find_version(&self, id: Uuid) -> Result<Option<NodeVersion>>;

    /// First version referencing `content`.
    async fn find_version_by_ref(&self, content: &ContentRef) -> Result<Option<NodeVersion>>;

    /// Append a node as last child of its parent (or as a new top-level node),
    /// shifting bounds to keep the nested set consistent.
    async fn insert_node(&self, node: NewNode) -> Result<Node>;

    /// Insert a translation plus its first version and publish that version,
    /// atomically.
    async fn insert_translation(
        &self,
        translation: NewNodeTranslation,
        version: NewNodeVersion,
    ) -> Result<(NodeTranslation, NodeVersion)>;
}
