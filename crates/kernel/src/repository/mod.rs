//! Node tree repository.
//!
//! [`NodeRepository`] is the query service menus and breadcrumbs are built
//! from. It resolves ACL scopes, walks slug paths and creates nodes; the
//! actual queries are delegated to a [`NodeStore`] backend.

mod memory;
mod postgres;
mod store;

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::acl::{AclHelper, PermissionDefinition};
use crate::content::HasNode;
use crate::error::{NodeError, NodeResult};
use crate::menu::MenuTreeNode;
use crate::models::{
    MenuNode, NewNode, NewNodeTranslation, NewNodeVersion, Node, NodeTranslation, NodeVersion,
};
use crate::slug;

pub use memory::MemoryNodeStore;
pub use postgres::PgNodeStore;
pub use store::{NodeStore, ParentFilter};

/// Query service over the persisted node tree.
#[derive(Clone)]
pub struct NodeRepository {
    store: Arc<dyn NodeStore>,
}

impl NodeRepository {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    pub async fn find_node(&self, id: Uuid) -> NodeResult<Option<Node>> {
        Ok(self.store.find_node(id).await?)
    }

    /// Children of a node (top-level nodes for `None`) the actor may access
    /// for `permission`, ordered by weight then title in `lang`.
    pub async fn child_nodes(
        &self,
        parent_id: Option<Uuid>,
        lang: &str,
        permission: &str,
        acl: &dyn AclHelper,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<Node>> {
        let scope = acl
            .access_scope(&PermissionDefinition::for_nodes(permission))
            .await?;
        let nodes = self
            .store
            .child_nodes(parent_id, lang, include_hidden_from_nav, &scope)
            .await?;

        debug!(
            parent = ?parent_id,
            lang,
            permission,
            count = nodes.len(),
            "fetched child nodes"
        );
        Ok(nodes)
    }

    pub async fn top_nodes(
        &self,
        lang: &str,
        permission: &str,
        acl: &dyn AclHelper,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<Node>> {
        self.child_nodes(None, lang, permission, acl, include_hidden_from_nav)
            .await
    }

    /// Every non-deleted top-level node, for administrative use.
    pub async fn all_top_nodes(&self) -> NodeResult<Vec<Node>> {
        Ok(self.store.top_level_nodes().await?)
    }

    /// The ancestor chain of `node`, root first, ending with the node itself.
    pub async fn all_parents(
        &self,
        node: Option<&Node>,
        lang: Option<&str>,
    ) -> NodeResult<Vec<Node>> {
        let Some(node) = node else {
            return Ok(Vec::new());
        };

        Ok(self.store.containing_nodes(node.lft, node.rgt, lang).await?)
    }

    pub async fn nodes_by_internal_name(
        &self,
        internal_name: &str,
        lang: &str,
        parent: ParentFilter,
        include_offline: bool,
    ) -> NodeResult<Vec<Node>> {
        Ok(self
            .store
            .nodes_by_internal_name(internal_name, lang, parent, include_offline)
            .await?)
    }

    /// The node owning a version of `content`.
    pub async fn node_for(&self, content: &dyn HasNode) -> NodeResult<Option<Node>> {
        let Some(content_ref) = content.content_ref() else {
            return Ok(None);
        };

        let Some(version) = self.store.find_version_by_ref(&content_ref).await? else {
            return Ok(None);
        };
        self.node_for_version(&version).await
    }

    pub async fn node_for_id_and_entity_name(
        &self,
        id: Uuid,
        entity_name: &str,
    ) -> NodeResult<Option<Node>> {
        let content_ref = crate::models::ContentRef::new(entity_name, id);
        let Some(version) = self.store.find_version_by_ref(&content_ref).await? else {
            return Ok(None);
        };
        self.node_for_version(&version).await
    }

    async fn node_for_version(&self, version: &NodeVersion) -> NodeResult<Option<Node>> {
        let Some(translation) = self.store.find_translation(version.node_translation_id).await?
        else {
            return Ok(None);
        };
        Ok(self.store.find_node(translation.node_id).await?)
    }

    /// Walk a `/`-separated slug path and return the deepest node matched.
    ///
    /// Each matched segment becomes the parent for the next lookup. A segment
    /// that matches nothing is skipped and the walk carries on from the last
    /// match, so the result may be an ancestor of what the path names.
    pub async fn node_for_slug(
        &self,
        parent: Option<&Node>,
        slug_path: &str,
    ) -> NodeResult<Option<Node>> {
        let mut cursor = parent.map(|p| p.id);
        let mut result = None;

        for segment in slug::segments(slug_path) {
            let filter = match cursor {
                Some(id) => ParentFilter::Node(id),
                None => ParentFilter::Any,
            };

            match self.store.find_by_slug(filter, segment).await? {
                Some(found) => {
                    cursor = Some(found.id);
                    result = Some(found);
                }
                None => debug!(segment, path = slug_path, "slug segment not found, skipping"),
            }
        }

        Ok(result)
    }

    /// Create a node for `content`, together with its `lang` translation and
    /// first public version.
    ///
    /// The node is attached under the node of the content's parent when that
    /// parent already has one. Content without an id is rejected.
    pub async fn create_node_for(
        &self,
        content: &dyn HasNode,
        lang: &str,
        owner: &str,
        internal_name: Option<&str>,
    ) -> NodeResult<Node> {
        if content.id().is_none() {
            return Err(NodeError::InvalidArgument(format!(
                "the entity of type {} has no id, persist it before creating a node",
                content.entity_name()
            )));
        }

        let mut parent_id = None;
        if let Some(parent_ref) = content.parent() {
            if let Some(version) = self.store.find_version_by_ref(&parent_ref).await? {
                parent_id = self.node_for_version(&version).await?.map(|n| n.id);
            }
        }

        let node = self
            .store
            .insert_node(NewNode {
                parent_id,
                internal_name: internal_name.map(str::to_string),
                ref_entity_name: content.entity_name().to_string(),
                hidden_from_nav: false,
            })
            .await?;

        info!(
            node_id = %node.id,
            entity = content.entity_name(),
            parent = ?node.parent_id,
            "created node"
        );

        self.create_node_translation_for(content, lang, &node, owner)
            .await?;

        Ok(node)
    }

    /// Create the `lang` translation of `node` for `content` with a public
    /// version owned by `owner`. New translations start offline.
    pub async fn create_node_translation_for(
        &self,
        content: &dyn HasNode,
        lang: &str,
        node: &Node,
        owner: &str,
    ) -> NodeResult<NodeTranslation> {
        let Some(content_ref) = content.content_ref() else {
            return Err(NodeError::InvalidArgument(format!(
                "the entity of type {} has no id, persist it before translating it",
                content.entity_name()
            )));
        };

        let mut segment = slug::slugify(content.title());
        if segment.is_empty() {
            segment = node.id.simple().to_string();
        }

        let parent_url = match node.parent_id {
            Some(parent_id) => self
                .store
                .translation_for(parent_id, lang)
                .await?
                .and_then(|t| t.url),
            None => None,
        };
        let url = slug::join_url(parent_url.as_deref(), &segment);

        let (translation, version) = self
            .store
            .insert_translation(
                NewNodeTranslation {
                    node_id: node.id,
                    lang: lang.to_string(),
                    title: content.title().to_string(),
                    slug: Some(segment),
                    url: Some(url),
                    weight: 0,
                    online: false,
                },
                NewNodeVersion::public(owner, content_ref),
            )
            .await?;

        debug!(
            node_id = %node.id,
            lang,
            translation_id = %translation.id,
            version_id = %version.id,
            "created node translation"
        );
        Ok(translation)
    }

    /// One-query projection of every accessible node for menu assembly.
    pub async fn all_menu_nodes(
        &self,
        lang: &str,
        permission: &str,
        acl: &dyn AclHelper,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<MenuNode>> {
        let scope = acl
            .access_scope(&PermissionDefinition::for_nodes(permission))
            .await?;
        Ok(self
            .store
            .menu_nodes(lang, include_hidden_from_nav, &scope)
            .await?)
    }

    /// [`Self::all_menu_nodes`] assembled into a nested tree.
    pub async fn menu_tree(
        &self,
        lang: &str,
        permission: &str,
        acl: &dyn AclHelper,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<MenuTreeNode>> {
        let rows = self
            .all_menu_nodes(lang, permission, acl, include_hidden_from_nav)
            .await?;
        Ok(MenuTreeNode::assemble(rows))
    }

    /// A node's `lang` translation, hidden when offline unless `include_offline`.
    pub async fn node_translation(
        &self,
        node_id: Uuid,
        lang: &str,
        include_offline: bool,
    ) -> NodeResult<Option<NodeTranslation>> {
        let translation = self.store.translation_for(node_id, lang).await?;
        Ok(translation.filter(|t| t.is_visible(include_offline)))
    }

    /// The version currently published for a translation.
    pub async fn public_version(
        &self,
        translation: &NodeTranslation,
    ) -> NodeResult<Option<NodeVersion>> {
        let Some(version_id) = translation.public_node_version_id else {
            return Ok(None);
        };
        Ok(self.store.find_version(version_id).await?)
    }
}
