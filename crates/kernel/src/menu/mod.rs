//! Navigation menus over the node tree.
//!
//! A [`NodeMenu`] is built per request for one language, permission and
//! actor. Items are wrapped lazily: a node's children are only queried when
//! they are first asked for, and the result is kept for the rest of the
//! menu's life.

mod item;
mod tree;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::acl::{AclHelper, PERMISSION_VIEW};
use crate::content::ContentRegistry;
use crate::error::NodeResult;
use crate::models::{Node, NodeTranslation};
use crate::repository::NodeRepository;

pub use item::NodeMenuItem;
pub use tree::MenuTreeNode;

/// One wrapped node in the menu arena.
pub(crate) struct MenuEntry {
    pub(crate) node: Node,
    pub(crate) translation: Option<NodeTranslation>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: OnceCell<Vec<usize>>,
}

/// Request-scoped menu context.
///
/// Owns every item it hands out; items refer to their parent and children by
/// position in the menu's arena.
pub struct NodeMenu {
    repository: NodeRepository,
    acl: Arc<dyn AclHelper>,
    content: Arc<ContentRegistry>,
    lang: String,
    permission: String,
    include_offline: bool,
    entries: RwLock<Vec<Arc<MenuEntry>>>,
    top: OnceCell<Vec<usize>>,
    breadcrumb: Vec<usize>,
    current: Option<usize>,
}

/// Builder for [`NodeMenu`].
pub struct NodeMenuBuilder {
    repository: NodeRepository,
    acl: Arc<dyn AclHelper>,
    content: Arc<ContentRegistry>,
    lang: String,
    permission: String,
    include_offline: bool,
    current_node: Option<Node>,
}

impl NodeMenuBuilder {
    pub fn new(
        repository: NodeRepository,
        acl: Arc<dyn AclHelper>,
        content: Arc<ContentRegistry>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            acl,
            content,
            lang: lang.into(),
            permission: PERMISSION_VIEW.to_string(),
            include_offline: false,
            current_node: None,
        }
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    /// Also wrap nodes whose translation is offline.
    pub fn include_offline(mut self, include_offline: bool) -> Self {
        self.include_offline = include_offline;
        self
    }

    /// The node being displayed; its ancestor chain becomes the breadcrumb.
    pub fn current_node(mut self, node: Node) -> Self {
        self.current_node = Some(node);
        self
    }

    pub async fn build(self) -> NodeResult<NodeMenu> {
        let mut menu = NodeMenu {
            repository: self.repository,
            acl: self.acl,
            content: self.content,
            lang: self.lang,
            permission: self.permission,
            include_offline: self.include_offline,
            entries: RwLock::new(Vec::new()),
            top: OnceCell::new(),
            breadcrumb: Vec::new(),
            current: None,
        };

        if let Some(current) = self.current_node {
            let chain = menu
                .repository
                .all_parents(Some(&current), Some(menu.lang.as_str()))
                .await?;

            // Ancestors without a visible translation are left out of the
            // trail; each crumb links to the previous kept one.
            let mut breadcrumb = Vec::with_capacity(chain.len());
            let mut parent = None;
            for node in chain {
                let is_current = node.id == current.id;
                let translation = menu
                    .repository
                    .node_translation(node.id, &menu.lang, menu.include_offline)
                    .await?;
                if translation.is_none() && !is_current {
                    continue;
                }
                let has_translation = translation.is_some();
                let index = menu.push(node, translation, parent);
                if is_current {
                    menu.current = Some(index);
                }
                if has_translation {
                    breadcrumb.push(index);
                    parent = Some(index);
                }
            }

            debug!(current = %current.id, depth = breadcrumb.len(), "built breadcrumb");
            menu.breadcrumb = breadcrumb;
        }

        Ok(menu)
    }
}

impl NodeMenu {
    pub fn builder(
        repository: NodeRepository,
        acl: Arc<dyn AclHelper>,
        content: Arc<ContentRegistry>,
        lang: impl Into<String>,
    ) -> NodeMenuBuilder {
        NodeMenuBuilder::new(repository, acl, content, lang)
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub fn is_include_offline(&self) -> bool {
        self.include_offline
    }

    pub fn repository(&self) -> &NodeRepository {
        &self.repository
    }

    pub fn acl(&self) -> &dyn AclHelper {
        self.acl.as_ref()
    }

    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    /// Top-level items with a translation in the menu language.
    ///
    /// Fetched once, hidden ones included; hidden-from-nav items are filtered
    /// on every call.
    pub async fn top_items(
        &self,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<NodeMenuItem<'_>>> {
        let indices = self
            .top
            .get_or_try_init(|| async {
                let nodes = self
                    .repository
                    .top_nodes(&self.lang, &self.permission, self.acl.as_ref(), true)
                    .await?;
                self.wrap_translated(nodes, None).await
            })
            .await?;

        Ok(self.items(indices, include_hidden_from_nav))
    }

    /// Translated ancestor chain of the current node, root first, ending
    /// with it when it is translated.
    pub fn breadcrumb(&self) -> Vec<NodeMenuItem<'_>> {
        self.breadcrumb.iter().map(|&index| self.item(index)).collect()
    }

    /// The item for the current node, if one was given.
    pub fn current(&self) -> Option<NodeMenuItem<'_>> {
        self.current.map(|index| self.item(index))
    }

    /// Wrap an arbitrary node as a root item of this menu.
    pub async fn item_for(&self, node: Node) -> NodeResult<NodeMenuItem<'_>> {
        let translation = self
            .repository
            .node_translation(node.id, &self.lang, self.include_offline)
            .await?;
        let index = self.push(node, translation, None);
        Ok(self.item(index))
    }

    /// Wrap the nodes that have a translation in the menu language.
    pub(crate) async fn wrap_translated(
        &self,
        nodes: Vec<Node>,
        parent: Option<usize>,
    ) -> NodeResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(nodes.len());
        for node in nodes {
            let translation = self
                .repository
                .node_translation(node.id, &self.lang, self.include_offline)
                .await?;
            if let Some(translation) = translation {
                indices.push(self.push(node, Some(translation), parent));
            }
        }
        Ok(indices)
    }

    pub(crate) fn items(
        &self,
        indices: &[usize],
        include_hidden_from_nav: bool,
    ) -> Vec<NodeMenuItem<'_>> {
        indices
            .iter()
            .map(|&index| self.item(index))
            .filter(|item| include_hidden_from_nav || !item.node().hidden_from_nav)
            .collect()
    }

    pub(crate) fn item(&self, index: usize) -> NodeMenuItem<'_> {
        let entry = Arc::clone(&self.entries.read()[index]);
        NodeMenuItem::new(self, index, entry)
    }

    fn push(
        &self,
        node: Node,
        translation: Option<NodeTranslation>,
        parent: Option<usize>,
    ) -> usize {
        let mut entries = self.entries.write();
        entries.push(Arc::new(MenuEntry {
            node,
            translation,
            parent,
            children: OnceCell::new(),
        }));
        entries.len() - 1
    }
}
