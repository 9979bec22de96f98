//! A node wrapped for menu rendering.

use std::sync::Arc;

use uuid::Uuid;

use super::{MenuEntry, NodeMenu};
use crate::content::HasNode;
use crate::error::NodeResult;
use crate::models::{Node, NodeTranslation, NodeVersion};

/// Title shown for a node without a translation in the menu language.
pub const UNTRANSLATED_TITLE: &str = "Untranslated";

/// Menu view of one node and its translation.
///
/// Cheap to clone; clones share the same lazily loaded children.
#[derive(Clone)]
pub struct NodeMenuItem<'m> {
    menu: &'m NodeMenu,
    index: usize,
    entry: Arc<MenuEntry>,
}

impl std::fmt::Debug for NodeMenuItem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeMenuItem")
            .field("id", &self.id())
            .field("title", &self.title())
            .field("url", &self.url())
            .finish()
    }
}

impl<'m> NodeMenuItem<'m> {
    pub(crate) fn new(menu: &'m NodeMenu, index: usize, entry: Arc<MenuEntry>) -> Self {
        Self { menu, index, entry }
    }

    pub fn id(&self) -> Uuid {
        self.entry.node.id
    }

    pub fn node(&self) -> &Node {
        &self.entry.node
    }

    pub fn node_translation(&self) -> Option<&NodeTranslation> {
        self.entry.translation.as_ref()
    }

    pub fn lang(&self) -> &'m str {
        self.menu.lang()
    }

    pub fn menu(&self) -> &'m NodeMenu {
        self.menu
    }

    pub fn title(&self) -> &str {
        self.node_translation()
            .map_or(UNTRANSLATED_TITLE, |t| t.title.as_str())
    }

    pub fn online(&self) -> bool {
        self.node_translation().is_some_and(|t| t.online)
    }

    /// The full slug of the translation.
    pub fn slug_part(&self) -> Option<&str> {
        self.node_translation().and_then(NodeTranslation::full_slug)
    }

    pub fn slug(&self) -> Option<&str> {
        self.url()
    }

    pub fn url(&self) -> Option<&str> {
        self.slug_part()
    }

    pub fn parent(&self) -> Option<NodeMenuItem<'m>> {
        self.entry.parent.map(|index| self.menu.item(index))
    }

    /// Every ancestor item, root first.
    pub fn parents(&self) -> Vec<NodeMenuItem<'m>> {
        let mut parents = Vec::new();
        let mut cursor = self.parent();
        while let Some(parent) = cursor {
            cursor = parent.parent();
            parents.push(parent);
        }
        parents.reverse();
        parents
    }

    /// Nearest ancestor whose content is an instance of `tag`.
    pub async fn parent_of_class(&self, tag: &str) -> NodeResult<Option<NodeMenuItem<'m>>> {
        let type_name = self.menu.content().resolve_type_name(tag)?;

        let mut cursor = self.parent();
        while let Some(parent) = cursor {
            if parent.is_instance_of(&type_name).await? {
                return Ok(Some(parent));
            }
            cursor = parent.parent();
        }
        Ok(None)
    }

    /// Translated children, in weight then title order.
    ///
    /// Queried and wrapped on first use; hidden-from-nav children are
    /// filtered on every call.
    pub async fn children(
        &self,
        include_hidden_from_nav: bool,
    ) -> NodeResult<Vec<NodeMenuItem<'m>>> {
        let menu = self.menu;
        let indices = self
            .entry
            .children
            .get_or_try_init(|| async {
                let nodes = menu
                    .repository()
                    .child_nodes(
                        Some(self.id()),
                        menu.lang(),
                        menu.permission(),
                        menu.acl(),
                        true,
                    )
                    .await?;
                menu.wrap_translated(nodes, Some(self.index)).await
            })
            .await?;

        Ok(menu.items(indices, include_hidden_from_nav))
    }

    /// Children whose content is an instance of `tag`.
    pub async fn children_of_class(&self, tag: &str) -> NodeResult<Vec<NodeMenuItem<'m>>> {
        let type_name = self.menu.content().resolve_type_name(tag)?;

        let mut matching = Vec::new();
        for child in self.children(true).await? {
            if child.is_instance_of(&type_name).await? {
                matching.push(child);
            }
        }
        Ok(matching)
    }

    /// First child whose content is an instance of `tag`.
    pub async fn child_of_class(&self, tag: &str) -> NodeResult<Option<NodeMenuItem<'m>>> {
        let type_name = self.menu.content().resolve_type_name(tag)?;

        for child in self.children(true).await? {
            if child.is_instance_of(&type_name).await? {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// The published version of this item's translation.
    pub async fn public_version(&self) -> NodeResult<Option<NodeVersion>> {
        match self.node_translation() {
            Some(translation) => self.menu.repository().public_version(translation).await,
            None => Ok(None),
        }
    }

    /// The content behind the published version.
    pub async fn page(&self) -> NodeResult<Option<Arc<dyn HasNode>>> {
        let Some(version) = self.public_version().await? else {
            return Ok(None);
        };
        self.menu.content().load(&version.content_ref()).await
    }

    /// Whether this item's url is on the breadcrumb trail.
    pub fn active(&self) -> bool {
        let Some(url) = self.url() else {
            return false;
        };
        self.menu
            .breadcrumb()
            .iter()
            .any(|crumb| crumb.url() == Some(url))
    }

    /// Content type of the published page, or the node's own type when
    /// nothing is published.
    async fn content_type(&self) -> NodeResult<String> {
        Ok(match self.public_version().await? {
            Some(version) => version.ref_entity_name,
            None => self.entry.node.ref_entity_name.clone(),
        })
    }

    async fn is_instance_of(&self, type_name: &str) -> NodeResult<bool> {
        let content_type = self.content_type().await?;
        Ok(self.menu.content().is_instance_of(&content_type, type_name))
    }
}
