//! In-process node store.
//!
//! Holds the three tables in vectors behind one lock. Query semantics match
//! [`super::PgNodeStore`], including PostgreSQL's placement of NULLs last in
//! ascending sorts. Used by tests and by embedders without a database.

use std::cmp::Ordering;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::{NodeStore, ParentFilter};
use crate::acl::AccessScope;
use crate::models::{
    ContentRef, MenuNode, NewNode, NewNodeTranslation, NewNodeVersion, Node, NodeTranslation,
    NodeVersion,
};

#[derive(Debug, Default)]
struct Tables {
    nodes: Vec<Node>,
    translations: Vec<NodeTranslation>,
    versions: Vec<NodeVersion>,
}

impl Tables {
    fn translation(&self, node_id: Uuid, lang: &str) -> Option<&NodeTranslation> {
        self.translations
            .iter()
            .find(|t| t.node_id == node_id && t.lang == lang)
    }

    /// Earliest translation of a node in any language other than `lang`.
    fn fallback_translation(&self, node_id: Uuid, lang: &str) -> Option<&NodeTranslation> {
        self.translations
            .iter()
            .filter(|t| t.node_id == node_id && t.lang != lang)
            .min_by_key(|t| t.created)
    }

    fn has_slug(&self, node_id: Uuid, slug: &str) -> bool {
        self.translations
            .iter()
            .any(|t| t.node_id == node_id && t.slug.as_deref() == Some(slug))
    }
}

fn parent_matches(node: &Node, parent: ParentFilter) -> bool {
    match parent {
        ParentFilter::Any => true,
        ParentFilter::Root => node.parent_id.is_none(),
        ParentFilter::Node(id) => node.parent_id == Some(id),
    }
}

/// Ascending order with `None` sorted after every value.
fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_weight_then_title(
    a: &(Option<i32>, Option<String>),
    b: &(Option<i32>, Option<String>),
) -> Ordering {
    nulls_last(&a.0, &b.0).then_with(|| nulls_last(&a.1, &b.1))
}

/// Node store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    tables: RwLock<Tables>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a node deleted. Returns whether the node exists.
    pub fn soft_delete(&self, id: Uuid) -> bool {
        let mut tables = self.tables.write();
        match tables.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.deleted = true;
                node.changed = chrono::Utc::now().timestamp();
                true
            }
            None => false,
        }
    }

    /// Copy of every stored node, in insertion order.
    pub fn snapshot(&self) -> Vec<Node> {
        self.tables.read().nodes.clone()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn find_node(&self, id: Uuid) -> Result<Option<Node>> {
        Ok(self.tables.read().nodes.iter().find(|n| n.id == id).cloned())
    }

    async fn child_nodes(
        &self,
        parent_id: Option<Uuid>,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<Node>> {
        let tables = self.tables.read();
        let mut rows: Vec<((Option<i32>, Option<String>), Node)> = tables
            .nodes
            .iter()
            .filter(|n| !n.deleted && n.parent_id == parent_id)
            .filter(|n| include_hidden_from_nav || !n.hidden_from_nav)
            .filter(|n| scope.permits(n.id))
            .map(|n| {
                let key = match tables.translation(n.id, lang) {
                    Some(t) => (Some(t.weight), Some(t.title.clone())),
                    None => (None, None),
                };
                (key, n.clone())
            })
            .collect();

        rows.sort_by(|a, b| by_weight_then_title(&a.0, &b.0));
        Ok(rows.into_iter().map(|(_, n)| n).collect())
    }

    async fn top_level_nodes(&self) -> Result<Vec<Node>> {
        Ok(self
            .tables
            .read()
            .nodes
            .iter()
            .filter(|n| !n.deleted && n.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn containing_nodes(&self, lft: i32, rgt: i32, lang: Option<&str>) -> Result<Vec<Node>> {
        let tables = self.tables.read();
        let mut nodes: Vec<Node> = tables
            .nodes
            .iter()
            .filter(|n| !n.deleted && n.lft <= lft && n.rgt >= rgt)
            .filter(|n| lang.is_none_or(|lang| tables.translation(n.id, lang).is_some()))
            .cloned()
            .collect();

        nodes.sort_by_key(|n| n.lft);
        Ok(nodes)
    }

    async fn nodes_by_internal_name(
        &self,
        internal_name: &str,
        lang: &str,
        parent: ParentFilter,
        include_offline: bool,
    ) -> Result<Vec<Node>> {
        let tables = self.tables.read();
        let mut rows: Vec<((Option<i32>, Option<String>), Node)> = tables
            .nodes
            .iter()
            .filter(|n| !n.deleted && n.internal_name.as_deref() == Some(internal_name))
            .filter(|n| parent_matches(n, parent))
            .filter_map(|n| {
                let t = tables.translation(n.id, lang)?;
                t.is_visible(include_offline)
                    .then(|| ((Some(t.weight), Some(t.title.clone())), n.clone()))
            })
            .collect();

        rows.sort_by(|a, b| by_weight_then_title(&a.0, &b.0));
        Ok(rows.into_iter().map(|(_, n)| n).collect())
    }

    async fn find_by_slug(&self, parent: ParentFilter, slug: &str) -> Result<Option<Node>> {
        let tables = self.tables.read();
        Ok(tables
            .nodes
            .iter()
            .filter(|n| !n.deleted && parent_matches(n, parent))
            .filter(|n| tables.has_slug(n.id, slug))
            .min_by_key(|n| n.lft)
            .cloned())
    }

    async fn menu_nodes(
        &self,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<MenuNode>> {
        let tables = self.tables.read();
        let mut rows: Vec<MenuNode> = tables
            .nodes
            .iter()
            .filter(|n| !n.deleted)
            .filter(|n| include_hidden_from_nav || !n.hidden_from_nav)
            .filter(|n| scope.permits(n.id))
            .map(|n| {
                let own = tables.translation(n.id, lang);
                let fallback = tables.fallback_translation(n.id, lang);
                MenuNode {
                    id: n.id,
                    parent: n.parent_id,
                    weight: own.or(fallback).map(|t| t.weight),
                    title: own.or(fallback).map(|t| t.title.clone()),
                    online: own.is_some_and(|t| t.online),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.parent
                .cmp(&b.parent)
                .then_with(|| nulls_last(&a.weight, &b.weight))
                .then_with(|| nulls_last(&a.title, &b.title))
        });
        Ok(rows)
    }

    async fn find_translation(&self, id: Uuid) -> Result<Option<NodeTranslation>> {
        Ok(self
            .tables
            .read()
            .translations
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn translation_for(&self, node_id: Uuid, lang: &str) -> Result<Option<NodeTranslation>> {
        Ok(self.tables.read().translation(node_id, lang).cloned())
    }

    async fn find_version(&self, id: Uuid) -> Result<Option<NodeVersion>> {
        Ok(self
            .tables
            .read()
            .versions
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn find_version_by_ref(&self, content: &ContentRef) -> Result<Option<NodeVersion>> {
        Ok(self
            .tables
            .read()
            .versions
            .iter()
            .find(|v| v.ref_id == content.id && v.ref_entity_name == content.entity_name)
            .cloned())
    }

    async fn insert_node(&self, node: NewNode) -> Result<Node> {
        let now = chrono::Utc::now().timestamp();
        let mut tables = self.tables.write();

        let (lft, lvl) = match node.parent_id {
            Some(parent_id) => {
                let parent = tables
                    .nodes
                    .iter()
                    .find(|n| n.id == parent_id)
                    .ok_or_else(|| anyhow!("parent node {parent_id} does not exist"))?;
                let (parent_rgt, parent_lvl) = (parent.rgt, parent.lvl);

                // Open a two-slot gap at the parent's right bound.
                for n in tables.nodes.iter_mut() {
                    if n.rgt >= parent_rgt {
                        n.rgt += 2;
                    }
                    if n.lft > parent_rgt {
                        n.lft += 2;
                    }
                }
                (parent_rgt, parent_lvl + 1)
            }
            None => {
                let max_rgt = tables.nodes.iter().map(|n| n.rgt).max().unwrap_or(0);
                (max_rgt + 1, 0)
            }
        };

        let created = Node {
            id: Uuid::now_v7(),
            parent_id: node.parent_id,
            lft,
            rgt: lft + 1,
            lvl,
            deleted: false,
            hidden_from_nav: node.hidden_from_nav,
            internal_name: node.internal_name,
            ref_entity_name: node.ref_entity_name,
            created: now,
            changed: now,
        };
        tables.nodes.push(created.clone());

        Ok(created)
    }

    async fn insert_translation(
        &self,
        translation: NewNodeTranslation,
        version: NewNodeVersion,
    ) -> Result<(NodeTranslation, NodeVersion)> {
        let now = chrono::Utc::now().timestamp();
        let mut tables = self.tables.write();

        if !tables.nodes.iter().any(|n| n.id == translation.node_id) {
            bail!("node {} does not exist", translation.node_id);
        }
        if tables.translation(translation.node_id, &translation.lang).is_some() {
            bail!(
                "node {} already has a {} translation",
                translation.node_id,
                translation.lang
            );
        }

        let translation_id = Uuid::now_v7();
        let version = NodeVersion {
            id: Uuid::now_v7(),
            node_translation_id: translation_id,
            version_type: version.version_type,
            owner: version.owner,
            ref_id: version.content.id,
            ref_entity_name: version.content.entity_name,
            created: now,
            changed: now,
        };
        let translation = NodeTranslation {
            id: translation_id,
            node_id: translation.node_id,
            lang: translation.lang,
            title: translation.title,
            slug: translation.slug,
            url: translation.url,
            weight: translation.weight,
            online: translation.online,
            public_node_version_id: Some(version.id),
            created: now,
            changed: now,
        };

        tables.translations.push(translation.clone());
        tables.versions.push(version.clone());

        Ok((translation, version))
    }
}
