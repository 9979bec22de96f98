//! Nodetree test utilities.
//!
//! Helpers for integration testing: a page content type with its loader,
//! and a fluent seeder that grows a translated tree in a
//! [`MemoryNodeStore`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use nodetree_kernel::models::{NewNode, NewNodeTranslation, NewNodeVersion};
use nodetree_kernel::slug;
use nodetree_kernel::{
    AclHelper, AllowAll, ContentLoader, ContentRef, ContentRegistry, HasNode, MemoryNodeStore,
    Node, NodeMenu, NodeMenuBuilder, NodeRepository, NodeStore,
};

/// Entity name used for plain test pages.
pub const PAGE: &str = "app::entity::Page";

/// Entity name used for news test pages; extends [`PAGE`].
pub const NEWS_PAGE: &str = "app::entity::NewsPage";

/// Owner recorded on seeded versions.
pub const TEST_OWNER: &str = "tests";

/// Create a saved test page.
pub fn test_page(entity_name: &str, title: &str) -> TestPage {
    TestPage {
        id: Some(Uuid::now_v7()),
        entity_name: entity_name.to_string(),
        title: title.to_string(),
        parent: None,
    }
}

/// A test page builder for creating content fixtures.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: Option<Uuid>,
    pub entity_name: String,
    pub title: String,
    pub parent: Option<ContentRef>,
}

impl TestPage {
    /// Set a custom ID.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Mark as not yet persisted.
    pub fn unsaved(mut self) -> Self {
        self.id = None;
        self
    }

    /// Set the parent page.
    pub fn with_parent(mut self, parent: &TestPage) -> Self {
        self.parent = parent.content_ref();
        self
    }
}

impl HasNode for TestPage {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn entity_name(&self) -> &str {
        &self.entity_name
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent(&self) -> Option<ContentRef> {
        self.parent.clone()
    }
}

/// In-memory page storage usable as a content loader for every page type.
#[derive(Debug, Default)]
pub struct PageCatalog {
    pages: RwLock<HashMap<Uuid, Arc<TestPage>>>,
}

impl PageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a saved page. Unsaved pages are ignored.
    pub fn insert(&self, page: TestPage) {
        if let Some(id) = page.id {
            self.pages.write().insert(id, Arc::new(page));
        }
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.read().is_empty()
    }
}

#[async_trait]
impl ContentLoader for PageCatalog {
    async fn load(&self, id: Uuid) -> Result<Option<Arc<dyn HasNode>>> {
        let page = self.pages.read().get(&id).cloned();
        Ok(page.map(|p| p as Arc<dyn HasNode>))
    }
}

/// Create a node seed of the given content type.
pub fn seed(entity_name: &str) -> SeedNode {
    SeedNode {
        entity_name: entity_name.to_string(),
        internal_name: None,
        hidden_from_nav: false,
        translations: Vec::new(),
    }
}

/// One translation to seed.
#[derive(Debug, Clone)]
pub struct SeedTranslation {
    pub lang: String,
    pub title: String,
    pub weight: i32,
    pub online: bool,
}

/// A node seed builder.
#[derive(Debug, Clone)]
pub struct SeedNode {
    pub entity_name: String,
    pub internal_name: Option<String>,
    pub hidden_from_nav: bool,
    pub translations: Vec<SeedTranslation>,
}

impl SeedNode {
    /// Add an online translation.
    pub fn translated(mut self, lang: &str, title: &str, weight: i32) -> Self {
        self.translations.push(SeedTranslation {
            lang: lang.to_string(),
            title: title.to_string(),
            weight,
            online: true,
        });
        self
    }

    /// Add an offline translation.
    pub fn offline(mut self, lang: &str, title: &str, weight: i32) -> Self {
        self.translations.push(SeedTranslation {
            lang: lang.to_string(),
            title: title.to_string(),
            weight,
            online: false,
        });
        self
    }

    /// Set as hidden from navigation.
    pub fn hidden(mut self) -> Self {
        self.hidden_from_nav = true;
        self
    }

    /// Set the internal name.
    pub fn named(mut self, internal_name: &str) -> Self {
        self.internal_name = Some(internal_name.to_string());
        self
    }
}

/// In-memory tree with everything a menu needs around it.
pub struct TestTree {
    pub store: Arc<MemoryNodeStore>,
    pub repository: NodeRepository,
    pub catalog: Arc<PageCatalog>,
    pub content: Arc<ContentRegistry>,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Empty tree with [`PAGE`] and [`NEWS_PAGE`] registered under the
    /// `App` namespace alias.
    pub fn new() -> Self {
        let store = Arc::new(MemoryNodeStore::new());
        let catalog = Arc::new(PageCatalog::new());
        let loader: Arc<dyn ContentLoader> = catalog.clone();
        let content = ContentRegistry::builder()
            .namespace("App", "app::entity")
            .register(PAGE, loader.clone())
            .register(NEWS_PAGE, loader)
            .extends(NEWS_PAGE, PAGE)
            .build();

        Self {
            repository: NodeRepository::new(store.clone()),
            store,
            catalog,
            content: Arc::new(content),
        }
    }

    /// Append a seeded node under `parent` (or at the top level).
    ///
    /// Each translation gets its own page in the catalog and a published
    /// version pointing at it. Urls extend the parent's url in the same
    /// language.
    pub async fn add(&self, parent: Option<&Node>, seed: SeedNode) -> Result<Node> {
        let node = self
            .store
            .insert_node(NewNode {
                parent_id: parent.map(|p| p.id),
                internal_name: seed.internal_name.clone(),
                ref_entity_name: seed.entity_name.clone(),
                hidden_from_nav: seed.hidden_from_nav,
            })
            .await
            .context("failed to seed node")?;

        for translation in seed.translations {
            let page = test_page(&seed.entity_name, &translation.title);
            let content = page
                .content_ref()
                .context("seeded page has no id")?;
            self.catalog.insert(page);

            let parent_url = match parent {
                Some(parent) => self
                    .store
                    .translation_for(parent.id, &translation.lang)
                    .await?
                    .and_then(|t| t.url),
                None => None,
            };
            let segment = slug::slugify(&translation.title);
            let url = slug::join_url(parent_url.as_deref(), &segment);

            self.store
                .insert_translation(
                    NewNodeTranslation {
                        node_id: node.id,
                        lang: translation.lang,
                        title: translation.title,
                        slug: Some(segment),
                        url: Some(url),
                        weight: translation.weight,
                        online: translation.online,
                    },
                    NewNodeVersion::public(TEST_OWNER, content),
                )
                .await
                .context("failed to seed translation")?;
        }

        // Bounds of earlier nodes shift on insert; hand back the stored row.
        self.reload(&node).await
    }

    /// Fetch the current state of a node.
    pub async fn reload(&self, node: &Node) -> Result<Node> {
        self.store
            .find_node(node.id)
            .await?
            .with_context(|| format!("node {} vanished", node.id))
    }

    /// Menu builder over this tree, unrestricted by ACL.
    pub fn menu(&self, lang: &str) -> NodeMenuBuilder {
        self.menu_with_acl(lang, Arc::new(AllowAll))
    }

    pub fn menu_with_acl(&self, lang: &str, acl: Arc<dyn AclHelper>) -> NodeMenuBuilder {
        NodeMenu::builder(self.repository.clone(), acl, self.content.clone(), lang)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_builder() {
        let parent = test_page(PAGE, "Home");
        let child = test_page(NEWS_PAGE, "News").with_parent(&parent);

        assert_eq!(child.parent, parent.content_ref());
        assert!(test_page(PAGE, "Draft").unsaved().content_ref().is_none());
    }

    #[tokio::test]
    async fn catalog_loads_inserted_pages() {
        let catalog = PageCatalog::new();
        let page = test_page(PAGE, "About");
        let id = page.id.unwrap();
        catalog.insert(page);

        let loaded = catalog.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.title(), "About");
        assert!(catalog.load(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_urls_extend_parent_url() {
        let tree = TestTree::new();
        let root = tree
            .add(None, seed(PAGE).translated("en", "Home", 0))
            .await
            .unwrap();
        let child = tree
            .add(Some(&root), seed(PAGE).translated("en", "About Us", 0))
            .await
            .unwrap();

        let translation = tree
            .store
            .translation_for(child.id, "en")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(translation.url.as_deref(), Some("home/about-us"));
        assert_eq!(tree.catalog.len(), 2);
        assert!(tree.content.is_registered(NEWS_PAGE));
    }
}
