#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Navigation menu integration tests.
//!
//! Builds menus over seeded in-memory trees and walks them the way a
//! template would.

use std::sync::Arc;

use nodetree_kernel::menu::NodeMenuItem;
use nodetree_kernel::{GrantTable, HasNode, Node, NodeError};
use nodetree_test_utils::{NEWS_PAGE, PAGE, TestTree, seed};
use uuid::Uuid;

fn item_ids(items: &[NodeMenuItem<'_>]) -> Vec<Uuid> {
    items.iter().map(NodeMenuItem::id).collect()
}

/// home
/// ├── about (weight 1)
/// │   └── team
/// ├── news (weight 2, NewsPage)
/// │   └── article (NewsPage)
/// ├── legal (weight 3, hidden)
/// └── dutch-only (nl)
struct Site {
    tree: TestTree,
    home: Node,
    about: Node,
    team: Node,
    news: Node,
    article: Node,
    legal: Node,
}

async fn site() -> Site {
    let tree = TestTree::new();
    let home = tree.add(None, seed(PAGE).translated("en", "Home", 0)).await.unwrap();
    let about = tree
        .add(Some(&home), seed(PAGE).translated("en", "About", 1))
        .await
        .unwrap();
    let team = tree
        .add(Some(&about), seed(PAGE).translated("en", "Team", 0))
        .await
        .unwrap();
    let news = tree
        .add(Some(&home), seed(NEWS_PAGE).translated("en", "News", 2))
        .await
        .unwrap();
    let article = tree
        .add(Some(&news), seed(NEWS_PAGE).translated("en", "Article", 0))
        .await
        .unwrap();
    let legal = tree
        .add(Some(&home), seed(PAGE).translated("en", "Legal", 3).hidden())
        .await
        .unwrap();
    tree.add(Some(&home), seed(PAGE).translated("nl", "Alleen NL", 0))
        .await
        .unwrap();

    Site {
        home: tree.reload(&home).await.unwrap(),
        about: tree.reload(&about).await.unwrap(),
        team: tree.reload(&team).await.unwrap(),
        news: tree.reload(&news).await.unwrap(),
        article: tree.reload(&article).await.unwrap(),
        legal: tree.reload(&legal).await.unwrap(),
        tree,
    }
}

// -------------------------------------------------------------------------
// Items and children
// -------------------------------------------------------------------------

#[tokio::test]
async fn root_with_weighted_children_and_hidden_sibling() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();

    let top = menu.top_items(false).await.unwrap();
    assert_eq!(item_ids(&top), vec![site.home.id]);

    let home = &top[0];
    assert_eq!(home.title(), "Home");
    assert_eq!(home.url(), Some("home"));
    assert!(home.parent().is_none());

    let visible = home.children(false).await.unwrap();
    assert_eq!(item_ids(&visible), vec![site.about.id, site.news.id]);

    let all = home.children(true).await.unwrap();
    assert_eq!(
        item_ids(&all),
        vec![site.about.id, site.news.id, site.legal.id]
    );

    let about = &visible[0];
    assert_eq!(about.url(), Some("home/about"));
    assert_eq!(about.slug(), about.url());
    assert_eq!(about.slug_part(), about.url());
    assert!(about.online());
    assert_eq!(about.lang(), "en");
    assert_eq!(about.parent().unwrap().id(), site.home.id);
}

#[tokio::test]
async fn untranslated_children_never_appear() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();

    let home = menu.item_for(site.home.clone()).await.unwrap();
    let children = home.children(true).await.unwrap();

    assert!(children.iter().all(|c| c.node_translation().is_some()));
    assert!(!children.iter().any(|c| c.title() == "Alleen NL"));
    assert_eq!(children.len(), 3);
}

#[tokio::test]
async fn children_are_loaded_once() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();
    let home = menu.item_for(site.home.clone()).await.unwrap();

    let first = item_ids(&home.children(true).await.unwrap());

    // Added after the first load; the cached list does not see it.
    site.tree
        .add(Some(&site.home), seed(PAGE).translated("en", "Late", 0))
        .await
        .unwrap();

    let second = item_ids(&home.children(true).await.unwrap());
    assert_eq!(first, second);

    let clone = home.clone();
    assert_eq!(item_ids(&clone.children(true).await.unwrap()), first);

    // Hidden filtering still applies per call on the cached list.
    assert_eq!(home.children(false).await.unwrap().len(), first.len() - 1);
}

#[tokio::test]
async fn offline_translations_need_include_offline() {
    let tree = TestTree::new();
    let home = tree.add(None, seed(PAGE).translated("en", "Home", 0)).await.unwrap();
    let draft = tree
        .add(Some(&home), seed(PAGE).offline("en", "Draft", 0))
        .await
        .unwrap();

    let public = tree.menu("en").build().await.unwrap();
    let item = public.item_for(home.clone()).await.unwrap();
    assert!(item.children(true).await.unwrap().is_empty());

    let preview = tree.menu("en").include_offline(true).build().await.unwrap();
    assert!(preview.is_include_offline());
    let item = preview.item_for(home).await.unwrap();
    let children = item.children(true).await.unwrap();
    assert_eq!(item_ids(&children), vec![draft.id]);
    assert!(!children[0].online());
}

#[tokio::test]
async fn item_for_untranslated_node() {
    let site = site().await;
    let menu = site.tree.menu("fr").build().await.unwrap();

    let item = menu.item_for(site.home.clone()).await.unwrap();
    assert_eq!(item.title(), "Untranslated");
    assert!(!item.online());
    assert!(item.url().is_none());
    assert!(item.parent().is_none());
    assert!(item.page().await.unwrap().is_none());
}

#[tokio::test]
async fn top_items_filter_hidden_per_call() {
    let tree = TestTree::new();
    let home = tree.add(None, seed(PAGE).translated("en", "Home", 0)).await.unwrap();
    let footer = tree
        .add(None, seed(PAGE).translated("en", "Footer", 1).hidden())
        .await
        .unwrap();
    tree.add(None, seed(PAGE).translated("nl", "Alleen NL", 2))
        .await
        .unwrap();

    let menu = tree.menu("en").build().await.unwrap();
    assert_eq!(item_ids(&menu.top_items(false).await.unwrap()), vec![home.id]);
    assert_eq!(
        item_ids(&menu.top_items(true).await.unwrap()),
        vec![home.id, footer.id]
    );
    assert_eq!(item_ids(&menu.top_items(false).await.unwrap()), vec![home.id]);
}

#[tokio::test]
async fn acl_limits_menu_items() {
    let site = site().await;
    let acl = Arc::new(GrantTable::new());
    acl.grant_all([site.home.id, site.news.id], "view");
    acl.grant(site.about.id, "edit");

    let menu = site.tree.menu_with_acl("en", acl.clone()).build().await.unwrap();
    let top = menu.top_items(false).await.unwrap();
    let children = top[0].children(true).await.unwrap();
    assert_eq!(item_ids(&children), vec![site.news.id]);

    let editors = site
        .tree
        .menu_with_acl("en", acl)
        .permission("edit")
        .build()
        .await
        .unwrap();
    assert!(editors.top_items(true).await.unwrap().is_empty());
}

// -------------------------------------------------------------------------
// Breadcrumb and ancestry
// -------------------------------------------------------------------------

#[tokio::test]
async fn breadcrumb_follows_current_node() {
    let site = site().await;
    let menu = site
        .tree
        .menu("en")
        .current_node(site.team.clone())
        .build()
        .await
        .unwrap();

    let crumbs = menu.breadcrumb();
    assert_eq!(
        item_ids(&crumbs),
        vec![site.home.id, site.about.id, site.team.id]
    );
    let titles: Vec<_> = crumbs.iter().map(|c| c.title()).collect();
    assert_eq!(titles, ["Home", "About", "Team"]);

    let current = menu.current().unwrap();
    assert_eq!(current.id(), site.team.id);
    assert_eq!(current.url(), Some("home/about/team"));

    let parents = current.parents();
    assert_eq!(item_ids(&parents), vec![site.home.id, site.about.id]);

    let mut chain = Vec::new();
    let mut cursor = current.parent();
    while let Some(parent) = cursor {
        chain.push(parent.id());
        cursor = parent.parent();
    }
    chain.reverse();
    assert_eq!(chain, item_ids(&parents));
}

#[tokio::test]
async fn breadcrumb_empty_without_current_node() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();

    assert!(menu.breadcrumb().is_empty());
    assert!(menu.current().is_none());

    let top = menu.top_items(false).await.unwrap();
    assert!(!top[0].active());
}

#[tokio::test]
async fn active_marks_breadcrumb_items() {
    let site = site().await;
    let menu = site
        .tree
        .menu("en")
        .current_node(site.team.clone())
        .build()
        .await
        .unwrap();

    let top = menu.top_items(false).await.unwrap();
    assert!(top[0].active());

    let children = top[0].children(false).await.unwrap();
    let about = children.iter().find(|c| c.id() == site.about.id).unwrap();
    let news = children.iter().find(|c| c.id() == site.news.id).unwrap();
    assert!(about.active());
    assert!(!news.active());

    let team = &about.children(false).await.unwrap()[0];
    assert!(team.active());
}

#[tokio::test]
async fn breadcrumb_skips_ancestors_without_visible_translation() {
    let tree = TestTree::new();
    let home = tree.add(None, seed(PAGE).translated("en", "Home", 0)).await.unwrap();
    let section = tree
        .add(Some(&home), seed(PAGE).offline("en", "Section", 0))
        .await
        .unwrap();
    let leaf = tree
        .add(Some(&section), seed(PAGE).translated("en", "Leaf", 0))
        .await
        .unwrap();
    let dutch = tree
        .add(None, seed(PAGE).translated("nl", "Alleen NL", 1))
        .await
        .unwrap();
    let home = tree.reload(&home).await.unwrap();
    let leaf = tree.reload(&leaf).await.unwrap();

    let menu = tree.menu("en").current_node(leaf.clone()).build().await.unwrap();

    let crumbs = menu.breadcrumb();
    assert_eq!(item_ids(&crumbs), vec![home.id, leaf.id]);
    assert!(crumbs.iter().all(|c| c.url().is_some()));
    assert_eq!(crumbs[1].parent().unwrap().id(), home.id);

    let current = menu.current().unwrap();
    assert_eq!(current.url(), Some("home/section/leaf"));
    assert_eq!(item_ids(&current.parents()), vec![home.id]);

    let unrelated = menu.item_for(dutch).await.unwrap();
    assert!(unrelated.url().is_none());
    assert!(!unrelated.active());
    assert!(current.active());
}

#[tokio::test]
async fn untranslated_current_node_stays_out_of_breadcrumb() {
    let tree = TestTree::new();
    let home = tree.add(None, seed(PAGE).translated("en", "Home", 0)).await.unwrap();
    let draft = tree
        .add(Some(&home), seed(PAGE).offline("en", "Draft", 0))
        .await
        .unwrap();
    let home = tree.reload(&home).await.unwrap();

    let menu = tree.menu("en").current_node(draft.clone()).build().await.unwrap();

    assert_eq!(item_ids(&menu.breadcrumb()), vec![home.id]);
    let current = menu.current().unwrap();
    assert_eq!(current.id(), draft.id);
    assert_eq!(current.title(), "Untranslated");
    assert!(!current.active());
    assert_eq!(current.parent().unwrap().id(), home.id);
}

// -------------------------------------------------------------------------
// Content types
// -------------------------------------------------------------------------

#[tokio::test]
async fn parent_of_class_resolves_aliases() {
    let site = site().await;
    let menu = site
        .tree
        .menu("en")
        .current_node(site.article.clone())
        .build()
        .await
        .unwrap();
    let article = menu.current().unwrap();

    let news = article.parent_of_class("App:NewsPage").await.unwrap().unwrap();
    assert_eq!(news.id(), site.news.id);

    // NewsPage extends Page, so the nearest Page ancestor is news itself.
    let page = article.parent_of_class("App:Page").await.unwrap().unwrap();
    assert_eq!(page.id(), site.news.id);

    let home = menu.breadcrumb()[0].clone();
    assert!(home.parent_of_class(PAGE).await.unwrap().is_none());
    assert!(article.parent_of_class("app::entity::Other").await.unwrap().is_none());
}

#[tokio::test]
async fn children_of_class_filters_by_type() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();
    let home = menu.item_for(site.home.clone()).await.unwrap();

    let news_pages = home.children_of_class("App:NewsPage").await.unwrap();
    assert_eq!(item_ids(&news_pages), vec![site.news.id]);

    let pages = home.children_of_class("App:Page").await.unwrap();
    assert_eq!(
        item_ids(&pages),
        vec![site.about.id, site.news.id, site.legal.id]
    );

    let first = home.child_of_class(NEWS_PAGE).await.unwrap().unwrap();
    assert_eq!(first.id(), site.news.id);

    assert!(home.child_of_class("App:Missing").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_alias_is_an_error() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();
    let home = menu.item_for(site.home.clone()).await.unwrap();

    let err = home.children_of_class("Shop:Product").await.unwrap_err();
    assert!(matches!(err, NodeError::UnknownNamespaceAlias(alias) if alias == "Shop"));
}

#[tokio::test]
async fn page_loads_published_content() {
    let site = site().await;
    let menu = site.tree.menu("en").build().await.unwrap();
    let news = menu.item_for(site.news.clone()).await.unwrap();

    let page = news.page().await.unwrap().unwrap();
    assert_eq!(page.title(), "News");
    assert_eq!(page.entity_name(), NEWS_PAGE);

    let version = news.public_version().await.unwrap().unwrap();
    assert_eq!(version.content_ref(), page.content_ref().unwrap());
}
