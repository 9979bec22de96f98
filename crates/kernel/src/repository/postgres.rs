//! PostgreSQL node store.
//!
//! Dynamically filtered selects are built with SeaQuery; fixed-shape queries
//! and writes use plain SQL with bound parameters.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sea_query::{Cond, Expr, Iden, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::store::{NodeStore, ParentFilter};
use crate::acl::AccessScope;
use crate::models::{
    ContentRef, MenuNode, NewNode, NewNodeTranslation, NewNodeVersion, Node, NodeTranslation,
    NodeVersion,
};

#[derive(Iden, Clone, Copy)]
enum Nodes {
    Table,
    Id,
    ParentId,
    Lft,
    Rgt,
    Lvl,
    Deleted,
    HiddenFromNav,
    InternalName,
    RefEntityName,
    Created,
    Changed,
}

#[derive(Iden, Clone, Copy)]
enum NodeTranslations {
    Table,
    NodeId,
    Lang,
    Title,
    Slug,
    Weight,
    Online,
}

const NODE_COLUMNS: [Nodes; 11] = [
    Nodes::Id,
    Nodes::ParentId,
    Nodes::Lft,
    Nodes::Rgt,
    Nodes::Lvl,
    Nodes::Deleted,
    Nodes::HiddenFromNav,
    Nodes::InternalName,
    Nodes::RefEntityName,
    Nodes::Created,
    Nodes::Changed,
];

/// `SELECT <node columns> FROM nodes WHERE NOT deleted`.
fn select_live_nodes() -> SelectStatement {
    let mut query = Query::select();
    query
        .columns(NODE_COLUMNS.iter().map(|c| (Nodes::Table, *c)))
        .from(Nodes::Table)
        .and_where(Expr::col((Nodes::Table, Nodes::Deleted)).eq(false));
    query
}

/// Join the node's translation in `lang`.
fn join_translation(query: &mut SelectStatement, join: JoinType, lang: &str) {
    query.join(
        join,
        NodeTranslations::Table,
        Cond::all()
            .add(
                Expr::col((NodeTranslations::Table, NodeTranslations::NodeId))
                    .equals((Nodes::Table, Nodes::Id)),
            )
            .add(Expr::col((NodeTranslations::Table, NodeTranslations::Lang)).eq(lang)),
    );
}

fn filter_parent(query: &mut SelectStatement, parent: ParentFilter) {
    let col = Expr::col((Nodes::Table, Nodes::ParentId));
    match parent {
        ParentFilter::Any => {}
        ParentFilter::Root => {
            query.and_where(col.is_null());
        }
        ParentFilter::Node(id) => {
            query.and_where(col.eq(id));
        }
    }
}

fn filter_scope(query: &mut SelectStatement, scope: &AccessScope) {
    if let Some(ids) = scope.restriction() {
        query.and_where(Expr::col((Nodes::Table, Nodes::Id)).is_in(ids));
    }
}

fn order_by_weight_and_title(query: &mut SelectStatement) {
    query
        .order_by((NodeTranslations::Table, NodeTranslations::Weight), Order::Asc)
        .order_by((NodeTranslations::Table, NodeTranslations::Title), Order::Asc);
}

fn child_nodes_sql(
    parent_id: Option<Uuid>,
    lang: &str,
    include_hidden_from_nav: bool,
    scope: &AccessScope,
) -> String {
    let mut query = select_live_nodes();
    join_translation(&mut query, JoinType::LeftJoin, lang);
    if !include_hidden_from_nav {
        query.and_where(Expr::col((Nodes::Table, Nodes::HiddenFromNav)).eq(false));
    }
    filter_parent(&mut query, ParentFilter::from(parent_id));
    filter_scope(&mut query, scope);
    order_by_weight_and_title(&mut query);
    query.to_string(PostgresQueryBuilder)
}

fn containing_nodes_sql(lft: i32, rgt: i32, lang: Option<&str>) -> String {
    let mut query = select_live_nodes();
    if let Some(lang) = lang {
        join_translation(&mut query, JoinType::InnerJoin, lang);
    }
    query
        .and_where(Expr::col((Nodes::Table, Nodes::Lft)).lte(lft))
        .and_where(Expr::col((Nodes::Table, Nodes::Rgt)).gte(rgt))
        .order_by((Nodes::Table, Nodes::Lft), Order::Asc);
    query.to_string(PostgresQueryBuilder)
}

fn internal_name_sql(
    internal_name: &str,
    lang: &str,
    parent: ParentFilter,
    include_offline: bool,
) -> String {
    let mut query = select_live_nodes();
    join_translation(&mut query, JoinType::InnerJoin, lang);
    query.and_where(Expr::col((Nodes::Table, Nodes::InternalName)).eq(internal_name));
    if !include_offline {
        query.and_where(Expr::col((NodeTranslations::Table, NodeTranslations::Online)).eq(true));
    }
    filter_parent(&mut query, parent);
    order_by_weight_and_title(&mut query);
    query.to_string(PostgresQueryBuilder)
}

fn find_by_slug_sql(parent: ParentFilter, slug: &str) -> String {
    let mut query = select_live_nodes();
    query.distinct().join(
        JoinType::InnerJoin,
        NodeTranslations::Table,
        Expr::col((NodeTranslations::Table, NodeTranslations::NodeId))
            .equals((Nodes::Table, Nodes::Id)),
    );
    query.and_where(Expr::col((NodeTranslations::Table, NodeTranslations::Slug)).eq(slug));
    filter_parent(&mut query, parent);
    query.order_by((Nodes::Table, Nodes::Lft), Order::Asc).limit(1);
    query.to_string(PostgresQueryBuilder)
}

/// Node store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgNodeStore {
    pool: PgPool,
}

impl PgNodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_nodes(&self, sql: &str, what: &'static str) -> Result<Vec<Node>> {
        debug!(sql, "node query");
        sqlx::query_as::<_, Node>(sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {what}"))
    }
}

#[async_trait]
impl NodeStore for PgNodeStore {
    async fn find_node(&self, id: Uuid) -> Result<Option<Node>> {
        let node = sqlx::query_as::<_, Node>(
            r#"
            SELECT id, parent_id, lft, rgt, lvl, deleted, hidden_from_nav, internal_name,
                   ref_entity_name, created, changed
            FROM nodes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch node")?;

        Ok(node)
    }

    async fn child_nodes(
        &self,
        parent_id: Option<Uuid>,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<Node>> {
        let sql = child_nodes_sql(parent_id, lang, include_hidden_from_nav, scope);
        self.fetch_nodes(&sql, "child nodes").await
    }

    async fn top_level_nodes(&self) -> Result<Vec<Node>> {
        let nodes = sqlx::query_as::<_, Node>(
            r#"
            SELECT id, parent_id, lft, rgt, lvl, deleted, hidden_from_nav, internal_name,
                   ref_entity_name, created, changed
            FROM nodes
            WHERE deleted = FALSE AND parent_id IS NULL
            ORDER BY lft
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch top-level nodes")?;

        Ok(nodes)
    }

    async fn containing_nodes(&self, lft: i32, rgt: i32, lang: Option<&str>) -> Result<Vec<Node>> {
        let sql = containing_nodes_sql(lft, rgt, lang);
        self.fetch_nodes(&sql, "ancestor nodes").await
    }

    async fn nodes_by_internal_name(
        &self,
        internal_name: &str,
        lang: &str,
        parent: ParentFilter,
        include_offline: bool,
    ) -> Result<Vec<Node>> {
        let sql = internal_name_sql(internal_name, lang, parent, include_offline);
        self.fetch_nodes(&sql, "nodes by internal name").await
    }

    async fn find_by_slug(&self, parent: ParentFilter, slug: &str) -> Result<Option<Node>> {
        let sql = find_by_slug_sql(parent, slug);
        let node = sqlx::query_as::<_, Node>(&sql)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch node by slug")?;

        Ok(node)
    }

    async fn menu_nodes(
        &self,
        lang: &str,
        include_hidden_from_nav: bool,
        scope: &AccessScope,
    ) -> Result<Vec<MenuNode>> {
        let rows = sqlx::query_as::<_, MenuNode>(
            r#"
            SELECT n.id, n.parent_id AS parent,
                   COALESCE(t.weight, v.weight) AS weight,
                   COALESCE(t.title, v.title) AS title,
                   COALESCE(t.online, FALSE) AS online
            FROM nodes n
            LEFT JOIN node_translations t ON t.node_id = n.id AND t.lang = $1
            LEFT JOIN (
                SELECT DISTINCT ON (node_id) node_id, title, weight
                FROM node_translations
                WHERE lang <> $1
                ORDER BY node_id, created ASC
            ) v ON v.node_id = n.id
            WHERE n.deleted = FALSE
              AND ($2 OR n.hidden_from_nav = FALSE)
              AND ($3::uuid[] IS NULL OR n.id = ANY($3))
            ORDER BY parent ASC NULLS FIRST, weight ASC, title ASC
            "#,
        )
        .bind(lang)
        .bind(include_hidden_from_nav)
        .bind(scope.restriction())
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch menu nodes")?;

        Ok(rows)
    }

    async fn find_translation(&self, id: Uuid) -> Result<Option<NodeTranslation>> {
        let translation = sqlx::query_as::<_, NodeTranslation>(
            r#"
            SELECT id, node_id, lang, title, slug, url, weight, online, public_node_version_id,
                   created, changed
            FROM node_translations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch node translation")?;

        Ok(translation)
    }

    async fn translation_for(&self, node_id: Uuid, lang: &str) -> Result<Option<NodeTranslation>> {
        let translation = sqlx::query_as::<_, NodeTranslation>(
            r#"
            SELECT id, node_id, lang, title, slug, url, weight, online, public_node_version_id,
                   created, changed
            FROM node_translations
            WHERE node_id = $1 AND lang = $2
            "#,
        )
        .bind(node_id)
        .bind(lang)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch node translation for language")?;

        Ok(translation)
    }

    async fn find_version(&self, id: Uuid) -> Result<Option<NodeVersion>> {
        let version = sqlx::query_as::<_, NodeVersion>(
            r#"
            SELECT id, node_translation_id, version_type, owner, ref_id, ref_entity_name,
                   created, changed
            FROM node_versions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch node version")?;

        Ok(version)
    }

    async fn find_version_by_ref(&self, content: &ContentRef) -> Result<Option<NodeVersion>> {
        let version = sqlx::query_as::<_, NodeVersion>(
            r#"
            SELECT id, node_translation_id, version_type, owner, ref_id, ref_entity_name,
                   created, changed
            FROM node_versions
            WHERE ref_id = $1 AND ref_entity_name = $2
            ORDER BY created ASC
            LIMIT 1
            "#,
        )
        .bind(content.id)
        .bind(&content.entity_name)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch node version by content reference")?;

        Ok(version)
    }

    async fn insert_node(&self, node: NewNode) -> Result<Node> {
        let now = chrono::Utc::now().timestamp();
        let id = Uuid::now_v7();

        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        // Bounds are shifted tree-wide; serialize concurrent inserts.
        sqlx::query("LOCK TABLE nodes IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .context("failed to lock nodes table")?;

        let (lft, lvl) = match node.parent_id {
            Some(parent_id) => {
                let parent: Option<(i32, i32)> =
                    sqlx::query_as("SELECT rgt, lvl FROM nodes WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .context("failed to fetch parent bounds")?;
                let Some((parent_rgt, parent_lvl)) = parent else {
                    bail!("parent node {parent_id} does not exist");
                };

                sqlx::query("UPDATE nodes SET rgt = rgt + 2 WHERE rgt >= $1")
                    .bind(parent_rgt)
                    .execute(&mut *tx)
                    .await
                    .context("failed to shift right bounds")?;

                sqlx::query("UPDATE nodes SET lft = lft + 2 WHERE lft > $1")
                    .bind(parent_rgt)
                    .execute(&mut *tx)
                    .await
                    .context("failed to shift left bounds")?;

                (parent_rgt, parent_lvl + 1)
            }
            None => {
                let max_rgt: Option<i32> = sqlx::query_scalar("SELECT MAX(rgt) FROM nodes")
                    .fetch_one(&mut *tx)
                    .await
                    .context("failed to fetch highest bound")?;
                (max_rgt.unwrap_or(0) + 1, 0)
            }
        };

        let created = sqlx::query_as::<_, Node>(
            r#"
            INSERT INTO nodes (id, parent_id, lft, rgt, lvl, deleted, hidden_from_nav,
                               internal_name, ref_entity_name, created, changed)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9, $10)
            RETURNING id, parent_id, lft, rgt, lvl, deleted, hidden_from_nav, internal_name,
                      ref_entity_name, created, changed
            "#,
        )
        .bind(id)
        .bind(node.parent_id)
        .bind(lft)
        .bind(lft + 1)
        .bind(lvl)
        .bind(node.hidden_from_nav)
        .bind(&node.internal_name)
        .bind(&node.ref_entity_name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert node")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(created)
    }

    async fn insert_translation(
        &self,
        translation: NewNodeTranslation,
        version: NewNodeVersion,
    ) -> Result<(NodeTranslation, NodeVersion)> {
        let now = chrono::Utc::now().timestamp();
        let translation_id = Uuid::now_v7();
        let version_id = Uuid::now_v7();

        let mut tx = self.pool.begin().await.context("failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO node_translations (id, node_id, lang, title, slug, url, weight, online,
                                           created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(translation_id)
        .bind(translation.node_id)
        .bind(&translation.lang)
        .bind(&translation.title)
        .bind(&translation.slug)
        .bind(&translation.url)
        .bind(translation.weight)
        .bind(translation.online)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("failed to insert node translation")?;

        let version = sqlx::query_as::<_, NodeVersion>(
            r#"
            INSERT INTO node_versions (id, node_translation_id, version_type, owner, ref_id,
                                       ref_entity_name, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, node_translation_id, version_type, owner, ref_id, ref_entity_name,
                      created, changed
            "#,
        )
        .bind(version_id)
        .bind(translation_id)
        .bind(&version.version_type)
        .bind(&version.owner)
        .bind(version.content.id)
        .bind(&version.content.entity_name)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert node version")?;

        let translation = sqlx::query_as::<_, NodeTranslation>(
            r#"
            UPDATE node_translations
            SET public_node_version_id = $1
            WHERE id = $2
            RETURNING id, node_id, lang, title, slug, url, weight, online, public_node_version_id,
                      created, changed
            "#,
        )
        .bind(version_id)
        .bind(translation_id)
        .fetch_one(&mut *tx)
        .await
        .context("failed to publish node version")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok((translation, version))
    }
}
