//! ACL seam for node queries.
//!
//! Repository queries never evaluate permissions themselves. They ask an
//! [`AclHelper`] for the [`AccessScope`] of the current actor and restrict
//! their result set to it.

mod role;

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

pub use role::RoleAclHelper;

/// Entity name used for node permission definitions.
pub const NODE_ENTITY: &str = "Node";

/// Permission most menus are built with.
pub const PERMISSION_VIEW: &str = "view";

/// What is being asked for: one or more permission names on an entity.
///
/// Holding any of the listed permissions is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDefinition {
    pub permissions: Vec<String>,
    pub entity: Option<String>,
    pub alias: Option<String>,
}

impl PermissionDefinition {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            entity: None,
            alias: None,
        }
    }

    /// Definition for a single permission on nodes, aliased as `n`.
    pub fn for_nodes(permission: &str) -> Self {
        Self::new([permission]).with_entity(NODE_ENTITY).with_alias("n")
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// The set of nodes an actor may access for a permission definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// No restriction applies.
    Unrestricted,
    /// Only these nodes are accessible.
    Only(HashSet<Uuid>),
}

impl AccessScope {
    pub fn permits(&self, node_id: Uuid) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Only(ids) => ids.contains(&node_id),
        }
    }

    /// The id list to restrict a query with, `None` when unrestricted.
    pub fn restriction(&self) -> Option<Vec<Uuid>> {
        match self {
            Self::Unrestricted => None,
            Self::Only(ids) => Some(ids.iter().copied().collect()),
        }
    }
}

/// Resolves the access scope of the current actor.
#[async_trait]
pub trait AclHelper: Send + Sync {
    async fn access_scope(&self, definition: &PermissionDefinition) -> Result<AccessScope>;
}

/// ACL helper that grants everything. Used for administrative tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AclHelper for AllowAll {
    async fn access_scope(&self, _definition: &PermissionDefinition) -> Result<AccessScope> {
        Ok(AccessScope::Unrestricted)
    }
}

/// In-memory grants of permissions on individual nodes.
#[derive(Debug, Default)]
pub struct GrantTable {
    grants: RwLock<HashMap<String, HashSet<Uuid>>>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` on a node.
    pub fn grant(&self, node_id: Uuid, permission: &str) {
        self.grants
            .write()
            .entry(permission.to_string())
            .or_default()
            .insert(node_id);
    }

    /// Grant `permission` on several nodes at once.
    pub fn grant_all(&self, node_ids: impl IntoIterator<Item = Uuid>, permission: &str) {
        let mut grants = self.grants.write();
        grants
            .entry(permission.to_string())
            .or_default()
            .extend(node_ids);
    }

    /// Revoke `permission` on a node. Returns whether a grant existed.
    pub fn revoke(&self, node_id: Uuid, permission: &str) -> bool {
        self.grants
            .write()
            .get_mut(permission)
            .is_some_and(|ids| ids.remove(&node_id))
    }
}

#[async_trait]
impl AclHelper for GrantTable {
    async fn access_scope(&self, definition: &PermissionDefinition) -> Result<AccessScope> {
        let grants = self.grants.read();
        let ids = definition
            .permissions
            .iter()
            .filter_map(|p| grants.get(p))
            .flatten()
            .copied()
            .collect();

        Ok(AccessScope::Only(ids))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn node_definition_carries_entity_and_alias() {
        let def = PermissionDefinition::for_nodes(PERMISSION_VIEW);
        assert_eq!(def.permissions, vec!["view".to_string()]);
        assert_eq!(def.entity.as_deref(), Some(NODE_ENTITY));
        assert_eq!(def.alias.as_deref(), Some("n"));
    }

    #[test]
    fn scope_permits() {
        let id = Uuid::now_v7();
        assert!(AccessScope::Unrestricted.permits(id));
        assert!(AccessScope::Only(HashSet::from([id])).permits(id));
        assert!(!AccessScope::Only(HashSet::new()).permits(id));
        assert_eq!(AccessScope::Unrestricted.restriction(), None);
    }

    #[tokio::test]
    async fn grant_table_unions_permissions() {
        let table = GrantTable::new();
        let viewable = Uuid::now_v7();
        let editable = Uuid::now_v7();
        let hidden = Uuid::now_v7();
        table.grant(viewable, "view");
        table.grant(editable, "edit");

        let scope = table
            .access_scope(&PermissionDefinition::new(["view", "edit"]))
            .await
            .unwrap();
        assert!(scope.permits(viewable));
        assert!(scope.permits(editable));
        assert!(!scope.permits(hidden));

        assert!(table.revoke(viewable, "view"));
        assert!(!table.revoke(viewable, "view"));
        let scope = table
            .access_scope(&PermissionDefinition::for_nodes("view"))
            .await
            .unwrap();
        assert!(!scope.permits(viewable));
    }

    #[tokio::test]
    async fn allow_all_is_unrestricted() {
        let scope = AllowAll
            .access_scope(&PermissionDefinition::for_nodes("delete"))
            .await
            .unwrap();
        assert_eq!(scope, AccessScope::Unrestricted);
    }
}
