//! Role-based ACL backed by the `node_acl` table.

use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{AccessScope, AclHelper, PermissionDefinition};

/// Grants come from `node_acl(node_id, role, permission)` rows matching any
/// of the actor's roles. Admins are unrestricted.
#[derive(Clone)]
pub struct RoleAclHelper {
    pool: PgPool,
    roles: Vec<String>,
    is_admin: bool,
}

impl RoleAclHelper {
    pub fn new(pool: PgPool, roles: Vec<String>) -> Self {
        Self {
            pool,
            roles,
            is_admin: false,
        }
    }

    /// Helper for an administrator; every query is unrestricted.
    pub fn admin(pool: PgPool) -> Self {
        Self {
            pool,
            roles: Vec::new(),
            is_admin: true,
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

#[async_trait]
impl AclHelper for RoleAclHelper {
    async fn access_scope(&self, definition: &PermissionDefinition) -> Result<AccessScope> {
        if self.is_admin {
            return Ok(AccessScope::Unrestricted);
        }

        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT node_id
            FROM node_acl
            WHERE role = ANY($1) AND permission = ANY($2)
            "#,
        )
        .bind(&self.roles)
        .bind(&definition.permissions)
        .fetch_all(&self.pool)
        .await
        .context("failed to load node ACL grants")?;

        debug!(
            roles = ?self.roles,
            permissions = ?definition.permissions,
            granted = ids.len(),
            "resolved node access scope"
        );

        Ok(AccessScope::Only(ids.into_iter().collect::<HashSet<_>>()))
    }
}
