//! Nodetree Kernel Library
//!
//! Nested-set content tree repository with per-language translations,
//! ACL-filtered queries and lazily expanded navigation menus.
//! The `nodetree` binary is a thin CLI over this library.

pub mod acl;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod menu;
pub mod models;
pub mod repository;
pub mod slug;

pub use acl::{AccessScope, AclHelper, AllowAll, GrantTable, PermissionDefinition, RoleAclHelper};
pub use config::Config;
pub use content::{ContentLoader, ContentRegistry, HasNode};
pub use error::{NodeError, NodeResult};
pub use menu::{MenuTreeNode, NodeMenu, NodeMenuBuilder, NodeMenuItem};
pub use models::{ContentRef, MenuNode, Node, NodeTranslation, NodeVersion};
pub use repository::{MemoryNodeStore, NodeRepository, NodeStore, ParentFilter, PgNodeStore};
