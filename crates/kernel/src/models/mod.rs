//! Database models.

pub mod node;
pub mod node_translation;
pub mod node_version;

pub use node::{MenuNode, NewNode, Node};
pub use node_translation::{NewNodeTranslation, NodeTranslation};
pub use node_version::{
    ContentRef, NewNodeVersion, NodeVersion, VERSION_TYPE_DRAFT, VERSION_TYPE_PUBLIC,
};
