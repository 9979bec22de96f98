//! Content entities that live in the node tree.
//!
//! A node never owns its content. It points at it through a [`ContentRef`]
//! (type tag + id) and the [`ContentRegistry`] turns that handle back into a
//! loaded object.

mod registry;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::ContentRef;

pub use registry::{ContentRegistry, ContentRegistryBuilder, TYPE_SEPARATOR};

/// Content that can be placed in the tree.
pub trait HasNode: fmt::Debug + Send + Sync {
    /// Persisted identity, `None` until the content has been saved.
    fn id(&self) -> Option<Uuid>;

    /// Fully qualified type tag.
    fn entity_name(&self) -> &str;

    fn title(&self) -> &str;

    /// The content's parent content, if it has one.
    fn parent(&self) -> Option<ContentRef>;

    fn content_ref(&self) -> Option<ContentRef> {
        self.id().map(|id| ContentRef::new(self.entity_name(), id))
    }
}

/// Loads content of one type by id.
#[async_trait]
pub trait ContentLoader: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Arc<dyn HasNode>>>;
}
