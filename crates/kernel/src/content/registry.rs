//! Content type registry.
//!
//! Maps type tags to loaders, records which types extend which, and expands
//! `Alias:Name` shorthands into fully qualified tags.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use super::{ContentLoader, HasNode};
use crate::error::{NodeError, NodeResult};
use crate::models::ContentRef;

/// Separator between namespace segments of a type tag.
pub const TYPE_SEPARATOR: &str = "::";

/// Registry of content types. Built once, then shared read-only.
#[derive(Default)]
pub struct ContentRegistry {
    namespaces: HashMap<String, String>,
    loaders: HashMap<String, Arc<dyn ContentLoader>>,
    supertypes: HashMap<String, Vec<String>>,
}

/// Builder for [`ContentRegistry`].
#[derive(Default)]
pub struct ContentRegistryBuilder {
    registry: ContentRegistry,
}

impl ContentRegistryBuilder {
    /// Map `alias` to `namespace`, so `Alias:Page` means `namespace::Page`.
    pub fn namespace(mut self, alias: impl Into<String>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.registry.namespaces.insert(
            alias.into(),
            namespace.trim_end_matches(TYPE_SEPARATOR).to_string(),
        );
        self
    }

    /// Add several namespace aliases, e.g. from configuration.
    pub fn namespaces(mut self, namespaces: &HashMap<String, String>) -> Self {
        for (alias, namespace) in namespaces {
            self = self.namespace(alias.clone(), namespace.clone());
        }
        self
    }

    /// Register the loader for a content type.
    pub fn register(
        mut self,
        entity_name: impl Into<String>,
        loader: Arc<dyn ContentLoader>,
    ) -> Self {
        self.registry.loaders.insert(entity_name.into(), loader);
        self
    }

    /// Declare that `entity_name` is also an instance of `supertype`.
    pub fn extends(mut self, entity_name: impl Into<String>, supertype: impl Into<String>) -> Self {
        self.registry
            .supertypes
            .entry(entity_name.into())
            .or_default()
            .push(supertype.into());
        self
    }

    pub fn build(self) -> ContentRegistry {
        self.registry
    }
}

impl ContentRegistry {
    pub fn builder() -> ContentRegistryBuilder {
        ContentRegistryBuilder::default()
    }

    /// Expand a type tag into its fully qualified form.
    ///
    /// `Alias:Name` is looked up in the namespace table; fully qualified
    /// tags (`a::b::Name`) and bare names pass through unchanged.
    pub fn resolve_type_name(&self, tag: &str) -> NodeResult<String> {
        if tag.contains(TYPE_SEPARATOR) {
            return Ok(tag.to_string());
        }

        let Some((alias, name)) = tag.split_once(':') else {
            return Ok(tag.to_string());
        };

        let namespace = self
            .namespaces
            .get(alias)
            .ok_or_else(|| NodeError::UnknownNamespaceAlias(alias.to_string()))?;

        Ok(format!("{namespace}{TYPE_SEPARATOR}{name}"))
    }

    /// Whether `entity_name` is `type_name` or extends it, directly or not.
    pub fn is_instance_of(&self, entity_name: &str, type_name: &str) -> bool {
        let mut seen = HashSet::new();
        let mut pending = vec![entity_name];

        while let Some(current) = pending.pop() {
            if current == type_name {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(current) {
                pending.extend(parents.iter().map(String::as_str));
            }
        }

        false
    }

    /// Resolve `tag` and check `entity_name` against it.
    pub fn matches(&self, entity_name: &str, tag: &str) -> NodeResult<bool> {
        let type_name = self.resolve_type_name(tag)?;
        Ok(self.is_instance_of(entity_name, &type_name))
    }

    /// Load the content behind a reference.
    pub async fn load(&self, content: &ContentRef) -> NodeResult<Option<Arc<dyn HasNode>>> {
        let loader = self.loaders.get(&content.entity_name).ok_or_else(|| {
            anyhow!("no content loader registered for {}", content.entity_name)
        })?;

        debug!(content = %content, "loading content");
        Ok(loader.load(content.id).await?)
    }

    pub fn is_registered(&self, entity_name: &str) -> bool {
        self.loaders.contains_key(entity_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn registry() -> ContentRegistry {
        ContentRegistry::builder()
            .namespace("App", "app::entity::")
            .extends("app::entity::NewsPage", "app::entity::Page")
            .extends("app::entity::Page", "app::entity::Content")
            .build()
    }

    #[test]
    fn resolve_alias() {
        let registry = registry();
        assert_eq!(
            registry.resolve_type_name("App:Page").unwrap(),
            "app::entity::Page"
        );
    }

    #[test]
    fn resolve_passthrough() {
        let registry = registry();
        assert_eq!(
            registry.resolve_type_name("app::entity::Page").unwrap(),
            "app::entity::Page"
        );
        assert_eq!(registry.resolve_type_name("Page").unwrap(), "Page");
    }

    #[test]
    fn resolve_unknown_alias() {
        let err = registry().resolve_type_name("Shop:Product").unwrap_err();
        assert!(matches!(err, NodeError::UnknownNamespaceAlias(alias) if alias == "Shop"));
    }

    #[test]
    fn instance_of_follows_supertypes() {
        let registry = registry();
        assert!(registry.is_instance_of("app::entity::NewsPage", "app::entity::NewsPage"));
        assert!(registry.is_instance_of("app::entity::NewsPage", "app::entity::Page"));
        assert!(registry.is_instance_of("app::entity::NewsPage", "app::entity::Content"));
        assert!(!registry.is_instance_of("app::entity::Page", "app::entity::NewsPage"));
    }

    #[test]
    fn instance_of_tolerates_cycles() {
        let registry = ContentRegistry::builder()
            .extends("a::A", "a::B")
            .extends("a::B", "a::A")
            .build();
        assert!(!registry.is_instance_of("a::A", "a::C"));
    }

    #[test]
    fn matches_uses_alias() {
        let registry = registry();
        assert!(registry.matches("app::entity::NewsPage", "App:Page").unwrap());
        assert!(!registry.matches("app::entity::Page", "App:NewsPage").unwrap());
    }

    #[tokio::test]
    async fn load_unregistered_type_fails() {
        let registry = registry();
        let missing = ContentRef::new("app::entity::Page", uuid::Uuid::nil());
        assert!(registry.load(&missing).await.is_err());
    }
}
