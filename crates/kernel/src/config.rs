//! Configuration loaded from environment variables.

use std::collections::HashMap;
use std::env;

use anyhow::{Context, Result, bail};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Language used when none is requested (default: "en").
    pub default_language: String,

    /// Namespace aliases for content type tags, e.g. `App=app::entity`.
    pub entity_namespaces: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let default_language = env::var("DEFAULT_LANGUAGE")
            .unwrap_or_else(|_| "en".to_string())
            .trim()
            .to_lowercase();

        let entity_namespaces = match env::var("ENTITY_NAMESPACES") {
            Ok(raw) => parse_namespaces(&raw).context("ENTITY_NAMESPACES is malformed")?,
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            default_language,
            entity_namespaces,
        })
    }
}

/// Parse `Alias=namespace` pairs separated by commas.
///
/// Empty entries are ignored so a trailing comma is harmless.
pub fn parse_namespaces(raw: &str) -> Result<HashMap<String, String>> {
    let mut namespaces = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((alias, namespace)) = entry.split_once('=') else {
            bail!("expected Alias=namespace, got {entry:?}");
        };
        let alias = alias.trim();
        let namespace = namespace.trim().trim_end_matches("::");
        if alias.is_empty() || namespace.is_empty() {
            bail!("empty alias or namespace in {entry:?}");
        }
        namespaces.insert(alias.to_string(), namespace.to_string());
    }

    Ok(namespaces)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_namespaces_pairs() {
        let parsed = parse_namespaces("App=app::entity, Blog = blog::entity::,").unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("App").map(String::as_str), Some("app::entity"));
        assert_eq!(parsed.get("Blog").map(String::as_str), Some("blog::entity"));
    }

    #[test]
    fn parse_namespaces_empty() {
        assert!(parse_namespaces("").unwrap().is_empty());
        assert!(parse_namespaces(" , ").unwrap().is_empty());
    }

    #[test]
    fn parse_namespaces_rejects_missing_separator() {
        assert!(parse_namespaces("App").is_err());
        assert!(parse_namespaces("=app::entity").is_err());
    }
}
