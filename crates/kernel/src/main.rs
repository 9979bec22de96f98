//! Nodetree CLI
//!
//! Inspect a node tree stored in PostgreSQL.
//!
//! Usage:
//!   nodetree --lang en --role editor menu
//!   nodetree --admin slug about/team

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use nodetree_kernel::acl::PERMISSION_VIEW;
use nodetree_kernel::{
    AclHelper, Config, ContentRegistry, Node, NodeMenu, NodeRepository, ParentFilter, PgNodeStore,
    RoleAclHelper, db,
};

/// Node tree inspection tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Language code; defaults to DEFAULT_LANGUAGE.
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Permission the listed nodes must grant.
    #[arg(long, global = true, default_value = PERMISSION_VIEW)]
    permission: String,

    /// Role of the actor (repeatable).
    #[arg(long = "role", global = true)]
    roles: Vec<String>,

    /// Act as administrator, bypassing node ACLs.
    #[arg(long, global = true)]
    admin: bool,

    /// Include nodes hidden from navigation.
    #[arg(long, global = true)]
    include_hidden: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// List accessible top-level nodes.
    TopNodes,
    /// List accessible children of a node.
    Children { id: Uuid },
    /// Show the ancestor chain of a node, root first.
    Parents { id: Uuid },
    /// Resolve a slug path to a node.
    Slug { path: String },
    /// Find nodes by internal name.
    InternalName {
        name: String,
        /// Only consider top-level nodes.
        #[arg(long)]
        root: bool,
        /// Include nodes whose translation is offline.
        #[arg(long)]
        include_offline: bool,
    },
    /// Print the whole menu tree.
    Menu,
    /// Print the breadcrumb trail of a node.
    Breadcrumb { id: Uuid },
}

#[derive(Serialize)]
struct Crumb {
    id: Uuid,
    title: String,
    url: Option<String>,
    online: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let lang = args
        .lang
        .clone()
        .unwrap_or_else(|| config.default_language.clone());

    let pool = db::create_pool(&config).await?;
    info!(lang = %lang, "connected to database");

    if matches!(args.command, Command::Migrate) {
        db::run_migrations(&pool).await?;
        info!("migrations applied");
        return Ok(());
    }

    let repository = NodeRepository::new(Arc::new(PgNodeStore::new(pool.clone())));
    let acl: Arc<dyn AclHelper> = if args.admin {
        Arc::new(RoleAclHelper::admin(pool))
    } else {
        Arc::new(RoleAclHelper::new(pool, args.roles.clone()))
    };

    match args.command {
        Command::Migrate => {}
        Command::TopNodes => {
            let nodes = repository
                .top_nodes(&lang, &args.permission, acl.as_ref(), args.include_hidden)
                .await?;
            print_json(&nodes)?;
        }
        Command::Children { id } => {
            let nodes = repository
                .child_nodes(Some(id), &lang, &args.permission, acl.as_ref(), args.include_hidden)
                .await?;
            print_json(&nodes)?;
        }
        Command::Parents { id } => {
            let node = require_node(&repository, id).await?;
            let parents = repository.all_parents(Some(&node), Some(lang.as_str())).await?;
            print_json(&parents)?;
        }
        Command::Slug { path } => {
            let node = repository.node_for_slug(None, &path).await?;
            print_json(&node)?;
        }
        Command::InternalName {
            name,
            root,
            include_offline,
        } => {
            let parent = if root {
                ParentFilter::Root
            } else {
                ParentFilter::Any
            };
            let nodes = repository
                .nodes_by_internal_name(&name, &lang, parent, include_offline)
                .await?;
            print_json(&nodes)?;
        }
        Command::Menu => {
            let tree = repository
                .menu_tree(&lang, &args.permission, acl.as_ref(), args.include_hidden)
                .await?;
            print_json(&tree)?;
        }
        Command::Breadcrumb { id } => {
            let node = require_node(&repository, id).await?;
            let content = ContentRegistry::builder()
                .namespaces(&config.entity_namespaces)
                .build();
            let menu = NodeMenu::builder(repository, acl, Arc::new(content), lang)
                .permission(args.permission)
                .current_node(node)
                .build()
                .await?;

            let crumbs: Vec<Crumb> = menu
                .breadcrumb()
                .iter()
                .map(|item| Crumb {
                    id: item.id(),
                    title: item.title().to_string(),
                    url: item.url().map(str::to_string),
                    online: item.online(),
                })
                .collect();
            print_json(&crumbs)?;
        }
    }

    Ok(())
}

async fn require_node(repository: &NodeRepository, id: Uuid) -> Result<Node> {
    match repository.find_node(id).await? {
        Some(node) => Ok(node),
        None => bail!("node {id} not found"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Initialize tracing with environment filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
