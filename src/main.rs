// Bibliographic Catalog - admin CLI
// Thin layer over `Catalog` for inspecting a catalog database

use anyhow::{Context, Result};
use bibcatalog::{
    Catalog, CatalogConfig, DatabaseLocation, EditgroupId, EntityId, EntityType, ExternalId,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bibcatalog", version, about = "Versioned bibliographic catalog admin tool")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and BIBCATALOG_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema and default editor
    Init,
    /// Print changelog entries
    Changelog {
        #[arg(long, default_value_t = 1)]
        from: i64,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the current state of an entity
    Show {
        ident: String,
        /// Release fields to leave out, eg `refs,contribs`
        #[arg(long, default_value = "")]
        hide: String,
    },
    /// Show accepted edits on an entity, newest first
    History { ident: String },
    /// Show an editgroup and its edits
    Editgroup { id: String },
    /// Find an entity by external id, eg `lookup doi 10.1234/5678`
    Lookup { kind: String, value: String },
    /// Show an editor, creating it if it does not exist
    Editor { username: String },
    /// Count live entities of each type
    Stats,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::from_env(),
    };
    if let Some(db) = cli.db {
        config.database = DatabaseLocation::File(db);
    }
    if config.database == DatabaseLocation::InMemory {
        tracing::warn!("no database configured, using a throwaway in-memory catalog");
    }

    let catalog = Catalog::open(config).context("Failed to open catalog")?;

    match cli.command {
        Commands::Init => {
            println!("✓ Catalog ready (version {})", bibcatalog::VERSION);
            let editor = catalog.get_editor(&catalog.default_editor())?;
            println!("✓ Default editor: {} ({})", editor.username, editor.id);
        }

        Commands::Changelog { from, limit } => {
            let entries = catalog.read_changelog(from, limit)?;
            if entries.is_empty() {
                println!("(no changelog entries from #{})", from);
            }
            for entry in entries {
                let editgroup = catalog.get_editgroup(&entry.editgroup_id)?;
                println!(
                    "#{:<6} {}  editgroup {}  {} edit(s)  {}",
                    entry.seq,
                    entry.accepted_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.editgroup_id,
                    editgroup.edits.len(),
                    editgroup.description.unwrap_or_default()
                );
            }
        }

        Commands::Show { ident, hide } => {
            let id: EntityId = ident.parse()?;
            let view = catalog.get_entity_with(&id, hide.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::History { ident } => {
            let id: EntityId = ident.parse()?;
            let history = catalog.entity_history(&id)?;
            println!("📜 {} accepted edit(s) on {}", history.len(), id);
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for entry in history {
                println!(
                    "#{:<6} {}  {:?}  editgroup {}",
                    entry.changelog.seq,
                    entry.changelog.accepted_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.edit.action,
                    entry.editgroup.id
                );
            }
        }

        Commands::Editgroup { id } => {
            let id: EditgroupId = id.parse()?;
            let editgroup = catalog.get_editgroup(&id)?;
            println!("{}", serde_json::to_string_pretty(&editgroup)?);
        }

        Commands::Lookup { kind, value } => {
            let extid = ExternalId::from_kind(&kind, &value)
                .ok_or_else(|| anyhow::anyhow!("unknown identifier kind: {}", kind))?;
            let view = catalog.lookup(&extid)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }

        Commands::Editor { username } => {
            let editor = match catalog.get_editor_by_username(&username) {
                Ok(editor) => editor,
                Err(bibcatalog::CatalogError::NotFound(_)) => {
                    let editor = catalog.create_editor(&username)?;
                    println!("✓ Created editor {}", editor.username);
                    editor
                }
                Err(e) => return Err(e.into()),
            };
            println!("{}", serde_json::to_string_pretty(&editor)?);
        }

        Commands::Stats => {
            println!("📊 Live entities");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            for entity_type in EntityType::ALL {
                println!("  {:<10} {}", entity_type, catalog.count_entities(entity_type)?);
            }
            match catalog.latest_changelog()? {
                Some(entry) => println!("  changelog  #{}", entry.seq),
                None => println!("  changelog  (empty)"),
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
