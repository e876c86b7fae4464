//! # Snippets CLI (`snip`)
//!
//! ## Usage
//!
//! ```bash
//! snip --config ./config/snip.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snip init` | Create the configured store |
//! | `snip add <key> <value..>` | Add a snippet (`--force` overwrites) |
//! | `snip get <key>` | Show one snippet |
//! | `snip list` | List snippets, optionally filtered |
//! | `snip query <tokens..>` | Ranked search with `name=value` variables |
//! | `snip use <key> [name=value..]` | Print the expanded snippet and record a use |
//! | `snip update <key> <value..>` | Replace a snippet's value |
//! | `snip remove <key>` | Delete a snippet |
//! | `snip favorite <key>` | Pin a snippet (`--off` unpins) |
//! | `snip reset-scores` | Zero scores and usage statistics |
//! | `snip clear` | Delete every snippet |
//! | `snip export` / `snip import <file>` | JSON interchange |
//! | `snip stats` | Store summary |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use snippets::config;
use snippets::error::SnippetError;
use snippets::manager::SnippetManager;
use snippets::{get, search, stats, template};

/// Snippets CLI: keyed text snippets with ranked lookup and templates.
#[derive(Parser)]
#[command(name = "snip", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/snip.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/snip.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured store. Safe to run repeatedly.
    Init,

    /// Add a snippet.
    Add {
        key: String,
        /// Snippet text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
        /// Overwrite an existing snippet with the same key.
        #[arg(long)]
        force: bool,
    },

    /// Show one snippet by key.
    Get { key: String },

    /// List snippets whose key and/or value contain the given terms.
    List {
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        value: Option<String>,
    },

    /// Ranked search. Leading words are the key term; `name=value`
    /// tokens fill template variables.
    Query {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// Print a snippet with variables substituted and record a use.
    Use {
        key: String,
        /// `name=value` assignments.
        #[arg(num_args = 0..)]
        variables: Vec<String>,
    },

    /// Replace the value of an existing snippet.
    Update {
        key: String,
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
    },

    /// Delete a snippet.
    Remove { key: String },

    /// Pin or unpin a snippet.
    Favorite {
        key: String,
        #[arg(long)]
        off: bool,
    },

    /// Zero every score and usage counter.
    ResetScores,

    /// Delete every snippet.
    Clear,

    /// Export all snippets as JSON.
    Export {
        /// Output file path. Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import snippets from a JSON export, overwriting matching keys.
    Import { file: PathBuf },

    /// Show store statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<SnippetError>() {
            Some(rejection) => {
                eprintln!("Error: {}", rejection);
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_or_default(&cli.config)?;
    let manager = SnippetManager::open(&cfg).await?;

    match cli.command {
        Commands::Init => {
            manager.store().flush().await?;
            println!("Store initialized ({}).", manager.store().backend_name());
        }
        Commands::Add { key, value, force } => {
            let value = value.join(" ");
            let sm = if force {
                manager.upsert(&key, &value).await?
            } else {
                manager.create(&key, &value).await?
            };
            println!("Added: {}", sm.key);
        }
        Commands::Get { key } => {
            get::run_get(&manager, &key).await?;
        }
        Commands::List { key, value } => {
            let snippets = manager.list(key.as_deref(), value.as_deref()).await?;
            if snippets.is_empty() {
                println!("No snippets.");
            }
            for sm in &snippets {
                println!("{}\t{}", sm.key, sm.value.replace('\n', "\\n"));
            }
        }
        Commands::Query { tokens } => {
            let results = manager.query(tokens.as_slice()).await?;
            search::print_results(&results);
        }
        Commands::Use { key, variables } => {
            let vars = template::parse_variable_arguments(variables.as_slice(), 0);
            let text = manager.use_snippet(&key, &vars).await?;
            println!("{}", text);
        }
        Commands::Update { key, value } => {
            let sm = manager.update(&key, &value.join(" ")).await?;
            println!("Updated: {}", sm.key);
        }
        Commands::Remove { key } => {
            if manager.remove(&key).await? {
                println!("Removed: {}", key);
            } else {
                println!("Not found: {}", key);
            }
        }
        Commands::Favorite { key, off } => {
            manager.set_favorite(&key, !off).await?;
            println!("{}: {}", if off { "Unpinned" } else { "Pinned" }, key);
        }
        Commands::ResetScores => {
            manager.reset_scores().await?;
            println!("Scores reset.");
        }
        Commands::Clear => {
            manager.clear().await?;
            println!("All snippets removed.");
        }
        Commands::Export { output } => {
            manager.export(output.as_deref()).await?;
        }
        Commands::Import { file } => {
            let count = manager.import(&file).await?;
            println!("Imported {} snippets from {}", count, file.display());
        }
        Commands::Stats => {
            stats::run_stats(&cfg, &manager).await?;
        }
    }

    manager.close().await
}
