//! Tagweave CLI: commit hashtag pairs and manage the topic graph.
//!
//! Usage:
//!   tagweave commit <A> <B> [--db path] [--config path]
//!   tagweave list [--json]
//!   tagweave export [--out file]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagweave::{
    Command, CommandOutcome, CommitOutcome, Config, LabelNormalizer, OpenStore, SkipReason,
    SqliteStore, TopicGraph,
};

#[derive(Parser)]
#[command(
    name = "tagweave",
    version,
    about = "Hashtag co-occurrence graph with fuzzy label deduplication"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize two tags and link them
    Commit {
        /// First tag
        a: String,
        /// Second tag
        b: String,
    },
    /// Reinforce (or create) a single tag
    LikeNode { tag: String },
    /// Reinforce the edge between two existing tags
    LikeEdge { source: String, target: String },
    /// Delete a tag and every edge touching it
    DeleteNode { label: String },
    /// Delete the edge stored exactly as SOURCE -> TARGET
    DeleteEdge { source: String, target: String },
    /// Delete every tag and edge
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// List tags and edges
    List {
        /// Print the display view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a JSON snapshot of the store
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy the database to a new file
    Backup {
        /// Destination file (must not exist)
        file: PathBuf,
    },
    /// Replace the store contents with the demo data set
    Demo,
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(config: &Config, db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(|| config.db_path());
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

/// Run a command through the graph and print its outcome
fn cmd_execute(graph: &TopicGraph, command: Command) -> i32 {
    match graph.execute(command) {
        Ok(CommandOutcome::Commit(CommitOutcome::Skipped(reason @ SkipReason::Rejected(_)))) => {
            eprintln!("{}", reason);
            1
        }
        Ok(outcome) => {
            println!("{}", outcome);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_reset(graph: &TopicGraph, yes: bool) -> i32 {
    if !yes {
        eprintln!("Error: refusing to delete every tag without --yes");
        return 1;
    }
    cmd_execute(graph, Command::ResetAll)
}

fn cmd_list(graph: &TopicGraph, json: bool) -> i32 {
    let view = match graph.view() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        return match serde_json::to_string_pretty(&view) {
            Ok(s) => {
                println!("{}", s);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    if view.is_empty() {
        println!("No tags yet.");
        return 0;
    }
    println!("{:<32}  {:>10}", "TAG", "SIZE");
    println!("{}", "-".repeat(44));
    for node in &view.nodes {
        println!("{:<32}  {:>10.1}", node.label, node.size);
    }
    println!();
    println!("{:<32}  {:<32}  {:>6}", "SOURCE", "TARGET", "WEIGHT");
    println!("{}", "-".repeat(74));
    for edge in &view.edges {
        println!("{:<32}  {:<32}  {:>6}", edge.source, edge.target, edge.stroke_width);
    }
    0
}

fn cmd_export(graph: &TopicGraph, out: Option<&Path>) -> i32 {
    let json = match graph.export_json() {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match out {
        Some(path) => match std::fs::write(path, json) {
            Ok(()) => {
                println!("Exported snapshot to {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                1
            }
        },
        None => {
            println!("{}", json);
            0
        }
    }
}

fn cmd_backup(store: &SqliteStore, file: &Path) -> i32 {
    if file.exists() {
        eprintln!("Error: '{}' already exists", file.display());
        return 1;
    }
    match store.backup_to(file) {
        Ok(()) => {
            println!("Backed up database to {}", file.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let store = match open_store(&config, cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let graph = TopicGraph::with_normalizer(
        store.clone(),
        LabelNormalizer::with_threshold(config.similarity_threshold),
    );
    tracing::debug!(
        threshold = graph.normalizer().threshold(),
        "topic graph ready"
    );

    let code = match cli.command {
        Commands::Commit { a, b } => cmd_execute(&graph, Command::CreatePair { a, b }),
        Commands::LikeNode { tag } => cmd_execute(&graph, Command::LikeNode { label: tag }),
        Commands::LikeEdge { source, target } => {
            cmd_execute(&graph, Command::LikeEdge { source, target })
        }
        Commands::DeleteNode { label } => cmd_execute(&graph, Command::DeleteNode { label }),
        Commands::DeleteEdge { source, target } => {
            cmd_execute(&graph, Command::DeleteEdge { source, target })
        }
        Commands::Reset { yes } => cmd_reset(&graph, yes),
        Commands::List { json } => cmd_list(&graph, json),
        Commands::Export { out } => cmd_export(&graph, out.as_deref()),
        Commands::Backup { file } => cmd_backup(&store, &file),
        Commands::Demo => cmd_execute(&graph, Command::LoadDemo),
    };
    std::process::exit(code);
}
