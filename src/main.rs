//! notegraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "notegraph")]
#[command(about = "Relationship graph and force-directed layout for a notes collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./notegraph.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print graph statistics, clusters and the most connected notes
    Stats {
        /// Notes directory or JSON item snapshot
        source: PathBuf,

        /// How many top nodes to list
        #[arg(long, default_value = "10")]
        top: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the layout and write a render frame as JSON
    Layout {
        source: PathBuf,

        /// Maximum simulation ticks
        #[arg(long, default_value = "300")]
        ticks: usize,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long)]
        search: Option<String>,

        /// Keep nodes with any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Keep nodes in any of these clusters
        #[arg(long = "cluster")]
        clusters: Vec<String>,

        #[arg(long)]
        hide_orphans: bool,

        /// Restrict to the neighborhood of this node
        #[arg(long)]
        focus: Option<String>,

        #[arg(long)]
        depth: Option<usize>,
    },
    /// List the neighborhood of a node by hop count
    Focus {
        source: PathBuf,
        id: String,
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Watch a notes directory and report graph changes
    Watch { dir: PathBuf },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("notegraph={log_level}")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Stats { source, top, json } => commands::stats(&source, &config, top, json),
        Commands::Layout {
            source,
            ticks,
            out,
            search,
            tags,
            clusters,
            hide_orphans,
            focus,
            depth,
        } => {
            let opts = commands::LayoutOptions {
                ticks,
                out,
                search,
                tags,
                clusters,
                hide_orphans,
                focus,
                depth,
            };
            commands::layout(&source, &config, opts)
        }
        Commands::Focus { source, id, depth } => commands::focus(&source, &config, &id, depth),
        Commands::Watch { dir } => commands::watch(&dir, config).await,
        Commands::Version => {
            println!("notegraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
