/*
taxcat - main.rs
Tags one post with Organization and People terms found by two text-analysis services.
*/

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::Config;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use taxcat::host::{create_host_platform, Taxonomy};
use taxcat::report::{print_entity_tables, print_term_table};
use taxcat::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "taxcat", about = "Tag a post with organization and people terms")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace a post's organization and people terms with extracted entities
    Enrich {
        /// The ID of the post you want to target
        post_id: u64,

        /// Print the post's resulting terms after writing them
        #[arg(long)]
        show_terms: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the tables
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // A .env file is optional; real environment variables win
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = load_config(args.config).await?;

    match args.command {
        Command::Enrich { post_id, show_terms } => enrich(&config, post_id, show_terms).await,
    }
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        Some(PathBuf::from("config.toml"))
    };

    let config = Config::load_with_defaults(Some(&default_path), override_path.as_deref()).await?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

async fn enrich(config: &Config, post_id: u64, show_terms: bool) -> Result<()> {
    let lookup = |name: &str| std::env::var(name).ok();

    // Secrets are checked before anything touches the network or the results file
    let pipeline = Pipeline::from_lookup(config, &lookup)?;
    let host = create_host_platform(&config.host, &lookup)?;

    let report = pipeline.run(host.as_ref(), post_id).await?;
    info!(
        results = %pipeline.results().path().display(),
        "post {} enriched",
        report.post_id
    );

    let mut term_tables = Vec::new();
    if show_terms {
        for taxonomy in Taxonomy::ALL {
            term_tables.push(host.list_terms(post_id, taxonomy).await?);
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    print_entity_tables(&mut out, &report.azure, &report.watson)?;
    for terms in &term_tables {
        print_term_table(&mut out, terms)?;
    }
    out.flush()?;

    Ok(())
}
