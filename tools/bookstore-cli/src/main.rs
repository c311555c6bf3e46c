//! Bookstore CLI - Command line front end for the bookstore backend.
//!
//! Commands:
//! - `bookstore init` - Write a config file and create the database
//! - `bookstore books` - Browse, search and manage the catalog
//! - `bookstore categories` - Manage categories
//! - `bookstore cart` - Work with a user's shopping cart
//! - `bookstore orders` - Place orders and track their status

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{BooksArgs, CartArgs, CategoriesArgs, InitArgs, OrdersArgs};
use config::{LogFormat, LoggingConfig};

/// Bookstore CLI - Manage a catalog, carts and orders
#[derive(Parser)]
#[command(name = "bookstore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database schema
    Init(InitArgs),

    /// Browse and manage books
    Books(BooksArgs),

    /// Browse and manage categories
    Categories(CategoriesArgs),

    /// Work with a user's shopping cart
    Cart(CartArgs),

    /// Place and track orders
    Orders(OrdersArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    init_logging(&ctx.config.logging, cli.verbose);
    if let Some(path) = &ctx.config_path {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    // Execute command
    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx).await,
        Commands::Books(args) => commands::books::run(args, &ctx).await,
        Commands::Categories(args) => commands::categories::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean for `--json`.
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let json = logging.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .init();
}
