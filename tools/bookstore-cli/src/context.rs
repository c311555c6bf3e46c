//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use bookstore_commerce::prelude::*;

use crate::config::{CliConfig, CONFIG_FILE_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration, environment overrides applied.
    pub config: CliConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

/// Services bound to the configured SQLite store.
pub struct Services {
    pub catalog: CatalogService<SqliteStore>,
    pub carts: CartService<SqliteStore>,
    pub settlement: CartSettlementService<SqliteStore>,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            let path = resolve(&cwd, path);
            (CliConfig::load(&path)?, Some(path))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd, &output) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config: config.with_env_overrides(),
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path, output: &Output) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    match CliConfig::load(&config_path) {
                        Ok(config) => return Some((config, config_path)),
                        Err(e) => output.warn(&format!("Ignoring {}: {:#}", config_path.display(), e)),
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, path)
    }

    /// Open the configured store, migrating its schema.
    pub async fn store(&self) -> Result<SqliteStore> {
        let url = &self.config.database.url;
        self.output.debug(&format!("Opening database: {}", url));
        SqliteStore::connect(url)
            .await
            .with_context(|| format!("Failed to open database: {}", url))
    }

    /// Open the store and wire up the services over it.
    pub async fn services(&self) -> Result<Services> {
        let store = self.store().await?;
        let registry = Arc::new(PredicateRegistry::for_books()?);
        Ok(Services {
            catalog: CatalogService::new(store.clone(), registry),
            carts: CartService::new(store.clone()),
            settlement: CartSettlementService::new(store),
        })
    }

    /// Parse a price in the configured currency.
    pub fn price(&self, text: &str) -> Result<Money> {
        Money::parse(text, self.config.store.currency)
            .with_context(|| format!("Invalid price: {}", text))
    }
}

fn resolve(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}
