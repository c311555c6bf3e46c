//! Initialize a bookstore config and database.

use anyhow::{bail, Result};

use super::InitArgs;
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the init command.
pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.path);
    ctx.output.header(&format!("Initializing bookstore: {}", path.display()));

    if path.exists() && !args.force {
        bail!("Config file '{}' already exists (use --force to overwrite)", path.display());
    }

    // Step 1: Write the config
    ctx.output.step(1, 3, "Writing config");
    let config = CliConfig::default().with_database_url(args.database_url);
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    if config == CliConfig::default() && !is_json {
        // keep the commented template when nothing was customized
        std::fs::write(&path, generate_default_config())?;
    } else {
        config.save(&path)?;
    }
    ctx.output.debug(&format!("Wrote {}", path.display()));

    // Step 2: Create the schema
    ctx.output.step(2, 3, "Creating database schema");
    let config = config.with_env_overrides();
    let store = bookstore_commerce::store::SqliteStore::connect(&config.database.url).await?;
    store.db().close().await;

    ctx.output.step(3, 3, "Done!");
    ctx.output.success(&format!("Database ready at {}", config.database.url));
    ctx.output.info("");
    ctx.output.info("Next steps:");
    ctx.output.list_item("bookstore categories add Fiction");
    ctx.output.list_item("bookstore books add --title ... --author ... --isbn ... --price 9.99");
    ctx.output.list_item("bookstore cart --user 1 add <BOOK_ID>");
    ctx.output.list_item("bookstore orders place --user 1 --address \"...\"");

    Ok(())
}
