//! Catalog category commands.

use anyhow::Result;
use bookstore_commerce::prelude::*;

use super::{confirm, CategoriesArgs, CategoriesCommand};
use crate::context::Context;
use crate::output::truncate;

/// Run the categories command.
pub async fn run(args: CategoriesArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services().await?;
    let catalog = &services.catalog;

    match args.command {
        CategoriesCommand::List { page } => {
            let categories = catalog.list_categories(page.into()).await?;
            ctx.output.emit(&categories, |out| {
                out.header("Categories");
                if categories.is_empty() {
                    out.info("No categories found");
                    return;
                }
                let widths = [6, 24, 40];
                out.table_header(&["ID", "NAME", "DESCRIPTION"], &widths);
                for category in &categories {
                    out.table_row(
                        &[
                            &category.id.to_string(),
                            &category.name,
                            &truncate(category.description.as_deref().unwrap_or(""), widths[2]),
                        ],
                        &widths,
                    );
                }
            });
        }

        CategoriesCommand::Show { id } => {
            let category = catalog.get_category(id).await?;
            ctx.output.emit(&category, |out| {
                out.header(&category.name);
                out.kv("ID", &category.id.to_string());
                if let Some(description) = &category.description {
                    out.kv("Description", description);
                }
            });
        }

        CategoriesCommand::Add { name, description } => {
            let category = catalog.create_category(new_category(name, description)).await?;
            ctx.output.emit(&category, |out| {
                out.success(&format!("Added category {} ({})", category.id, category.name));
            });
        }

        CategoriesCommand::Update {
            id,
            name,
            description,
        } => {
            let category = catalog
                .update_category(id, new_category(name, description))
                .await?;
            ctx.output.emit(&category, |out| {
                out.success(&format!("Updated category {}", category.id));
            });
        }

        CategoriesCommand::Delete { id, yes } => {
            let category = catalog.get_category(id).await?;
            if !confirm(&format!("Delete category '{}'?", category.name), yes)? {
                ctx.output.warn("Delete cancelled");
                return Ok(());
            }

            catalog.delete_category(id).await?;
            ctx.output.emit(&serde_json::json!({ "deleted": id }), |out| {
                out.success(&format!("Deleted category {}", id));
            });
        }
    }

    Ok(())
}

fn new_category(name: String, description: Option<String>) -> NewCategory {
    NewCategory {
        description,
        ..NewCategory::new(name)
    }
}
