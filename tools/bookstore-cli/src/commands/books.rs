//! Catalog book commands.

use anyhow::Result;
use bookstore_commerce::prelude::*;

use super::{confirm, BooksArgs, BooksCommand};
use crate::context::Context;
use crate::output::{truncate, Output};

const WIDTHS: [usize; 5] = [6, 32, 22, 16, 10];

/// Run the books command.
pub async fn run(args: BooksArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services().await?;
    let catalog = &services.catalog;

    match args.command {
        BooksCommand::List { page } => {
            let books = catalog.list_books(page.into()).await?;
            ctx.output.emit(&books, |out| table(out, "Books", &books));
        }

        BooksCommand::Show { id } => {
            let book = catalog.get_book(id).await?;
            ctx.output.emit(&book, |out| out.book(&book));
        }

        BooksCommand::Add {
            title,
            author,
            isbn,
            price,
            description,
            cover_image,
            categories,
        } => {
            let mut book = NewBook::new(title, author, isbn, ctx.price(&price)?);
            book.description = description;
            book.cover_image = cover_image;
            book.category_ids = categories;

            let book = catalog.create_book(book).await?;
            ctx.output.emit(&book, |out| {
                out.success(&format!("Added book {} ({})", book.id, book.title));
            });
        }

        BooksCommand::Update {
            id,
            title,
            author,
            isbn,
            price,
            description,
            cover_image,
            categories,
        } => {
            let update = BookUpdate {
                title,
                author,
                isbn,
                price: price.map(|p| ctx.price(&p)).transpose()?,
                description,
                cover_image,
                category_ids: categories,
            };
            if update.is_empty() {
                ctx.output.warn("Nothing to update");
                return Ok(());
            }

            let book = catalog.update_book(id, update).await?;
            ctx.output.emit(&book, |out| {
                out.success(&format!("Updated book {}", book.id));
                out.book(&book);
            });
        }

        BooksCommand::Delete { id, yes } => {
            let book = catalog.get_book(id).await?;
            if !confirm(&format!("Delete '{}'?", book.title), yes)? {
                ctx.output.warn("Delete cancelled");
                return Ok(());
            }

            catalog.delete_book(id).await?;
            ctx.output.emit(&serde_json::json!({ "deleted": id }), |out| {
                out.success(&format!("Deleted book {}", id));
            });
        }

        BooksCommand::Search {
            title,
            author,
            isbn,
            page,
        } => {
            let criteria = SearchCriteria::new()
                .with("title", title)
                .with("author", author)
                .with("isbn", isbn);
            ctx.output.debug(&format!("Criteria: {}", serde_json::to_string(&criteria)?));

            let books = catalog.search_books(&criteria, page.into()).await?;
            ctx.output.emit(&books, |out| table(out, "Search results", &books));
        }

        BooksCommand::InCategory { id } => {
            let category = catalog.get_category(id).await?;
            let books = catalog.books_in_category(id).await?;
            ctx.output.emit(&books, |out| table(out, &category.name, &books));
        }
    }

    Ok(())
}

fn table(out: &Output, title: &str, books: &[BookView]) {
    out.header(title);
    if books.is_empty() {
        out.info("No books found");
        return;
    }

    out.table_header(&["ID", "TITLE", "AUTHOR", "ISBN", "PRICE"], &WIDTHS);
    for book in books {
        out.table_row(
            &[
                &book.id.to_string(),
                &truncate(&book.title, WIDTHS[1]),
                &truncate(&book.author, WIDTHS[2]),
                &book.isbn,
                &book.price.display(),
            ],
            &WIDTHS,
        );
    }
}
