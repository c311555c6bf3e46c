//! CLI command implementations.

pub mod books;
pub mod cart;
pub mod categories;
pub mod init;
pub mod orders;

use bookstore_commerce::prelude::*;
use clap::{Args, Subcommand};

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Config file to write.
    #[arg(default_value = "bookstore.toml")]
    pub path: String,

    /// Database URL to record in the config.
    #[arg(long)]
    pub database_url: Option<String>,

    /// Overwrite an existing config file.
    #[arg(short, long)]
    pub force: bool,
}

/// Paging options shared by list commands.
#[derive(Args, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: i64,

    /// Items per page (at most 100).
    #[arg(long, default_value_t = 20)]
    pub per_page: i64,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.page, args.per_page)
    }
}

/// Arguments for the books command.
#[derive(Args)]
pub struct BooksArgs {
    #[command(subcommand)]
    pub command: BooksCommand,
}

#[derive(Subcommand)]
pub enum BooksCommand {
    /// List books.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a book.
    Show {
        /// Book ID.
        id: BookId,
    },
    /// Add a book to the catalog.
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        isbn: String,

        /// Price in the configured currency, e.g. 12.99.
        #[arg(long)]
        price: String,

        #[arg(long)]
        description: Option<String>,

        /// Cover image URL.
        #[arg(long)]
        cover_image: Option<String>,

        /// Category ID (repeatable).
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    /// Change fields of a book.
    Update {
        /// Book ID.
        id: BookId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        isbn: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        cover_image: Option<String>,

        /// Replace the book's categories (repeatable).
        #[arg(long = "category")]
        categories: Option<Vec<CategoryId>>,
    },
    /// Remove a book from the catalog.
    Delete {
        /// Book ID.
        id: BookId,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Search books. Values for one field match any; different fields must all match.
    Search {
        /// Exact title (repeatable).
        #[arg(long)]
        title: Vec<String>,

        /// Exact author (repeatable).
        #[arg(long)]
        author: Vec<String>,

        /// Exact ISBN (repeatable).
        #[arg(long)]
        isbn: Vec<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// List books in a category.
    InCategory {
        /// Category ID.
        id: CategoryId,
    },
}

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Subcommand)]
pub enum CategoriesCommand {
    /// List categories.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a category.
    Show {
        /// Category ID.
        id: CategoryId,
    },
    /// Create a category.
    Add {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },
    /// Rename or describe a category.
    Update {
        /// Category ID.
        id: CategoryId,

        name: String,

        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a category.
    Delete {
        /// Category ID.
        id: CategoryId,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    /// User whose cart to work on.
    #[arg(short, long)]
    pub user: UserId,

    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart (default).
    Show,
    /// Put a book in the cart.
    Add {
        /// Book ID.
        book: BookId,

        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Change the quantity of a cart line.
    Update {
        /// Cart line ID.
        line: CartLineId,

        quantity: i64,
    },
    /// Remove a line from the cart.
    Remove {
        /// Cart line ID.
        line: CartLineId,
    },
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// A user's orders, newest first.
    List {
        #[arg(short, long)]
        user: UserId,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Turn a user's cart into an order.
    Place {
        #[arg(short, long)]
        user: UserId,

        /// Shipping address.
        #[arg(short, long)]
        address: String,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show an order.
    Show {
        /// Order ID.
        id: OrderId,
    },
    /// List the lines of an order.
    Lines {
        /// Order ID.
        id: OrderId,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one line of an order.
    Line {
        /// Order ID.
        id: OrderId,

        /// Order line ID.
        line: OrderLineId,
    },
    /// Set the status of an order.
    Status {
        /// Order ID.
        id: OrderId,

        /// ACCEPTED, REJECTED, PENDING, DELIVERED or COMPLETED.
        status: String,
    },
}

/// Ask the user to confirm on stderr, unless `--yes` was given.
pub fn confirm(prompt: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
