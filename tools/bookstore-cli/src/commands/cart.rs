//! Shopping cart commands.

use anyhow::Result;
use bookstore_commerce::prelude::*;

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::Output;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services().await?;
    let carts = &services.carts;
    let user = args.user;

    let cart = match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => carts.get_cart(user).await?,
        CartCommand::Add { book, quantity } => {
            let cart = carts.add_book(user, book, quantity).await?;
            ctx.output.success(&format!("Added {} x book {}", quantity, book));
            cart
        }
        CartCommand::Update { line, quantity } => {
            let cart = carts.update_line_quantity(user, line, quantity).await?;
            ctx.output.success(&format!("Line {} now has quantity {}", line, quantity));
            cart
        }
        CartCommand::Remove { line } => {
            let cart = carts.remove_line(user, line).await?;
            ctx.output.success(&format!("Removed line {}", line));
            cart
        }
    };

    ctx.output.emit(&cart, |out| show(out, &cart));
    Ok(())
}

fn show(out: &Output, cart: &CartView) {
    out.header(&format!("Cart {} (user {})", cart.id, cart.user_id));
    if cart.lines.is_empty() {
        out.info("Cart is empty");
        return;
    }

    let widths = [8, 8, 6];
    out.table_header(&["LINE", "BOOK", "QTY"], &widths);
    for line in &cart.lines {
        out.table_row(
            &[&line.id.to_string(), &line.book_id.to_string(), &line.quantity.to_string()],
            &widths,
        );
    }
    out.kv("Items", &cart.item_count.to_string());
}
