//! Order commands: placement, history, status.

use anyhow::Result;
use bookstore_commerce::prelude::*;

use super::{confirm, OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::{format_date, status_badge, Output};

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    let services = ctx.services().await?;
    let settlement = &services.settlement;

    match args.command {
        OrdersCommand::List { user, page } => {
            let orders = settlement.order_history(user, page.into()).await?;
            ctx.output.emit(&orders, |out| history(out, user, &orders));
        }

        OrdersCommand::Place { user, address, yes } => {
            let cart = services.carts.get_cart(user).await?;
            ctx.output.kv("Cart", &cart.id.to_string());
            ctx.output.kv("Items", &cart.item_count.to_string());
            ctx.output.kv("Ship to", address.trim());
            if !confirm("Place order?", yes)? {
                ctx.output.warn("Order cancelled");
                return Ok(());
            }

            let order = settlement.place_order(user, &address).await?;
            ctx.output.emit(&order, |out| {
                out.success(&format!("Placed order {} for {}", order.id, order.total));
                out.order(&order);
            });
        }

        OrdersCommand::Show { id } => {
            let order = settlement.get_order(id).await?;
            ctx.output.emit(&order, |out| out.order(&order));
        }

        OrdersCommand::Lines { id, page } => {
            let lines = settlement.order_lines(id, page.into()).await?;
            ctx.output.emit(&lines, |out| {
                out.header(&format!("Order {} lines", id));
                let widths = [8, 8, 6, 12];
                out.table_header(&["LINE", "BOOK", "QTY", "UNIT PRICE"], &widths);
                for line in &lines {
                    out.table_row(
                        &[
                            &line.id.to_string(),
                            &line.book_id.to_string(),
                            &line.quantity.to_string(),
                            &line.unit_price.display(),
                        ],
                        &widths,
                    );
                }
            });
        }

        OrdersCommand::Line { id, line } => {
            let line = settlement.order_line(id, line).await?;
            ctx.output.emit(&line, |out| {
                out.header(&format!("Order {} line {}", id, line.id));
                out.kv("Book", &line.book_id.to_string());
                out.kv("Quantity", &line.quantity.to_string());
                out.kv("Unit price", &line.unit_price.display());
            });
        }

        OrdersCommand::Status { id, status } => {
            let order = settlement.update_order_status(id, &status).await?;
            ctx.output.emit(&order, |out| {
                out.success(&format!("Order {} is now {}", order.id, status_badge(order.status)));
            });
        }
    }

    Ok(())
}

fn history(out: &Output, user: UserId, orders: &[OrderView]) {
    out.header(&format!("Orders for user {}", user));
    if orders.is_empty() {
        out.info("No orders yet");
        return;
    }

    let widths = [6, 18, 12, 12, 6];
    out.table_header(&["ID", "PLACED", "STATUS", "TOTAL", "LINES"], &widths);
    for order in orders {
        out.table_row(
            &[
                &order.id.to_string(),
                &format_date(order.order_date),
                order.status.display_name(),
                &order.total.display(),
                &order.lines.len().to_string(),
            ],
            &widths,
        );
    }
}
