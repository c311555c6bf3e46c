//! Output formatting for the CLI.

use bookstore_commerce::checkout::OrderStatus;
use bookstore_commerce::views::{BookView, OrderView};
use chrono::{DateTime, Local, Utc};
use console::style;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a step in a process.
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style(format!("[{}/{}]", num, total)).dim(), msg);
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        println!("  {}", format_row(cols, widths));
    }

    /// Print a table header row, dimmed.
    pub fn table_header(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        println!("  {}", style(format_row(cols, widths)).dim());
    }

    /// Print a value as JSON in JSON mode, otherwise run the human renderer.
    pub fn emit<T: serde::Serialize>(&self, value: &T, human: impl FnOnce(&Self)) {
        if self.json {
            self.json(value);
        } else {
            human(self);
        }
    }

    /// Print the details of one book.
    pub fn book(&self, book: &BookView) {
        self.header(&book.title);
        self.kv("ID", &book.id.to_string());
        self.kv("Author", &book.author);
        self.kv("ISBN", &book.isbn);
        self.kv("Price", &book.price.display());
        if let Some(description) = &book.description {
            self.kv("Description", description);
        }
        if let Some(cover) = &book.cover_image {
            self.kv("Cover", cover);
        }
        if !book.category_ids.is_empty() {
            let ids: Vec<String> = book.category_ids.iter().map(ToString::to_string).collect();
            self.kv("Categories", &ids.join(", "));
        }
    }

    /// Print an order with its lines.
    pub fn order(&self, order: &OrderView) {
        self.header(&format!("Order {}", order.id));
        self.kv("User", &order.user_id.to_string());
        self.kv("Status", &status_badge(order.status));
        self.kv("Placed", &format_date(order.order_date));
        self.kv("Ship to", &order.shipping_address);
        self.kv("Total", &style(order.total.display()).bold().to_string());

        let widths = [8, 8, 6, 12];
        println!();
        self.table_header(&["LINE", "BOOK", "QTY", "UNIT PRICE"], &widths);
        for line in &order.lines {
            self.table_row(
                &[
                    &line.id.to_string(),
                    &line.book_id.to_string(),
                    &line.quantity.to_string(),
                    &line.unit_price.display(),
                ],
                &widths,
            );
        }
    }
}

fn format_row(cols: &[&str], widths: &[usize]) -> String {
    let formatted: Vec<String> = cols
        .iter()
        .zip(widths.iter())
        .map(|(col, width)| format!("{:width$}", col, width = width))
        .collect();
    formatted.join("  ")
}

/// Status badge for order states.
pub fn status_badge(status: OrderStatus) -> String {
    let label = status.display_name();
    match status {
        OrderStatus::Accepted | OrderStatus::Completed => style(label).green().to_string(),
        OrderStatus::Pending => style(label).yellow().to_string(),
        OrderStatus::Delivered => style(label).cyan().to_string(),
        OrderStatus::Rejected => style(label).red().to_string(),
    }
}

/// Format a timestamp in the local timezone.
pub fn format_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Shorten text to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_pads_columns() {
        assert_eq!(format_row(&["1", "Dune"], &[3, 6]), "1    Dune  ");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("Children of Dune", 8), "Childre…");
    }

    #[test]
    fn test_status_badge_contains_label() {
        for status in OrderStatus::ALL {
            assert!(status_badge(status).contains(status.display_name()));
        }
    }
}
