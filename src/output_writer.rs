use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;

use crate::cards::ResolvedItem;
use crate::config::OutputConfig;
use crate::error::PersistenceError;
use crate::state::repository::{write_file, write_json};
use crate::state::AggregationStore;

/// Order counters read by the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountersDocument {
    pub count: u64,
    pub today: u64,
    pub last_updated: String,
}

impl CountersDocument {
    pub fn new(count: u64, today: u64, now: DateTime<Local>) -> Self {
        CountersDocument {
            count,
            today,
            last_updated: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Destination of the documents produced at the end of each cycle.
pub trait OutputSink {
    fn write_counters(&self, counters: &CountersDocument) -> Result<(), PersistenceError>;

    fn write_newest_batch(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError>;

    fn write_all_items(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError>;

    fn write_summary(&self, fragment: &str) -> Result<(), PersistenceError>;
}

/// Writes every document to its configured path.
pub struct FileOutputWriter {
    config: OutputConfig,
}

impl FileOutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        FileOutputWriter { config }
    }
}

impl OutputSink for FileOutputWriter {
    fn write_counters(&self, counters: &CountersDocument) -> Result<(), PersistenceError> {
        write_json(&self.config.orders_path, "order counters", counters)?;
        info!("💾 Saved {}", self.config.orders_path.display());
        Ok(())
    }

    fn write_newest_batch(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError> {
        write_json(&self.config.cards_path, "latest order cards", items)?;
        info!("💾 Saved {} card(s) to {}", items.len(), self.config.cards_path.display());
        Ok(())
    }

    fn write_all_items(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError> {
        write_json(&self.config.all_cards_path, "all cards", items)
    }

    fn write_summary(&self, fragment: &str) -> Result<(), PersistenceError> {
        write_file(&self.config.summary_path, fragment)
    }
}

/// Prints the documents instead of writing them (dry-run mode).
pub struct ConsoleOutput;

impl ConsoleOutput {
    fn print_json<T: Serialize + ?Sized>(title: &str, what: &'static str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| PersistenceError::Serialize { what, source })?;
        println!("📄 {}:\n{}\n", title, json);
        Ok(())
    }
}

impl OutputSink for ConsoleOutput {
    fn write_counters(&self, counters: &CountersDocument) -> Result<(), PersistenceError> {
        Self::print_json("Order counters", "order counters", counters)
    }

    fn write_newest_batch(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError> {
        Self::print_json("Latest order cards", "latest order cards", items)
    }

    fn write_all_items(&self, items: &[ResolvedItem]) -> Result<(), PersistenceError> {
        println!("📦 All cards: {} recorded\n", items.len());
        Ok(())
    }

    fn write_summary(&self, fragment: &str) -> Result<(), PersistenceError> {
        println!("🏆 Summary:\n{}", fragment);
        Ok(())
    }
}

/// HTML fragment ranking the most sold cards.
pub fn render_summary(store: &AggregationStore, top_n: usize) -> String {
    let mut html = String::from("<div class=\"card-summary\">\n  <ol class=\"top-cards\">\n");

    for (name, count) in store.top_n(top_n) {
        html.push_str(&format!(
            "    <li><span class=\"name\">{}</span> <span class=\"count\">{}</span></li>\n",
            escape_html(&name),
            count
        ));
    }

    html.push_str("  </ol>\n");
    html.push_str(&format!("  <p class=\"total\">Total: {}</p>\n", store.total()));
    html.push_str("</div>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
