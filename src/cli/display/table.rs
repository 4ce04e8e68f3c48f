//! Table builder wrapper around comfy-table for consistent list display.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

use crate::domain::models::CircuitSummary;

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table to string with a count header.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

/// One row per breaker, in the order given.
pub fn circuit_table<'a>(circuits: impl IntoIterator<Item = (&'a str, &'a CircuitSummary)>) -> Table {
    let mut table = list_table(&[
        "name",
        "state",
        "failure rate",
        "requests",
        "failed",
        "consec. fail",
        "consec. ok",
    ]);
    for (name, summary) in circuits {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(summary.state.as_str()),
            Cell::new(format!("{:.1}%", summary.failure_rate * 100.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(summary.stats.total_requests).set_alignment(CellAlignment::Right),
            Cell::new(summary.stats.failed_requests).set_alignment(CellAlignment::Right),
            Cell::new(summary.stats.consecutive_failures).set_alignment(CellAlignment::Right),
            Cell::new(summary.stats.consecutive_successes).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
