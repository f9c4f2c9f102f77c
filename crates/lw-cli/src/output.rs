use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;

use lw_core::identifiers::IdentifierKind;
use lw_core::models::NOT_FOUND;
use lw_core::tracker_domains::match_tracker_domain;

use crate::replay::ReplayReport;

/// Evidence longer than this is cut in the table view.
const EVIDENCE_WIDTH: usize = 60;

fn category_color(category: &str) -> Color {
    match category {
        "advertising" => Color::Red,
        "data_broker" => Color::DarkRed,
        "social" => Color::Magenta,
        "analytics" => Color::Yellow,
        "server_side_tagging" => Color::DarkYellow,
        _ => Color::White,
    }
}

/// Shorten `text` to at most `width` characters, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace('\n', " | ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let kept: String = single_line.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Print a replay report as a table or JSON.
pub fn print_report(report: &ReplayReport, format: &str) {
    if format == "json" {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: failed to serialize report: {e}"),
        }
        return;
    }

    println!();
    println!("  {}", "leakwatch".bold());
    println!("  {}", "Identifier Leak Report".dimmed());
    println!();

    for kind in IdentifierKind::ALL {
        let cookie = report
            .cookie_values
            .as_ref()
            .map(|c| c.display_value(kind))
            .unwrap_or_else(|| NOT_FOUND.to_string());
        let fingerprint = report
            .snapshot
            .fingerprints
            .get(kind)
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} {}",
            format!("{:<12}", kind.display_label()).bold(),
            cookie,
            format_args!("(fingerprint {fingerprint})").dimmed(),
        );
    }
    println!();

    let total = report.snapshot.total_leaks();
    if total == 0 {
        println!("  {}", "No third-party leaks recorded".green());
        println!();
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Identifier", "Destination", "Category", "Evidence"]);

    for kind in IdentifierKind::ALL {
        for record in report.snapshot.records(kind).iter() {
            let category_cell = match match_tracker_domain(&record.hostname) {
                Some(category) => Cell::new(category).fg(category_color(category)),
                None => Cell::new("-").fg(Color::DarkGrey),
            };
            table.add_row(vec![
                Cell::new(kind.display_label()),
                Cell::new(&record.hostname),
                category_cell,
                Cell::new(truncate(&record.evidence, EVIDENCE_WIDTH)),
            ]);
        }
    }

    println!("{table}");
    println!();
    println!(
        "  {} leak{} · {} events replayed · {} skipped",
        total.to_string().red().bold(),
        if total != 1 { "s" } else { "" },
        report.processed,
        report.skipped,
    );
    println!();
}
