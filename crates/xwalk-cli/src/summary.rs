use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use xwalk_cli::pipeline::RunOutcome;
use xwalk_model::{Severity, ValidationReport};

pub fn print_report(report: &ValidationReport) {
    if !report.errors().is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Severity"),
            header_cell("Kind"),
            header_cell("Step"),
            header_cell("Field"),
            header_cell("Column"),
            header_cell("Rows"),
            header_cell("Message"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 2, CellAlignment::Right);
        align_column(&mut table, 5, CellAlignment::Right);
        for issue in report.errors() {
            table.add_row(vec![
                severity_cell(issue.severity),
                Cell::new(issue.kind.as_str()),
                optional_cell(issue.step),
                optional_cell(issue.field.as_deref()),
                optional_cell(issue.column.as_deref()),
                optional_cell(issue.count),
                Cell::new(&issue.message),
            ]);
        }
        println!("{table}");
    }
    let status = if report.ok() { "ok" } else { "failed" };
    println!(
        "Validation: {status} ({} errors, {} warnings)",
        report.error_count(),
        report.warning_count()
    );
}

pub fn print_run(outcome: &RunOutcome) {
    println!("Method: {}", outcome.method);
    println!("Source rows: {}", outcome.rows);
    print_report(&outcome.report);
    match &outcome.written {
        Some(written) => {
            println!(
                "Output: {} ({}, {} bytes)",
                written.path.display(),
                written.format.extension(),
                written.bytes
            );
            println!("Fingerprint: sha256:{}", written.fingerprint);
        }
        None => println!("Output: not written"),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("error")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("warning").fg(Color::Yellow),
    }
}

fn optional_cell<T: ToString>(value: Option<T>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
