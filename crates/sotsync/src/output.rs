//! Table rendering for diffs and run reports.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use sotsync_core::{KindChanges, RunReport};

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Create")]
    create: usize,
    #[tabled(rename = "Update")]
    update: usize,
    #[tabled(rename = "Delete")]
    delete: usize,
}

pub fn print_changes(changes: &[KindChanges]) {
    if changes.is_empty() {
        println!("{}", "In sync: no pending changes.".green());
        return;
    }
    let rows: Vec<ChangeRow> = changes
        .iter()
        .map(|change| ChangeRow {
            kind: change.kind.to_string(),
            create: change.create,
            update: change.update,
            delete: change.delete,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Deleted")]
    deleted: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
}

pub fn print_report(report: &RunReport) {
    if report.dry_run {
        println!("{}", "Dry run: planned changes only, nothing written.".yellow());
    }
    if report.counts.is_empty() {
        println!("{}", "In sync: nothing to do.".green());
    } else {
        let rows: Vec<ReportRow> = report
            .counts
            .iter()
            .map(|(kind, counts)| ReportRow {
                kind: kind.to_string(),
                created: counts.created,
                updated: counts.updated,
                deleted: counts.deleted,
                skipped: counts.skipped,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for diagnostic in &report.diagnostics {
        println!(
            "{} {} {}: {}",
            "skipped".yellow(),
            diagnostic.kind,
            diagnostic.key,
            diagnostic.reason
        );
    }

    let summary = format!(
        "{} changes, {} skipped",
        report.total_changes(),
        report.total_skipped()
    );
    if report.total_skipped() == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}
