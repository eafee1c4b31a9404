use std::io::Read;
use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::warn;

use crate::cli::{today, Session};
use crate::dates::DateOrder;
use crate::error::Result;
use crate::fmt::date_with_day;
use crate::importer::{parse_text, ImportOutcome, ImportReport, ScanMode};
use crate::models::PaymentInput;
use crate::ocr::{Recognizer, TesseractCli};

fn read_text(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) if path != "-" => Ok(std::fs::read_to_string(PathBuf::from(path))?),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn print_issues(report: &ImportReport) {
    if !report.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for w in &report.warnings {
            println!("  {}", w.to_string().yellow());
        }
    }
    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for e in &report.errors {
            println!("  {}", e.to_string().red());
        }
    }
}

fn print_candidates(session: &Session, report: &ImportReport) {
    let mut table = Table::new();
    table.set_header(vec!["Line", "Date", "Day", "Amount", "Text"]);
    for c in &report.candidates {
        table.add_row(vec![
            Cell::new(c.line_number),
            Cell::new(c.date.format("%Y-%m-%d")),
            Cell::new(date_with_day(c.date)),
            Cell::new(session.money(c.amount)),
            Cell::new(&c.original),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(session.money(report.total())),
        Cell::new(""),
    ]);
    println!("Found {} payments\n{table}", report.candidates.len());
}

pub fn run(
    key: &str,
    file: Option<&str>,
    image: Option<&str>,
    apply: bool,
    scan_mode: Option<ScanMode>,
    date_order: Option<DateOrder>,
) -> Result<()> {
    let mut session = Session::open()?;
    let customer = session.ledger.resolve(key)?;
    let (id, name) = (customer.id.clone(), customer.name.clone());

    if let Some(mode) = scan_mode {
        session.settings.scan_mode = mode;
    }
    if let Some(order) = date_order {
        session.settings.date_order = order;
    }

    let text = match image {
        Some(path) => {
            let ocr = TesseractCli::new(&session.settings.ocr_program, &session.settings.ocr_language);
            ocr.recognize(&PathBuf::from(path)).inspect_err(|e| {
                warn!(error = %e, "image import failed");
            })?
        }
        None => read_text(file)?,
    };

    let report = parse_text(&text, &session.settings.import_options(today()));

    match report.outcome() {
        ImportOutcome::Empty => {
            println!("No valid payments found. Please check your format.");
            return Ok(());
        }
        ImportOutcome::AllFailed => {
            print_issues(&report);
            println!("\nNo valid payments found. Nothing to apply.");
            return Ok(());
        }
        ImportOutcome::Partial | ImportOutcome::Clean => {
            print_candidates(&session, &report);
            print_issues(&report);
        }
    }

    if !apply {
        println!(
            "\nPreview only. Re-run with --apply to merge {} payments into {name}.",
            report.candidates.len()
        );
        return Ok(());
    }

    let incoming: Vec<PaymentInput> = report.candidates.iter().map(PaymentInput::from).collect();
    let summary = session.ledger.merge_payments(&id, &incoming)?;
    session.save()?;
    println!(
        "\nImported for {name}: {} payments processed ({} added, {} updated)",
        summary.processed(),
        summary.added,
        summary.updated
    );
    Ok(())
}
