use std::io::Write;

use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::cli::{parse_amount_arg, parse_date_arg, today, Session};
use crate::error::Result;
use crate::fmt::date_with_day;
use crate::models::CustomerDraft;
use crate::reconciler;
use crate::reports;

fn pending_cell(session: &Session, pending: Decimal) -> Cell {
    if pending > Decimal::ZERO {
        Cell::new(session.money(pending).red())
    } else {
        Cell::new(session.money(pending).green())
    }
}

pub fn add(
    name: &str,
    area: &str,
    phone: &str,
    loan: &str,
    plan_days: Option<u32>,
    daily_amount: Option<&str>,
    start: Option<&str>,
) -> Result<()> {
    let mut session = Session::open()?;
    let draft = CustomerDraft {
        name: name.to_string(),
        area: area.to_string(),
        phone: phone.to_string(),
        loan_amount: parse_amount_arg(loan)?,
    };

    let plan = match (plan_days, daily_amount) {
        (Some(days), Some(amount)) => {
            let start = match start {
                Some(raw) => parse_date_arg(raw, &session.date_options(), today())?,
                None => today(),
            };
            reconciler::consecutive_days(start, days, parse_amount_arg(amount)?)?
        }
        _ => Vec::new(),
    };

    let now = chrono::Local::now().timestamp_millis();
    let customer = session.ledger.add_customer(draft, &plan, now)?;
    let (id, name) = (customer.id.clone(), customer.name.clone());
    session.save()?;

    println!("Added customer: {name} (id {id})");
    if !plan.is_empty() {
        println!("Created {} plan payments", plan.len());
    }
    Ok(())
}

pub fn edit(
    key: &str,
    name: Option<&str>,
    area: Option<&str>,
    phone: Option<&str>,
    loan: Option<&str>,
) -> Result<()> {
    let mut session = Session::open()?;
    let current = session.ledger.resolve(key)?;
    let id = current.id.clone();
    let draft = CustomerDraft {
        name: name.unwrap_or(&current.name).to_string(),
        area: area.unwrap_or(&current.area).to_string(),
        phone: phone.unwrap_or(&current.phone).to_string(),
        loan_amount: match loan {
            Some(raw) => parse_amount_arg(raw)?,
            None => current.loan_amount,
        },
    };
    session.ledger.edit_customer(&id, draft)?;
    session.save()?;
    println!("Updated customer {id}");
    Ok(())
}

pub fn delete(key: &str, yes: bool) -> Result<()> {
    let mut session = Session::open()?;
    let customer = session.ledger.resolve(key)?;
    let id = customer.id.clone();

    if !yes {
        print!(
            "Delete {} and {} payments? [y/N]: ",
            customer.name,
            customer.payments.len()
        );
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = session.ledger.delete_customer(&id)?;
    session.save()?;
    println!("Deleted customer: {}", removed.name);
    Ok(())
}

pub fn list(search: Option<&str>) -> Result<()> {
    let session = Session::open()?;
    let today = today();
    let customers = session.ledger.search(search.unwrap_or(""));

    if customers.is_empty() {
        println!("No customers found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Area", "Loan", "Payments", "Paid", "Pending", "Today"]);
    for c in customers {
        let s = reports::summarize(c, today);
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(&s.name),
            Cell::new(&s.area),
            Cell::new(session.money(s.loan_amount)),
            Cell::new(s.payment_count),
            Cell::new(session.money(s.paid)),
            pending_cell(&session, s.pending),
            Cell::new(match s.paid_today {
                Some(amount) => session.money(amount).green().to_string(),
                None => "-".to_string(),
            }),
        ]);
    }
    println!("Customers\n{table}");
    Ok(())
}

pub fn show(key: &str) -> Result<()> {
    let session = Session::open()?;
    let customer = session.ledger.resolve(key)?;
    let s = reports::summarize(customer, today());

    println!("{} (id {})", customer.name.bold(), customer.id);
    if !customer.area.is_empty() {
        println!("Area:       {}", customer.area);
    }
    if !customer.phone.is_empty() {
        println!("Phone:      {}", customer.phone);
    }
    println!("Loan:       {}", session.money(s.loan_amount));
    println!("Paid:       {}", session.money(s.paid));
    println!("Pending:    {}", session.money(s.pending));
    if let Some(last) = s.last_payment {
        println!("Last:       {} on {}", session.money(last.amount), date_with_day(last.date));
    }
    println!("Next:       {}", session.money(customer.suggested_amount()));
    if let (Some(avg), Some(high), Some(low)) = (s.average, s.highest, s.lowest) {
        println!("Average:    {}", session.money(avg));
        println!("Highest:    {}", session.money(high));
        println!("Lowest:     {}", session.money(low));
    }

    if customer.payments.is_empty() {
        println!();
        println!("No payments yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Day", "Amount"]);
    for (i, p) in customer.payments.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(p.date.format("%Y-%m-%d")),
            Cell::new(date_with_day(p.date)),
            Cell::new(session.money(p.amount)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(session.money(s.paid)),
    ]);
    println!("\nPayments\n{table}");
    Ok(())
}
