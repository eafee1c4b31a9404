use crate::amounts;
use crate::cli::{parse_amount_arg, parse_date_arg, payment_index, today, Session};
use crate::dates::{self, DateOptions};
use crate::error::{DaybookError, Result};
use crate::models::PaymentInput;
use crate::reconciler::{self, FlexibleRow, MergeSummary};

fn print_merge(summary: MergeSummary) {
    println!(
        "{} payments processed ({} added, {} updated)",
        summary.processed(),
        summary.added,
        summary.updated
    );
}

pub fn pay(key: &str, amount: Option<&str>, date: Option<&str>) -> Result<()> {
    let mut session = Session::open()?;
    let customer = session.ledger.resolve(key)?;
    let id = customer.id.clone();
    let amount = match amount {
        Some(raw) => parse_amount_arg(raw)?,
        None => customer.suggested_amount(),
    };
    let date = match date {
        Some(raw) => parse_date_arg(raw, &session.date_options(), today())?,
        None => today(),
    };

    session.ledger.add_payment(&id, PaymentInput { date, amount })?;
    session.save()?;
    println!("Recorded {} on {date}", session.money(amount));
    Ok(())
}

pub fn edit(key: &str, number: usize, date: Option<&str>, amount: Option<&str>) -> Result<()> {
    let mut session = Session::open()?;
    let index = payment_index(number)?;
    let customer = session.ledger.resolve(key)?;
    let id = customer.id.clone();
    let current = customer
        .payments
        .get(index)
        .copied()
        .ok_or(DaybookError::UnknownPayment {
            customer: id.clone(),
            index: number,
        })?;

    let input = PaymentInput {
        date: match date {
            Some(raw) => parse_date_arg(raw, &session.date_options(), today())?,
            None => current.date,
        },
        amount: match amount {
            Some(raw) => parse_amount_arg(raw)?,
            None => current.amount,
        },
    };
    session.ledger.edit_payment(&id, index, input)?;
    session.save()?;
    println!("Updated payment #{number}: {} on {}", session.money(input.amount), input.date);
    Ok(())
}

pub fn delete(key: &str, number: usize) -> Result<()> {
    let mut session = Session::open()?;
    let index = payment_index(number)?;
    let removed = session.ledger.delete_payment(key, index)?;
    session.save()?;
    println!("Deleted payment of {} on {}", session.money(removed.amount), removed.date);
    Ok(())
}

pub fn bulk(key: &str, start: &str, days: u32, amount: &str) -> Result<()> {
    let mut session = Session::open()?;
    let start = parse_date_arg(start, &session.date_options(), today())?;
    let incoming = reconciler::consecutive_days(start, days, parse_amount_arg(amount)?)?;
    let summary = session.ledger.merge_payments(key, &incoming)?;
    session.save()?;
    print_merge(summary);
    Ok(())
}

/// Read `DATE,AMOUNT` text into a row; unreadable halves become `None`.
fn parse_row(raw: &str, opts: &DateOptions) -> FlexibleRow {
    let (date, amount) = raw.split_once(',').unwrap_or((raw, ""));
    FlexibleRow {
        date: dates::normalize(date, opts),
        amount: amounts::extract(amount),
    }
}

pub fn rows(key: &str, rows: &[String]) -> Result<()> {
    let mut session = Session::open()?;
    let opts = session.date_options();
    let parsed: Vec<FlexibleRow> = rows.iter().map(|r| parse_row(r, &opts)).collect();
    let incoming = reconciler::flexible_rows(&parsed)?;
    let summary = session.ledger.merge_payments(key, &incoming)?;
    session.save()?;
    print_merge(summary);
    Ok(())
}

pub fn update_all(key: &str, amount: Option<&str>) -> Result<()> {
    let mut session = Session::open()?;
    let customer = session.ledger.resolve(key)?;
    let id = customer.id.clone();
    let amount = match amount {
        Some(raw) => parse_amount_arg(raw)?,
        None => customer.average_payment().ok_or_else(|| {
            DaybookError::InvalidPayment("No payments to update for this customer.".to_string())
        })?,
    };
    let count = session.ledger.update_all_amounts(&id, amount)?;
    session.save()?;
    println!("Updated {count} payments to {}", session.money(amount));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_row() {
        let opts = DateOptions::default();
        let row = parse_row("05/01/2024,500", &opts);
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(row.amount, Some(Decimal::new(500, 0)));

        let row = parse_row("05/01/2024", &opts);
        assert!(row.date.is_some());
        assert_eq!(row.amount, None);

        let row = parse_row("later,0", &opts);
        assert_eq!(row.date, None);
        assert_eq!(row.amount, None);
    }
}
