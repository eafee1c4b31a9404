use std::io::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Customer, Payment};

// ---------------------------------------------------------------------------
// Per-customer summary
// ---------------------------------------------------------------------------

pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub area: String,
    pub loan_amount: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub payment_count: usize,
    pub last_payment: Option<Payment>,
    pub paid_today: Option<Decimal>,
    pub average: Option<Decimal>,
    pub highest: Option<Decimal>,
    pub lowest: Option<Decimal>,
}

pub fn summarize(customer: &Customer, today: NaiveDate) -> CustomerSummary {
    CustomerSummary {
        id: customer.id.clone(),
        name: customer.name.clone(),
        area: customer.area.clone(),
        loan_amount: customer.loan_amount,
        paid: customer.total_paid(),
        pending: customer.pending(),
        payment_count: customer.payments.len(),
        last_payment: customer.last_payment().copied(),
        paid_today: customer.payment_on(today).map(|p| p.amount),
        average: customer.average_payment(),
        highest: customer.highest_payment(),
        lowest: customer.lowest_payment(),
    }
}

// ---------------------------------------------------------------------------
// Ledger totals
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub customers: usize,
    pub payments: usize,
    pub loaned: Decimal,
    pub collected: Decimal,
    pub pending: Decimal,
    pub collected_today: Decimal,
    pub paid_today: usize,
}

pub fn totals(customers: &[Customer], today: NaiveDate) -> LedgerTotals {
    let mut t = LedgerTotals {
        customers: customers.len(),
        ..LedgerTotals::default()
    };
    for c in customers {
        t.payments += c.payments.len();
        t.loaned += c.loan_amount;
        t.collected += c.total_paid();
        let today_amount: Decimal = c
            .payments
            .iter()
            .filter(|p| p.date == today)
            .map(|p| p.amount)
            .sum();
        if today_amount > Decimal::ZERO {
            t.paid_today += 1;
            t.collected_today += today_amount;
        }
    }
    t.pending = t.loaned - t.collected;
    t
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write one row per payment. Returns the number of payment rows written.
pub fn write_payments_csv<W: Write>(customers: &[&Customer], out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["customer_id", "name", "area", "date", "amount"])?;
    let mut rows = 0;
    for c in customers {
        for p in &c.payments {
            let date = p.date.format("%Y-%m-%d").to_string();
            let amount = p.amount.to_string();
            writer.write_record([
                c.id.as_str(),
                c.name.as_str(),
                c.area.as_str(),
                date.as_str(),
                amount.as_str(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}
