use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;

use crate::amounts;
use crate::error::{DaybookError, Result};
use crate::models::{Payment, PaymentInput};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
}

impl MergeSummary {
    pub fn processed(&self) -> usize {
        self.added + self.updated
    }
}

/// Stable sort by date; entries sharing a date keep their relative order.
pub fn sort_payments(payments: &mut [Payment]) {
    payments.sort_by_key(|p| p.date);
}

/// Merge incoming records into `existing`, treating the date as the key.
///
/// A record whose date is already present overwrites that payment's amount;
/// any other record is appended. The collection is sorted afterwards.
pub fn merge(existing: &mut Vec<Payment>, incoming: &[PaymentInput]) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for record in incoming {
        match existing.iter_mut().find(|p| p.date == record.date) {
            Some(payment) => {
                payment.amount = record.amount;
                summary.updated += 1;
            }
            None => {
                existing.push(Payment {
                    date: record.date,
                    amount: record.amount,
                });
                summary.added += 1;
            }
        }
    }
    sort_payments(existing);
    info!(added = summary.added, updated = summary.updated, "merged payments");
    summary
}

// ---------------------------------------------------------------------------
// Producers of incoming lists
// ---------------------------------------------------------------------------

/// Reject amounts outside `(0, MAX_AMOUNT]`.
pub fn check_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(DaybookError::InvalidPayment(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if !amounts::within_limits(amount) {
        return Err(DaybookError::InvalidPayment(format!(
            "Amount must not exceed {}",
            amounts::MAX_AMOUNT
        )));
    }
    Ok(())
}

/// One fixed-amount payment per day for `days` consecutive days from `start`.
pub fn consecutive_days(start: NaiveDate, days: u32, amount: Decimal) -> Result<Vec<PaymentInput>> {
    if days == 0 {
        return Err(DaybookError::InvalidPayment(
            "Number of days must be at least 1".to_string(),
        ));
    }
    check_amount(amount)?;
    (0..days)
        .map(|i| {
            start
                .checked_add_days(Days::new(u64::from(i)))
                .map(|date| PaymentInput { date, amount })
                .ok_or_else(|| DaybookError::InvalidPayment(format!("Date out of range after {start}")))
        })
        .collect()
}

/// A hand-entered row; either field may be missing or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleRow {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

/// Validate hand-entered rows. Any bad row rejects the whole batch, with one
/// message per bad row.
pub fn flexible_rows(rows: &[FlexibleRow]) -> Result<Vec<PaymentInput>> {
    let mut errors = Vec::new();
    let mut inputs = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let n = i + 1;
        let Some(date) = row.date else {
            errors.push(format!("Row {n}: Date is required"));
            continue;
        };
        match row.amount {
            Some(amount) if amounts::within_limits(amount) => inputs.push(PaymentInput { date, amount }),
            Some(amount) if amount > Decimal::ZERO => {
                errors.push(format!("Row {n}: Amount must not exceed {}", amounts::MAX_AMOUNT))
            }
            _ => errors.push(format!("Row {n}: Amount must be greater than 0")),
        }
    }
    if !errors.is_empty() {
        return Err(DaybookError::InvalidPayment(errors.join("\n")));
    }
    if inputs.is_empty() {
        return Err(DaybookError::InvalidPayment(
            "Please add at least one payment.".to_string(),
        ));
    }
    Ok(inputs)
}

/// Set every payment to `amount`. Returns how many were changed.
pub fn set_all_amounts(payments: &mut [Payment], amount: Decimal) -> Result<usize> {
    if payments.is_empty() {
        return Err(DaybookError::InvalidPayment(
            "No payments to update for this customer.".to_string(),
        ));
    }
    check_amount(amount)?;
    for payment in payments.iter_mut() {
        payment.amount = amount;
    }
    sort_payments(payments);
    Ok(payments.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn pay(date: &str, amount: &str) -> Payment {
        Payment {
            date: d(date),
            amount: dec(amount),
        }
    }

    fn input(date: &str, amount: &str) -> PaymentInput {
        PaymentInput {
            date: d(date),
            amount: dec(amount),
        }
    }

    fn is_sorted(payments: &[Payment]) -> bool {
        payments.windows(2).all(|w| w[0].date <= w[1].date)
    }

    #[test]
    fn test_same_date_overwrites() {
        let mut existing = vec![pay("2024-01-01", "100")];
        let summary = merge(&mut existing, &[input("2024-01-01", "200")]);
        assert_eq!(existing, vec![pay("2024-01-01", "200")]);
        assert_eq!(summary, MergeSummary { added: 0, updated: 1 });
    }

    #[test]
    fn test_new_dates_append_and_sort() {
        let mut existing = vec![pay("2024-01-03", "100"), pay("2024-01-05", "100")];
        let summary = merge(
            &mut existing,
            &[input("2024-01-04", "150"), input("2024-01-01", "50"), input("2024-01-05", "120")],
        );
        assert_eq!(summary, MergeSummary { added: 2, updated: 1 });
        assert_eq!(
            existing,
            vec![
                pay("2024-01-01", "50"),
                pay("2024-01-03", "100"),
                pay("2024-01-04", "150"),
                pay("2024-01-05", "120"),
            ]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let incoming = [input("2024-02-01", "300"), input("2024-01-15", "250")];
        let mut existing = vec![pay("2024-01-10", "100")];
        let first = merge(&mut existing, &incoming);
        let after_first = existing.clone();
        let second = merge(&mut existing, &incoming);
        assert_eq!(first.added, 2);
        assert_eq!(second, MergeSummary { added: 0, updated: incoming.len() });
        assert_eq!(existing, after_first);
    }

    #[test]
    fn test_duplicate_dates_in_incoming_collapse() {
        let mut existing = Vec::new();
        let summary = merge(&mut existing, &[input("2024-01-01", "100"), input("2024-01-01", "300")]);
        assert_eq!(summary, MergeSummary { added: 1, updated: 1 });
        assert_eq!(existing, vec![pay("2024-01-01", "300")]);
    }

    #[test]
    fn test_overwrite_hits_first_of_existing_duplicates() {
        let mut existing = vec![pay("2024-01-02", "10"), pay("2024-01-01", "20"), pay("2024-01-01", "30")];
        merge(&mut existing, &[input("2024-01-01", "99")]);
        assert_eq!(
            existing,
            vec![pay("2024-01-01", "99"), pay("2024-01-01", "30"), pay("2024-01-02", "10")]
        );
        assert!(is_sorted(&existing));
    }

    #[test]
    fn test_consecutive_days_crosses_month_end() {
        let inputs = consecutive_days(d("2024-01-30"), 3, dec("50")).unwrap();
        let dates: Vec<String> = inputs.iter().map(|i| i.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-30", "2024-01-31", "2024-02-01"]);
        assert!(inputs.iter().all(|i| i.amount == dec("50")));
    }

    #[test]
    fn test_consecutive_days_rejects_bad_input() {
        assert!(consecutive_days(d("2024-01-30"), 0, dec("50")).is_err());
        assert!(consecutive_days(d("2024-01-30"), 3, dec("0")).is_err());
    }

    #[test]
    fn test_flexible_rows_rejects_whole_batch() {
        let rows = [
            FlexibleRow { date: Some(d("2024-01-01")), amount: Some(dec("100")) },
            FlexibleRow { date: Some(d("2024-01-02")), amount: Some(dec("0")) },
            FlexibleRow { date: None, amount: Some(dec("100")) },
        ];
        let err = flexible_rows(&rows).unwrap_err().to_string();
        assert!(err.contains("Row 2: Amount must be greater than 0"));
        assert!(err.contains("Row 3: Date is required"));
    }

    #[test]
    fn test_flexible_rows_accepts_valid_rows_in_order() {
        let rows = [
            FlexibleRow { date: Some(d("2024-01-05")), amount: Some(dec("100")) },
            FlexibleRow { date: Some(d("2024-01-01")), amount: Some(dec("75.5")) },
        ];
        let inputs = flexible_rows(&rows).unwrap();
        assert_eq!(inputs, vec![input("2024-01-05", "100"), input("2024-01-01", "75.5")]);
        assert!(flexible_rows(&[]).is_err());
    }

    #[test]
    fn test_set_all_amounts() {
        let mut payments = vec![pay("2024-01-02", "10"), pay("2024-01-01", "20")];
        assert_eq!(set_all_amounts(&mut payments, dec("150")).unwrap(), 2);
        assert_eq!(payments, vec![pay("2024-01-01", "150"), pay("2024-01-02", "150")]);
        assert!(set_all_amounts(&mut [], dec("150")).is_err());
        assert!(set_all_amounts(&mut payments, dec("-1")).is_err());
        assert!(set_all_amounts(&mut payments, dec("1000000000001")).is_err());
    }

    #[test]
    fn test_amounts_above_ceiling_are_rejected() {
        assert!(consecutive_days(d("2024-01-01"), 2, dec("50000000000000000000000000000")).is_err());
        let rows = [FlexibleRow { date: Some(d("2024-01-01")), amount: Some(dec("2000000000000")) }];
        let err = flexible_rows(&rows).unwrap_err().to_string();
        assert!(err.contains("Row 1: Amount must not exceed 1000000000000"));
    }
}
