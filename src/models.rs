use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub area: String,
    pub phone: String,
    pub loan_amount: Decimal,
    pub payments: Vec<Payment>,
}

impl Customer {
    pub fn total_paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn pending(&self) -> Decimal {
        self.loan_amount - self.total_paid()
    }

    pub fn payment_on(&self, date: NaiveDate) -> Option<&Payment> {
        self.payments.iter().find(|p| p.date == date)
    }

    /// Most recent payment by date. Among payments sharing that date the
    /// earliest recorded one wins.
    pub fn last_payment(&self) -> Option<&Payment> {
        self.payments.iter().rev().max_by_key(|p| p.date)
    }

    /// Amount of the most recent payment, used to prefill new entries.
    pub fn last_payment_amount(&self) -> Option<Decimal> {
        self.last_payment().map(|p| p.amount)
    }

    /// Mean payment rounded to 2 places, `None` without payments.
    pub fn average_payment(&self) -> Option<Decimal> {
        if self.payments.is_empty() {
            return None;
        }
        let count = Decimal::from(self.payments.len());
        Some((self.total_paid() / count).round_dp(2))
    }

    pub fn highest_payment(&self) -> Option<Decimal> {
        self.payments.iter().map(|p| p.amount).max()
    }

    pub fn lowest_payment(&self) -> Option<Decimal> {
        self.payments.iter().map(|p| p.amount).min()
    }

    /// Last payment amount, or 1% of the loan when there is no history yet.
    pub fn suggested_amount(&self) -> Decimal {
        self.last_payment_amount()
            .unwrap_or_else(|| (self.loan_amount / Decimal::ONE_HUNDRED).round_dp(2))
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.area.to_lowercase().contains(&term)
            || self.phone.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// A (date, amount) pair headed for the reconciler, whatever produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentInput {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// One line of imported text that yielded a payment. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub line_number: usize,
    pub original: String,
}

impl From<&ImportCandidate> for PaymentInput {
    fn from(c: &ImportCandidate) -> Self {
        PaymentInput {
            date: c.date,
            amount: c.amount,
        }
    }
}

/// Fields accepted when creating or editing a customer.
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub area: String,
    pub phone: String,
    pub loan_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn customer(payments: &[(&str, &str)]) -> Customer {
        Customer {
            id: "1".to_string(),
            name: "Ravi Kumar".to_string(),
            area: "Gandhi Nagar".to_string(),
            phone: "98765 43210".to_string(),
            loan_amount: Decimal::from(10_000),
            payments: payments
                .iter()
                .map(|(date, amt)| Payment {
                    date: d(date),
                    amount: Decimal::from_str(amt).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_totals_and_pending() {
        let c = customer(&[("2024-01-01", "100"), ("2024-01-02", "150.50")]);
        assert_eq!(c.total_paid(), Decimal::from_str("250.50").unwrap());
        assert_eq!(c.pending(), Decimal::from_str("9749.50").unwrap());
    }

    #[test]
    fn test_last_payment_amount_uses_latest_date() {
        let c = customer(&[("2024-01-05", "300"), ("2024-01-01", "100")]);
        assert_eq!(c.last_payment_amount(), Some(Decimal::from(300)));
    }

    #[test]
    fn test_suggested_amount_defaults_to_one_percent() {
        let c = customer(&[]);
        assert_eq!(c.suggested_amount(), Decimal::from(100));
    }

    #[test]
    fn test_matches_name_area_phone() {
        let c = customer(&[]);
        assert!(c.matches("ravi"));
        assert!(c.matches("NAGAR"));
        assert!(c.matches("43210"));
        assert!(!c.matches("suresh"));
    }

    #[test]
    fn test_last_payment_prefers_first_entry_on_same_date() {
        let c = customer(&[("2024-01-03", "80"), ("2024-01-05", "100"), ("2024-01-05", "50")]);
        assert_eq!(c.last_payment_amount(), Some(Decimal::from(100)));
        assert_eq!(c.suggested_amount(), Decimal::from(100));
    }

    #[test]
    fn test_payment_statistics() {
        let c = customer(&[("2024-01-01", "100"), ("2024-01-02", "150"), ("2024-01-03", "75")]);
        assert_eq!(c.average_payment(), Some(Decimal::from_str("108.33").unwrap()));
        assert_eq!(c.highest_payment(), Some(Decimal::from(150)));
        assert_eq!(c.lowest_payment(), Some(Decimal::from(75)));

        let empty = customer(&[]);
        assert_eq!(empty.average_payment(), None);
        assert_eq!(empty.highest_payment(), None);
        assert_eq!(empty.lowest_payment(), None);
    }
}
