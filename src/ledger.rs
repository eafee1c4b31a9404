use rust_decimal::Decimal;
use tracing::info;

use crate::amounts;
use crate::db::Store;
use crate::error::{DaybookError, Result};
use crate::models::{Customer, CustomerDraft, Payment, PaymentInput};
use crate::reconciler::{self, MergeSummary};

/// The customer list and every mutation allowed on it. Loaded from and saved
/// to a [`Store`] as a whole.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    customers: Vec<Customer>,
}

fn validate_draft(draft: &CustomerDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(DaybookError::InvalidInput("Customer name is required".to_string()));
    }
    if !amounts::within_limits(draft.loan_amount) {
        return Err(DaybookError::InvalidInput(format!(
            "Loan amount must be greater than 0 and at most {}",
            amounts::MAX_AMOUNT
        )));
    }
    Ok(())
}

fn validate_payment(input: &PaymentInput) -> Result<()> {
    reconciler::check_amount(input.amount)
}

impl Ledger {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self { customers }
    }

    pub fn load(store: &dyn Store) -> Result<Self> {
        Ok(Self::new(store.load()?))
    }

    pub fn save(&self, store: &dyn Store) -> Result<()> {
        store.save(&self.customers)
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn search(&self, term: &str) -> Vec<&Customer> {
        let term = term.trim();
        self.customers
            .iter()
            .filter(|c| term.is_empty() || c.matches(term))
            .collect()
    }

    /// Look a customer up by id, or failing that by a unique case-insensitive name.
    pub fn resolve(&self, key: &str) -> Result<&Customer> {
        let index = self.position(key)?;
        Ok(&self.customers[index])
    }

    fn position(&self, key: &str) -> Result<usize> {
        if let Some(i) = self.customers.iter().position(|c| c.id == key) {
            return Ok(i);
        }
        let named: Vec<usize> = self
            .customers
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.eq_ignore_ascii_case(key.trim()))
            .map(|(i, _)| i)
            .collect();
        match named.as_slice() {
            [i] => Ok(*i),
            [] => Err(DaybookError::UnknownCustomer(key.to_string())),
            many => Err(DaybookError::InvalidInput(format!(
                "'{key}' matches {} customers; use the customer id",
                many.len()
            ))),
        }
    }

    fn customer_mut(&mut self, key: &str) -> Result<&mut Customer> {
        let index = self.position(key)?;
        Ok(&mut self.customers[index])
    }

    fn next_id(&self, now_millis: i64) -> String {
        let mut candidate = now_millis;
        while self.customers.iter().any(|c| c.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Create a customer, optionally seeded with a payment plan.
    pub fn add_customer(
        &mut self,
        draft: CustomerDraft,
        plan: &[PaymentInput],
        now_millis: i64,
    ) -> Result<&Customer> {
        validate_draft(&draft)?;
        let mut customer = Customer {
            id: self.next_id(now_millis),
            name: draft.name.trim().to_string(),
            area: draft.area.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            loan_amount: draft.loan_amount,
            payments: Vec::new(),
        };
        if !plan.is_empty() {
            reconciler::merge(&mut customer.payments, plan);
        }
        info!(id = %customer.id, plan_days = plan.len(), "added customer");
        self.customers.push(customer);
        Ok(&self.customers[self.customers.len() - 1])
    }

    pub fn edit_customer(&mut self, key: &str, draft: CustomerDraft) -> Result<()> {
        validate_draft(&draft)?;
        let customer = self.customer_mut(key)?;
        customer.name = draft.name.trim().to_string();
        customer.area = draft.area.trim().to_string();
        customer.phone = draft.phone.trim().to_string();
        customer.loan_amount = draft.loan_amount;
        Ok(())
    }

    pub fn delete_customer(&mut self, key: &str) -> Result<Customer> {
        let index = self.position(key)?;
        let removed = self.customers.remove(index);
        info!(id = %removed.id, payments = removed.payments.len(), "deleted customer");
        Ok(removed)
    }

    /// Record a single payment. Unlike the bulk paths this never merges, so a
    /// second payment on the same date is kept as its own entry.
    pub fn add_payment(&mut self, key: &str, input: PaymentInput) -> Result<()> {
        validate_payment(&input)?;
        let customer = self.customer_mut(key)?;
        customer.payments.push(Payment {
            date: input.date,
            amount: input.amount,
        });
        reconciler::sort_payments(&mut customer.payments);
        Ok(())
    }

    pub fn edit_payment(&mut self, key: &str, index: usize, input: PaymentInput) -> Result<()> {
        validate_payment(&input)?;
        let customer = self.customer_mut(key)?;
        let id = customer.id.clone();
        let payment = customer
            .payments
            .get_mut(index)
            .ok_or(DaybookError::UnknownPayment {
                customer: id,
                index: index + 1,
            })?;
        payment.date = input.date;
        payment.amount = input.amount;
        reconciler::sort_payments(&mut customer.payments);
        Ok(())
    }

    pub fn delete_payment(&mut self, key: &str, index: usize) -> Result<Payment> {
        let customer = self.customer_mut(key)?;
        if index >= customer.payments.len() {
            return Err(DaybookError::UnknownPayment {
                customer: customer.id.clone(),
                index: index + 1,
            });
        }
        Ok(customer.payments.remove(index))
    }

    /// Apply a bulk, row-by-row or imported list with merge-by-date semantics.
    pub fn merge_payments(&mut self, key: &str, incoming: &[PaymentInput]) -> Result<MergeSummary> {
        for input in incoming {
            validate_payment(input)?;
        }
        let customer = self.customer_mut(key)?;
        Ok(reconciler::merge(&mut customer.payments, incoming))
    }

    pub fn update_all_amounts(&mut self, key: &str, amount: Decimal) -> Result<usize> {
        let customer = self.customer_mut(key)?;
        reconciler::set_all_amounts(&mut customer.payments, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn input(date: &str, amount: &str) -> PaymentInput {
        PaymentInput {
            date: d(date),
            amount: dec(amount),
        }
    }

    fn draft(name: &str) -> CustomerDraft {
        CustomerDraft {
            name: name.to_string(),
            area: "Market Road".to_string(),
            phone: "9876543210".to_string(),
            loan_amount: dec("5000"),
        }
    }

    fn ledger_with(names: &[&str]) -> Ledger {
        let mut ledger = Ledger::default();
        for (i, name) in names.iter().enumerate() {
            ledger.add_customer(draft(name), &[], 1_000 + i as i64).unwrap();
        }
        ledger
    }

    #[test]
    fn test_add_customer_assigns_unique_ids() {
        let mut ledger = Ledger::default();
        let a = ledger.add_customer(draft("Asha"), &[], 42).unwrap().id.clone();
        let b = ledger.add_customer(draft("Bala"), &[], 42).unwrap().id.clone();
        assert_eq!(a, "42");
        assert_eq!(b, "43");
    }

    #[test]
    fn test_add_customer_validates() {
        let mut ledger = Ledger::default();
        assert!(ledger.add_customer(draft("  "), &[], 1).is_err());
        let mut bad = draft("Asha");
        bad.loan_amount = Decimal::ZERO;
        assert!(ledger.add_customer(bad, &[], 1).is_err());
        let mut huge = draft("Asha");
        huge.loan_amount = dec("50000000000000000000000000000");
        assert!(ledger.add_customer(huge, &[], 1).is_err());
        assert!(ledger.customers().is_empty());
    }

    #[test]
    fn test_add_customer_with_plan() {
        let mut ledger = Ledger::default();
        let plan = reconciler::consecutive_days(d("2024-03-01"), 10, dec("500")).unwrap();
        let c = ledger.add_customer(draft("Asha"), &plan, 1).unwrap();
        assert_eq!(c.payments.len(), 10);
        assert_eq!(c.total_paid(), dec("5000"));
    }

    #[test]
    fn test_resolve_by_id_or_name() {
        let ledger = ledger_with(&["Asha", "Bala", "bala"]);
        assert_eq!(ledger.resolve("1000").unwrap().name, "Asha");
        assert_eq!(ledger.resolve("asha").unwrap().id, "1000");
        assert!(matches!(ledger.resolve("Bala"), Err(DaybookError::InvalidInput(_))));
        assert!(matches!(ledger.resolve("Chitra"), Err(DaybookError::UnknownCustomer(_))));
    }

    #[test]
    fn test_search_filters_and_empty_term_returns_all() {
        let ledger = ledger_with(&["Asha", "Bala"]);
        assert_eq!(ledger.search("").len(), 2);
        assert_eq!(ledger.search("bal").len(), 1);
        assert_eq!(ledger.search("market").len(), 2);
    }

    #[test]
    fn test_edit_and_delete_customer() {
        let mut ledger = ledger_with(&["Asha"]);
        let mut edited = draft("Asha Devi");
        edited.loan_amount = dec("7500");
        ledger.edit_customer("1000", edited).unwrap();
        assert_eq!(ledger.resolve("1000").unwrap().loan_amount, dec("7500"));
        let removed = ledger.delete_customer("Asha Devi").unwrap();
        assert_eq!(removed.id, "1000");
        assert!(ledger.customers().is_empty());
    }

    #[test]
    fn test_single_payments_keep_sorted_and_allow_same_day() {
        let mut ledger = ledger_with(&["Asha"]);
        ledger.add_payment("Asha", input("2024-01-05", "100")).unwrap();
        ledger.add_payment("Asha", input("2024-01-01", "100")).unwrap();
        ledger.add_payment("Asha", input("2024-01-05", "50")).unwrap();
        let c = ledger.resolve("Asha").unwrap();
        let dates: Vec<String> = c.payments.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-05", "2024-01-05"]);
        assert!(ledger.add_payment("Asha", input("2024-01-06", "0")).is_err());
        assert!(ledger.add_payment("Asha", input("2024-01-06", "50000000000000000000000000000")).is_err());
        assert_eq!(ledger.resolve("Asha").unwrap().payments.len(), 3);
    }

    #[test]
    fn test_edit_payment_resorts() {
        let mut ledger = ledger_with(&["Asha"]);
        ledger
            .merge_payments("Asha", &[input("2024-01-01", "100"), input("2024-01-02", "100")])
            .unwrap();
        ledger.edit_payment("Asha", 0, input("2024-01-09", "120")).unwrap();
        let c = ledger.resolve("Asha").unwrap();
        assert_eq!(c.payments[1].date, d("2024-01-09"));
        assert_eq!(c.payments[1].amount, dec("120"));
        assert!(matches!(
            ledger.edit_payment("Asha", 5, input("2024-01-09", "120")),
            Err(DaybookError::UnknownPayment { index: 6, .. })
        ));
    }

    #[test]
    fn test_delete_payment() {
        let mut ledger = ledger_with(&["Asha"]);
        ledger.merge_payments("Asha", &[input("2024-01-01", "100")]).unwrap();
        let removed = ledger.delete_payment("Asha", 0).unwrap();
        assert_eq!(removed.amount, dec("100"));
        assert!(ledger.delete_payment("Asha", 0).is_err());
    }

    #[test]
    fn test_merge_payments_rejects_non_positive_before_touching_ledger() {
        let mut ledger = ledger_with(&["Asha"]);
        let result = ledger.merge_payments("Asha", &[input("2024-01-01", "100"), input("2024-01-02", "0")]);
        assert!(result.is_err());
        assert!(ledger.resolve("Asha").unwrap().payments.is_empty());
    }

    #[test]
    fn test_update_all_amounts() {
        let mut ledger = ledger_with(&["Asha"]);
        ledger
            .merge_payments("Asha", &[input("2024-01-01", "100"), input("2024-01-02", "80")])
            .unwrap();
        assert_eq!(ledger.update_all_amounts("Asha", dec("90")).unwrap(), 2);
        assert_eq!(ledger.resolve("Asha").unwrap().total_paid(), dec("180"));
    }
}
