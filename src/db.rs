use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{DaybookError, Result};
use crate::models::{Customer, Payment};

pub const DB_FILE: &str = "daybook.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customers (
    seq INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    area TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    loan_amount TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY,
    customer_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    date TEXT NOT NULL,
    amount TEXT NOT NULL,
    FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |r| r.get(0))
        .optional()
        .ok()
        .flatten()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Snapshot store
// ---------------------------------------------------------------------------

/// Whole-snapshot persistence for the customer list.
pub trait Store {
    fn load(&self) -> Result<Vec<Customer>>;
    fn save(&self, customers: &[Customer]) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| DaybookError::Other(format!("Bad stored amount '{raw}': {e}")))
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DaybookError::Other(format!("Bad stored date '{raw}': {e}")))
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = get_connection(path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn last_updated(&self) -> Option<String> {
        get_metadata(&self.conn, "last_updated")
    }

    fn load_payments(&self) -> Result<HashMap<String, Vec<Payment>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT customer_id, date, amount FROM payments ORDER BY customer_id, position")?;
        let rows: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut by_customer: HashMap<String, Vec<Payment>> = HashMap::new();
        for (customer_id, date, amount) in rows {
            by_customer.entry(customer_id).or_default().push(Payment {
                date: parse_stored_date(&date)?,
                amount: parse_amount(&amount)?,
            });
        }
        Ok(by_customer)
    }
}

impl Store for SqliteStore {
    fn load(&self) -> Result<Vec<Customer>> {
        let mut payments = self.load_payments()?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, area, phone, loan_amount FROM customers ORDER BY seq")?;
        let rows: Vec<(String, String, String, String, String)> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, area, phone, loan)| {
                Ok(Customer {
                    payments: payments.remove(&id).unwrap_or_default(),
                    loan_amount: parse_amount(&loan)?,
                    id,
                    name,
                    area,
                    phone,
                })
            })
            .collect()
    }

    fn save(&self, customers: &[Customer]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM payments", [])?;
        tx.execute("DELETE FROM customers", [])?;
        {
            let mut insert_customer = tx.prepare(
                "INSERT INTO customers (seq, id, name, area, phone, loan_amount) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_payment = tx.prepare(
                "INSERT INTO payments (customer_id, position, date, amount) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (seq, c) in customers.iter().enumerate() {
                insert_customer.execute(rusqlite::params![
                    seq as i64,
                    c.id,
                    c.name,
                    c.area,
                    c.phone,
                    c.loan_amount.to_string(),
                ])?;
                for (position, p) in c.payments.iter().enumerate() {
                    insert_payment.execute(rusqlite::params![
                        c.id,
                        position as i64,
                        p.date.format("%Y-%m-%d").to_string(),
                        p.amount.to_string(),
                    ])?;
                }
            }
        }
        set_metadata(&tx, "last_updated", &chrono::Local::now().to_rfc3339())?;
        tx.commit()?;
        info!(customers = customers.len(), "saved ledger snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join(DB_FILE)).unwrap();
        (dir, store)
    }

    fn customer(id: &str, name: &str, payments: &[(&str, &str)]) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            area: "Ward 4".to_string(),
            phone: String::new(),
            loan_amount: Decimal::from_str("10000").unwrap(),
            payments: payments
                .iter()
                .map(|(d, a)| Payment {
                    date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                    amount: Decimal::from_str(a).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["customers", "payments", "metadata"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_metadata_upsert() {
        let (_dir, conn) = test_db();
        assert_eq!(get_metadata(&conn, "last_updated"), None);
        set_metadata(&conn, "last_updated", "a").unwrap();
        set_metadata(&conn, "last_updated", "b").unwrap();
        assert_eq!(get_metadata(&conn, "last_updated").as_deref(), Some("b"));
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let (_dir, store) = test_store();
        assert!(store.load().unwrap().is_empty());
        assert!(store.last_updated().is_none());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_order() {
        let (_dir, store) = test_store();
        let customers = vec![
            customer("200", "Zainab", &[("2024-01-01", "100"), ("2024-01-01", "50.25"), ("2024-01-03", "100")]),
            customer("100", "Arun", &[]),
        ];
        store.save(&customers).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, customers);
        assert!(store.last_updated().is_some());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let (_dir, store) = test_store();
        store
            .save(&[customer("1", "Arun", &[("2024-01-01", "100")]), customer("2", "Bina", &[])])
            .unwrap();
        store.save(&[customer("2", "Bina", &[("2024-02-01", "75")])]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].payments.len(), 1);
        let orphans: i64 = store
            .conn
            .query_row("SELECT count(*) FROM payments WHERE customer_id = '1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let (_dir, store) = test_store();
        store.save(&[customer("1", "Arun", &[("2024-01-01", "100")])]).unwrap();
        // Duplicate ids violate the UNIQUE constraint midway through the save.
        let result = store.save(&[customer("9", "Dup", &[]), customer("9", "Dup", &[])]);
        assert!(result.is_err());
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Arun");
    }
}
