pub mod customers;
pub mod export;
pub mod import;
pub mod init;
pub mod payments;
pub mod status;

use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::amounts;
use crate::dates::{self, DateOptions, DateOrder};
use crate::db::SqliteStore;
use crate::error::{DaybookError, Result};
use crate::fmt;
use crate::importer::ScanMode;
use crate::ledger::Ledger;
use crate::settings::{load_settings, Settings};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Settings, store and loaded ledger for one command invocation.
pub(crate) struct Session {
    pub settings: Settings,
    pub store: SqliteStore,
    pub ledger: Ledger,
}

impl Session {
    pub fn open() -> Result<Self> {
        let settings = load_settings();
        let db_path = settings.db_path();
        if !db_path.exists() {
            return Err(DaybookError::Other(
                "Database not found. Run `daybook init` to set up.".to_string(),
            ));
        }
        let store = SqliteStore::open(&db_path)?;
        let ledger = Ledger::load(&store)?;
        Ok(Self {
            settings,
            store,
            ledger,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.ledger.save(&self.store)
    }

    pub fn money(&self, val: Decimal) -> String {
        fmt::money(val, &self.settings.currency_symbol)
    }

    pub fn date_options(&self) -> DateOptions {
        self.settings.date_options()
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts `today`, `yesterday`, `2days` or anything the date reader understands.
pub(crate) fn parse_date_arg(raw: &str, opts: &DateOptions, today: NaiveDate) -> Result<NaiveDate> {
    let back = |n: u64| today.checked_sub_days(Days::new(n));
    let relative = match raw.trim().to_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => back(1),
        "2days" => back(2),
        _ => None,
    };
    relative
        .or_else(|| dates::normalize(raw, opts))
        .ok_or_else(|| DaybookError::InvalidInput(format!("Could not read date: {raw}")))
}

pub(crate) fn parse_amount_arg(raw: &str) -> Result<Decimal> {
    amounts::extract(raw)
        .ok_or_else(|| DaybookError::InvalidInput(format!("Amount must be greater than 0: {raw}")))
}

/// Payment numbers on the command line are 1-based, as shown by `customers show`.
pub(crate) fn payment_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| DaybookError::InvalidInput("Payment numbers start at 1".to_string()))
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "daybook", about = "Daily installment ledger for micro-loan customers.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up daybook: choose a data directory and initialize the database.
    Init {
        /// Path for daybook data (default: ~/Documents/daybook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show the database location and collection totals.
    Status,
    /// Manage customers.
    Customers {
        #[command(subcommand)]
        command: CustomersCommands,
    },
    /// Record a single payment (defaults: today, last amount paid).
    Pay {
        /// Customer id or name
        customer: String,
        /// Amount, e.g. 500 or ₹1,250
        #[arg(long)]
        amount: Option<String>,
        /// Date: today, yesterday, 2days, or a date such as 05/01/2024
        #[arg(long)]
        date: Option<String>,
    },
    /// Edit, delete or add payments in bulk.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommands,
    },
    /// Read payments from pasted text, a file or a photo, and merge them by date.
    Import {
        /// Customer id or name
        customer: String,
        /// Text file to read; `-` or omitted reads stdin
        file: Option<String>,
        /// Image to run through OCR instead of reading text
        #[arg(long, conflicts_with = "file")]
        image: Option<String>,
        /// Merge the parsed payments into the ledger (default: preview only)
        #[arg(long)]
        apply: bool,
        /// Override the configured scan mode
        #[arg(long = "scan-mode", value_enum)]
        scan_mode: Option<ScanMode>,
        /// Override the configured day/month order
        #[arg(long = "date-order", value_enum)]
        date_order: Option<DateOrder>,
    },
    /// Export payment histories to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/payments-YYYYMMDD.csv); `-` for stdout
        #[arg(long)]
        output: Option<String>,
        /// Only customers whose name, area or phone matches
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CustomersCommands {
    /// Add a customer, optionally with a daily payment plan.
    Add {
        /// Customer name
        name: String,
        #[arg(long, default_value = "")]
        area: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// Loan amount
        #[arg(long)]
        loan: String,
        /// Create one payment per day for this many days (e.g. 10 or 30)
        #[arg(long = "plan-days", requires = "daily_amount")]
        plan_days: Option<u32>,
        /// Amount for each plan day
        #[arg(long = "daily-amount", requires = "plan_days")]
        daily_amount: Option<String>,
        /// First plan day (default: today)
        #[arg(long)]
        start: Option<String>,
    },
    /// Change a customer's details; omitted fields are kept.
    Edit {
        /// Customer id or name
        customer: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        area: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        loan: Option<String>,
    },
    /// Delete a customer and all their payments.
    Delete {
        /// Customer id or name
        customer: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List customers with paid and pending totals.
    List {
        /// Filter by name, area or phone
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one customer's payment history.
    Show {
        /// Customer id or name
        customer: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentsCommands {
    /// Change the date or amount of one payment.
    Edit {
        /// Customer id or name
        customer: String,
        /// Payment number as shown by `customers show`
        number: usize,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        amount: Option<String>,
    },
    /// Delete one payment.
    Delete {
        /// Customer id or name
        customer: String,
        /// Payment number as shown by `customers show`
        number: usize,
    },
    /// Add the same amount for consecutive days, merging by date.
    Bulk {
        /// Customer id or name
        customer: String,
        /// First day
        #[arg(long)]
        start: String,
        /// Number of days
        #[arg(long)]
        days: u32,
        /// Amount per day
        #[arg(long)]
        amount: String,
    },
    /// Add payments given as DATE,AMOUNT rows, merging by date.
    Rows {
        /// Customer id or name
        customer: String,
        /// Rows such as 05/01/2024,500
        #[arg(required = true)]
        rows: Vec<String>,
    },
    /// Set every payment of a customer to the same amount.
    UpdateAll {
        /// Customer id or name
        customer: String,
        /// Amount to set (defaults to the current average payment)
        #[arg(long)]
        amount: Option<String>,
    },
}
