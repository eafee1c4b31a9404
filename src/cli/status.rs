use crate::cli::{today, Session};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::reports;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `daybook init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let session = Session::open()?;
    println!(
        "Updated:    {}",
        session.store.last_updated().as_deref().unwrap_or("(never)")
    );

    let t = reports::totals(session.ledger.customers(), today());
    println!();
    println!("Customers:       {}", t.customers);
    println!("Payments:        {}", t.payments);
    println!("Loaned:          {}", session.money(t.loaned));
    println!("Collected:       {}", session.money(t.collected));
    println!("Pending:         {}", session.money(t.pending));
    println!(
        "Paid today:      {} of {} ({})",
        t.paid_today,
        t.customers,
        session.money(t.collected_today)
    );
    Ok(())
}
