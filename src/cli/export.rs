use std::path::PathBuf;

use crate::cli::Session;
use crate::error::Result;
use crate::reports::write_payments_csv;

fn default_path(data_dir: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    PathBuf::from(data_dir)
        .join("exports")
        .join(format!("payments-{date}.csv"))
}

pub fn run(output: Option<&str>, search: Option<&str>) -> Result<()> {
    let session = Session::open()?;
    let customers = session.ledger.search(search.unwrap_or(""));

    if output == Some("-") {
        write_payments_csv(&customers, std::io::stdout().lock())?;
        return Ok(());
    }

    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&session.settings.data_dir));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;
    let rows = write_payments_csv(&customers, file)?;
    println!(
        "Wrote {rows} payments for {} customers to {}",
        customers.len(),
        path.display()
    );
    Ok(())
}
