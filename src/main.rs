mod amounts;
mod cli;
mod dates;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod ocr;
mod reconciler;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CustomersCommands, PaymentsCommands};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None | Some(Commands::Status) => cli::status::run(),
        Some(Commands::Init { data_dir }) => cli::init::run(data_dir),
        Some(Commands::Customers { command }) => match command {
            CustomersCommands::Add {
                name,
                area,
                phone,
                loan,
                plan_days,
                daily_amount,
                start,
            } => cli::customers::add(
                &name,
                &area,
                &phone,
                &loan,
                plan_days,
                daily_amount.as_deref(),
                start.as_deref(),
            ),
            CustomersCommands::Edit {
                customer,
                name,
                area,
                phone,
                loan,
            } => cli::customers::edit(
                &customer,
                name.as_deref(),
                area.as_deref(),
                phone.as_deref(),
                loan.as_deref(),
            ),
            CustomersCommands::Delete { customer, yes } => cli::customers::delete(&customer, yes),
            CustomersCommands::List { search } => cli::customers::list(search.as_deref()),
            CustomersCommands::Show { customer } => cli::customers::show(&customer),
        },
        Some(Commands::Pay {
            customer,
            amount,
            date,
        }) => cli::payments::pay(&customer, amount.as_deref(), date.as_deref()),
        Some(Commands::Payments { command }) => match command {
            PaymentsCommands::Edit {
                customer,
                number,
                date,
                amount,
            } => cli::payments::edit(&customer, number, date.as_deref(), amount.as_deref()),
            PaymentsCommands::Delete { customer, number } => cli::payments::delete(&customer, number),
            PaymentsCommands::Bulk {
                customer,
                start,
                days,
                amount,
            } => cli::payments::bulk(&customer, &start, days, &amount),
            PaymentsCommands::Rows { customer, rows } => cli::payments::rows(&customer, &rows),
            PaymentsCommands::UpdateAll { customer, amount } => cli::payments::update_all(&customer, amount.as_deref()),
        },
        Some(Commands::Import {
            customer,
            file,
            image,
            apply,
            scan_mode,
            date_order,
        }) => cli::import::run(
            &customer,
            file.as_deref(),
            image.as_deref(),
            apply,
            scan_mode,
            date_order,
        ),
        Some(Commands::Export { output, search }) => cli::export::run(output.as_deref(), search.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
