mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod money;
#[cfg(feature = "pdf")]
mod pdf;
mod reports;
mod settings;

use clap::Parser;

#[cfg(feature = "pdf")]
use cli::ExportCommands;
use cli::{
    CategoryCommands, Cli, Commands, CostCenterCommands, EntryCommands, PersonCommands,
    ReportCommands, SupplierCommands, UserCommands,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, parish } => cli::init::run(data_dir, parish),
        Commands::Login { email } => cli::login::login(&email),
        Commands::Logout => cli::login::logout(),
        Commands::Entry { command } => match command {
            EntryCommands::Add {
                description,
                amount,
                due,
                transaction_type,
                category,
                method,
                cost_center,
                parishioner,
                supplier,
                note,
                paid,
            } => cli::entries::add(
                &description,
                &amount,
                &due,
                &transaction_type,
                &category,
                &method,
                cost_center.as_deref(),
                parishioner.as_deref(),
                supplier.as_deref(),
                note.as_deref(),
                paid,
            ),
            EntryCommands::List {
                month,
                from_date,
                to_date,
                transaction_type,
                cost_center,
                paid_only,
                include_cancelled,
                by_payment_date,
            } => cli::entries::list(
                month.as_deref(),
                from_date.as_deref(),
                to_date.as_deref(),
                transaction_type.as_deref(),
                cost_center.as_deref(),
                paid_only,
                include_cancelled,
                by_payment_date,
            ),
            EntryCommands::Show { id } => cli::entries::show(id),
            EntryCommands::Settle {
                id,
                amount,
                date,
                method,
            } => cli::entries::settle(id, &amount, &date, method.as_deref()),
            EntryCommands::Reverse { id } => cli::entries::reverse(id),
            EntryCommands::Cancel { id } => cli::entries::cancel(id),
            EntryCommands::Update {
                id,
                description,
                amount,
                due,
                category,
                method,
                cost_center,
                note,
            } => cli::entries::update(
                id,
                description.as_deref(),
                amount.as_deref(),
                due.as_deref(),
                category.as_deref(),
                method.as_deref(),
                cost_center.as_deref(),
                note.as_deref(),
            ),
            EntryCommands::Remove { id } => cli::entries::remove(id),
        },
        Commands::Category { command } => match command {
            CategoryCommands::Add {
                name,
                transaction_type,
                deductible,
            } => cli::categories::add(&name, &transaction_type, deductible),
            CategoryCommands::List { transaction_type } => {
                cli::categories::list(transaction_type.as_deref())
            }
            CategoryCommands::Deactivate { id } => cli::categories::deactivate(id),
        },
        Commands::Costcenter { command } => match command {
            CostCenterCommands::Add { name } => cli::costcenters::add(&name),
            CostCenterCommands::List => cli::costcenters::list(),
            CostCenterCommands::Deactivate { id } => cli::costcenters::deactivate(id),
        },
        Commands::Parishioner { command } => match command {
            PersonCommands::Add { name, phone, email } => {
                cli::parishioners::add(&name, phone.as_deref(), email.as_deref())
            }
            PersonCommands::List => cli::parishioners::list(),
            PersonCommands::Deactivate { id } => cli::parishioners::deactivate(id),
        },
        Commands::Supplier { command } => match command {
            SupplierCommands::Add { name, document } => {
                cli::suppliers::add(&name, document.as_deref())
            }
            SupplierCommands::List => cli::suppliers::list(),
            SupplierCommands::Deactivate { id } => cli::suppliers::deactivate(id),
        },
        Commands::User { command } => match command {
            UserCommands::Add { name, email } => cli::users::add(&name, &email),
            UserCommands::List => cli::users::list(),
            UserCommands::Deactivate { id } => cli::users::deactivate(id),
        },
        Commands::Report { command } => match command {
            ReportCommands::Statement {
                month,
                from_date,
                to_date,
                transaction_type,
                cost_center,
                paid_only,
                include_cancelled,
                by_payment_date,
            } => cli::report::statement(
                month.as_deref(),
                from_date.as_deref(),
                to_date.as_deref(),
                transaction_type.as_deref(),
                cost_center.as_deref(),
                paid_only,
                include_cancelled,
                by_payment_date,
            ),
            ReportCommands::Summary {
                by,
                month,
                from_date,
                to_date,
                paid_only,
            } => cli::report::summary(
                &by,
                month.as_deref(),
                from_date.as_deref(),
                to_date.as_deref(),
                paid_only,
            ),
            ReportCommands::Balance {
                month,
                from_date,
                to_date,
            } => cli::report::balance(month.as_deref(), from_date.as_deref(), to_date.as_deref()),
            ReportCommands::Dashboard { months } => cli::report::dashboard(months),
        },
        #[cfg(feature = "pdf")]
        Commands::Export { command } => match command {
            ExportCommands::Statement {
                month,
                from_date,
                to_date,
                transaction_type,
                cost_center,
                paid_only,
                output,
            } => cli::export::statement(
                month.as_deref(),
                from_date.as_deref(),
                to_date.as_deref(),
                transaction_type.as_deref(),
                cost_center.as_deref(),
                paid_only,
                output,
            ),
            ExportCommands::Summary {
                by,
                month,
                from_date,
                to_date,
                paid_only,
                output,
            } => cli::export::summary(
                &by,
                month.as_deref(),
                from_date.as_deref(),
                to_date.as_deref(),
                paid_only,
                output,
            ),
        },
        Commands::Import {
            file,
            format,
            income_category,
            expense_category,
            cost_center,
        } => cli::import::run(
            &file,
            format.as_deref(),
            income_category.as_deref(),
            expense_category.as_deref(),
            cost_center.as_deref(),
        ),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
