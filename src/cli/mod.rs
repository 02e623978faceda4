pub mod backup;
pub mod categories;
pub mod costcenters;
pub mod entries;
#[cfg(feature = "pdf")]
pub mod export;
pub mod import;
pub mod init;
pub mod login;
pub mod parishioners;
pub mod report;
pub mod status;
pub mod suppliers;
pub mod users;

use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, VestryError};
use crate::ledger::parse_iso_date;

/// Resolve a reporting period: `--month YYYY-MM` wins, then `--from`/`--to`,
/// then the current calendar month.
pub(crate) fn resolve_period(
    month: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(String, String)> {
    if let Some(m) = month {
        let parts: Vec<&str> = m.split('-').collect();
        let (year, mon) = match parts.as_slice() {
            [y, m] => (y.parse::<i32>().ok(), m.parse::<u32>().ok()),
            _ => (None, None),
        };
        let (Some(year), Some(mon)) = (year, mon) else {
            return Err(VestryError::Validation(format!(
                "invalid month (expected YYYY-MM): {m}"
            )));
        };
        let first = NaiveDate::from_ymd_opt(year, mon, 1)
            .ok_or_else(|| VestryError::Validation(format!("invalid month: {m}")))?;
        return Ok(month_range(first));
    }
    match (from, to) {
        (Some(from), Some(to)) => Ok((parse_iso_date(from)?, parse_iso_date(to)?)),
        (None, None) => {
            let today = chrono::Local::now().date_naive();
            let first = today.with_day(1).unwrap_or(today);
            Ok(month_range(first))
        }
        _ => Err(VestryError::Validation(
            "--from and --to must be given together".to_string(),
        )),
    }
}

fn month_range(first: NaiveDate) -> (String, String) {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next.and_then(|d| d.pred_opt()).unwrap_or(first);
    (
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    )
}

fn lookup_id(conn: &Connection, sql: &str, name: &str, what: &str) -> Result<i64> {
    conn.query_row(sql, [name], |row| row.get(0))
        .optional()?
        .ok_or_else(|| VestryError::NotFound(format!("{what} '{name}'")))
}

pub(crate) fn resolve_category(conn: &Connection, name: &str) -> Result<i64> {
    lookup_id(
        conn,
        "SELECT id FROM categories WHERE name = ?1 AND is_active = 1",
        name,
        "category",
    )
}

pub(crate) fn resolve_cost_center(conn: &Connection, name: &str) -> Result<i64> {
    lookup_id(
        conn,
        "SELECT id FROM cost_centers WHERE name = ?1 AND is_active = 1",
        name,
        "cost center",
    )
}

pub(crate) fn resolve_parishioner(conn: &Connection, name: &str) -> Result<i64> {
    lookup_id(
        conn,
        "SELECT id FROM parishioners WHERE name = ?1 AND is_active = 1",
        name,
        "parishioner",
    )
}

pub(crate) fn resolve_supplier(conn: &Connection, name: &str) -> Result<i64> {
    lookup_id(
        conn,
        "SELECT id FROM suppliers WHERE name = ?1 AND is_active = 1",
        name,
        "supplier",
    )
}

#[derive(Parser)]
#[command(name = "vestry", about = "Parish treasury bookkeeping CLI.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Vestry: choose a data directory and initialize the database.
    Init {
        /// Path for Vestry data (default: ~/Documents/vestry)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Parish name shown on reports
        #[arg(long)]
        parish: Option<String>,
    },
    /// Log in as a treasury user (prompts for the password).
    Login {
        /// User email
        email: String,
    },
    /// Clear the current session.
    Logout,
    /// Manage financial entries.
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Manage categories.
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Manage cost centers.
    Costcenter {
        #[command(subcommand)]
        command: CostCenterCommands,
    },
    /// Manage parishioners.
    Parishioner {
        #[command(subcommand)]
        command: PersonCommands,
    },
    /// Manage suppliers.
    Supplier {
        #[command(subcommand)]
        command: SupplierCommands,
    },
    /// Manage treasury users.
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export reports to PDF.
    #[cfg(feature = "pdf")]
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Import a bank statement as settled entries.
    Import {
        /// Path to the statement file
        file: String,
        /// Statement format key (sicoob, csv); auto-detected when omitted
        #[arg(long)]
        format: Option<String>,
        /// Category for credit movements (default: Outras Receitas)
        #[arg(long = "income-category")]
        income_category: Option<String>,
        /// Category for debit movements (default: Outras Despesas)
        #[arg(long = "expense-category")]
        expense_category: Option<String>,
        /// Cost center for imported entries (default: Geral)
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/vestry-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Register a new entry (starts pending).
    Add {
        /// Entry description
        description: String,
        /// Amount, e.g. 1.234,56 or 1234.56
        #[arg(long)]
        amount: String,
        /// Due date: YYYY-MM-DD
        #[arg(long)]
        due: String,
        /// Entry type: income, expense
        #[arg(long = "type")]
        transaction_type: String,
        /// Category name
        #[arg(long)]
        category: String,
        /// Payment method: cash, pix, transfer, card, check, other
        #[arg(long, default_value = "cash")]
        method: String,
        /// Cost center name (default: Geral)
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
        /// Contributing parishioner (income entries only)
        #[arg(long)]
        parishioner: Option<String>,
        /// Supplier (expense entries only)
        #[arg(long)]
        supplier: Option<String>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
        /// Settle immediately for the full amount on the due date
        #[arg(long)]
        paid: bool,
    },
    /// List entries for a period.
    List {
        /// Month: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Filter by type: income, expense
        #[arg(long = "type")]
        transaction_type: Option<String>,
        /// Filter by cost center name
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
        /// Only paid entries
        #[arg(long = "paid-only")]
        paid_only: bool,
        /// Include cancelled entries
        #[arg(long = "include-cancelled")]
        include_cancelled: bool,
        /// Select and sort by payment date instead of due date
        #[arg(long = "by-payment-date")]
        by_payment_date: bool,
    },
    /// Show one entry in full.
    Show {
        /// Entry ID
        id: i64,
    },
    /// Settle (baixa): record the amount and date actually paid.
    Settle {
        /// Entry ID
        id: i64,
        /// Amount actually paid
        #[arg(long)]
        amount: String,
        /// Payment date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Payment method (keeps the entry's when omitted)
        #[arg(long)]
        method: Option<String>,
    },
    /// Reverse (estorno): undo a settlement, back to pending.
    Reverse {
        /// Entry ID
        id: i64,
    },
    /// Cancel a pending entry.
    Cancel {
        /// Entry ID
        id: i64,
    },
    /// Edit a pending entry.
    Update {
        /// Entry ID
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        /// Due date: YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
        /// Payment method
        #[arg(long)]
        method: Option<String>,
        /// Cost center name
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove an entry from all reports (soft delete).
    Remove {
        /// Entry ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category.
    Add {
        /// Category name
        name: String,
        /// Category type: income, expense
        #[arg(long = "type")]
        transaction_type: String,
        /// Mark as deductible (social works)
        #[arg(long)]
        deductible: bool,
    },
    /// List categories.
    List {
        /// Filter by type: income, expense
        #[arg(long = "type")]
        transaction_type: Option<String>,
    },
    /// Deactivate a category by ID.
    Deactivate {
        /// Category ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum CostCenterCommands {
    /// Add a cost center.
    Add {
        /// Cost center name, e.g. 'Capela Santa Rita'
        name: String,
    },
    /// List cost centers.
    List,
    /// Deactivate a cost center by ID.
    Deactivate {
        /// Cost center ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PersonCommands {
    /// Add a parishioner.
    Add {
        /// Parishioner name
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List parishioners.
    List,
    /// Deactivate a parishioner by ID.
    Deactivate {
        /// Parishioner ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum SupplierCommands {
    /// Add a supplier.
    Add {
        /// Supplier name
        name: String,
        /// CNPJ/CPF
        #[arg(long)]
        document: Option<String>,
    },
    /// List suppliers.
    List,
    /// Deactivate a supplier by ID.
    Deactivate {
        /// Supplier ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a treasury user (prompts for a password).
    Add {
        /// User name
        name: String,
        #[arg(long)]
        email: String,
    },
    /// List users.
    List,
    /// Deactivate a user by ID.
    Deactivate {
        /// User ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Cash book: entries with totals for a period.
    Statement {
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long = "type")]
        transaction_type: Option<String>,
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
        #[arg(long = "paid-only")]
        paid_only: bool,
        #[arg(long = "include-cancelled")]
        include_cancelled: bool,
        #[arg(long = "by-payment-date")]
        by_payment_date: bool,
    },
    /// Income/expense totals grouped by cost center or category.
    Summary {
        /// Group by: cost-center, category
        #[arg(long, default_value = "cost-center")]
        by: String,
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long = "paid-only")]
        paid_only: bool,
    },
    /// Forecast (by due date) and realized (by payment date) balances.
    Balance {
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Current-month snapshot with a monthly history.
    Dashboard {
        /// History length in months
        #[arg(long, default_value = "6")]
        months: u32,
    },
}

#[cfg(feature = "pdf")]
#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export the cash book to PDF.
    Statement {
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long = "type")]
        transaction_type: Option<String>,
        #[arg(long = "cost-center")]
        cost_center: Option<String>,
        #[arg(long = "paid-only")]
        paid_only: bool,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
    },
    /// Export a grouped summary to PDF.
    Summary {
        /// Group by: cost-center, category
        #[arg(long, default_value = "cost-center")]
        by: String,
        #[arg(long)]
        month: Option<String>,
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long = "paid-only")]
        paid_only: bool,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_period_from_month() {
        let (start, end) = resolve_period(Some("2024-02"), None, None).unwrap();
        assert_eq!(start, "2024-02-01");
        assert_eq!(end, "2024-02-29");
    }

    #[test]
    fn test_resolve_period_from_dates() {
        let (start, end) =
            resolve_period(None, Some("2024-01-10"), Some("2024-01-20")).unwrap();
        assert_eq!(start, "2024-01-10");
        assert_eq!(end, "2024-01-20");
    }

    #[test]
    fn test_resolve_period_rejects_half_ranges_and_bad_months() {
        assert!(resolve_period(None, Some("2024-01-10"), None).is_err());
        assert!(resolve_period(Some("2024-13"), None, None).is_err());
        assert!(resolve_period(Some("fevereiro"), None, None).is_err());
    }
}
