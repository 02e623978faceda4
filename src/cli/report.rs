use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::cli::{resolve_cost_center, resolve_period};
use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::fmt::money;
use crate::models::{EntryStatus, TransactionType};
use crate::reports::{self, EntryFilter, GroupBy};
use crate::settings::db_path;

pub(crate) fn parse_group_by(raw: &str) -> Result<GroupBy> {
    match raw {
        "cost-center" => Ok(GroupBy::CostCenter),
        "category" => Ok(GroupBy::Category),
        _ => Err(VestryError::Validation(format!(
            "invalid group (cost-center, category): {raw}"
        ))),
    }
}

pub(crate) fn build_filter(
    conn: &Connection,
    start: &str,
    end: &str,
    transaction_type: Option<&str>,
    cost_center: Option<&str>,
    paid_only: bool,
    include_cancelled: bool,
    by_payment_date: bool,
) -> Result<EntryFilter> {
    let mut filter = EntryFilter::for_period(start, end);
    filter.paid_only = paid_only;
    filter.include_cancelled = include_cancelled;
    filter.by_payment_date = by_payment_date;
    if let Some(t) = transaction_type {
        filter.transaction_type = Some(crate::cli::entries::parse_type(t)?);
    }
    if let Some(name) = cost_center {
        filter.cost_center_id = Some(resolve_cost_center(conn, name)?);
    }
    Ok(filter)
}

fn net_cell(net: Decimal) -> Cell {
    if net >= Decimal::ZERO {
        Cell::new(money(net).green().bold())
    } else {
        Cell::new(money(net).red().bold())
    }
}

#[allow(clippy::too_many_arguments)]
pub fn statement(
    month: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    transaction_type: Option<&str>,
    cost_center: Option<&str>,
    paid_only: bool,
    include_cancelled: bool,
    by_payment_date: bool,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (start, end) = resolve_period(month, from, to)?;
    let filter = build_filter(
        &conn,
        &start,
        &end,
        transaction_type,
        cost_center,
        paid_only,
        include_cancelled,
        by_payment_date,
    )?;
    let report = reports::get_statement(&conn, &filter)?;

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Description", "Category", "Cost center", "Counterparty", "Method", "Status",
        "Amount",
    ]);
    for row in &report.rows {
        let date = if filter.by_payment_date {
            row.payment_date.as_deref().unwrap_or("")
        } else {
            &row.due_date
        };
        let status = match row.status {
            EntryStatus::Pending => Cell::new("pendente".yellow()),
            EntryStatus::Paid => Cell::new("pago".green()),
            EntryStatus::Cancelled => Cell::new("cancelado".red()),
        };
        let amount = match row.transaction_type {
            TransactionType::Income => Cell::new(money(row.effective_amount()).green()),
            TransactionType::Expense => Cell::new(money(-row.effective_amount()).red()),
        };
        table.add_row(vec![
            Cell::new(date),
            Cell::new(&row.description),
            Cell::new(&row.category),
            Cell::new(&row.cost_center),
            Cell::new(row.counterparty.as_deref().unwrap_or("")),
            Cell::new(row.payment_method.as_str()),
            status,
            amount,
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Totals".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        net_cell(report.net),
    ]);
    println!("Cash Book {start} to {end}\n{table}");
    println!(
        "Income: {}   Expenses: {}   Net: {}",
        money(report.total_income).green(),
        money(report.total_expense).red(),
        money(report.net).bold()
    );
    Ok(())
}

pub fn summary(
    by: &str,
    month: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    paid_only: bool,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (start, end) = resolve_period(month, from, to)?;
    let group_by = parse_group_by(by)?;

    let mut filter = EntryFilter::for_period(&start, &end);
    filter.paid_only = paid_only;
    let groups = reports::get_summary(&conn, &filter, group_by)?;

    let mut table = Table::new();
    let label = match group_by {
        GroupBy::CostCenter => "Cost center",
        GroupBy::Category => "Category",
    };
    table.set_header(vec![label, "Income", "Expenses", "Balance"]);
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for g in &groups {
        table.add_row(vec![
            Cell::new(&g.name),
            Cell::new(money(g.income)),
            Cell::new(money(g.expense)),
            net_cell(g.balance),
        ]);
        total_income += g.income;
        total_expense += g.expense;
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total_income).bold()),
        Cell::new(money(total_expense).bold()),
        net_cell(total_income - total_expense),
    ]);
    println!("Summary {start} to {end}\n{table}");
    Ok(())
}

pub fn balance(month: Option<&str>, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (start, end) = resolve_period(month, from, to)?;

    let (forecast_income, forecast_expense) = reports::forecast_totals(&conn, &start, &end)?;
    let (realized_income, realized_expense) = reports::realized_totals(&conn, &start, &end)?;

    let mut table = Table::new();
    table.set_header(vec!["", "Income", "Expenses", "Balance"]);
    table.add_row(vec![
        Cell::new("Forecast (by due date)"),
        Cell::new(money(forecast_income)),
        Cell::new(money(forecast_expense)),
        net_cell(forecast_income - forecast_expense),
    ]);
    table.add_row(vec![
        Cell::new("Realized (by payment date)"),
        Cell::new(money(realized_income)),
        Cell::new(money(realized_expense)),
        net_cell(realized_income - realized_expense),
    ]);
    println!("Balance {start} to {end}\n{table}");
    Ok(())
}

pub fn dashboard(months: u32) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let today = chrono::Local::now().date_naive();
    let dash = reports::get_dashboard(&conn, today, months)?;

    println!("This month");
    println!("  Income:    {}", money(dash.month_income).green());
    println!("  Expenses:  {}", money(dash.month_expense).red());
    println!("  Realized:  {}", money(dash.realized).bold());
    println!("  Forecast:  {}", money(dash.forecast));

    if !dash.history.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
        for point in &dash.history {
            table.add_row(vec![
                Cell::new(&point.month),
                Cell::new(money(point.income)),
                Cell::new(money(point.expense)),
                net_cell(point.income - point.expense),
            ]);
        }
        println!("\nHistory ({} months)\n{table}", months);
    }
    Ok(())
}
