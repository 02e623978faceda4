use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{resolve_category, resolve_cost_center, resolve_parishioner, resolve_period, resolve_supplier};
use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::fmt::money;
use crate::ledger::{self, EntryDraft};
use crate::models::{Counterparty, EntryStatus, PaymentMethod, TransactionType};
use crate::money::parse_amount;
use crate::reports::{self, EntryFilter};
use crate::settings::{db_path, Session};

pub(crate) fn parse_type(raw: &str) -> Result<TransactionType> {
    TransactionType::parse(raw)
        .ok_or_else(|| VestryError::Validation(format!("invalid type (income, expense): {raw}")))
}

pub(crate) fn parse_method(raw: &str) -> Result<PaymentMethod> {
    PaymentMethod::parse(raw).ok_or_else(|| {
        VestryError::Validation(format!(
            "invalid method (cash, pix, transfer, card, check, other): {raw}"
        ))
    })
}

fn status_cell(status: EntryStatus) -> Cell {
    match status {
        EntryStatus::Pending => Cell::new("pendente".yellow()),
        EntryStatus::Paid => Cell::new("pago".green()),
        EntryStatus::Cancelled => Cell::new("cancelado".red()),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    description: &str,
    amount: &str,
    due: &str,
    transaction_type: &str,
    category: &str,
    method: &str,
    cost_center: Option<&str>,
    parishioner: Option<&str>,
    supplier: Option<&str>,
    note: Option<&str>,
    paid: bool,
) -> Result<()> {
    let session = Session::require()?;
    let mut conn = get_connection(&db_path())?;

    let transaction_type = parse_type(transaction_type)?;
    let counterparty = match (parishioner, supplier) {
        (Some(_), Some(_)) => {
            return Err(VestryError::Validation(
                "an entry takes either a parishioner or a supplier, not both".to_string(),
            ))
        }
        (Some(name), None) => Some(Counterparty::Parishioner(resolve_parishioner(&conn, name)?)),
        (None, Some(name)) => Some(Counterparty::Supplier(resolve_supplier(&conn, name)?)),
        (None, None) => None,
    };

    let draft = EntryDraft {
        description: description.to_string(),
        amount: parse_amount(amount)?,
        due_date: due.to_string(),
        transaction_type,
        payment_method: parse_method(method)?,
        category_id: resolve_category(&conn, category)?,
        cost_center_id: resolve_cost_center(&conn, cost_center.unwrap_or("Geral"))?,
        counterparty,
        note: note.map(|s| s.to_string()),
    };

    let id = ledger::register(&mut conn, &draft, session.user_id, paid)?;
    let entry = ledger::get_entry(&conn, id)?;
    println!(
        "Entry #{id} registered: {} ({}, {})",
        entry.description,
        money(entry.original_amount),
        entry.status.as_str()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn list(
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

    let mut filter = EntryFilter::for_period(&start, &end);
    filter.paid_only = paid_only;
    filter.include_cancelled = include_cancelled;
    filter.by_payment_date = by_payment_date;
    if let Some(t) = transaction_type {
        filter.transaction_type = Some(parse_type(t)?);
    }
    if let Some(name) = cost_center {
        filter.cost_center_id = Some(resolve_cost_center(&conn, name)?);
    }

    let report = reports::get_statement(&conn, &filter)?;
    if report.rows.is_empty() {
        println!("No entries between {start} and {end}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Due", "Paid on", "Description", "Category", "Status", "Amount",
    ]);
    for row in &report.rows {
        let amount = match row.transaction_type {
            TransactionType::Income => Cell::new(money(row.effective_amount()).green()),
            TransactionType::Expense => Cell::new(money(-row.effective_amount()).red()),
        };
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(&row.due_date),
            Cell::new(row.payment_date.as_deref().unwrap_or("")),
            Cell::new(&row.description),
            Cell::new(&row.category),
            status_cell(row.status),
            amount,
        ]);
    }
    println!("Entries {start} to {end}\n{table}");
    println!(
        "Income: {}   Expenses: {}   Net: {}",
        money(report.total_income).green(),
        money(report.total_expense).red(),
        money(report.net).bold()
    );
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let entry = ledger::get_entry(&conn, id)?;

    let category: String = conn.query_row(
        "SELECT name FROM categories WHERE id = ?1",
        [entry.category_id],
        |r| r.get(0),
    )?;
    let cost_center: String = conn.query_row(
        "SELECT name FROM cost_centers WHERE id = ?1",
        [entry.cost_center_id],
        |r| r.get(0),
    )?;

    println!("Entry #{}", entry.id);
    println!("Description:  {}", entry.description);
    println!("Type:         {}", entry.transaction_type.as_str());
    println!("Status:       {}", entry.status.as_str());
    println!("Amount:       {}", money(entry.original_amount));
    println!("Due date:     {}", entry.due_date);
    if entry.status == EntryStatus::Paid {
        println!("Paid:         {}", money(entry.paid_amount));
        println!(
            "Paid on:      {}",
            entry.payment_date.as_deref().unwrap_or("")
        );
    }
    println!("Method:       {}", entry.payment_method.as_str());
    println!("Category:     {category}");
    println!("Cost center:  {cost_center}");
    match entry.counterparty {
        Some(Counterparty::Parishioner(pid)) => {
            let name: String = conn.query_row(
                "SELECT name FROM parishioners WHERE id = ?1",
                [pid],
                |r| r.get(0),
            )?;
            println!("Parishioner:  {name}");
        }
        Some(Counterparty::Supplier(sid)) => {
            let name: String =
                conn.query_row("SELECT name FROM suppliers WHERE id = ?1", [sid], |r| {
                    r.get(0)
                })?;
            println!("Supplier:     {name}");
        }
        None => {}
    }
    if let Some(note) = &entry.note {
        println!("Note:         {note}");
    }
    let created_by: String = conn.query_row(
        "SELECT name FROM users WHERE id = ?1",
        [entry.created_by],
        |r| r.get(0),
    )?;
    println!("Created by:   {created_by}");
    if !entry.is_active {
        println!("{}", "Removed from reports.".red());
    }
    Ok(())
}

pub fn settle(id: i64, amount: &str, date: &str, method: Option<&str>) -> Result<()> {
    Session::require()?;
    let mut conn = get_connection(&db_path())?;
    let method = method.map(parse_method).transpose()?;
    let entry = ledger::settle(&mut conn, id, parse_amount(amount)?, date, method)?;
    println!(
        "Entry #{id} settled: {} paid on {}",
        money(entry.paid_amount),
        entry.payment_date.as_deref().unwrap_or("")
    );
    Ok(())
}

pub fn reverse(id: i64) -> Result<()> {
    Session::require()?;
    let mut conn = get_connection(&db_path())?;
    ledger::reverse(&mut conn, id)?;
    println!("Entry #{id} reversed; back to pending.");
    Ok(())
}

pub fn cancel(id: i64) -> Result<()> {
    Session::require()?;
    let mut conn = get_connection(&db_path())?;
    ledger::cancel(&mut conn, id)?;
    println!("Entry #{id} cancelled.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    id: i64,
    description: Option<&str>,
    amount: Option<&str>,
    due: Option<&str>,
    category: Option<&str>,
    method: Option<&str>,
    cost_center: Option<&str>,
    note: Option<&str>,
) -> Result<()> {
    Session::require()?;
    let mut conn = get_connection(&db_path())?;
    let entry = ledger::get_entry(&conn, id)?;

    // Unspecified fields keep their current values.
    let draft = EntryDraft {
        description: description.unwrap_or(&entry.description).to_string(),
        amount: amount.map(parse_amount).transpose()?.unwrap_or(entry.original_amount),
        due_date: due.unwrap_or(&entry.due_date).to_string(),
        transaction_type: entry.transaction_type,
        payment_method: method.map(parse_method).transpose()?.unwrap_or(entry.payment_method),
        category_id: category
            .map(|name| resolve_category(&conn, name))
            .transpose()?
            .unwrap_or(entry.category_id),
        cost_center_id: cost_center
            .map(|name| resolve_cost_center(&conn, name))
            .transpose()?
            .unwrap_or(entry.cost_center_id),
        counterparty: entry.counterparty,
        note: note.map(|s| s.to_string()).or(entry.note),
    };

    ledger::update_details(&mut conn, id, &draft)?;
    println!("Entry #{id} updated.");
    Ok(())
}

pub fn remove(id: i64) -> Result<()> {
    Session::require()?;
    let mut conn = get_connection(&db_path())?;
    ledger::deactivate(&mut conn, id)?;
    println!("Entry #{id} removed from reports.");
    Ok(())
}
