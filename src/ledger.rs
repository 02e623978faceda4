use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::error::{Result, VestryError};
use crate::models::{Counterparty, Entry, EntryStatus, PaymentMethod, TransactionType};
use crate::money::{from_cents, to_cents};

/// Input for `register` and `update_details`. Carries everything the user
/// controls; status and audit fields are owned by the lifecycle functions.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub description: String,
    pub amount: Decimal,
    pub due_date: String,
    pub transaction_type: TransactionType,
    pub payment_method: PaymentMethod,
    pub category_id: i64,
    pub cost_center_id: i64,
    pub counterparty: Option<Counterparty>,
    pub note: Option<String>,
}

pub fn parse_iso_date(raw: &str) -> Result<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| VestryError::Validation(format!("invalid date (expected YYYY-MM-DD): {raw}")))
}

// ---------------------------------------------------------------------------
// Lifecycle operations — each one is a single DB transaction
// ---------------------------------------------------------------------------

/// Register a new entry. Starts pending; with `settle_now` the entry is
/// settled in the same transaction for the full amount on the due date.
pub fn register(
    conn: &mut Connection,
    draft: &EntryDraft,
    user_id: i64,
    settle_now: bool,
) -> Result<i64> {
    let tx = conn.transaction()?;
    validate_draft(&tx, draft)?;

    tx.execute(
        "INSERT INTO entries (description, original_amount_cents, due_date, payment_method, \
         transaction_type, status, category_id, cost_center_id, created_by, parishioner_id, \
         supplier_id, note) \
         VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            draft.description.trim(),
            to_cents(draft.amount)?,
            draft.due_date,
            draft.payment_method,
            draft.transaction_type,
            draft.category_id,
            draft.cost_center_id,
            user_id,
            draft.counterparty.and_then(|c| c.parishioner_id()),
            draft.counterparty.and_then(|c| c.supplier_id()),
            draft.note,
        ],
    )?;
    let id = tx.last_insert_rowid();

    if settle_now {
        let mut entry = fetch_entry(&tx, id)?;
        entry.settle(draft.amount, draft.due_date.clone(), draft.payment_method)?;
        persist(&tx, &entry)?;
    }

    tx.commit()?;
    Ok(id)
}

/// Settle (baixa): record the amount and date actually paid.
pub fn settle(
    conn: &mut Connection,
    id: i64,
    paid_amount: Decimal,
    payment_date: &str,
    method: Option<PaymentMethod>,
) -> Result<Entry> {
    let date = parse_iso_date(payment_date)?;
    let tx = conn.transaction()?;
    let mut entry = fetch_entry(&tx, id)?;
    let method = method.unwrap_or(entry.payment_method);
    entry.settle(paid_amount, date, method)?;
    persist(&tx, &entry)?;
    tx.commit()?;
    Ok(entry)
}

/// Reverse (estorno): undo a settlement, back to pending.
pub fn reverse(conn: &mut Connection, id: i64) -> Result<Entry> {
    let tx = conn.transaction()?;
    let mut entry = fetch_entry(&tx, id)?;
    entry.reverse()?;
    persist(&tx, &entry)?;
    tx.commit()?;
    Ok(entry)
}

pub fn cancel(conn: &mut Connection, id: i64) -> Result<Entry> {
    let tx = conn.transaction()?;
    let mut entry = fetch_entry(&tx, id)?;
    entry.cancel()?;
    persist(&tx, &entry)?;
    tx.commit()?;
    Ok(entry)
}

/// Overwrite the user-editable fields of a pending entry.
pub fn update_details(conn: &mut Connection, id: i64, draft: &EntryDraft) -> Result<Entry> {
    let tx = conn.transaction()?;
    let mut entry = fetch_entry(&tx, id)?;
    if entry.status != EntryStatus::Pending {
        return Err(VestryError::InvalidTransition(
            "only pending entries can be edited; reverse or un-cancel first".to_string(),
        ));
    }
    validate_draft(&tx, draft)?;

    entry.description = draft.description.trim().to_string();
    entry.original_amount = draft.amount;
    entry.due_date = draft.due_date.clone();
    entry.payment_method = draft.payment_method;
    entry.transaction_type = draft.transaction_type;
    entry.category_id = draft.category_id;
    entry.cost_center_id = draft.cost_center_id;
    entry.counterparty = draft.counterparty;
    entry.note = draft.note.clone();

    persist(&tx, &entry)?;
    tx.commit()?;
    Ok(entry)
}

/// Soft-delete: the entry stays in the store but leaves every report.
pub fn deactivate(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    fetch_entry(&tx, id)?;
    tx.execute(
        "UPDATE entries SET is_active = 0, updated_at = datetime('now') WHERE id = ?1",
        [id],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Entry> {
    fetch_entry(conn, id)
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn validate_draft(conn: &Connection, draft: &EntryDraft) -> Result<()> {
    if draft.description.trim().is_empty() {
        return Err(VestryError::Validation("description is required".to_string()));
    }
    if draft.amount <= Decimal::ZERO {
        return Err(VestryError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    parse_iso_date(&draft.due_date)?;

    let category: Option<(String, TransactionType, bool)> = conn
        .query_row(
            "SELECT name, transaction_type, is_active FROM categories WHERE id = ?1",
            [draft.category_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let (cat_name, cat_type, cat_active) = category
        .ok_or_else(|| VestryError::NotFound(format!("category {}", draft.category_id)))?;
    if !cat_active {
        return Err(VestryError::Validation(format!(
            "category '{cat_name}' is inactive"
        )));
    }
    if cat_type != draft.transaction_type {
        return Err(VestryError::Validation(format!(
            "category '{cat_name}' is an {} category, but the entry is an {}",
            cat_type.as_str(),
            draft.transaction_type.as_str()
        )));
    }

    let cost_center_active: Option<bool> = conn
        .query_row(
            "SELECT is_active FROM cost_centers WHERE id = ?1",
            [draft.cost_center_id],
            |row| row.get(0),
        )
        .optional()?;
    match cost_center_active {
        None => {
            return Err(VestryError::NotFound(format!(
                "cost center {}",
                draft.cost_center_id
            )))
        }
        Some(false) => {
            return Err(VestryError::Validation("cost center is inactive".to_string()))
        }
        Some(true) => {}
    }

    match (draft.counterparty, draft.transaction_type) {
        (Some(Counterparty::Parishioner(_)), TransactionType::Expense) => {
            return Err(VestryError::Validation(
                "a parishioner can only be linked to an income entry".to_string(),
            ));
        }
        (Some(Counterparty::Supplier(_)), TransactionType::Income) => {
            return Err(VestryError::Validation(
                "a supplier can only be linked to an expense entry".to_string(),
            ));
        }
        (Some(Counterparty::Parishioner(id)), _) => {
            let exists: bool = conn
                .prepare("SELECT 1 FROM parishioners WHERE id = ?1")?
                .exists([id])?;
            if !exists {
                return Err(VestryError::NotFound(format!("parishioner {id}")));
            }
        }
        (Some(Counterparty::Supplier(id)), _) => {
            let exists: bool = conn
                .prepare("SELECT 1 FROM suppliers WHERE id = ?1")?
                .exists([id])?;
            if !exists {
                return Err(VestryError::NotFound(format!("supplier {id}")));
            }
        }
        (None, _) => {}
    }

    Ok(())
}

fn fetch_entry(conn: &Connection, id: i64) -> Result<Entry> {
    conn.query_row(
        "SELECT id, description, original_amount_cents, paid_amount_cents, due_date, \
         payment_date, payment_method, transaction_type, status, category_id, cost_center_id, \
         created_by, parishioner_id, supplier_id, note, is_active \
         FROM entries WHERE id = ?1",
        [id],
        |row| {
            Ok(Entry {
                id: row.get(0)?,
                description: row.get(1)?,
                original_amount: from_cents(row.get(2)?),
                paid_amount: from_cents(row.get(3)?),
                due_date: row.get(4)?,
                payment_date: row.get(5)?,
                payment_method: row.get(6)?,
                transaction_type: row.get(7)?,
                status: row.get(8)?,
                category_id: row.get(9)?,
                cost_center_id: row.get(10)?,
                created_by: row.get(11)?,
                counterparty: Counterparty::from_columns(row.get(12)?, row.get(13)?),
                note: row.get(14)?,
                is_active: row.get(15)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| VestryError::NotFound(format!("entry {id}")))
}

fn persist(conn: &Connection, entry: &Entry) -> Result<()> {
    conn.execute(
        "UPDATE entries SET description = ?1, original_amount_cents = ?2, paid_amount_cents = ?3, \
         due_date = ?4, payment_date = ?5, payment_method = ?6, transaction_type = ?7, \
         status = ?8, category_id = ?9, cost_center_id = ?10, parishioner_id = ?11, \
         supplier_id = ?12, note = ?13, updated_at = datetime('now') WHERE id = ?14",
        rusqlite::params![
            entry.description,
            to_cents(entry.original_amount)?,
            to_cents(entry.paid_amount)?,
            entry.due_date,
            entry.payment_date,
            entry.payment_method,
            entry.transaction_type,
            entry.status,
            entry.category_id,
            entry.cost_center_id,
            entry.counterparty.and_then(|c| c.parishioner_id()),
            entry.counterparty.and_then(|c| c.supplier_id()),
            entry.note,
            entry.id,
        ],
    )?;
    Ok(())
}
