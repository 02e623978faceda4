use chrono::{Datelike, NaiveDate};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{EntryStatus, PaymentMethod, TransactionType};
use crate::money::from_cents;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Describes which entries a statement covers. The date range is inclusive
/// on both ends and applies to the due date, or to the payment date when
/// `by_payment_date` is set.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub start: String,
    pub end: String,
    pub cost_center_id: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub paid_only: bool,
    pub include_cancelled: bool,
    pub by_payment_date: bool,
}

impl EntryFilter {
    pub fn for_period(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            cost_center_id: None,
            transaction_type: None,
            paid_only: false,
            include_cancelled: false,
            by_payment_date: false,
        }
    }

    pub fn date_column(&self) -> &'static str {
        if self.by_payment_date {
            "e.payment_date"
        } else {
            "e.due_date"
        }
    }

    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clause = format!(
            "e.is_active = 1 AND {} BETWEEN ?1 AND ?2",
            self.date_column()
        );
        let mut params: Vec<Box<dyn ToSql>> =
            vec![Box::new(self.start.clone()), Box::new(self.end.clone())];
        if self.paid_only {
            clause.push_str(" AND e.status = 'paid'");
        }
        if !self.include_cancelled {
            clause.push_str(" AND e.status != 'cancelled'");
        }
        if let Some(id) = self.cost_center_id {
            params.push(Box::new(id));
            clause.push_str(&format!(" AND e.cost_center_id = ?{}", params.len()));
        }
        if let Some(t) = self.transaction_type {
            params.push(Box::new(t));
            clause.push_str(&format!(" AND e.transaction_type = ?{}", params.len()));
        }
        (clause, params)
    }
}

// Paid entries count for what was actually paid; everything else for what
// is due. Cancelled entries (when included) keep their due amount.
const EFFECTIVE_CENTS: &str =
    "CASE WHEN e.status = 'paid' THEN e.paid_amount_cents ELSE e.original_amount_cents END";

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

pub struct StatementRow {
    pub id: i64,
    pub due_date: String,
    pub payment_date: Option<String>,
    pub description: String,
    pub original_amount: Decimal,
    pub paid_amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: EntryStatus,
    pub payment_method: PaymentMethod,
    pub category: String,
    pub cost_center: String,
    pub counterparty: Option<String>,
}

impl StatementRow {
    pub fn effective_amount(&self) -> Decimal {
        if self.status == EntryStatus::Paid {
            self.paid_amount
        } else {
            self.original_amount
        }
    }
}

pub struct StatementReport {
    pub rows: Vec<StatementRow>,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
}

/// Matching entries with display names resolved in one query, sorted by the
/// filter's date column (ties by id, so the order is stable).
pub fn get_statement(conn: &Connection, filter: &EntryFilter) -> Result<StatementReport> {
    let (clause, params) = filter.where_clause();
    let sql = format!(
        "SELECT e.id, e.due_date, e.payment_date, e.description, e.original_amount_cents, \
         e.paid_amount_cents, e.transaction_type, e.status, e.payment_method, c.name, cc.name, \
         CASE WHEN e.transaction_type = 'income' THEN p.name ELSE s.name END \
         FROM entries e \
         JOIN categories c ON e.category_id = c.id \
         JOIN cost_centers cc ON e.cost_center_id = cc.id \
         LEFT JOIN parishioners p ON e.parishioner_id = p.id \
         LEFT JOIN suppliers s ON e.supplier_id = s.id \
         WHERE {clause} ORDER BY {col}, e.id",
        col = filter.date_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows: Vec<StatementRow> = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(StatementRow {
                id: row.get(0)?,
                due_date: row.get(1)?,
                payment_date: row.get(2)?,
                description: row.get(3)?,
                original_amount: from_cents(row.get(4)?),
                paid_amount: from_cents(row.get(5)?),
                transaction_type: row.get(6)?,
                status: row.get(7)?,
                payment_method: row.get(8)?,
                category: row.get(9)?,
                cost_center: row.get(10)?,
                counterparty: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for row in &rows {
        match row.transaction_type {
            TransactionType::Income => total_income += row.effective_amount(),
            TransactionType::Expense => total_expense += row.effective_amount(),
        }
    }

    Ok(StatementReport {
        net: total_income - total_expense,
        rows,
        total_income,
        total_expense,
    })
}

// ---------------------------------------------------------------------------
// Grouped summaries
// ---------------------------------------------------------------------------

pub struct GroupSummary {
    pub name: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub enum GroupBy {
    CostCenter,
    Category,
}

/// Per-group income/expense over the same filtered set as `get_statement`;
/// the grand totals across groups always equal the ungrouped totals.
pub fn get_summary(
    conn: &Connection,
    filter: &EntryFilter,
    group_by: GroupBy,
) -> Result<Vec<GroupSummary>> {
    let group_col = match group_by {
        GroupBy::CostCenter => "cc.name",
        GroupBy::Category => "c.name",
    };
    let (clause, params) = filter.where_clause();
    let sql = format!(
        "SELECT {group_col}, \
         SUM(CASE WHEN e.transaction_type = 'income' THEN {EFFECTIVE_CENTS} ELSE 0 END), \
         SUM(CASE WHEN e.transaction_type = 'expense' THEN {EFFECTIVE_CENTS} ELSE 0 END) \
         FROM entries e \
         JOIN categories c ON e.category_id = c.id \
         JOIN cost_centers cc ON e.cost_center_id = cc.id \
         WHERE {clause} GROUP BY {group_col} ORDER BY {group_col}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let groups = stmt
        .query_map(param_refs.as_slice(), |row| {
            let income = from_cents(row.get(1)?);
            let expense = from_cents(row.get(2)?);
            Ok(GroupSummary {
                name: row.get(0)?,
                income,
                expense,
                balance: income - expense,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(groups)
}

// ---------------------------------------------------------------------------
// Period balances
// ---------------------------------------------------------------------------

fn sum_cents(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Decimal> {
    let cents: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(from_cents(cents))
}

/// Due amounts falling in the period, cancelled entries excluded. Counts
/// both pending and already-paid entries: what the period is expected to
/// move, not what it has moved.
pub fn forecast_totals(conn: &Connection, start: &str, end: &str) -> Result<(Decimal, Decimal)> {
    let sql = "SELECT COALESCE(SUM(original_amount_cents), 0) FROM entries \
               WHERE is_active = 1 AND status != 'cancelled' \
               AND due_date BETWEEN ?1 AND ?2 AND transaction_type = ?3";
    let income = sum_cents(conn, sql, &[&start, &end, &TransactionType::Income])?;
    let expense = sum_cents(conn, sql, &[&start, &end, &TransactionType::Expense])?;
    Ok((income, expense))
}

/// Amounts actually paid in the period, by payment date.
pub fn realized_totals(conn: &Connection, start: &str, end: &str) -> Result<(Decimal, Decimal)> {
    let sql = "SELECT COALESCE(SUM(paid_amount_cents), 0) FROM entries \
               WHERE is_active = 1 AND status = 'paid' \
               AND payment_date BETWEEN ?1 AND ?2 AND transaction_type = ?3";
    let income = sum_cents(conn, sql, &[&start, &end, &TransactionType::Income])?;
    let expense = sum_cents(conn, sql, &[&start, &end, &TransactionType::Expense])?;
    Ok((income, expense))
}

pub fn forecast_balance(conn: &Connection, start: &str, end: &str) -> Result<Decimal> {
    let (income, expense) = forecast_totals(conn, start, end)?;
    Ok(income - expense)
}

pub fn realized_balance(conn: &Connection, start: &str, end: &str) -> Result<Decimal> {
    let (income, expense) = realized_totals(conn, start, end)?;
    Ok(income - expense)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct MonthPoint {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

pub struct DashboardSummary {
    pub month_income: Decimal,
    pub month_expense: Decimal,
    pub realized: Decimal,
    pub forecast: Decimal,
    pub history: Vec<MonthPoint>,
}

fn month_bounds(date: NaiveDate) -> (String, String) {
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    (
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    )
}

/// Current-month totals plus a realized income/expense series for the last
/// `months` calendar months.
pub fn get_dashboard(conn: &Connection, today: NaiveDate, months: u32) -> Result<DashboardSummary> {
    let (start, end) = month_bounds(today);
    let (month_income, month_expense) = realized_totals(conn, &start, &end)?;
    let forecast = forecast_balance(conn, &start, &end)?;

    let mut anchor = today.with_day(1).unwrap_or(today);
    for _ in 1..months {
        anchor = anchor
            .pred_opt()
            .map(|d| d.with_day(1).unwrap_or(d))
            .unwrap_or(anchor);
    }
    let history_start = anchor.format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare(
        "SELECT substr(payment_date, 1, 7) AS month, \
         SUM(CASE WHEN transaction_type = 'income' THEN paid_amount_cents ELSE 0 END), \
         SUM(CASE WHEN transaction_type = 'expense' THEN paid_amount_cents ELSE 0 END) \
         FROM entries WHERE is_active = 1 AND status = 'paid' \
         AND payment_date >= ?1 AND payment_date <= ?2 \
         GROUP BY month ORDER BY month",
    )?;
    let history = stmt
        .query_map([&history_start, &end], |row| {
            Ok(MonthPoint {
                month: row.get(0)?,
                income: from_cents(row.get(1)?),
                expense: from_cents(row.get(2)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(DashboardSummary {
        month_income,
        month_expense,
        realized: month_income - month_expense,
        forecast,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::ledger::{self, EntryDraft};
    use rust_decimal_macros::dec;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }

    fn draft(
        conn: &Connection,
        description: &str,
        amount: Decimal,
        due: &str,
        t: TransactionType,
    ) -> EntryDraft {
        let category = match t {
            TransactionType::Income => "Dízimo",
            TransactionType::Expense => "Energia Elétrica",
        };
        EntryDraft {
            description: description.to_string(),
            amount,
            due_date: due.to_string(),
            transaction_type: t,
            payment_method: PaymentMethod::Cash,
            category_id: category_id(conn, category),
            cost_center_id: 1,
            counterparty: None,
            note: None,
        }
    }

    fn add(conn: &mut Connection, description: &str, amount: Decimal, due: &str, t: TransactionType) -> i64 {
        let d = draft(conn, description, amount, due, t);
        ledger::register(conn, &d, 1, false).unwrap()
    }

    fn add_paid(conn: &mut Connection, description: &str, amount: Decimal, due: &str, t: TransactionType) -> i64 {
        let id = add(conn, description, amount, due, t);
        ledger::settle(conn, id, amount, due, None).unwrap();
        id
    }

    #[test]
    fn test_realized_balance_paid_only_by_payment_date() {
        let (_dir, mut conn) = test_db();
        add_paid(&mut conn, "Dízimo", dec!(500.00), "2024-01-05", TransactionType::Income);
        add_paid(&mut conn, "Conta de luz", dec!(200.00), "2024-01-06", TransactionType::Expense);
        add(&mut conn, "Oferta prometida", dec!(999.00), "2024-01-20", TransactionType::Income);

        let balance = realized_balance(&conn, "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(balance, dec!(300.00));
    }

    #[test]
    fn test_forecast_includes_pending_excludes_cancelled() {
        let (_dir, mut conn) = test_db();
        add(&mut conn, "Dízimo", dec!(500.00), "2024-01-05", TransactionType::Income);
        add_paid(&mut conn, "Oferta", dec!(100.00), "2024-01-10", TransactionType::Income);
        let cancelled = add(&mut conn, "Doação desistida", dec!(50.00), "2024-01-12", TransactionType::Income);
        ledger::cancel(&mut conn, cancelled).unwrap();
        add(&mut conn, "Conta de luz", dec!(200.00), "2024-01-15", TransactionType::Expense);

        let forecast = forecast_balance(&conn, "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(forecast, dec!(400.00));
    }

    #[test]
    fn test_statement_end_date_is_inclusive() {
        let (_dir, mut conn) = test_db();
        add(&mut conn, "No último dia", dec!(10.00), "2024-01-31", TransactionType::Income);
        add(&mut conn, "Um dia depois", dec!(10.00), "2024-02-01", TransactionType::Income);

        let filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        let report = get_statement(&conn, &filter).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].description, "No último dia");
    }

    #[test]
    fn test_statement_sorted_by_selected_date_then_id() {
        let (_dir, mut conn) = test_db();
        let b = add(&mut conn, "b", dec!(10.00), "2024-01-10", TransactionType::Income);
        let a = add(&mut conn, "a", dec!(10.00), "2024-01-05", TransactionType::Income);
        let c = add(&mut conn, "c", dec!(10.00), "2024-01-10", TransactionType::Income);

        let filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        let report = get_statement(&conn, &filter).unwrap();
        let ids: Vec<i64> = report.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_paid_only_and_payment_date_selection() {
        let (_dir, mut conn) = test_db();
        // Due in January, paid in February.
        let id = add(&mut conn, "Pago atrasado", dec!(150.00), "2024-01-25", TransactionType::Income);
        ledger::settle(&mut conn, id, dec!(150.00), "2024-02-02", None).unwrap();
        add(&mut conn, "Pendente", dec!(70.00), "2024-01-20", TransactionType::Income);

        // By due date it shows in January even though paid later.
        let mut filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        filter.paid_only = true;
        let report = get_statement(&conn, &filter).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].id, id);

        // By payment date it moves to February.
        filter.by_payment_date = true;
        let report = get_statement(&conn, &filter).unwrap();
        assert!(report.rows.is_empty());

        let mut feb = EntryFilter::for_period("2024-02-01", "2024-02-29");
        feb.paid_only = true;
        feb.by_payment_date = true;
        let report = get_statement(&conn, &feb).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.total_income, dec!(150.00));
    }

    #[test]
    fn test_cancelled_hidden_unless_included() {
        let (_dir, mut conn) = test_db();
        let id = add(&mut conn, "Cancelado", dec!(80.00), "2024-01-10", TransactionType::Income);
        ledger::cancel(&mut conn, id).unwrap();

        let filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        assert!(get_statement(&conn, &filter).unwrap().rows.is_empty());

        let mut with_cancelled = filter.clone();
        with_cancelled.include_cancelled = true;
        let report = get_statement(&conn, &with_cancelled).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, EntryStatus::Cancelled);
    }

    #[test]
    fn test_cost_center_and_type_filters() {
        let (_dir, mut conn) = test_db();
        conn.execute("INSERT INTO cost_centers (name) VALUES ('Capela Santa Rita')", [])
            .unwrap();
        let capela = conn.last_insert_rowid();

        let mut d = draft(&conn, "Oferta capela", dec!(40.00), "2024-01-07", TransactionType::Income);
        d.cost_center_id = capela;
        ledger::register(&mut conn, &d, 1, false).unwrap();
        add(&mut conn, "Oferta matriz", dec!(60.00), "2024-01-08", TransactionType::Income);
        add(&mut conn, "Conta de luz", dec!(30.00), "2024-01-09", TransactionType::Expense);

        let mut filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        filter.cost_center_id = Some(capela);
        let report = get_statement(&conn, &filter).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].cost_center, "Capela Santa Rita");

        let mut filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        filter.transaction_type = Some(TransactionType::Expense);
        let report = get_statement(&conn, &filter).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.total_expense, dec!(30.00));
    }

    #[test]
    fn test_group_totals_match_statement_totals() {
        let (_dir, mut conn) = test_db();
        conn.execute("INSERT INTO cost_centers (name) VALUES ('Capela Santa Rita')", [])
            .unwrap();
        let capela = conn.last_insert_rowid();

        add_paid(&mut conn, "Dízimo", dec!(500.00), "2024-01-05", TransactionType::Income);
        add(&mut conn, "Oferta", dec!(120.00), "2024-01-06", TransactionType::Income);
        add_paid(&mut conn, "Conta de luz", dec!(200.00), "2024-01-06", TransactionType::Expense);
        let mut d = draft(&conn, "Vela e hóstia", dec!(45.50), "2024-01-15", TransactionType::Expense);
        d.cost_center_id = capela;
        d.category_id = category_id(&conn, "Material Litúrgico");
        ledger::register(&mut conn, &d, 1, false).unwrap();

        for paid_only in [false, true] {
            for by_payment_date in [false, true] {
                let mut filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
                filter.paid_only = paid_only;
                filter.by_payment_date = by_payment_date;

                let statement = get_statement(&conn, &filter).unwrap();
                for group_by in [GroupBy::CostCenter, GroupBy::Category] {
                    let groups = get_summary(&conn, &filter, group_by).unwrap();
                    let income: Decimal = groups.iter().map(|g| g.income).sum();
                    let expense: Decimal = groups.iter().map(|g| g.expense).sum();
                    let balance: Decimal = groups.iter().map(|g| g.balance).sum();
                    assert_eq!(income, statement.total_income);
                    assert_eq!(expense, statement.total_expense);
                    assert_eq!(balance, statement.net);
                }
            }
        }
    }

    #[test]
    fn test_statement_resolves_counterparty_names() {
        let (_dir, mut conn) = test_db();
        conn.execute("INSERT INTO parishioners (name) VALUES ('Maria das Dores')", [])
            .unwrap();
        let maria = conn.last_insert_rowid();
        let mut d = draft(&conn, "Dízimo de Maria", dec!(50.00), "2024-01-05", TransactionType::Income);
        d.counterparty = Some(crate::models::Counterparty::Parishioner(maria));
        ledger::register(&mut conn, &d, 1, false).unwrap();

        let filter = EntryFilter::for_period("2024-01-01", "2024-01-31");
        let report = get_statement(&conn, &filter).unwrap();
        assert_eq!(report.rows[0].counterparty.as_deref(), Some("Maria das Dores"));
    }

    #[test]
    fn test_dashboard_history_groups_by_month() {
        let (_dir, mut conn) = test_db();
        add_paid(&mut conn, "Dízimo dez", dec!(300.00), "2023-12-10", TransactionType::Income);
        add_paid(&mut conn, "Dízimo jan", dec!(500.00), "2024-01-10", TransactionType::Income);
        add_paid(&mut conn, "Luz jan", dec!(150.00), "2024-01-12", TransactionType::Expense);
        add(&mut conn, "Oferta prevista", dec!(100.00), "2024-01-20", TransactionType::Income);

        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let dash = get_dashboard(&conn, today, 6).unwrap();
        assert_eq!(dash.month_income, dec!(500.00));
        assert_eq!(dash.month_expense, dec!(150.00));
        assert_eq!(dash.realized, dec!(350.00));
        // Forecast counts the pending offering and the paid entries' due amounts.
        assert_eq!(dash.forecast, dec!(450.00));
        assert_eq!(dash.history.len(), 2);
        assert_eq!(dash.history[0].month, "2023-12");
        assert_eq!(dash.history[0].income, dec!(300.00));
        assert_eq!(dash.history[1].month, "2024-01");
        assert_eq!(dash.history[1].expense, dec!(150.00));
    }

    #[test]
    fn test_month_bounds() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(month_bounds(d), ("2024-02-01".to_string(), "2024-02-29".to_string()));
        let d = NaiveDate::from_ymd_opt(2023, 12, 3).unwrap();
        assert_eq!(month_bounds(d), ("2023-12-01".to_string(), "2023-12-31".to_string()));
    }
}
