use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cost_centers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    transaction_type TEXT NOT NULL CHECK (transaction_type IN ('income', 'expense')),
    deductible INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS parishioners (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT,
    email TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS suppliers (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    document TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    original_amount_cents INTEGER NOT NULL,
    paid_amount_cents INTEGER NOT NULL DEFAULT 0,
    due_date TEXT NOT NULL,
    payment_date TEXT,
    payment_method TEXT NOT NULL DEFAULT 'cash',
    transaction_type TEXT NOT NULL CHECK (transaction_type IN ('income', 'expense')),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'paid', 'cancelled')),
    category_id INTEGER NOT NULL,
    cost_center_id INTEGER NOT NULL,
    created_by INTEGER NOT NULL,
    parishioner_id INTEGER,
    supplier_id INTEGER,
    note TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (category_id) REFERENCES categories(id),
    FOREIGN KEY (cost_center_id) REFERENCES cost_centers(id),
    FOREIGN KEY (created_by) REFERENCES users(id),
    FOREIGN KEY (parishioner_id) REFERENCES parishioners(id),
    FOREIGN KEY (supplier_id) REFERENCES suppliers(id),
    CHECK (parishioner_id IS NULL OR supplier_id IS NULL)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    imported_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_entries_due_date ON entries(due_date);
CREATE INDEX IF NOT EXISTS idx_entries_payment_date ON entries(payment_date);
";

// (name, transaction_type, deductible)
const DEFAULT_CATEGORIES: &[(&str, &str, bool)] = &[
    // Income
    ("Dízimo", "income", false),
    ("Oferta", "income", false),
    ("Doação", "income", false),
    ("Eventos e Festas", "income", false),
    ("Outras Receitas", "income", false),
    // Expenses
    ("Energia Elétrica", "expense", false),
    ("Água e Esgoto", "expense", false),
    ("Manutenção Predial", "expense", false),
    ("Material Litúrgico", "expense", false),
    ("Salários e Encargos", "expense", false),
    ("Ação Social", "expense", true),
    ("Taxas Bancárias", "expense", false),
    ("Outras Despesas", "expense", false),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for cat in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, transaction_type, deductible) VALUES (?1, ?2, ?3)",
                rusqlite::params![cat.0, cat.1, cat.2],
            )?;
        }
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM cost_centers", [], |row| row.get(0))?;
    if count == 0 {
        conn.execute("INSERT INTO cost_centers (name) VALUES ('Geral')", [])?;
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM users", [], |row| row.get(0))?;
    if count == 0 {
        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                "Administrador",
                "admin@paroquia.com",
                hash_password("admin123")
            ],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "users",
            "cost_centers",
            "categories",
            "parishioners",
            "suppliers",
            "entries",
            "imports",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_init_db_seeds_income_and_expense_categories() {
        let (_dir, conn) = test_db();
        let income: i64 = conn
            .query_row(
                "SELECT count(*) FROM categories WHERE transaction_type = 'income'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        let expense: i64 = conn
            .query_row(
                "SELECT count(*) FROM categories WHERE transaction_type = 'expense'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(income >= 5, "expected >= 5 income categories, got {income}");
        assert!(expense >= 8, "expected >= 8 expense categories, got {expense}");
    }

    #[test]
    fn test_init_db_seeds_admin_user() {
        let (_dir, conn) = test_db();
        let hash: String = conn
            .query_row(
                "SELECT password_hash FROM users WHERE email = 'admin@paroquia.com'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hash, hash_password("admin123"));
    }

    #[test]
    fn test_entries_reject_both_counterparties() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO parishioners (name) VALUES ('Maria')", [])
            .unwrap();
        conn.execute("INSERT INTO suppliers (name) VALUES ('Padaria')", [])
            .unwrap();
        let result = conn.execute(
            "INSERT INTO entries (description, original_amount_cents, due_date, transaction_type, \
             category_id, cost_center_id, created_by, parishioner_id, supplier_id) \
             VALUES ('x', 100, '2024-01-01', 'income', 1, 1, 1, 1, 1)",
            [],
        );
        assert!(result.is_err());
    }
}
