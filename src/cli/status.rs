use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::money::from_cents;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("vestry.db");

    println!(
        "User:       {}",
        settings.session_user_name.as_deref().unwrap_or("(not logged in)")
    );
    println!(
        "Parish:     {}",
        if settings.parish_name.is_empty() { "(not set)" } else { &settings.parish_name }
    );
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let entries: i64 = conn.query_row(
            "SELECT count(*) FROM entries WHERE is_active = 1",
            [],
            |r| r.get(0),
        )?;
        let pending: i64 = conn.query_row(
            "SELECT count(*) FROM entries WHERE is_active = 1 AND status = 'pending'",
            [],
            |r| r.get(0),
        )?;
        let pending_cents: i64 = conn.query_row(
            "SELECT COALESCE(SUM(original_amount_cents), 0) FROM entries \
             WHERE is_active = 1 AND status = 'pending'",
            [],
            |r| r.get(0),
        )?;
        let parishioners: i64 = conn.query_row(
            "SELECT count(*) FROM parishioners WHERE is_active = 1",
            [],
            |r| r.get(0),
        )?;
        let suppliers: i64 = conn.query_row(
            "SELECT count(*) FROM suppliers WHERE is_active = 1",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Entries:        {entries}");
        println!("Pending:        {pending} ({})", money(from_cents(pending_cents)));
        println!("Parishioners:   {parishioners}");
        println!("Suppliers:      {suppliers}");
    } else {
        println!();
        println!("Database not found. Run `vestry init` to set up.");
    }

    Ok(())
}
