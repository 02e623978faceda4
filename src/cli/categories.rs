use comfy_table::{Cell, Table};

use crate::cli::entries::parse_type;
use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::settings::db_path;

pub fn add(name: &str, transaction_type: &str, deductible: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let t = parse_type(transaction_type)?;
    conn.execute(
        "INSERT INTO categories (name, transaction_type, deductible) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, t, deductible],
    )?;
    println!("Added category: {name} ({})", t.as_str());
    Ok(())
}

pub fn list(transaction_type: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let filter = transaction_type.map(parse_type).transpose()?;

    let mut stmt = conn.prepare(
        "SELECT id, name, transaction_type, deductible, is_active FROM categories \
         ORDER BY transaction_type, name",
    )?;
    let rows: Vec<(i64, String, String, bool, bool)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Deductible", "Active"]);
    for (id, name, t, deductible, active) in rows {
        if let Some(f) = filter {
            if t != f.as_str() {
                continue;
            }
        }
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(t),
            Cell::new(if deductible { "yes" } else { "" }),
            Cell::new(if active { "yes" } else { "no" }),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let changed = conn.execute("UPDATE categories SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(VestryError::NotFound(format!("category {id}")));
    }
    println!("Category #{id} deactivated.");
    Ok(())
}
