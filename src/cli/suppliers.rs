use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::settings::db_path;

pub fn add(name: &str, document: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    conn.execute(
        "INSERT INTO suppliers (name, document) VALUES (?1, ?2)",
        rusqlite::params![name, document],
    )?;
    println!("Added supplier: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt =
        conn.prepare("SELECT id, name, document, is_active FROM suppliers ORDER BY name")?;
    let rows: Vec<(i64, String, Option<String>, bool)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Document", "Active"]);
    for (id, name, document, active) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(document.unwrap_or_default()),
            Cell::new(if active { "yes" } else { "no" }),
        ]);
    }
    println!("Suppliers\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let changed = conn.execute("UPDATE suppliers SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(VestryError::NotFound(format!("supplier {id}")));
    }
    println!("Supplier #{id} deactivated.");
    Ok(())
}
