use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::settings::db_path;

pub fn add(name: &str, phone: Option<&str>, email: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    conn.execute(
        "INSERT INTO parishioners (name, phone, email) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, phone, email],
    )?;
    println!("Added parishioner: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn
        .prepare("SELECT id, name, phone, email, is_active FROM parishioners ORDER BY name")?;
    let rows: Vec<(i64, String, Option<String>, Option<String>, bool)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Phone", "Email", "Active"]);
    for (id, name, phone, email, active) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(phone.unwrap_or_default()),
            Cell::new(email.unwrap_or_default()),
            Cell::new(if active { "yes" } else { "no" }),
        ]);
    }
    println!("Parishioners\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let changed = conn.execute("UPDATE parishioners SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(VestryError::NotFound(format!("parishioner {id}")));
    }
    println!("Parishioner #{id} deactivated.");
    Ok(())
}
