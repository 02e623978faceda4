use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{Result, VestryError};
use crate::settings::db_path;

pub fn add(name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    conn.execute("INSERT INTO cost_centers (name) VALUES (?1)", [name])?;
    println!("Added cost center: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt =
        conn.prepare("SELECT id, name, is_active FROM cost_centers ORDER BY name")?;
    let rows: Vec<(i64, String, bool)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Active"]);
    for (id, name, active) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(if active { "yes" } else { "no" }),
        ]);
    }
    println!("Cost centers\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let changed = conn.execute("UPDATE cost_centers SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(VestryError::NotFound(format!("cost center {id}")));
    }
    println!("Cost center #{id} deactivated.");
    Ok(())
}
