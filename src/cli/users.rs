use comfy_table::{Cell, Table};

use crate::db::{get_connection, hash_password};
use crate::error::{Result, VestryError};
use crate::settings::db_path;

pub fn add(name: &str, email: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        return Err(VestryError::Validation("passwords do not match".to_string()));
    }
    if password.len() < 6 {
        return Err(VestryError::Validation(
            "password must have at least 6 characters".to_string(),
        ));
    }
    conn.execute(
        "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, email, hash_password(&password)],
    )?;
    println!("Added user: {name} <{email}>");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare("SELECT id, name, email, is_active FROM users ORDER BY name")?;
    let rows: Vec<(i64, String, String, bool)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email", "Active"]);
    for (id, name, email, active) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(email),
            Cell::new(if active { "yes" } else { "no" }),
        ]);
    }
    println!("Users\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let active_count: i64 = conn.query_row(
        "SELECT count(*) FROM users WHERE is_active = 1 AND id != ?1",
        [id],
        |r| r.get(0),
    )?;
    if active_count == 0 {
        return Err(VestryError::Validation(
            "cannot deactivate the last active user".to_string(),
        ));
    }
    let changed = conn.execute("UPDATE users SET is_active = 0 WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(VestryError::NotFound(format!("user {id}")));
    }
    println!("User #{id} deactivated.");
    Ok(())
}
