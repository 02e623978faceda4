use rusqlite::OptionalExtension;

use crate::db::{get_connection, hash_password};
use crate::error::{Result, VestryError};
use crate::settings::{db_path, load_settings, save_settings};

pub fn login(email: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let user: Option<(i64, String, String, bool)> = conn
        .query_row(
            "SELECT id, name, password_hash, is_active FROM users WHERE email = ?1",
            [email],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    let Some((id, name, stored_hash, active)) = user else {
        return Err(VestryError::Validation("invalid email or password".to_string()));
    };
    if !active {
        return Err(VestryError::Validation("this user is deactivated".to_string()));
    }

    let password = rpassword::prompt_password("Password: ")?;
    if hash_password(&password) != stored_hash {
        return Err(VestryError::Validation("invalid email or password".to_string()));
    }

    let mut settings = load_settings();
    settings.session_user_id = Some(id);
    settings.session_user_name = Some(name.clone());
    save_settings(&settings)?;
    println!("Logged in as {name}.");
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut settings = load_settings();
    settings.session_user_id = None;
    settings.session_user_name = None;
    save_settings(&settings)?;
    println!("Logged out.");
    Ok(())
}
