use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, parish: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(name) = parish {
        settings.parish_name = name;
    }

    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("vestry.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("Database ready at {}", db_path.display());
    println!("Default admin: admin@paroquia.com (password: admin123 — change it).");
    println!("Next: `vestry login admin@paroquia.com`");
    Ok(())
}
