use std::path::PathBuf;

use crate::cli::{resolve_category, resolve_cost_center};
use crate::db::get_connection;
use crate::error::Result;
use crate::importer::{import_file, ImportOptions};
use crate::settings::{db_path, Session};

pub fn run(
    file: &str,
    format: Option<&str>,
    income_category: Option<&str>,
    expense_category: Option<&str>,
    cost_center: Option<&str>,
) -> Result<()> {
    let session = Session::require()?;
    let file_path = PathBuf::from(file);
    let mut conn = get_connection(&db_path())?;

    let opts = ImportOptions {
        income_category_id: resolve_category(&conn, income_category.unwrap_or("Outras Receitas"))?,
        expense_category_id: resolve_category(
            &conn,
            expense_category.unwrap_or("Outras Despesas"),
        )?,
        cost_center_id: resolve_cost_center(&conn, cost_center.unwrap_or("Geral"))?,
        user_id: session.user_id,
    };

    let result = import_file(&mut conn, &file_path, format, &opts)?;

    if result.duplicate_file {
        println!("This statement has already been imported (duplicate checksum).");
        return Ok(());
    }
    println!(
        "{} imported, {} skipped (duplicates)",
        result.imported, result.skipped
    );
    Ok(())
}
