use std::path::PathBuf;

use crate::cli::report::{build_filter, parse_group_by};
use crate::cli::resolve_period;
use crate::db::get_connection;
use crate::error::Result;
use crate::pdf;
use crate::reports::{self, EntryFilter, GroupBy};
use crate::settings::{db_path, get_data_dir, load_settings};

fn default_path(name: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("{name}-{date}.pdf"))
}

fn write_pdf(bytes: &[u8], path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn date_range_label(start: &str, end: &str) -> String {
    format!("{start} a {end}")
}

#[allow(clippy::too_many_arguments)]
pub fn statement(
    month: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    transaction_type: Option<&str>,
    cost_center: Option<&str>,
    paid_only: bool,
    output: Option<String>,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (start, end) = resolve_period(month, from, to)?;
    let filter = build_filter(
        &conn,
        &start,
        &end,
        transaction_type,
        cost_center,
        paid_only,
        false,
        false,
    )?;
    let report = reports::get_statement(&conn, &filter)?;

    let parish = load_settings().parish_name;
    let bytes = pdf::render_statement(&report, &parish, &date_range_label(&start, &end))?;
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path("livro-caixa"));
    write_pdf(&bytes, &path)
}

pub fn summary(
    by: &str,
    month: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    paid_only: bool,
    output: Option<String>,
) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let (start, end) = resolve_period(month, from, to)?;
    let group_by = parse_group_by(by)?;

    let mut filter = EntryFilter::for_period(&start, &end);
    filter.paid_only = paid_only;
    let groups = reports::get_summary(&conn, &filter, group_by)?;

    let (title, file_name) = match group_by {
        GroupBy::CostCenter => ("Resumo por Centro de Custo", "resumo-centro-custo"),
        GroupBy::Category => ("Resumo por Categoria", "resumo-categoria"),
    };
    let parish = load_settings().parish_name;
    let bytes = pdf::render_summary(&groups, title, &parish, &date_range_label(&start, &end))?;
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(file_name));
    write_pdf(&bytes, &path)
}
