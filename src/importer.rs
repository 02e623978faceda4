use std::path::Path;

use chrono::Datelike;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::error::{Result, VestryError};
use crate::ledger::{self, EntryDraft};
use crate::models::{PaymentMethod, TransactionType};
use crate::money::{parse_amount, to_cents};

/// One movement extracted from a bank statement. `C` lines become income,
/// `D` lines become expenses; both arrive already paid.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMovement {
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| VestryError::Validation(format!("bad pattern: {e}")))
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Statement formats — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementFormat {
    SicoobText,
    Csv,
}

impl StatementFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SicoobText => "sicoob",
            Self::Csv => "csv",
        }
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SicoobText => "Extrato Sicoob (texto)",
            Self::Csv => "CSV genérico",
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        match self {
            Self::SicoobText => detect_sicoob(file_path),
            Self::Csv => detect_csv(file_path),
        }
    }

    pub fn parse(&self, file_path: &Path) -> Result<Vec<ParsedMovement>> {
        match self {
            Self::SicoobText => parse_sicoob(file_path),
            Self::Csv => parse_csv(file_path),
        }
    }
}

const ALL_FORMATS: &[StatementFormat] = &[StatementFormat::SicoobText, StatementFormat::Csv];

pub fn get_by_key(key: &str) -> Option<StatementFormat> {
    ALL_FORMATS.iter().find(|f| f.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> Option<StatementFormat> {
    ALL_FORMATS.iter().find(|f| f.detect(file_path)).copied()
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

pub struct ImportOptions {
    pub income_category_id: i64,
    pub expense_category_id: i64,
    pub cost_center_id: i64,
    pub user_id: i64,
}

pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

/// Import a bank statement as settled entries. The file checksum guards
/// against re-importing the same statement; individual movements already
/// present (same date, amount, description, type) are skipped.
pub fn import_file(
    conn: &mut Connection,
    file_path: &Path,
    format_key: Option<&str>,
    opts: &ImportOptions,
) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let format = if let Some(key) = format_key {
        get_by_key(key).ok_or_else(|| VestryError::UnknownFormat(key.to_string()))?
    } else {
        get_for_file(file_path).ok_or_else(|| {
            VestryError::UnknownFormat(file_path.to_string_lossy().to_string())
        })?
    };

    let movements = format.parse(file_path)?;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for m in &movements {
        if is_duplicate_movement(conn, m)? {
            skipped += 1;
            continue;
        }
        let draft = EntryDraft {
            description: m.description.clone(),
            amount: m.amount,
            due_date: m.date.clone(),
            transaction_type: m.transaction_type,
            payment_method: PaymentMethod::Transfer,
            category_id: match m.transaction_type {
                TransactionType::Income => opts.income_category_id,
                TransactionType::Expense => opts.expense_category_id,
            },
            cost_center_id: opts.cost_center_id,
            counterparty: None,
            note: None,
        };
        ledger::register(conn, &draft, opts.user_id, true)?;
        imported += 1;
    }

    let min_date = movements.iter().map(|m| m.date.as_str()).min();
    let max_date = movements.iter().map(|m| m.date.as_str()).max();
    conn.execute(
        "INSERT INTO imports (filename, checksum, record_count, date_range_start, date_range_end) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            checksum,
            movements.len() as i64,
            min_date,
            max_date,
        ],
    )?;

    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}

fn is_duplicate_movement(conn: &Connection, m: &ParsedMovement) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM entries WHERE is_active = 1 AND due_date = ?1 \
         AND original_amount_cents = ?2 AND description = ?3 AND transaction_type = ?4",
    )?;
    Ok(stmt.exists(rusqlite::params![
        m.date,
        to_cents(m.amount)?,
        m.description,
        m.transaction_type
    ])?)
}

// ---------------------------------------------------------------------------
// Sicoob statement parser (plain-text export)
// ---------------------------------------------------------------------------

fn detect_sicoob(file_path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(file_path) else {
        return false;
    };
    content.contains("SICOOB") || content.contains("PERÍODO:")
}

/// Each movement starts with a `dd/mm` line; continuation lines belong to
/// the block until the next date. The amount appears somewhere in the block
/// as `1.234,56 C` (credit) or `D` (debit) at end of line.
fn parse_sicoob(file_path: &Path) -> Result<Vec<ParsedMovement>> {
    let content = std::fs::read_to_string(file_path)?;

    let date_re = compile(r"^(\d{2}/\d{2})")?;
    let year_re = compile(r"PERÍODO:.*/(\d{4})")?;
    let value_re = compile(r"(\d{1,3}(?:[.,]\d{3})*[.,]\d{2})\s*([CD])\s*$")?;

    let mut year = chrono::Local::now().year();
    for line in content.lines() {
        if let Some(caps) = year_re.captures(line) {
            if let Some(y) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                year = y;
            }
        }
    }

    let mut movements = Vec::new();
    let mut current_date: Option<String> = None;
    let mut block: Vec<String> = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("SICOOB") {
            continue;
        }
        let upper = line.to_uppercase();
        if upper.contains("EXTRATO CONTA CORRENTE") || upper.starts_with("SALDO") {
            continue;
        }

        if let Some(caps) = date_re.captures(line) {
            if let Some(date) = current_date.take() {
                if let Some(m) = finish_block(&value_re, &date, &block) {
                    movements.push(m);
                }
            }
            block.clear();

            let Some(day_month) = caps.get(1) else { continue };
            let rest = line[day_month.end()..].trim();
            if rest.to_uppercase().starts_with("SALDO") {
                continue;
            }
            current_date = parse_day_month(day_month.as_str(), year);
            if !rest.is_empty() {
                block.push(rest.to_string());
            }
        } else if current_date.is_some() {
            block.push(line.to_string());
        }
    }
    if let Some(date) = current_date {
        if let Some(m) = finish_block(&value_re, &date, &block) {
            movements.push(m);
        }
    }

    Ok(movements)
}

fn parse_day_month(day_month: &str, year: i32) -> Option<String> {
    let (day, month) = day_month.split_once('/')?;
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn finish_block(value_re: &Regex, date: &str, block: &[String]) -> Option<ParsedMovement> {
    let mut amount: Option<Decimal> = None;
    let mut transaction_type = TransactionType::Income;
    let mut history: Vec<String> = Vec::new();

    for raw in block {
        let mut line = raw.as_str();

        if amount.is_none() {
            if let Some(caps) = value_re.captures(line) {
                if let (Some(whole), Some(value), Some(kind)) =
                    (caps.get(0), caps.get(1), caps.get(2))
                {
                    amount = parse_amount(value.as_str()).ok();
                    transaction_type = if kind.as_str() == "C" {
                        TransactionType::Income
                    } else {
                        TransactionType::Expense
                    };
                    line = line[..whole.start()].trim_end();
                }
            }
        }

        if line.is_empty() || line.starts_with("***") {
            continue;
        }

        let upper = line.to_uppercase();
        let owned;
        if upper.starts_with("DOC.:") {
            let content = line[5..].trim();
            if content.eq_ignore_ascii_case("pix") {
                continue;
            }
            line = content;
        } else if upper.starts_with("REM.:") {
            owned = format!("REM: {}", line[5..].trim());
            line = &owned;
        }

        if !line.is_empty() {
            history.push(line.to_string());
        }
    }

    let amount = amount?;
    if amount <= Decimal::ZERO {
        return None;
    }
    Some(ParsedMovement {
        date: date.to_string(),
        description: history.join(" | ").trim().to_string(),
        amount,
        transaction_type,
    })
}

// ---------------------------------------------------------------------------
// Generic CSV parser
// ---------------------------------------------------------------------------

fn detect_csv(file_path: &Path) -> bool {
    if !file_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    {
        return false;
    }
    let Ok(content) = std::fs::read_to_string(file_path) else {
        return false;
    };
    content
        .lines()
        .next()
        .is_some_and(|h| h.contains("descricao") && h.contains("valor"))
}

/// Columns: data, descricao, valor, tipo. Dates accepted as `YYYY-MM-DD`
/// or `dd/mm/yyyy`; tipo is `C`/`D` or `receita`/`despesa`.
fn parse_csv(file_path: &Path) -> Result<Vec<ParsedMovement>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut movements = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() < 4 {
            continue;
        }
        let Some(date) = parse_csv_date(record[0].trim()) else {
            continue;
        };
        let description = record[1].trim().to_string();
        if description.is_empty() {
            continue;
        }
        let Ok(amount) = parse_amount(&record[2]) else {
            continue;
        };
        if amount <= Decimal::ZERO {
            continue;
        }
        let transaction_type = match record[3].trim().to_lowercase().as_str() {
            "c" | "receita" => TransactionType::Income,
            "d" | "despesa" => TransactionType::Expense,
            _ => continue,
        };
        movements.push(ParsedMovement {
            date,
            description,
            amount,
            transaction_type,
        });
    }
    Ok(movements)
}

fn parse_csv_date(raw: &str) -> Option<String> {
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    chrono::NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::EntryStatus;
    use rust_decimal_macros::dec;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn test_options(conn: &Connection) -> ImportOptions {
        let income: i64 = conn
            .query_row("SELECT id FROM categories WHERE name = 'Outras Receitas'", [], |r| r.get(0))
            .unwrap();
        let expense: i64 = conn
            .query_row("SELECT id FROM categories WHERE name = 'Outras Despesas'", [], |r| r.get(0))
            .unwrap();
        ImportOptions {
            income_category_id: income,
            expense_category_id: expense,
            cost_center_id: 1,
            user_id: 1,
        }
    }

    const SICOOB_SAMPLE: &str = "\
SICOOB COOPERATIVA DE CRÉDITO
EXTRATO CONTA CORRENTE
PERÍODO: 01/01/2024 a 31/01/2024
01/01 SALDO ANTERIOR 1.000,00 C
05/01 PIX RECEBIDO
DOC.: Pix
REM.: MARIA DAS DORES
500,00 C
10/01 PAGAMENTO ENERGIA
DOC.: 12345
200,50 D
SALDO FINAL 1.299,50 C
";

    fn write_sicoob(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, SICOOB_SAMPLE).unwrap();
        path
    }

    #[test]
    fn test_parse_sicoob_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sicoob(dir.path(), "extrato.txt");
        let movements = StatementFormat::SicoobText.parse(&path).unwrap();
        assert_eq!(movements.len(), 2);

        assert_eq!(movements[0].date, "2024-01-05");
        assert_eq!(movements[0].amount, dec!(500.00));
        assert_eq!(movements[0].transaction_type, TransactionType::Income);
        // "DOC.: Pix" dropped, "REM.:" rewritten
        assert_eq!(movements[0].description, "PIX RECEBIDO | REM: MARIA DAS DORES");

        assert_eq!(movements[1].date, "2024-01-10");
        assert_eq!(movements[1].amount, dec!(200.50));
        assert_eq!(movements[1].transaction_type, TransactionType::Expense);
        assert_eq!(movements[1].description, "PAGAMENTO ENERGIA | 12345");
    }

    #[test]
    fn test_parse_sicoob_uses_statement_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extrato.txt");
        std::fs::write(
            &path,
            "PERÍODO: 01/12/2022 a 31/12/2022\n15/12 OFERTA\n100,00 C\n",
        )
        .unwrap();
        let movements = StatementFormat::SicoobText.parse(&path).unwrap();
        assert_eq!(movements[0].date, "2022-12-15");
    }

    #[test]
    fn test_parse_sicoob_skips_balance_and_marker_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extrato.txt");
        std::fs::write(
            &path,
            "PERÍODO: 01/01/2024 a 31/01/2024\n\
             02/01 SALDO DO DIA 5.000,00 C\n\
             03/01 DÍZIMO\n*** continua ***\n50,00 C\n",
        )
        .unwrap();
        let movements = StatementFormat::SicoobText.parse(&path).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].description, "DÍZIMO");
    }

    #[test]
    fn test_parse_sicoob_tolerates_both_number_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extrato.txt");
        std::fs::write(
            &path,
            "PERÍODO: 01/01/2024 a 31/01/2024\n\
             05/01 A\n1.000,20 C\n\
             06/01 B\n1,000.20 C\n\
             07/01 C\n0.20 D\n",
        )
        .unwrap();
        let movements = StatementFormat::SicoobText.parse(&path).unwrap();
        assert_eq!(movements[0].amount, dec!(1000.20));
        assert_eq!(movements[1].amount, dec!(1000.20));
        assert_eq!(movements[2].amount, dec!(0.20));
    }

    #[test]
    fn test_detect_formats() {
        let dir = tempfile::tempdir().unwrap();
        let sicoob = write_sicoob(dir.path(), "extrato.txt");
        assert_eq!(get_for_file(&sicoob), Some(StatementFormat::SicoobText));

        let csv_path = dir.path().join("movimentos.csv");
        std::fs::write(&csv_path, "data,descricao,valor,tipo\n2024-01-05,Oferta,50.00,C\n")
            .unwrap();
        assert_eq!(get_for_file(&csv_path), Some(StatementFormat::Csv));

        let other = dir.path().join("outro.txt");
        std::fs::write(&other, "nada a ver\n").unwrap();
        assert_eq!(get_for_file(&other), None);
    }

    #[test]
    fn test_parse_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movimentos.csv");
        std::fs::write(
            &path,
            "data,descricao,valor,tipo\n\
             2024-01-05,Oferta dominical,\"150,00\",receita\n\
             10/01/2024,Conta de luz,200.50,D\n\
             2024-01-11,,10.00,C\n",
        )
        .unwrap();
        let movements = StatementFormat::Csv.parse(&path).unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].date, "2024-01-05");
        assert_eq!(movements[0].amount, dec!(150.00));
        assert_eq!(movements[1].date, "2024-01-10");
        assert_eq!(movements[1].transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_import_registers_paid_entries() {
        let (dir, mut conn) = test_db();
        let path = write_sicoob(dir.path(), "extrato.txt");
        let opts = test_options(&conn);
        let result = import_file(&mut conn, &path, Some("sicoob"), &opts).unwrap();
        assert_eq!(result.imported, 2);
        assert!(!result.duplicate_file);

        let entry = ledger::get_entry(&conn, 1).unwrap();
        assert_eq!(entry.status, EntryStatus::Paid);
        assert_eq!(entry.paid_amount, dec!(500.00));
        assert_eq!(entry.payment_date.as_deref(), Some("2024-01-05"));
        assert_eq!(entry.payment_method, PaymentMethod::Transfer);

        let balance =
            crate::reports::realized_balance(&conn, "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(balance, dec!(299.50));
    }

    #[test]
    fn test_import_detects_duplicate_file() {
        let (dir, mut conn) = test_db();
        let path = write_sicoob(dir.path(), "extrato.txt");
        let opts = test_options(&conn);
        let r1 = import_file(&mut conn, &path, Some("sicoob"), &opts).unwrap();
        assert_eq!(r1.imported, 2);
        let r2 = import_file(&mut conn, &path, Some("sicoob"), &opts).unwrap();
        assert!(r2.duplicate_file);
        assert_eq!(r2.imported, 0);
    }

    #[test]
    fn test_import_skips_duplicate_movements() {
        let (dir, mut conn) = test_db();
        let opts = test_options(&conn);
        let first = dir.path().join("jan1.txt");
        std::fs::write(
            &first,
            "PERÍODO: 01/01/2024 a 31/01/2024\n05/01 OFERTA\n50,00 C\n",
        )
        .unwrap();
        import_file(&mut conn, &first, Some("sicoob"), &opts).unwrap();

        // Overlapping statement with one new movement.
        let second = dir.path().join("jan2.txt");
        std::fs::write(
            &second,
            "PERÍODO: 01/01/2024 a 31/01/2024\n05/01 OFERTA\n50,00 C\n06/01 DÍZIMO\n80,00 C\n",
        )
        .unwrap();
        let r = import_file(&mut conn, &second, Some("sicoob"), &opts).unwrap();
        assert_eq!(r.imported, 1);
        assert_eq!(r.skipped, 1);
    }

    #[test]
    fn test_import_records_batch_with_date_range() {
        let (dir, mut conn) = test_db();
        let path = write_sicoob(dir.path(), "extrato.txt");
        let opts = test_options(&conn);
        import_file(&mut conn, &path, Some("sicoob"), &opts).unwrap();
        let (count, start, end): (i64, String, String) = conn
            .query_row(
                "SELECT record_count, date_range_start, date_range_end FROM imports",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(start, "2024-01-05");
        assert_eq!(end, "2024-01-10");
    }

    #[test]
    fn test_import_unknown_format_key() {
        let (dir, mut conn) = test_db();
        let path = write_sicoob(dir.path(), "extrato.txt");
        let opts = test_options(&conn);
        assert!(matches!(
            import_file(&mut conn, &path, Some("nubank"), &opts),
            Err(VestryError::UnknownFormat(_))
        ));
    }
}
