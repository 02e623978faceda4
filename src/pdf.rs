use std::io::BufWriter;

use printpdf::*;

use crate::error::{Result, VestryError};
use crate::fmt::money;
use crate::reports::{GroupSummary, StatementReport};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| VestryError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| VestryError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold {
            self.font_bold.clone()
        } else {
            self.font.clone()
        };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), &font);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, title: &str, parish: &str, date_range: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        if !parish.is_empty() {
            self.text(parish, MARGIN_LEFT, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        self.text(date_range, MARGIN_LEFT, SUBTITLE_SIZE, false);
        self.y += 5.0;
        let ts = chrono::Local::now()
            .format("Emitido em %d/%m/%Y %H:%M")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 5.0;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < headers.len() {
                match col.align {
                    Align::Left => self.text(headers[i], x, FONT_SIZE, true),
                    Align::Right => {
                        let tw = approx_text_width(headers[i], FONT_SIZE);
                        self.text(headers[i], x + col.width - tw, FONT_SIZE, true);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < values.len() {
                match col.align {
                    Align::Left => self.text(values[i], x, FONT_SIZE, bold),
                    Align::Right => {
                        let tw = approx_text_width(values[i], FONT_SIZE);
                        self.text(values[i], x + col.width - tw, FONT_SIZE, bold);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn blank_row(&mut self) {
        self.y += ROW_H;
    }

    fn separator(&mut self) {
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| VestryError::Pdf(format!("{e:?}")))?;
        Ok(buf.into_inner().map_err(|e| VestryError::Pdf(e.to_string()))?)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

pub fn render_statement(
    report: &StatementReport,
    parish: &str,
    date_range: &str,
) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("Livro Caixa")?;
    pdf.header("Livro Caixa", parish, date_range);

    let cols = &[
        Col { width: 20.0, align: Align::Left },
        Col { width: 62.0, align: Align::Left },
        Col { width: 32.0, align: Align::Left },
        Col { width: 18.0, align: Align::Left },
        Col { width: 39.9, align: Align::Right },
    ];
    pdf.table_header(cols, &["Data", "Descrição", "Categoria", "Situação", "Valor"]);

    for row in &report.rows {
        let date = row.payment_date.as_deref().unwrap_or(&row.due_date);
        let desc = truncate(&row.description, 38);
        let cat = truncate(&row.category, 18);
        let status = match row.status {
            crate::models::EntryStatus::Pending => "pendente",
            crate::models::EntryStatus::Paid => "pago",
            crate::models::EntryStatus::Cancelled => "cancelado",
        };
        let amount = match row.transaction_type {
            crate::models::TransactionType::Income => money(row.effective_amount()),
            crate::models::TransactionType::Expense => money(-row.effective_amount()),
        };
        pdf.table_row(cols, &[date, &desc, &cat, status, &amount], false);
    }

    pdf.blank_row();
    pdf.separator();
    let income = money(report.total_income);
    pdf.table_row(cols, &["", "Total de receitas", "", "", &income], true);
    let expense = money(report.total_expense);
    pdf.table_row(cols, &["", "Total de despesas", "", "", &expense], true);
    let net = money(report.net);
    pdf.table_row(cols, &["", "Saldo do período", "", "", &net], true);

    pdf.to_bytes()
}

pub fn render_summary(
    groups: &[GroupSummary],
    title: &str,
    parish: &str,
    date_range: &str,
) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(title)?;
    pdf.header(title, parish, date_range);

    let cols = &[
        Col { width: 75.0, align: Align::Left },
        Col { width: 32.0, align: Align::Right },
        Col { width: 32.0, align: Align::Right },
        Col { width: 32.9, align: Align::Right },
    ];
    pdf.table_header(cols, &["Grupo", "Receitas", "Despesas", "Saldo"]);

    let mut total_income = rust_decimal::Decimal::ZERO;
    let mut total_expense = rust_decimal::Decimal::ZERO;
    for g in groups {
        let income = money(g.income);
        let expense = money(g.expense);
        let balance = money(g.balance);
        pdf.table_row(cols, &[&g.name, &income, &expense, &balance], false);
        total_income += g.income;
        total_expense += g.expense;
    }

    pdf.separator();
    let income = money(total_income);
    let expense = money(total_expense);
    let net = money(total_income - total_expense);
    pdf.table_row(cols, &["Total", &income, &expense, &net], true);

    pdf.to_bytes()
}
