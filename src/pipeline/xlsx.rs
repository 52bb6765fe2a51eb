//! Spreadsheets: every sheet → grid of display strings → bordered cells.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::pdf::{Canvas, Font, Rgb, TextStyle};
use crate::pipeline::Rendered;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Read every worksheet of a workbook held in memory.
///
/// The container format (xlsx, xlsm, xlsb, xls, ods) is detected from the
/// bytes. A sheet that cannot be read (a chart sheet, say) is skipped.
pub fn read(bytes: &[u8], name: &str) -> Result<Vec<Sheet>, ConvertError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ConvertError::Spreadsheet(format!("cannot open '{name}': {e}")))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        match workbook.worksheet_range(&sheet_name) {
            Ok(range) => {
                let rows = range_to_rows(&range);
                debug!("Sheet '{}': {} rows", sheet_name, rows.len());
                sheets.push(Sheet {
                    name: sheet_name,
                    rows,
                });
            }
            Err(e) => warn!("Skipping sheet '{}': {}", sheet_name, e),
        }
    }
    Ok(sheets)
}

/// Display strings for every cell of the used range, trailing empty rows
/// removed.
pub fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(display_value).collect())
        .collect();
    while rows
        .last()
        .is_some_and(|row| row.iter().all(String::is_empty))
    {
        rows.pop();
    }
    rows
}

/// The text a spreadsheet application would show for `value`.
pub fn display_value(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Error(e) => e.to_string(),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                format_duration(dt.as_f64())
            } else {
                format_serial_date(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) => s.replace('T', " "),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Up to 10 significant decimals, trailing zeros dropped.
fn format_number(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let s = format!("{f:.10}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Excel serial date (days since 1899-12-30) → `YYYY-MM-DD[ HH:MM[:SS]]`.
fn format_serial_date(serial: f64) -> String {
    let days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * 86_400.0).round() as i64;
    // Serial 25569 is 1970-01-01.
    let (y, m, d) = civil_from_days(days - 25_569);
    let date = format!("{y:04}-{m:02}-{d:02}");
    match seconds {
        0 => date,
        s if s % 60 == 0 => format!("{date} {:02}:{:02}", s / 3600, (s / 60) % 60),
        s => format!("{date} {:02}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60),
    }
}

fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

/// Days since 1970-01-01 → (year, month, day), proleptic Gregorian.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Draw each sheet as a titled grid; sheets after the first start a new page.
pub fn lay_out(sheets: &[Sheet], config: &ConversionConfig) -> Rendered {
    let (width, height) = config.page_size.dimensions();
    let mut canvas = Canvas::new(width, height, config.margin);
    let body = config.font_size;
    let title = TextStyle::new(Font::HelveticaBold, body + 3.0);
    let cell = TextStyle::new(Font::Helvetica, (body - 2.0).max(6.0));
    let note = TextStyle::new(Font::Helvetica, body).color(Rgb::GREY);

    for (index, sheet) in sheets.iter().enumerate() {
        if index > 0 {
            canvas.break_page();
        }
        canvas.text_block(&sheet.name, title);
        canvas.advance(body * 0.5);

        let has_values = sheet.rows.iter().flatten().any(|v| !v.is_empty());
        if has_values {
            let cells = canvas.table(&sheet.rows, cell);
            debug!("Sheet '{}': {} cells drawn", sheet.name, cells);
        } else {
            canvas.text_line("(empty sheet)", note);
        }
    }
    if sheets.is_empty() {
        canvas.text_line("(no worksheets)", note);
    }

    Rendered {
        layout: canvas.finish(),
        images_embedded: 0,
        images_skipped: 0,
    }
}
