//! Spreadsheet extraction: anomaly workbooks in, JSON-ready records
//! out.
//!
//! The source workbooks are hand-maintained exports with a fixed set
//! of named columns. Header spelling is matched after trimming,
//! whitespace-collapsing and lower-casing, since the exports are not
//! consistent about spacing.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Required column headers, as they appear in the source workbooks.
pub const COL_NUM_EQUIPEMENT: &str = "Num_equipement";
pub const COL_SYSTEME: &str = "Systeme";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_DATE_DETECTION: &str = "Date de détéction de l'anomalie";
pub const COL_DESCRIPTION_EQUIPEMENT: &str = "Description de l'équipement";
pub const COL_SECTION_PROPRIETAIRE: &str = "Section propriétaire";

const REQUIRED_COLUMNS: [&str; 6] = [
    COL_NUM_EQUIPEMENT,
    COL_SYSTEME,
    COL_DESCRIPTION,
    COL_DATE_DETECTION,
    COL_DESCRIPTION_EQUIPEMENT,
    COL_SECTION_PROPRIETAIRE,
];

/// Rows scanned from the top of a sheet when locating the header row.
const HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Failed to open workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No data found in workbook")]
    NoData,
}

/// One anomaly row, coerced to strings. Field names serialize to the
/// record keys the downstream ingestion endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRow {
    #[serde(rename = "num_equipments")]
    pub num_equipement: String,
    pub systeme: String,
    #[serde(rename = "descreption_anomalie")]
    pub description: String,
    pub date_detection: String,
    pub description_equipement: String,
    pub section_proprietaire: String,
}

impl AnomalyRow {
    /// The text the scorer sees for this row: anomaly description
    /// followed by the equipment description.
    pub fn inference_text(&self) -> String {
        if self.description_equipement.is_empty() {
            self.description.clone()
        } else {
            format!("{} {}", self.description, self.description_equipement)
        }
    }
}

/// The parsed contents of one sheet plus the metadata callers report.
#[derive(Debug, Serialize)]
pub struct ExtractedSheet {
    pub sheet_used: String,
    pub available_sheets: Vec<String>,
    pub total_rows: usize,
    pub rows: Vec<AnomalyRow>,
}

/// Positions of the required columns within the header row.
#[derive(Debug, Clone)]
struct ColumnIndex {
    header_row: usize,
    positions: HashMap<&'static str, usize>,
}

fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a cell the way the downstream JSON expects it: strings
/// trimmed, numbers without a trailing `.0`, dates ISO-8601, empty
/// cells as empty strings.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => {
            log::warn!("Error cell encountered: {:?}", e);
            String::new()
        }
    }
}

/// Excel stores datetimes as days since 1899-12-30.
fn excel_serial_to_iso(serial: f64) -> String {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).expect("fixed epoch");
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    let date = base + Duration::days(days);
    if secs == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        (date.and_hms_opt(0, 0, 0).expect("midnight") + Duration::seconds(secs))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }
}

fn locate_columns(range: &Range<Data>) -> Result<ColumnIndex, SheetError> {
    let wanted: HashMap<String, &'static str> = REQUIRED_COLUMNS
        .iter()
        .map(|&col| (normalize_header(col), col))
        .collect();

    for (row_idx, row) in range.rows().take(HEADER_SCAN_ROWS).enumerate() {
        let mut positions = HashMap::new();
        for (col_idx, cell) in row.iter().enumerate() {
            if let Data::String(raw) = cell {
                if let Some(&col) = wanted.get(&normalize_header(raw)) {
                    positions.entry(col).or_insert(col_idx);
                }
            }
        }
        if positions.len() == REQUIRED_COLUMNS.len() {
            return Ok(ColumnIndex {
                header_row: row_idx,
                positions,
            });
        }
    }

    // Report what the closest row was missing so the caller can fix
    // the workbook
    let mut best: Option<HashMap<&'static str, usize>> = None;
    for row in range.rows().take(HEADER_SCAN_ROWS) {
        let mut positions = HashMap::new();
        for (col_idx, cell) in row.iter().enumerate() {
            if let Data::String(raw) = cell {
                if let Some(&col) = wanted.get(&normalize_header(raw)) {
                    positions.entry(col).or_insert(col_idx);
                }
            }
        }
        if best.as_ref().map_or(true, |b| positions.len() > b.len()) {
            best = Some(positions);
        }
    }

    let found = best.unwrap_or_default();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&col| !found.contains_key(col))
        .map(|&col| col.to_string())
        .collect();
    Err(SheetError::MissingColumns(missing))
}

fn parse_row(cells: &[Data], index: &ColumnIndex) -> AnomalyRow {
    let get = |col: &'static str| -> String {
        index
            .positions
            .get(col)
            .and_then(|&i| cells.get(i))
            .map(cell_to_string)
            .unwrap_or_default()
    };

    AnomalyRow {
        num_equipement: get(COL_NUM_EQUIPEMENT),
        systeme: get(COL_SYSTEME),
        description: get(COL_DESCRIPTION),
        date_detection: get(COL_DATE_DETECTION),
        description_equipement: get(COL_DESCRIPTION_EQUIPEMENT),
        section_proprietaire: get(COL_SECTION_PROPRIETAIRE),
    }
}

fn extract_rows(range: &Range<Data>) -> Result<Vec<AnomalyRow>, SheetError> {
    let index = locate_columns(range)?;
    let rows = range
        .rows()
        .skip(index.header_row + 1)
        .map(|cells| parse_row(cells, &index))
        // Rows without a description carry nothing to score
        .filter(|row| !row.description.is_empty())
        .collect();
    Ok(rows)
}

/// Picks the sheet to read: exact name match, then the name with a
/// file extension stripped, then the first sheet.
fn select_sheet(available: &[String], requested: Option<&str>) -> Option<String> {
    if let Some(name) = requested {
        if available.iter().any(|s| s == name) {
            return Some(name.to_string());
        }
        let cleaned = name
            .trim_end_matches(".xlsx")
            .trim_end_matches(".xls")
            .trim()
            .to_string();
        if available.iter().any(|s| *s == cleaned) {
            return Some(cleaned);
        }
    }
    available.first().cloned()
}

/// Reads an anomaly workbook and extracts its rows.
///
/// `requested_sheet` is optional; selection falls back as the source
/// pipeline always has: exact match, extension-stripped match, first
/// sheet.
pub fn read_workbook<P: AsRef<Path>>(
    path: P,
    requested_sheet: Option<&str>,
) -> Result<ExtractedSheet, SheetError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let available_sheets: Vec<String> = workbook.sheet_names().to_vec();

    let sheet_used =
        select_sheet(&available_sheets, requested_sheet).ok_or(SheetError::NoData)?;
    log::info!("Reading sheet {:?}", sheet_used);

    let range = workbook.worksheet_range(&sheet_used)?;
    if range.is_empty() {
        return Err(SheetError::NoData);
    }

    let rows = extract_rows(&range)?;
    Ok(ExtractedSheet {
        sheet_used,
        available_sheets,
        total_rows: rows.len(),
        rows,
    })
}
