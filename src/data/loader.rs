use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Table, Workbook};
use crate::config::MissingSheetPolicy;
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the requested sheets of a workbook.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet workbooks
/// * `.json` – column-oriented sheets, see [`JsonWorkbook`]
///
/// Only the first `n_columns` columns of each sheet are kept. Sheets that are
/// not in the workbook are logged and listed in [`Workbook::missing`]; whether
/// that is fatal is decided by `policy`.
pub fn load_workbook(
    path: &Path,
    sheets: &[String],
    n_columns: usize,
    policy: MissingSheetPolicy,
) -> Result<Workbook, AnalysisError> {
    if !path.exists() {
        log::error!("Workbook {} not found", path.display());
        return Err(AnalysisError::FileAccess {
            path: path.to_path_buf(),
            detail: "file not found".into(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    log::info!("Opening workbook {}", path.display());
    let workbook = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path, sheets, n_columns)?,
        "json" => load_json(path, sheets, n_columns)?,
        other => return Err(AnalysisError::UnsupportedFormat(other.to_string())),
    };

    for name in &workbook.missing {
        log::warn!("Sheet {name} not found in {}", path.display());
    }
    if policy == MissingSheetPolicy::Fail {
        if let Some(name) = workbook.missing.first() {
            return Err(AnalysisError::SheetMissing {
                sheet: name.clone(),
            });
        }
    }

    Ok(workbook)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(
    path: &Path,
    sheets: &[String],
    n_columns: usize,
) -> Result<Workbook, AnalysisError> {
    let file_error = |detail: String| AnalysisError::FileAccess {
        path: path.to_path_buf(),
        detail,
    };

    let mut book = open_workbook_auto(path).map_err(|e| file_error(e.to_string()))?;
    let available = book.sheet_names();

    let mut workbook = Workbook::default();
    for name in sheets {
        if !available.iter().any(|s| s == name) {
            workbook.missing.push(name.clone());
            continue;
        }
        let range = book
            .worksheet_range(name)
            .map_err(|e| file_error(format!("sheet {name}: {e}")))?;

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        let table = table_from_rows(name, rows, n_columns);
        log::info!("Read sheet {name} ({} columns)", table.columns.len());
        workbook.tables.push(table);
    }
    Ok(workbook)
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

/// Turn header + data rows into a table of the first `n_columns` columns.
/// Short rows are padded with empty cells.
fn table_from_rows(name: &str, rows: Vec<Vec<CellValue>>, n_columns: usize) -> Table {
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let width = header.len().min(n_columns);

    let mut columns: Vec<Column> = header
        .into_iter()
        .take(width)
        .enumerate()
        .map(|(i, cell)| Column {
            name: header_name(&cell, i),
            cells: Vec::new(),
        })
        .collect();

    for row in rows {
        for (i, column) in columns.iter_mut().enumerate() {
            column
                .cells
                .push(row.get(i).cloned().unwrap_or(CellValue::Empty));
        }
    }

    Table {
        name: name.to_string(),
        columns,
    }
}

fn header_name(cell: &CellValue, index: usize) -> String {
    match cell {
        CellValue::Text(s) if !s.trim().is_empty() => s.clone(),
        CellValue::Number(v) => v.to_string(),
        _ => format!("Unnamed: {index}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Column-oriented JSON workbook:
///
/// ```json
/// {
///   "sheets": [
///     {
///       "name": "AT1",
///       "columns": [
///         { "name": "POTÊNCIA LASER [µW]", "values": [1200.0, 1200.0] },
///         { "name": "POTÊNCIA DETECTOR [µW]", "values": [1200.0, 1100.0] }
///       ]
///     }
///   ]
/// }
/// ```
///
/// Arrays keep column order, which a JSON object would not guarantee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonWorkbook {
    pub sheets: Vec<JsonSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSheet {
    pub name: String,
    pub columns: Vec<JsonColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonColumn {
    pub name: String,
    pub values: Vec<JsonValue>,
}

fn load_json(path: &Path, sheets: &[String], n_columns: usize) -> Result<Workbook, AnalysisError> {
    let file_error = |detail: String| AnalysisError::FileAccess {
        path: path.to_path_buf(),
        detail,
    };

    let text = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let root: JsonWorkbook =
        serde_json::from_str(&text).map_err(|e| file_error(format!("parsing JSON: {e}")))?;

    let mut workbook = Workbook::default();
    for name in sheets {
        let Some(sheet) = root.sheets.iter().find(|s| &s.name == name) else {
            workbook.missing.push(name.clone());
            continue;
        };
        let columns: Vec<Column> = sheet
            .columns
            .iter()
            .take(n_columns)
            .map(|c| Column {
                name: c.name.clone(),
                cells: c.values.iter().map(json_to_cell).collect(),
            })
            .collect();
        log::info!("Read sheet {name} ({} columns)", columns.len());
        workbook.tables.push(Table {
            name: name.clone(),
            columns,
        });
    }
    Ok(workbook)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(dir: &Path, body: JsonValue) -> std::path::PathBuf {
        let path = dir.join("bench.json");
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn two_sheets() -> JsonValue {
        json!({
            "sheets": [
                { "name": "AT1", "columns": [
                    { "name": "A", "values": [1.0, 2.0] },
                    { "name": "B", "values": [3.0, 4.0] },
                    { "name": "C", "values": ["note", null] }
                ]},
                { "name": "AT2", "columns": [
                    { "name": "A", "values": [5.0] }
                ]}
            ]
        })
    }

    #[test]
    fn missing_file_is_file_access() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_workbook(
            &dir.path().join("nope.xlsx"),
            &names(&["AT1"]),
            6,
            MissingSheetPolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::FileAccess { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.txt");
        std::fs::write(&path, "x").unwrap();
        let err = load_workbook(&path, &names(&["AT1"]), 6, MissingSheetPolicy::Skip).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn missing_sheet_skipped_when_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), two_sheets());
        let wb = load_workbook(
            &path,
            &names(&["AT1", "AT2", "AT3"]),
            6,
            MissingSheetPolicy::Skip,
        )
        .unwrap();
        assert_eq!(wb.len(), 2);
        assert_eq!(wb.missing, vec!["AT3".to_string()]);
        assert!(wb.sheet("AT3").is_none());
        assert_eq!(wb.sheet("AT2").unwrap().numeric("A").unwrap(), vec![5.0]);
    }

    #[test]
    fn missing_sheet_fails_by_default_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), two_sheets());
        let err = load_workbook(
            &path,
            &names(&["AT1", "AT3"]),
            6,
            MissingSheetPolicy::Fail,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::SheetMissing { sheet } if sheet == "AT3"));
    }

    #[test]
    fn only_leading_columns_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), two_sheets());
        let wb = load_workbook(&path, &names(&["AT1"]), 2, MissingSheetPolicy::Fail).unwrap();
        assert_eq!(wb.sheet("AT1").unwrap().column_names(), vec!["A", "B"]);
    }

    #[test]
    fn malformed_json_is_file_access() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_workbook(&path, &names(&["AT1"]), 6, MissingSheetPolicy::Fail).unwrap_err();
        assert!(matches!(err, AnalysisError::FileAccess { .. }));
    }

    #[test]
    fn rows_become_padded_columns() {
        let rows = vec![
            vec![
                CellValue::Text("A".into()),
                CellValue::Empty,
                CellValue::Text("C".into()),
            ],
            vec![CellValue::Number(1.0)],
            vec![
                CellValue::Number(2.0),
                CellValue::Number(3.0),
                CellValue::Number(4.0),
            ],
        ];
        let t = table_from_rows("S", rows, 6);
        assert_eq!(t.column_names(), vec!["A", "Unnamed: 1", "C"]);
        assert_eq!(t.numeric("A").unwrap(), vec![1.0, 2.0]);
        assert!(t.numeric("C").is_err());
    }

    #[test]
    fn headers_are_kept_as_written() {
        let rows = vec![
            vec![CellValue::Text(" POTÊNCIA LASER [µW]".into())],
            vec![CellValue::Number(1200.0)],
        ];
        let t = table_from_rows("AT1", rows, 6);
        assert_eq!(t.column_names(), vec![" POTÊNCIA LASER [µW]"]);
        assert!(matches!(
            t.numeric("POTÊNCIA LASER [µW]"),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn calamine_cells_map_to_values() {
        assert_eq!(cell_from_data(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(cell_from_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
        assert!(matches!(
            cell_from_data(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Text(_)
        ));
    }

    fn write_xlsx(dir: &Path) -> std::path::PathBuf {
        let mut book = rust_xlsxwriter::Workbook::new();

        let sheet = book.add_worksheet();
        sheet.set_name("AT1").unwrap();
        for (col, header) in ["TENSÃO [V]", "POTÊNCIA LASER [µW]", "", "EXTRA"].iter().enumerate() {
            if !header.is_empty() {
                sheet.write_string(0, col as u16, *header).unwrap();
            }
        }
        for row in 1..=3u32 {
            sheet.write_number(row, 0, f64::from(row - 1) * 0.5).unwrap();
            sheet.write_number(row, 1, 1200.0).unwrap();
            sheet.write_number(row, 2, 7.0).unwrap();
            sheet.write_number(row, 3, 9.0).unwrap();
        }
        sheet.write_string(2, 2, "n/a").unwrap();

        let other = book.add_worksheet();
        other.set_name("AT2").unwrap();
        other.write_string(0, 0, "A").unwrap();

        let path = dir.join("ATENUADORES.xlsx");
        book.save(&path).unwrap();
        path
    }

    #[test]
    fn xlsx_sheets_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xlsx(dir.path());
        let wb = load_workbook(&path, &names(&["AT1", "AT2"]), 3, MissingSheetPolicy::Fail).unwrap();

        let at1 = wb.sheet("AT1").unwrap();
        assert_eq!(
            at1.column_names(),
            vec!["TENSÃO [V]", "POTÊNCIA LASER [µW]", "Unnamed: 2"]
        );
        assert_eq!(at1.numeric("TENSÃO [V]").unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(at1.numeric("POTÊNCIA LASER [µW]").unwrap(), vec![1200.0; 3]);
        assert!(matches!(
            at1.numeric("Unnamed: 2"),
            Err(AnalysisError::InvalidCell { row: 3, .. })
        ));
        assert!(wb.sheet("AT2").unwrap().numeric("A").unwrap().is_empty());
    }

    #[test]
    fn xlsx_missing_sheet_follows_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_xlsx(dir.path());

        let err = load_workbook(&path, &names(&["AT1", "AT3"]), 6, MissingSheetPolicy::Fail)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SheetMissing { sheet } if sheet == "AT3"));

        let wb = load_workbook(&path, &names(&["AT1", "AT3"]), 6, MissingSheetPolicy::Skip).unwrap();
        assert_eq!(wb.missing, vec!["AT3".to_string()]);
    }
}
