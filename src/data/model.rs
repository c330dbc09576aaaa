use std::fmt;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// CellValue – a single worksheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, kept as read until a column is requested
/// as numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "'{s}'"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Empty => write!(f, "<empty>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number. Numeric text is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Column / Table – one worksheet
// ---------------------------------------------------------------------------

/// One named column of a sheet, top to bottom, header excluded.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

/// A sheet restricted to its leading columns, in sheet order.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Read a column as numbers.
    ///
    /// Trailing empty cells are dropped (sheets often carry formatting below
    /// the data). Any other empty or non-numeric cell is an error that names
    /// the spreadsheet row, counting the header as row 1.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, AnalysisError> {
        let column = self.column(name).ok_or_else(|| AnalysisError::MissingColumn {
            sheet: self.name.clone(),
            column: name.to_string(),
        })?;

        let used = column
            .cells
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |last| last + 1);

        column.cells[..used]
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.as_f64().ok_or_else(|| AnalysisError::InvalidCell {
                    sheet: self.name.clone(),
                    column: name.to_string(),
                    row: i + 2,
                    found: cell.to_string(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Workbook – the loaded sheets
// ---------------------------------------------------------------------------

/// Requested sheets that were found, in request order, plus the names of
/// those that were not.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub tables: Vec<Table>,
    pub missing: Vec<String>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cells: Vec<CellValue>) -> Table {
        Table {
            name: "AT1".into(),
            columns: vec![Column {
                name: "P".into(),
                cells,
            }],
        }
    }

    #[test]
    fn numeric_trims_trailing_blanks() {
        let t = table(vec![
            CellValue::Number(1.0),
            CellValue::Text(" 2.5 ".into()),
            CellValue::Empty,
            CellValue::Text(String::new()),
        ]);
        assert_eq!(t.numeric("P").unwrap(), vec![1.0, 2.5]);
    }

    #[test]
    fn numeric_rejects_interior_gap() {
        let t = table(vec![
            CellValue::Number(1.0),
            CellValue::Empty,
            CellValue::Number(3.0),
        ]);
        match t.numeric("P") {
            Err(AnalysisError::InvalidCell { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected InvalidCell, got {other:?}"),
        }
    }

    #[test]
    fn numeric_reports_missing_column() {
        let t = table(vec![]);
        assert!(matches!(
            t.numeric("Q"),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }
}
