use std::borrow::Cow;
use std::collections::BTreeMap;

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date, written back with a date format.
    DateTime(f64),
    /// Excel serial duration, written back as `[h]:mm:ss`.
    Duration(f64),
    /// Formula text without the leading `=`, plus the last computed value.
    Formula { formula: String, cached: String },
}

impl Cell {
    /// True only for cells with no value at all. Whitespace-only text counts as
    /// a value, so a user-entered blank-looking description is kept.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.is_empty(),
            Cell::Number(_)
            | Cell::Bool(_)
            | Cell::DateTime(_)
            | Cell::Duration(_)
            | Cell::Formula { .. } => false,
        }
    }

    /// Display text. Dates print as their serial number and formulas as their
    /// cached result.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(text) => Cow::Borrowed(text.as_str()),
            Cell::Number(n) | Cell::DateTime(n) | Cell::Duration(n) => {
                Cow::Owned(number_text(*n))
            }
            Cell::Bool(b) => Cow::Owned(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Cell::Formula { cached, .. } => Cow::Borrowed(cached.as_str()),
        }
    }
}

fn number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// A merged block of cells, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

/// One worksheet. Rows and columns are 1-based, like a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub hidden: bool,
    rows: Vec<Vec<Cell>>,
    column_widths: BTreeMap<u32, f64>,
    merged: Vec<MergedRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
            rows: Vec::new(),
            column_widths: BTreeMap::new(),
            merged: Vec::new(),
        }
    }

    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut sheet = Self::new(name);
        sheet.rows = rows;
        sheet.trim_trailing_empty_rows();
        sheet
    }

    pub fn max_row(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn max_col(&self) -> u32 {
        self.rows.iter().map(Vec::len).max().unwrap_or(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Cell::is_empty))
    }

    pub fn cell(&self, row: u32, col: u32) -> &Cell {
        if row == 0 || col == 0 {
            return &EMPTY_CELL;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(col as usize - 1))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: impl Into<Cell>) {
        assert!(row > 0 && col > 0, "cell coordinates are 1-based");
        let (r, c) = (row as usize - 1, col as usize - 1);
        if self.rows.len() <= r {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if cells.len() <= c {
            cells.resize(c + 1, Cell::Empty);
        }
        cells[c] = value.into();
    }

    /// Appends below the last row and returns the new row number.
    pub fn append_row(&mut self, cells: Vec<Cell>) -> u32 {
        self.rows.push(cells);
        self.max_row()
    }

    /// Iterates `(row_number, cells)` starting at `first_row`.
    pub fn rows_from(&self, first_row: u32) -> impl Iterator<Item = (u32, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .skip(first_row.saturating_sub(1) as usize)
            .map(|(idx, cells)| (idx as u32 + 1, cells.as_slice()))
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    pub fn add_merged_range(&mut self, range: MergedRange) {
        self.merged.push(range);
    }

    pub fn merged_ranges(&self) -> &[MergedRange] {
        &self.merged
    }

    fn trim_trailing_empty_rows(&mut self) {
        while self
            .rows
            .last()
            .is_some_and(|row| row.iter().all(Cell::is_empty))
        {
            self.rows.pop();
        }
    }
}

/// The in-memory store. The active sheet is the index region; the others are
/// carried through a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    sheets: Vec<Sheet>,
    active: usize,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME)],
            active: 0,
        }
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        if sheets.is_empty() {
            return Self::new();
        }
        Self { sheets, active: 0 }
    }

    /// Selects the active sheet by position. An index past the last sheet
    /// falls back to the first one.
    pub fn set_active(&mut self, index: usize) {
        self.active = if index < self.sheets.len() { index } else { 0 };
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Sheet {
        &self.sheets[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active]
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let sheet = Sheet::new("s");
        assert!(sheet.cell(1, 1).is_empty());
        assert!(sheet.cell(0, 3).is_empty());
        assert_eq!(sheet.max_row(), 0);
    }

    #[test]
    fn test_set_cell_grows_ragged_rows() {
        let mut sheet = Sheet::new("s");
        sheet.set_cell(3, 2, "x");
        assert_eq!(sheet.max_row(), 3);
        assert_eq!(sheet.max_col(), 2);
        assert_eq!(sheet.cell(3, 2).as_text(), "x");
        assert!(sheet.cell(2, 1).is_empty());
    }

    #[test]
    fn test_append_row_returns_row_number() {
        let mut sheet = Sheet::new("s");
        sheet.set_cell(1, 1, "Name");
        let row = sheet.append_row(vec!["a".into(), "b".into()]);
        assert_eq!(row, 2);
        assert_eq!(sheet.cell(2, 2).as_text(), "b");
    }

    #[test]
    fn test_rows_from_skips_header() {
        let sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["h".into()],
                vec!["one".into()],
                vec!["two".into()],
            ],
        );
        let numbers: Vec<u32> = sheet.rows_from(2).map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_from_rows_drops_trailing_blank_rows() {
        let sheet = Sheet::from_rows(
            "s",
            vec![vec!["h".into()], vec![Cell::Empty, Cell::Text(String::new())]],
        );
        assert_eq!(sheet.max_row(), 1);
    }

    #[test]
    fn test_whitespace_text_is_not_empty() {
        assert!(!Cell::Text("  ".to_string()).is_empty());
        assert!(Cell::Text(String::new()).is_empty());
        assert!(!Cell::Number(0.0).is_empty());
    }

    #[test]
    fn test_number_as_text() {
        assert_eq!(Cell::Number(42.0).as_text(), "42");
        assert_eq!(Cell::Number(1.5).as_text(), "1.5");
        assert_eq!(Cell::Bool(true).as_text(), "TRUE");
        assert_eq!(Cell::DateTime(45000.0).as_text(), "45000");
    }

    #[test]
    fn test_formula_reads_as_cached_value() {
        let cell = Cell::Formula {
            formula: "LEN(A2)".to_string(),
            cached: "5".to_string(),
        };
        assert!(!cell.is_empty());
        assert_eq!(cell.as_text(), "5");
    }

    #[test]
    fn test_set_active_selects_sheet() {
        let mut book = Book::from_sheets(vec![Sheet::new("Notes"), Sheet::new("Index")]);
        book.set_active(1);
        assert_eq!(book.active().name, "Index");
        book.active_mut().set_cell(1, 1, "Name");
        assert!(book.sheets()[0].is_empty());

        book.set_active(7);
        assert_eq!(book.active_index(), 0);
    }

    #[test]
    fn test_book_always_has_active_sheet() {
        let book = Book::from_sheets(Vec::new());
        assert_eq!(book.active().name, DEFAULT_SHEET_NAME);
        assert_eq!(book.sheets().len(), 1);
    }
}
