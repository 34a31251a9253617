use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, open_workbook_auto, Data, Reader, SheetVisible, Xlsx};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet, XlsxError};

use crate::data::sheet::{Book, Cell, MergedRange, Sheet};
use crate::data::xlsx_layout;
use crate::error::AppError;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const TIME_FORMAT: &str = "hh:mm:ss";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(text) if text.is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => Cell::Duration(dt.as_f64()),
        Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
        other => Cell::Text(other.to_string()),
    }
}

fn read_sheets<R>(workbook: &mut R, path: &Path) -> Result<Vec<Sheet>, AppError>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    let metadata = workbook.sheets_metadata().to_owned();
    let mut sheets = Vec::with_capacity(metadata.len());

    for info in metadata {
        let sheet_err =
            |e: R::Error| AppError::store_format(path, format!("sheet '{}': {e}", info.name));
        let range = workbook.worksheet_range(&info.name).map_err(sheet_err)?;
        let formulas = workbook.worksheet_formula(&info.name).map_err(sheet_err)?;

        // calamine ranges start at the first used cell, not at A1.
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row as usize];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; start_col as usize];
            cells.extend(row.iter().map(cell_from_data));
            rows.push(cells);
        }

        let mut sheet = Sheet::from_rows(info.name.as_str(), rows);
        sheet.hidden = info.visible != SheetVisible::Visible;

        let (formula_row, formula_col) = formulas.start().unwrap_or((0, 0));
        for (r, c, formula) in formulas.used_cells() {
            let row = formula_row + r as u32 + 1;
            let col = formula_col + c as u32 + 1;
            let cached = sheet.cell(row, col).as_text().into_owned();
            sheet.set_cell(
                row,
                col,
                Cell::Formula {
                    formula: formula.clone(),
                    cached,
                },
            );
        }

        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Adds what only the xlsx reader exposes: merged ranges, custom column
/// widths and the selected tab.
fn read_xlsx(workbook: &mut Xlsx<BufReader<File>>, path: &Path) -> Result<Book, AppError> {
    let mut sheets = read_sheets(workbook, path)?;

    for sheet in &mut sheets {
        let Some(regions) = workbook.worksheet_merge_cells(&sheet.name) else {
            continue;
        };
        let regions = regions
            .map_err(|e| AppError::store_format(path, format!("sheet '{}': {e}", sheet.name)))?;
        for dims in regions {
            sheet.add_merged_range(MergedRange {
                first_row: dims.start.0 + 1,
                first_col: dims.start.1 + 1,
                last_row: dims.end.0 + 1,
                last_col: dims.end.1 + 1,
            });
        }
    }

    let layout = xlsx_layout::read(path).map_err(|e| AppError::store_format(path, e))?;
    for sheet in &mut sheets {
        if let Some(widths) = layout.column_widths.get(&sheet.name) {
            for (col, width) in widths {
                sheet.set_column_width(*col, *width);
            }
        }
    }

    let mut book = Book::from_sheets(sheets);
    book.set_active(layout.active_tab);
    Ok(book)
}

/// Opens the store as xlsx (what `save` writes), then falls back to
/// calamine's own format sniffing for xls/xlsb/ods files.
pub fn load(path: &Path) -> Result<Book, AppError> {
    match open_workbook::<Xlsx<BufReader<File>>, _>(path) {
        Ok(mut workbook) => read_xlsx(&mut workbook, path),
        Err(xlsx_err) => {
            let mut workbook = open_workbook_auto(path)
                .map_err(|e| AppError::store_format(path, format!("{xlsx_err}; {e}")))?;
            Ok(Book::from_sheets(read_sheets(&mut workbook, path)?))
        }
    }
}

fn date_format(serial: f64) -> Format {
    let pattern = if serial.fract() == 0.0 {
        DATE_FORMAT
    } else if serial < 1.0 {
        TIME_FORMAT
    } else {
        DATETIME_FORMAT
    };
    Format::new().set_num_format(pattern)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) if text.is_empty() => {}
        Cell::Text(text) => {
            worksheet.write_string(row, col, text.as_str())?;
        }
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Cell::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, &date_format(*serial))?;
        }
        Cell::Duration(serial) => {
            let format = Format::new().set_num_format(DURATION_FORMAT);
            worksheet.write_number_with_format(row, col, *serial, &format)?;
        }
        Cell::Formula { formula, cached } => {
            worksheet.write_formula(row, col, Formula::new(formula).set_result(cached.as_str()))?;
        }
    }
    Ok(())
}

/// Encodes the book as an xlsx document. Values, formulas, date formats,
/// sheet names and order, hidden sheets, the active tab, merged ranges and
/// custom column widths survive. Cell styling and hyperlinks do not.
pub fn encode(book: &Book, path: &Path) -> Result<Vec<u8>, AppError> {
    let encode_err = |e: XlsxError| AppError::persistence_format(path, e);
    let mut workbook = Workbook::new();

    for (idx, sheet) in book.sheets().iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str()).map_err(encode_err)?;
        if idx == book.active_index() {
            worksheet.set_active(true);
        } else if sheet.hidden {
            worksheet.set_hidden(true);
        }

        // Merges go first; the anchor cell is then rewritten with its value.
        for merged in sheet.merged_ranges() {
            worksheet
                .merge_range(
                    merged.first_row - 1,
                    (merged.first_col - 1) as u16,
                    merged.last_row - 1,
                    (merged.last_col - 1) as u16,
                    "",
                    &Format::new(),
                )
                .map_err(encode_err)?;
        }

        for (row_number, cells) in sheet.rows_from(1) {
            for (col_idx, cell) in cells.iter().enumerate() {
                write_cell(worksheet, row_number - 1, col_idx as u16, cell).map_err(encode_err)?;
            }
        }

        for (col, width) in sheet.column_widths() {
            worksheet
                .set_column_width((col - 1) as u16, width)
                .map_err(encode_err)?;
        }
    }

    workbook.save_to_buffer().map_err(encode_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_book(book: &Book, path: &Path) {
        let bytes = encode(book, path).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_encode_then_load_keeps_values_and_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.xlsx");

        let mut index = Sheet::new("Index");
        index.set_cell(1, 1, "Name");
        index.set_cell(1, 4, "Owner");
        index.set_cell(2, 1, "a.pdf");
        index.set_cell(2, 4, Cell::Number(7.0));
        index.set_cell(3, 2, Cell::Bool(true));
        index.set_column_width(1, 40.0);
        let mut notes = Sheet::new("Notes");
        notes.set_cell(1, 1, "keep this sheet");
        write_book(&Book::from_sheets(vec![index, notes]), &path);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.sheets().len(), 2);
        let active = loaded.active();
        assert_eq!(active.name, "Index");
        assert_eq!(active.cell(1, 4).as_text(), "Owner");
        assert_eq!(active.cell(2, 4), &Cell::Number(7.0));
        assert_eq!(active.cell(3, 2), &Cell::Bool(true));
        assert_eq!(active.column_width(1), Some(40.0));
        assert_eq!(loaded.sheets()[1].cell(1, 1).as_text(), "keep this sheet");
    }

    #[test]
    fn test_load_offsets_range_not_starting_at_a1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut sheet = Sheet::new("Sheet1");
        sheet.set_cell(3, 2, "B3");
        write_book(&Book::from_sheets(vec![sheet]), &path);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.active().cell(3, 2).as_text(), "B3");
        assert!(loaded.active().cell(1, 1).is_empty());
    }

    #[test]
    fn test_formulas_and_dates_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hand_edited.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(1, 0, "a.pdf").unwrap();
        worksheet
            .write_formula(1, 3, Formula::new("=LEN(A2)").set_result("5"))
            .unwrap();
        let date = Format::new().set_num_format(DATE_FORMAT);
        worksheet.write_number_with_format(1, 4, 45000.0, &date).unwrap();
        workbook.save(&path).unwrap();

        let book = load(&path).unwrap();
        assert_eq!(
            book.active().cell(2, 4),
            &Cell::Formula {
                formula: "LEN(A2)".to_string(),
                cached: "5".to_string(),
            }
        );
        assert_eq!(book.active().cell(2, 5), &Cell::DateTime(45000.0));

        write_book(&book, &path);
        let mut reopened: Xlsx<_> = open_workbook(&path).unwrap();
        let formulas = reopened.worksheet_formula("Sheet1").unwrap();
        assert_eq!(formulas.get_value((1, 3)).map(String::as_str), Some("LEN(A2)"));
        assert_eq!(load(&path).unwrap(), book);
    }

    #[test]
    fn test_layout_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.xlsx");

        let mut notes = Sheet::new("Notes");
        notes.set_cell(1, 1, "merged title");
        notes.add_merged_range(MergedRange {
            first_row: 1,
            first_col: 1,
            last_row: 1,
            last_col: 3,
        });
        let mut index = Sheet::new("Index");
        index.set_cell(1, 1, "Name");
        index.set_column_width(4, 25.0);
        let mut archive = Sheet::new("Archive");
        archive.hidden = true;
        archive.set_cell(1, 1, "old");
        let mut book = Book::from_sheets(vec![notes, index, archive]);
        book.set_active(1);
        write_book(&book, &path);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.active().name, "Index");
        assert_eq!(loaded.active().column_width(4), Some(25.0));
        assert!(loaded.sheets()[2].hidden);
        assert_eq!(
            loaded.sheets()[0].merged_ranges(),
            &[MergedRange {
                first_row: 1,
                first_col: 1,
                last_row: 1,
                last_col: 3,
            }]
        );
        assert_eq!(loaded.sheets()[0].cell(1, 1).as_text(), "merged title");
    }

    #[test]
    fn test_load_rejects_non_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, AppError::StoreFormat { .. }));
    }
}
