use std::path::Path;

use crate::data::sheet::{Book, Cell, Sheet, DEFAULT_SHEET_NAME};
use crate::error::AppError;

pub fn load(path: &Path) -> Result<Book, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::store_format(path, format!("csv open failed: {e}")))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::store_format(path, format!("csv read failed: {e}")))?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(value.to_string())
                }
            })
            .collect();
        rows.push(cells);
    }

    Ok(Book::from_sheets(vec![Sheet::from_rows(
        DEFAULT_SHEET_NAME,
        rows,
    )]))
}

/// CSV has no sheets or widths; only the active sheet's values are written.
pub fn encode(book: &Book, path: &Path) -> Result<Vec<u8>, AppError> {
    if book.sheets().len() > 1 {
        tracing::warn!(
            store = %path.display(),
            dropped = book.sheets().len() - 1,
            "csv store keeps only the active sheet"
        );
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for (_, cells) in book.active().rows_from(1) {
        let fields: Vec<String> = if cells.is_empty() {
            vec![String::new()]
        } else {
            cells.iter().map(|cell| cell.as_text().into_owned()).collect()
        };
        writer
            .write_record(&fields)
            .map_err(|e| AppError::persistence_format(path, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::persistence_format(path, e))
}
