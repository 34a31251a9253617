use std::collections::HashMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::data::repository;
use crate::data::sheet::{Book, Cell, Sheet};
use crate::error::AppError;
use crate::models::document_row::{
    DocumentRow, COLUMN_WIDTHS, DESCRIPTION_COL, HEADERS, NAME_COL, PATH_COL,
};
use crate::models::sync_report::SyncReport;
use crate::services::description_service::{self, Description};

/// Makes row 1 read `Name | Path | Description`, rewriting only the cells that
/// differ. Header cells past the third column are left alone.
pub fn ensure_headers(sheet: &mut Sheet) {
    for (idx, title) in HEADERS.iter().enumerate() {
        let col = idx as u32 + 1;
        if sheet.cell(1, col) != &Cell::from(*title) {
            sheet.set_cell(1, col, *title);
        }
    }
    for (idx, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(idx as u32 + 1, *width);
    }
}

/// Maps each non-empty path cell (rows 2 and below) to its row number. If a
/// path is listed twice the later row wins.
pub fn index_rows(sheet: &Sheet) -> HashMap<String, u32> {
    let mut existing = HashMap::new();
    for (row, _) in sheet.rows_from(2) {
        let path = sheet.cell(row, PATH_COL);
        if !path.is_empty() {
            existing.insert(path.as_text().into_owned(), row);
        }
    }
    existing
}

pub fn document_rows(sheet: &Sheet) -> Vec<DocumentRow> {
    sheet
        .rows_from(2)
        .map(|(row, _)| DocumentRow {
            name: sheet.cell(row, NAME_COL).as_text().into_owned(),
            path: sheet.cell(row, PATH_COL).as_text().into_owned(),
            description: sheet.cell(row, DESCRIPTION_COL).as_text().into_owned(),
        })
        .collect()
}

/// Merges the files under `docs_dir` into the active sheet of `book`.
pub fn sync_book(book: &mut Book, docs_dir: &Path) -> SyncReport {
    let sheet = book.active_mut();
    ensure_headers(sheet);
    let mut existing = index_rows(sheet);
    let mut report = SyncReport::default();

    let walker = WalkDir::new(docs_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        // `is_file` follows a symlink, so links to regular files count.
        if !path.is_file() {
            continue;
        }
        report.files_seen += 1;

        let Ok(relative) = path.strip_prefix(docs_dir) else {
            continue;
        };
        let relative_path = relative.to_string_lossy().to_string();

        let row = match existing.get(&relative_path).copied() {
            Some(row) => row,
            None => {
                let name = entry.file_name().to_string_lossy().to_string();
                let row = sheet.append_row(DocumentRow::new(name, &relative_path).into_cells());
                tracing::debug!(path = %relative_path, row, "appended row");
                existing.insert(relative_path.clone(), row);
                report.rows_appended += 1;
                row
            }
        };

        if !sheet.cell(row, DESCRIPTION_COL).is_empty() {
            report.descriptions_kept += 1;
            continue;
        }

        let description = description_service::describe_file(path);
        if description == Description::Unreadable {
            report.unreadable_pdfs += 1;
        }
        let description = description.into_text();
        tracing::debug!(path = %relative_path, %description, "wrote description");
        sheet.set_cell(row, DESCRIPTION_COL, description);
        report.descriptions_written += 1;
    }

    report.total_rows = sheet.max_row().saturating_sub(1) as usize;
    report
}

/// One full pass: open (or create) the store, merge the directory into it and
/// save it back over `store_path`.
pub fn synchronize(docs_dir: &Path, store_path: &Path) -> Result<SyncReport, AppError> {
    if !docs_dir.is_dir() {
        return Err(AppError::Configuration(format!(
            "Document directory {} not found",
            docs_dir.display()
        )));
    }

    let (mut book, created) = repository::open_store(store_path)?;
    if created {
        tracing::info!(store = %store_path.display(), "creating new index store");
    } else {
        tracing::info!(
            store = %store_path.display(),
            rows = book.active().max_row(),
            "loaded index store"
        );
    }

    let report = sync_book(&mut book, docs_dir);
    repository::save_store(&book, store_path)?;

    tracing::info!(
        files = report.files_seen,
        appended = report.rows_appended,
        written = report.descriptions_written,
        kept = report.descriptions_kept,
        unreadable = report.unreadable_pdfs,
        rows = report.total_rows,
        "index synchronized"
    );
    Ok(report)
}
