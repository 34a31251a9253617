use std::fs;
use std::io::Write;
use std::path::Path;

use crate::data::sheet::Book;
use crate::data::{csv_store, xlsx_store};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Workbook,
    Csv,
}

impl StoreKind {
    pub fn for_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            StoreKind::Csv
        } else {
            StoreKind::Workbook
        }
    }
}

/// Loads the store at `path`, or returns a fresh empty book when nothing is
/// there yet. The flag is true when the book was created.
pub fn open_store(path: &Path) -> Result<(Book, bool), AppError> {
    if !path.exists() {
        return Ok((Book::new(), true));
    }
    if !path.is_file() {
        return Err(AppError::store_format(path, "not a regular file"));
    }

    let book = match StoreKind::for_path(path) {
        StoreKind::Workbook => xlsx_store::load(path)?,
        StoreKind::Csv => csv_store::load(path)?,
    };
    Ok((book, false))
}

pub fn save_store(book: &Book, path: &Path) -> Result<(), AppError> {
    let bytes = match StoreKind::for_path(path) {
        StoreKind::Workbook => xlsx_store::encode(book, path)?,
        StoreKind::Csv => csv_store::encode(book, path)?,
    };
    write_atomically(path, &bytes)
}

/// Writes into a sibling temp file and renames it over `path`, so readers
/// see either the old store or the new one.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(AppError::persistence(path, e)),
    };

    // A rename would silently replace a read-only store; refuse instead.
    if let Some(meta) = &existing {
        if meta.permissions().readonly() {
            return Err(AppError::persistence(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "destination is read-only",
                ),
            ));
        }
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".doc-index-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| AppError::persistence(path, e))?;

    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| AppError::persistence(path, e))?;

    let permissions = match &existing {
        Some(meta) => meta.permissions(),
        None => default_permissions(tmp.as_file())?,
    };
    fs::set_permissions(tmp.path(), permissions).map_err(|e| AppError::persistence(path, e))?;

    tmp.persist(path)
        .map_err(|e| AppError::persistence(path, e.error))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions(_file: &fs::File) -> Result<fs::Permissions, AppError> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(file: &fs::File) -> Result<fs::Permissions, AppError> {
    Ok(file.metadata()?.permissions())
}
