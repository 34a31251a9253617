//! Workbook layout that calamine does not expose: the active tab and the
//! custom column widths, read straight from the xlsx package parts.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const MAX_COLUMN: u32 = 16_384;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("package: {0}")]
    Zip(#[from] ZipError),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default, PartialEq)]
pub struct WorkbookLayout {
    /// Position of the selected tab in workbook order.
    pub active_tab: usize,
    /// Custom widths per sheet name, keyed by 1-based column.
    pub column_widths: HashMap<String, BTreeMap<u32, f64>>,
}

pub fn read(path: &Path) -> Result<WorkbookLayout, LayoutError> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
    let mut layout = WorkbookLayout::default();

    let mut sheets: Vec<(String, String)> = Vec::new();
    visit_elements(&mut archive, WORKBOOK_PART, None, |e| {
        match e.local_name().as_ref() {
            b"workbookView" => {
                if let Some(tab) = attribute(e, b"activeTab")? {
                    layout.active_tab = tab.parse().unwrap_or(0);
                }
            }
            b"sheet" => {
                if let (Some(name), Some(rel_id)) = (attribute(e, b"name")?, attribute(e, b"id")?) {
                    sheets.push((name, rel_id));
                }
            }
            _ => {}
        }
        Ok(())
    })?;

    let mut targets: HashMap<String, String> = HashMap::new();
    visit_elements(&mut archive, WORKBOOK_RELS_PART, None, |e| {
        if e.local_name().as_ref() == b"Relationship" {
            if let (Some(id), Some(target)) = (attribute(e, b"Id")?, attribute(e, b"Target")?) {
                targets.insert(id, part_name(&target));
            }
        }
        Ok(())
    })?;

    for (name, rel_id) in sheets {
        let Some(part) = targets.get(&rel_id) else {
            continue;
        };
        let mut widths = BTreeMap::new();
        // <cols> always precedes <sheetData>, so the cell data is never parsed.
        visit_elements(&mut archive, part, Some(b"sheetData".as_slice()), |e| {
            if e.local_name().as_ref() == b"col" {
                read_column(e, &mut widths)?;
            }
            Ok(())
        })?;
        if !widths.is_empty() {
            layout.column_widths.insert(name, widths);
        }
    }

    Ok(layout)
}

fn read_column(e: &BytesStart<'_>, widths: &mut BTreeMap<u32, f64>) -> Result<(), LayoutError> {
    let custom = attribute(e, b"customWidth")?.is_some_and(|v| v == "1" || v == "true");
    if !custom {
        return Ok(());
    }
    let number = |value: Option<String>| value.and_then(|v| v.parse::<f64>().ok());
    let (Some(min), Some(max), Some(width)) = (
        number(attribute(e, b"min")?),
        number(attribute(e, b"max")?),
        number(attribute(e, b"width")?),
    ) else {
        return Ok(());
    };

    let first = (min as u32).max(1);
    let last = (max as u32).min(MAX_COLUMN);
    for col in first..=last {
        widths.insert(col, user_width(width));
    }
    Ok(())
}

/// Converts a stored `<col width>` (which includes cell padding) back to the
/// character width a writer is given, for Calibri 11 metrics.
pub fn user_width(stored: f64) -> f64 {
    let pixels = (stored * 7.0).round();
    if pixels >= 12.0 {
        (pixels - 5.0) / 7.0
    } else {
        pixels / 12.0
    }
}

/// Relationship targets are relative to `xl/` unless they start with `/`.
fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, LayoutError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == key {
            // `unescape_value` is unavailable when quick-xml's `encoding`
            // feature is on (calamine enables it); this is its body.
            let raw = std::str::from_utf8(&attr.value).map_err(quick_xml::Error::from)?;
            let value = quick_xml::escape::unescape(raw).map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Calls `visit` for each opening element of `part` until `stop_at` or the
/// end of the part. A missing part is not an error.
fn visit_elements<R, F>(
    archive: &mut ZipArchive<R>,
    part: &str,
    stop_at: Option<&[u8]>,
    mut visit: F,
) -> Result<(), LayoutError>
where
    R: Read + Seek,
    F: FnMut(&BytesStart<'_>) -> Result<(), LayoutError>,
{
    let file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = Reader::from_reader(BufReader::new(file));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if stop_at.is_some_and(|stop| e.local_name().as_ref() == stop) {
                    break;
                }
                visit(e)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}
