pub mod document_row;
pub mod sync_report;
