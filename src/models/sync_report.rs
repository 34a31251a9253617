/// Counters for one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub files_seen: usize,
    pub rows_appended: usize,
    pub descriptions_written: usize,
    pub descriptions_kept: usize,
    pub unreadable_pdfs: usize,
    pub total_rows: usize,
}
