use crate::data::sheet::Cell;

pub const HEADERS: [&str; 3] = ["Name", "Path", "Description"];
pub const COLUMN_WIDTHS: [f64; 3] = [40.0, 60.0, 60.0];

pub const NAME_COL: u32 = 1;
pub const PATH_COL: u32 = 2;
pub const DESCRIPTION_COL: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub name: String,
    pub path: String,
    pub description: String,
}

impl DocumentRow {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: String::new(),
        }
    }

    pub fn into_cells(self) -> Vec<Cell> {
        vec![
            Cell::Text(self.name),
            Cell::Text(self.path),
            Cell::Text(self.description),
        ]
    }
}
