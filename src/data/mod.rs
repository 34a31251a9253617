pub mod csv_store;
pub mod repository;
pub mod sheet;
pub mod xlsx_layout;
pub mod xlsx_store;
