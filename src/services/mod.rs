pub mod description_service;
pub mod index_service;
pub mod pdf_service;
