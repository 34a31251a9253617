use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_DOCS_DIR: &str = "Cleantech - Atacama Salt Lakes SpA";
pub const DEFAULT_STORE_PATH: &str = "Libro7.xlsx";

#[derive(Debug, Clone, Parser)]
#[command(name = "doc-indexer")]
#[command(about = "Update the document index with file names, paths and descriptions")]
#[command(version)]
pub struct Config {
    /// Directory with documents
    #[arg(long = "docs", env = "DOC_INDEX_DOCS", default_value = DEFAULT_DOCS_DIR)]
    pub docs_dir: PathBuf,

    /// Workbook (.xlsx) or .csv file holding the index
    #[arg(long = "excel", env = "DOC_INDEX_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["doc-indexer"]).unwrap();
        assert_eq!(config.docs_dir, PathBuf::from(DEFAULT_DOCS_DIR));
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config =
            Config::try_parse_from(["doc-indexer", "--docs", "/srv/docs", "--excel", "idx.csv"])
                .unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.store_path, PathBuf::from("idx.csv"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Config::try_parse_from(["doc-indexer", "--force"]).is_err());
    }
}
