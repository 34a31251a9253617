use std::process::Command;

fn doc_indexer() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_doc-indexer"));
    command.env_remove("DOC_INDEX_DOCS").env_remove("DOC_INDEX_STORE");
    command.env("RUST_LOG", "info");
    command
}

#[test]
fn test_missing_directory_exits_non_zero_and_reports_once() {
    let root = tempfile::tempdir().unwrap();
    let store = root.path().join("Libro7.xlsx");

    let output = doc_indexer()
        .arg("--docs")
        .arg(root.path().join("missing"))
        .arg("--excel")
        .arg(&store)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("not found").count(), 1, "stderr: {stderr}");
    assert!(!store.exists());
}

#[test]
fn test_successful_run_exits_zero() {
    let root = tempfile::tempdir().unwrap();
    let docs = root.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.txt"), "a").unwrap();
    let store = root.path().join("index.csv");

    let status = doc_indexer()
        .arg("--docs")
        .arg(&docs)
        .arg("--excel")
        .arg(&store)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(store.is_file());
}
