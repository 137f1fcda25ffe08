use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use xzchat::storage::FileStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (FileStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store =
        FileStore::new_with_path(tmp.path()).expect("failed to create file store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
