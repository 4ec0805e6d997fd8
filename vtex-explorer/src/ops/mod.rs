//! File menu operations. Failures are absorbed into status messages,
//! never propagated to the event loop.

pub mod export;
pub mod folders;
pub mod import;
pub mod version;

use std::{fs, path::Path, path::PathBuf};

/// Recursively collects files whose lowercased extension is in `exts`.
pub fn walk_files(root: &Path, exts: &[&str]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect(root, exts, &mut found);
    found
}

fn collect(dir: &Path, exts: &[&str], found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, exts, found);
        } else if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            if exts.contains(&ext.as_str()) {
                found.push(path);
            }
        }
    }
}

#[cfg(test)]
mod walk_tests {
    use std::fs::{self, File};

    use super::*;

    #[test]
    fn test_walk_is_recursive_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        File::create(tmp.path().join("top.vtf")).unwrap();
        File::create(tmp.path().join("a/mid.VTF")).unwrap();
        File::create(tmp.path().join("a/b/deep.vtf")).unwrap();
        File::create(tmp.path().join("a/b/other.txt")).unwrap();

        let mut files = walk_files(tmp.path(), &["vtf"]);
        files.sort();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f
            .extension()
            .unwrap()
            .to_string_lossy()
            .eq_ignore_ascii_case("vtf")));
    }
}
