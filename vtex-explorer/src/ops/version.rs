//! Rewrite VTF minor versions, singly or over a folder tree.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use vtex::vtf::VTF;

pub struct VersionSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Rewrites each file to the requested minor version. With a destination,
/// output mirrors the files' layout relative to `base` under `dest`;
/// otherwise files are rewritten in place. Already-current files are
/// skipped unless they are being copied somewhere else.
pub fn run(
    files: &[PathBuf],
    minor: u32,
    destination: Option<(&Path, &Path)>,
) -> VersionSummary {
    let mut summary = VersionSummary {
        converted: 0,
        skipped: 0,
        failed: 0,
    };

    for file in files {
        match convert_one(file, minor, destination) {
            Ok(true) => summary.converted += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                log::warn!("{}: {e}", file.display());
                summary.failed += 1;
            }
        }
    }
    summary
}

fn convert_one(
    file: &Path,
    minor: u32,
    destination: Option<(&Path, &Path)>,
) -> Result<bool, String> {
    let reader = File::open(file).map_err(|e| e.to_string())?;
    let mut vtf = VTF::read(&mut BufReader::new(reader)).map_err(|e| e.to_string())?;

    if vtf.version().1 == minor && destination.is_none() {
        return Ok(false);
    }
    vtf.set_version(minor).map_err(|e| e.to_string())?;

    let out_path = match destination {
        Some((dest, base)) => {
            let relative = match file.strip_prefix(base) {
                Ok(relative) => relative.to_owned(),
                Err(_) => file.file_name().map(PathBuf::from).unwrap_or_default(),
            };
            dest.join(relative)
        }
        None => file.to_owned(),
    };

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let writer = File::create(&out_path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(writer);
    vtf.write(&mut writer).map_err(|e| e.to_string())?;
    Ok(true)
}

#[cfg(test)]
mod version_tests {
    use std::io::Cursor;

    use super::*;

    fn write_vtf(path: &Path, minor: u32) {
        let vtf = VTF::from_rgba8(4, 4, vec![vec![9; 64]], false, minor).unwrap();
        let mut bytes = Vec::new();
        vtf.write(&mut bytes).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn read_version(path: &Path) -> (u32, u32) {
        let bytes = fs::read(path).unwrap();
        let vtf = VTF::read(&mut BufReader::new(Cursor::new(bytes))).unwrap();
        vtf.version()
    }

    #[test]
    fn test_in_place_conversion() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.vtf");
        let b = tmp.path().join("b.vtf");
        write_vtf(&a, 4);
        write_vtf(&b, 1);

        let summary = run(&[a.clone(), b.clone()], 1, None);
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(read_version(&a), (7, 1));
        assert_eq!(read_version(&b), (7, 1));
    }

    #[test]
    fn test_destination_mirrors_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(src.join("sub")).unwrap();
        let a = src.join("sub/a.vtf");
        write_vtf(&a, 4);

        let summary = run(&[a], 5, Some((&dest, &src)));
        assert_eq!(summary.converted, 1);
        assert_eq!(read_version(&dest.join("sub/a.vtf")), (7, 5));
    }

    #[test]
    fn test_invalid_file_counts_as_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("bogus.vtf");
        fs::write(&bogus, b"junk").unwrap();

        let summary = run(&[bogus], 4, None);
        assert_eq!(summary.failed, 1);
    }
}
