//! Convert a folder tree of raster images into a mirrored tree of VTFs.
//! A `.animation.txt` marker file turns its folder's images into a single
//! animated texture.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use super::{import, walk_files};

const FRAME_FORMATS: [&str; 6] = ["bmp", "gif", "jpg", "jpeg", "png", "tga"];

#[derive(Default)]
struct SourceFolder {
    is_animation: bool,
    paths: Vec<PathBuf>,
}

pub struct FolderSummary {
    pub written: usize,
    pub failed: usize,
}

pub fn run(import_root: &Path, export_root: &Path, minor: u32, mips: bool) -> FolderSummary {
    // group images by their folder, relative to the import root
    let mut folders: BTreeMap<PathBuf, SourceFolder> = BTreeMap::new();

    for path in walk_files(import_root, &FRAME_FORMATS) {
        let relative_dir = path
            .parent()
            .and_then(|p| p.strip_prefix(import_root).ok())
            .map(Path::to_owned)
            .unwrap_or_default();
        folders.entry(relative_dir).or_default().paths.push(path);
    }
    for path in walk_files(import_root, &["txt"]) {
        if path.file_name().map(|n| n == ".animation.txt").unwrap_or(false) {
            if let Some(dir) = path
                .parent()
                .and_then(|p| p.strip_prefix(import_root).ok())
            {
                folders.entry(dir.to_owned()).or_default().is_animation = true;
            }
        }
    }

    let mut summary = FolderSummary {
        written: 0,
        failed: 0,
    };

    for (relative, mut folder) in folders {
        if folder.paths.is_empty() {
            continue;
        }
        folder.paths.sort();

        let out_dir = export_root.join(&relative);
        if fs::create_dir_all(&out_dir).is_err() {
            log::warn!("could not create {}", out_dir.display());
            summary.failed += 1;
            continue;
        }

        if folder.is_animation {
            let name = vtf_name(&folder.paths[0]);
            match write_vtf(&folder.paths, &out_dir.join(name), minor, mips) {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    log::warn!("{e}");
                    summary.failed += 1;
                }
            }
        } else {
            for path in &folder.paths {
                let name = vtf_name(path);
                match write_vtf(std::slice::from_ref(path), &out_dir.join(name), minor, mips) {
                    Ok(()) => summary.written += 1,
                    Err(e) => {
                        log::warn!("{e}");
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    summary
}

fn vtf_name(image: &Path) -> String {
    format!(
        "{}.vtf",
        image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "texture".to_owned())
    )
}

fn write_vtf(frames: &[PathBuf], out: &Path, minor: u32, mips: bool) -> Result<(), String> {
    let vtf = import::generate(frames, minor, mips)?;
    let file = File::create(out).map_err(|e| format!("{}: {e}", out.display()))?;
    let mut writer = BufWriter::new(file);
    vtf.write(&mut writer)
        .map_err(|e| format!("{}: {e}", out.display()))
}

#[cfg(test)]
mod folders_tests {
    use super::*;

    fn write_png(path: &Path, value: u8) {
        let image: image::RgbaImage =
            image::ImageBuffer::from_pixel(4, 4, image::Rgba([value, value, value, 255]));
        image.save(path).unwrap();
    }

    #[test]
    fn test_mirrored_conversion() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("out");
        fs::create_dir_all(src.join("walls")).unwrap();
        write_png(&src.join("floor.png"), 1);
        write_png(&src.join("walls/brick.png"), 2);
        write_png(&src.join("walls/stone.png"), 3);

        let summary = run(&src, &out, 4, false);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.failed, 0);
        assert!(out.join("floor.vtf").exists());
        assert!(out.join("walls/brick.vtf").exists());
        assert!(out.join("walls/stone.vtf").exists());
    }

    #[test]
    fn test_animation_marker_folds_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("out");
        fs::create_dir_all(src.join("anim")).unwrap();
        write_png(&src.join("anim/frame_0.png"), 0);
        write_png(&src.join("anim/frame_1.png"), 128);
        write_png(&src.join("anim/frame_2.png"), 255);
        fs::write(src.join("anim/.animation.txt"), b"").unwrap();

        let summary = run(&src, &out, 4, false);
        assert_eq!(summary.written, 1);

        let bytes = fs::read(out.join("anim/frame_0.vtf")).unwrap();
        let vtf = vtex::vtf::VTF::read(&mut std::io::BufReader::new(std::io::Cursor::new(bytes)))
            .unwrap();
        assert_eq!(vtf.frame_count(), 3);
    }
}
