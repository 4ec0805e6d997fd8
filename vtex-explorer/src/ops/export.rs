//! Export the active texture to raster images.

use std::path::{Path, PathBuf};

use vtex::vtf::VTF;

/// Writes the texture to `path`. Multi-frame or multi-face textures fan
/// out into `_N`-numbered files; returns how many images were written.
pub fn export_document(vtf: &VTF, path: &Path) -> Result<usize, String> {
    // frames win over faces when both are present, like the original tool
    let (count, by_face) = if vtf.frame_count() > 1 {
        (vtf.frame_count(), false)
    } else if vtf.face_count() > 1 {
        (vtf.face_count(), true)
    } else {
        (1, false)
    };

    for i in 0..count {
        let (frame, face) = if by_face { (0, i) } else { (i, 0) };
        let (w, h, pixels) = vtf
            .decode_rgba8(frame, face, 0)
            .map_err(|e| format!("could not decode image {i}: {e}"))?;

        let image: image::RgbaImage = image::ImageBuffer::from_raw(w, h, pixels)
            .ok_or_else(|| "decoded image has the wrong size".to_owned())?;

        let out = if count > 1 {
            numbered_path(path, i)
        } else {
            path.to_owned()
        };
        image
            .save(&out)
            .map_err(|e| format!("could not save {}: {e}", out.display()))?;
    }

    Ok(count as usize)
}

fn numbered_path(path: &Path, index: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_{index}.{ext}"))
}

#[cfg(test)]
mod export_tests {
    use super::*;

    #[test]
    fn test_single_frame_export() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.png");

        let data = vec![127u8; 4 * 4 * 4];
        let vtf = VTF::from_rgba8(4, 4, vec![data], false, 4).unwrap();
        assert_eq!(export_document(&vtf, &out).unwrap(), 1);
        assert!(out.exists());

        let back = image::open(&out).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (4, 4));
    }

    #[test]
    fn test_animated_export_numbers_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("anim.png");

        let frames = vec![vec![0u8; 4 * 4 * 4], vec![255u8; 4 * 4 * 4]];
        let vtf = VTF::from_rgba8(4, 4, frames, false, 4).unwrap();
        assert_eq!(export_document(&vtf, &out).unwrap(), 2);
        assert!(tmp.path().join("anim_0.png").exists());
        assert!(tmp.path().join("anim_1.png").exists());
        assert!(!out.exists());
    }
}
