//! Build VTF textures out of raster images. Multiple inputs become
//! animation frames.

use std::path::PathBuf;

use vtex::vtf::VTF;

pub fn load_frames(paths: &[PathBuf]) -> Result<(u32, u32, Vec<Vec<u8>>), String> {
    let mut dims = None;
    let mut frames = Vec::with_capacity(paths.len());

    for path in paths {
        let image = image::open(path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?
            .to_rgba8();
        let (w, h) = image.dimensions();
        match dims {
            None => dims = Some((w, h)),
            Some(expected) if expected != (w, h) => {
                return Err(format!(
                    "{} is {w}x{h}, expected {}x{}",
                    path.display(),
                    expected.0,
                    expected.1
                ));
            }
            Some(_) => {}
        }
        frames.push(image.into_raw());
    }

    let (w, h) = dims.ok_or_else(|| "no images selected".to_owned())?;
    Ok((w, h, frames))
}

pub fn generate(paths: &[PathBuf], minor: u32, generate_mips: bool) -> Result<VTF, String> {
    let (w, h, frames) = load_frames(paths)?;
    VTF::from_rgba8(w, h, frames, generate_mips, minor).map_err(|e| e.to_string())
}

/// Display name for a generated document.
pub fn import_name(paths: &[PathBuf]) -> String {
    paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| format!("{}.vtf", s.to_string_lossy()))
        .unwrap_or_else(|| "imported.vtf".to_owned())
}

#[cfg(test)]
mod import_tests {
    use std::path::Path;

    use super::*;

    fn write_png(path: &Path, w: u32, h: u32, value: u8) {
        let image: image::RgbaImage =
            image::ImageBuffer::from_pixel(w, h, image::Rgba([value, value, value, 255]));
        image.save(path).unwrap();
    }

    #[test]
    fn test_generate_animated_vtf() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        write_png(&a, 8, 8, 10);
        write_png(&b, 8, 8, 200);

        let vtf = generate(&[a, b], 4, true).unwrap();
        assert_eq!((vtf.width(), vtf.height()), (8, 8));
        assert_eq!(vtf.frame_count(), 2);
        assert_eq!(vtf.mipmap_count(), 4);
        let (_, _, pixels) = vtf.decode_rgba8(1, 0, 0).unwrap();
        assert_eq!(pixels[0], 200);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        write_png(&a, 8, 8, 0);
        write_png(&b, 4, 4, 0);

        assert!(generate(&[a, b], 4, false).is_err());
    }
}
