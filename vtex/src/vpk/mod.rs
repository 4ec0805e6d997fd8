// Valve Packfile. Handles VPK directory versions 1 and 2.
// https://developer.valvesoftware.com/wiki/VPK_(file_format)#Tree

use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use ahash::AHashMap;

use crate::{
    binaries::BinaryData,
    error::{VtexError, VtexResult},
};

/// First four bytes of every VPK directory file.
pub const VPK_SIGNATURE: u32 = 0x55aa1234;

/// Entry data is stored in the directory file itself rather than a
/// numbered archive.
const ARCHIVE_INLINE: u16 = 0x7fff;

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable)]
struct VPKDirectoryEntry {
    crc: u32,          // A 32bit CRC of the file's data.
    preload_bytes: u16, // The number of bytes contained in the index file.

    // A zero based index of the archive this file's data is contained in.
    // If 0x7fff, the data follows the directory.
    archive_index: u16,

    // If archive_index is 0x7fff, the offset of the file data relative to the end of the directory.
    // Otherwise, the offset of the data from the start of the specified archive.
    entry_offset: u32,

    // If zero, the entire file is stored in the preload data.
    // Otherwise, the number of bytes stored starting at entry_offset.
    entry_length: u32,

    terminator: u16, // = 0xffff
}

impl BinaryData for VPKDirectoryEntry {}

/// One file inside the archive.
pub struct VPKEntry {
    filename: String,
    ext: String,
    path: String,
    entry: VPKDirectoryEntry,
    preload: Option<Vec<u8>>,
}

impl VPKEntry {
    /// File name including extension.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn extension(&self) -> &str {
        &self.ext
    }

    /// Archive-relative path, `dir/name.ext`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn preload(&self) -> Option<&[u8]> {
        self.preload.as_deref()
    }
}

/// A parsed VPK directory: a flat listing of directory paths and the
/// entries under each, in file order.
pub struct VPKDirectory {
    dir_path: PathBuf,
    version: u32,
    data_offset: u64,
    dirs: Vec<(String, Vec<VPKEntry>)>,
    lookup: AHashMap<String, (usize, usize)>,
}

impl VPKDirectory {
    pub fn load(dir_path: PathBuf) -> VtexResult<Self> {
        let file = File::open(&dir_path)?;
        let mut buffer = BufReader::new(file);

        let signature = read_u32(&mut buffer)?;
        if signature != VPK_SIGNATURE {
            return Err(VtexError::Signature {
                expected: "0x55aa1234",
            });
        }
        let version = read_u32(&mut buffer)?;
        let tree_size = read_u32(&mut buffer)?;

        let header_size = match version {
            1 => 12u64,
            2 => {
                // remaining v2 header: section sizes we have no use for
                for _ in 0..4 {
                    read_u32(&mut buffer)?;
                }
                28
            }
            _ => return Err(VtexError::Format("unsupported vpk version")),
        };

        let mut dirs: Vec<(String, Vec<VPKEntry>)> = Vec::new();
        let mut dir_index: AHashMap<String, usize> = AHashMap::new();
        let mut lookup = AHashMap::new();

        loop {
            let ext = read_string(&mut buffer)?;
            if ext.is_empty() {
                break;
            }
            loop {
                let dir = read_string(&mut buffer)?;
                if dir.is_empty() {
                    break;
                }
                // a single space marks the archive root
                let dir = if dir == " " { String::new() } else { dir };

                loop {
                    let name = read_string(&mut buffer)?;
                    if name.is_empty() {
                        break;
                    }

                    let entry = VPKDirectoryEntry::read(&mut buffer)?;
                    let terminator = entry.terminator;
                    if terminator != 0xffff {
                        return Err(VtexError::Format("vpk entry terminator missing"));
                    }

                    let preload = if entry.preload_bytes > 0 {
                        let mut buf = vec![0; entry.preload_bytes as usize];
                        buffer.read_exact(&mut buf[..])?;
                        Some(buf)
                    } else {
                        None
                    };

                    let filename = format!("{name}.{ext}");
                    let path = if dir.is_empty() {
                        filename.clone()
                    } else {
                        format!("{dir}/{filename}")
                    };

                    let slot = *dir_index.entry(dir.clone()).or_insert_with(|| {
                        dirs.push((dir.clone(), Vec::new()));
                        dirs.len() - 1
                    });
                    lookup.insert(path.clone(), (slot, dirs[slot].1.len()));
                    dirs[slot].1.push(VPKEntry {
                        filename,
                        ext: ext.clone(),
                        path,
                        entry,
                        preload,
                    });
                }
            }
        }

        Ok(Self {
            dir_path,
            version,
            data_offset: header_size + tree_size as u64,
            dirs,
            lookup,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir_path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// File name of the directory file, for labels.
    pub fn file_label(&self) -> &str {
        self.dir_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("vpk")
    }

    /// `(directory path, entries)` pairs in file order.
    pub fn directories(&self) -> impl Iterator<Item = (&str, &[VPKEntry])> {
        self.dirs.iter().map(|(d, e)| (d.as_str(), e.as_slice()))
    }

    pub fn entry(&self, path: &str) -> Option<&VPKEntry> {
        let (dir, idx) = *self.lookup.get(path)?;
        Some(&self.dirs[dir].1[idx])
    }

    /// Full contents of an entry: preload bytes plus archive data.
    pub fn read_entry(&self, path: &str) -> VtexResult<Vec<u8>> {
        let entry = self
            .entry(path)
            .ok_or_else(|| VtexError::NotFound(path.to_owned()))?;

        let mut data = entry.preload.clone().unwrap_or_default();

        let info = entry.entry;
        if info.entry_length > 0 {
            let (archive_path, base) = if info.archive_index == ARCHIVE_INLINE {
                (self.dir_path.clone(), self.data_offset)
            } else {
                (self.archive_path(info.archive_index), 0)
            };

            let file = File::open(&archive_path)?;
            let mut buffer = BufReader::new(file);
            buffer.seek(SeekFrom::Start(base + info.entry_offset as u64))?;

            let start = data.len();
            data.resize(start + info.entry_length as usize, 0);
            buffer.read_exact(&mut data[start..])?;
        }

        Ok(data)
    }

    /// Sibling `_NNN.vpk` archive holding entry data for this directory.
    fn archive_path(&self, index: u16) -> PathBuf {
        let mut path = self.dir_path.clone();
        let dir_file = self
            .dir_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.set_file_name(dir_file.replace("_dir", &format!("_{index:0>3}")));
        path
    }
}

fn read_string<R: BufRead>(buffer: &mut R) -> VtexResult<String> {
    let mut string_buf = Vec::new();
    buffer.read_until(0, &mut string_buf)?;
    string_buf.pop();
    Ok(String::from_utf8_lossy(&string_buf).into_owned())
}

fn read_u32<R: Read>(buffer: &mut R) -> VtexResult<u32> {
    let mut bytes = [0; 4];
    buffer.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod vpk_tests {
    use std::io::Write;

    use super::*;

    fn push_cstr(out: &mut Vec<u8>, s: &str) {
        out.extend_from_slice(s.as_bytes());
        out.push(0);
    }

    fn push_entry(out: &mut Vec<u8>, preload: &[u8]) {
        out.extend_from_slice(&0u32.to_le_bytes()); // crc
        out.extend_from_slice(&(preload.len() as u16).to_le_bytes());
        out.extend_from_slice(&ARCHIVE_INLINE.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // offset
        out.extend_from_slice(&0u32.to_le_bytes()); // length
        out.extend_from_slice(&0xffffu16.to_le_bytes());
        out.extend_from_slice(preload);
    }

    /// A minimal v2 directory: two files under materials/, one at the root.
    fn sample_vpk() -> Vec<u8> {
        let mut tree = Vec::new();
        push_cstr(&mut tree, "vtf");
        {
            push_cstr(&mut tree, "materials/metal");
            push_cstr(&mut tree, "fence");
            push_entry(&mut tree, b"fence-bytes");
            push_cstr(&mut tree, "door");
            push_entry(&mut tree, b"door-bytes");
            push_cstr(&mut tree, "");
        }
        {
            push_cstr(&mut tree, " ");
            push_cstr(&mut tree, "root");
            push_entry(&mut tree, b"root-bytes");
            push_cstr(&mut tree, "");
        }
        push_cstr(&mut tree, "");

        let mut out = Vec::new();
        out.extend_from_slice(&VPK_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(tree.len() as u32).to_le_bytes());
        out.extend_from_slice(&[0u8; 16]); // v2 section sizes
        out.extend_from_slice(&tree);
        out
    }

    fn write_temp(bytes: &[u8]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut f = File::create(dir.path().join("pack_dir.vpk")).unwrap();
        f.write_all(bytes).unwrap();
        dir
    }

    #[test]
    fn test_parse_listing() {
        let dir = write_temp(&sample_vpk());
        let vpk = VPKDirectory::load(dir.path().join("pack_dir.vpk")).unwrap();

        assert_eq!(vpk.version(), 2);
        let dirs: Vec<_> = vpk.directories().collect();
        assert_eq!(dirs.len(), 2);
        assert_eq!(dirs[0].0, "materials/metal");
        assert_eq!(dirs[0].1.len(), 2);
        assert_eq!(dirs[0].1[0].filename(), "fence.vtf");
        assert_eq!(dirs[0].1[0].path(), "materials/metal/fence.vtf");
        assert_eq!(dirs[0].1[0].extension(), "vtf");
        assert_eq!(dirs[1].0, "");
        assert_eq!(dirs[1].1[0].filename(), "root.vtf");
    }

    #[test]
    fn test_read_entry_preload() {
        let dir = write_temp(&sample_vpk());
        let vpk = VPKDirectory::load(dir.path().join("pack_dir.vpk")).unwrap();

        let data = vpk.read_entry("materials/metal/door.vtf").unwrap();
        assert_eq!(data, b"door-bytes");
        let data = vpk.read_entry("root.vtf").unwrap();
        assert_eq!(data, b"root-bytes");
        assert!(vpk.read_entry("materials/metal/missing.vtf").is_err());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut bytes = sample_vpk();
        bytes[0] = 0;
        let dir = write_temp(&bytes);
        let err = VPKDirectory::load(dir.path().join("pack_dir.vpk"));
        assert!(matches!(err, Err(VtexError::Signature { .. })));
    }
}
