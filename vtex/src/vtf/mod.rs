// Valve Texture Format

pub mod consts;
pub mod convert;
pub mod header;

use std::{
    fmt,
    io::{BufReader, Read, Seek, Write},
    mem,
};

use flagset::FlagSet;

use crate::{
    binaries::BinaryData,
    error::{VtexError, VtexResult},
};

use self::{
    consts::{ImageFormat, TextureFlags},
    header::{
        ResourceEntryInfo, VTFHeader, VTFHeader73, RSRC_NO_DATA_CHUNK, TAG_CRC, TAG_HIGH_RES,
        TAG_KVD, TAG_LOD, TAG_LOW_RES, TAG_SHEET, TAG_TSO, VTF_SIGNATURE,
    },
};

/// A loaded VTF file: headers, thumbnail and per-mip image blocks.
///
/// Mip blocks are indexed largest-first; each block packs all
/// frames * faces images for that level, in on-disk order.
pub struct VTF {
    header: VTFHeader,
    header_73: Option<VTFHeader73>,
    resources: Vec<ResourceEntryInfo>,
    low_res_data: Vec<u8>,
    high_res_data: Vec<Vec<u8>>,
}

impl fmt::Debug for VTF {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, ".vtf: {:?}", self.header)?;
        write!(f, " 7.3 data: {:?}", self.header_73)
    }
}

impl VTF {
    pub fn width(&self) -> u32 {
        self.header.width as u32
    }
    pub fn height(&self) -> u32 {
        self.header.height as u32
    }
    pub fn format(&self) -> ImageFormat {
        self.header.high_res_image_format
    }
    pub fn low_res_format(&self) -> ImageFormat {
        self.header.low_res_image_format
    }
    pub fn frame_count(&self) -> u32 {
        (self.header.frames as u32).max(1)
    }
    pub fn start_frame(&self) -> u32 {
        let first = self.header.first_frame;
        if first == u16::MAX {
            0
        } else {
            first as u32
        }
    }
    pub fn face_count(&self) -> u32 {
        if self.flags().contains(TextureFlags::ENVMAP) {
            6
        } else {
            1
        }
    }
    pub fn mipmap_count(&self) -> u32 {
        self.header.mipmap_count as u32
    }
    pub fn depth(&self) -> u32 {
        self.header_73.map(|h| (h.depth as u32).max(1)).unwrap_or(1)
    }
    pub fn version(&self) -> (u32, u32) {
        let v = self.header.version;
        (v[0], v[1])
    }
    pub fn reflectivity(&self) -> [f32; 3] {
        self.header.reflectivity
    }
    pub fn bumpmap_scale(&self) -> f32 {
        self.header.bumpmap_scale
    }
    pub fn resources(&self) -> &[ResourceEntryInfo] {
        &self.resources
    }
    pub fn flags(&self) -> FlagSet<TextureFlags> {
        FlagSet::new_truncated(self.header.flags)
    }

    pub fn set_flag(&mut self, flag: TextureFlags, on: bool) {
        let mut flags = self.header.flags;
        if on {
            flags |= flag as u32;
        } else {
            flags &= !(flag as u32);
        }
        self.header.flags = flags;
    }

    pub fn set_start_frame(&mut self, frame: u32) {
        self.header.first_frame = frame.min(self.frame_count().saturating_sub(1)) as u16;
    }

    pub fn set_version(&mut self, minor: u32) -> VtexResult<()> {
        if minor > 5 {
            return Err(VtexError::Unsupported(7, minor));
        }
        self.header.version = [7, minor];
        if minor >= 2 && self.header_73.is_none() {
            let mut h: VTFHeader73 = bytemuck::Zeroable::zeroed();
            h.depth = 1;
            self.header_73 = Some(h);
        }
        Ok(())
    }

    pub fn mip_dims(&self, mip: u32) -> (u32, u32) {
        (
            (self.width() >> mip).max(1),
            (self.height() >> mip).max(1),
        )
    }

    /// Total bytes of image payload held in memory.
    pub fn data_size(&self) -> usize {
        self.low_res_data.len() + self.high_res_data.iter().map(Vec::len).sum::<usize>()
    }

    /// Raw bytes of one image, in the stored format.
    pub fn face_data(&self, frame: u32, face: u32, mip: u32) -> Option<&[u8]> {
        let (w, h) = self.mip_dims(mip);
        let size = self
            .format()
            .bytes_for_size(w as usize, h as usize, 0);
        let index = (frame * self.face_count() + face) as usize * size;
        self.high_res_data
            .get(mip as usize)?
            .get(index..index + size)
    }

    /// One image converted to RGBA8888, with its mip dimensions.
    pub fn decode_rgba8(&self, frame: u32, face: u32, mip: u32) -> VtexResult<(u32, u32, Vec<u8>)> {
        let (w, h) = self.mip_dims(mip);
        let data = self
            .face_data(frame, face, mip)
            .ok_or(VtexError::Format("no image data for the requested frame"))?;
        let rgba = convert::decode_to_rgba8(self.format(), data, w as usize, h as usize)?;
        Ok((w, h, rgba))
    }

    /// The thumbnail converted to RGBA8888, when the file carries one.
    pub fn decode_low_res(&self) -> VtexResult<(u32, u32, Vec<u8>)> {
        let w = self.header.low_res_image_width as usize;
        let h = self.header.low_res_image_height as usize;
        if self.low_res_data.is_empty() || w == 0 || h == 0 {
            return Err(VtexError::Format("no thumbnail data"));
        }
        let rgba = convert::decode_to_rgba8(self.low_res_format(), &self.low_res_data, w, h)?;
        Ok((w as u32, h as u32, rgba))
    }

    pub fn read<R: Read + Seek>(buffer: &mut BufReader<R>) -> VtexResult<Self> {
        let mut data_read = 0i64;

        let header = VTFHeader::read(buffer)?;
        data_read += mem::size_of::<VTFHeader>() as i64;

        let signature = header.signature;
        if signature != VTF_SIGNATURE {
            return Err(VtexError::Signature { expected: "VTF\\0" });
        }
        let version = header.version;
        if version[0] != 7 || version[1] > 5 {
            return Err(VtexError::Unsupported(version[0], version[1]));
        }
        if header.width >= 4096 || header.height >= 4096 {
            return Err(VtexError::Format("texture dimensions out of range"));
        }

        let header_size = header.header_size as i64;

        let header_73 = if version[1] >= 2 {
            let h = VTFHeader73::read(buffer)?;
            data_read += mem::size_of::<VTFHeader73>() as i64;
            Some(h)
        } else {
            None
        };

        let num_resources = if version[1] >= 3 {
            header_73.map(|h| h.num_resources as usize).unwrap_or(0)
        } else {
            0
        };

        let mut resources = Vec::with_capacity(num_resources);
        for _ in 0..num_resources {
            resources.push(ResourceEntryInfo::read(buffer)?);
            data_read += mem::size_of::<ResourceEntryInfo>() as i64;
        }

        let remaining_header = header_size - data_read;
        if remaining_header > 0 {
            log::warn!(
                "not all header has been read, skipping {} bytes",
                remaining_header
            );
            buffer.seek_relative(remaining_header)?;
            data_read += remaining_header;
        }

        let mut tex = Self {
            header,
            header_73,
            resources,
            low_res_data: Vec::new(),
            high_res_data: Vec::new(),
        };

        if num_resources > 0 {
            for entry in tex.resources.clone() {
                if entry.flags & RSRC_NO_DATA_CHUNK > 0 {
                    continue;
                }

                let dist = entry.offset as i64 - data_read;
                buffer.seek_relative(dist)?;
                data_read = entry.offset as i64;

                match entry.tag {
                    TAG_LOW_RES => {
                        tex.low_res_data = read_low_res(&header, buffer)?;
                        data_read += tex.low_res_data.len() as i64;
                    }
                    TAG_HIGH_RES => {
                        let (blocks, read) = read_high_res(&header, buffer)?;
                        tex.high_res_data = blocks;
                        data_read += read;
                    }
                    TAG_SHEET | TAG_CRC | TAG_LOD | TAG_TSO | TAG_KVD => (),
                    tag => {
                        log::warn!("skipping unknown vtf resource tag {:?}", tag);
                    }
                }
            }
        } else {
            tex.low_res_data = read_low_res(&header, buffer)?;
            let (blocks, _) = read_high_res(&header, buffer)?;
            tex.high_res_data = blocks;
        }

        Ok(tex)
    }

    pub fn write<W: Write>(&self, out: &mut W) -> VtexResult<()> {
        let minor = self.version().1;
        let has_low_res =
            !self.low_res_data.is_empty() && self.low_res_format() != ImageFormat::NONE;

        let mut resources: Vec<ResourceEntryInfo> = Vec::new();
        if minor >= 3 {
            if has_low_res {
                resources.push(ResourceEntryInfo {
                    tag: TAG_LOW_RES,
                    flags: 0,
                    offset: 0,
                });
            }
            resources.push(ResourceEntryInfo {
                tag: TAG_HIGH_RES,
                flags: 0,
                offset: 0,
            });
        }

        let header_size: u32 = match minor {
            0 | 1 => 64,
            2 => 80,
            _ => 80 + 8 * resources.len() as u32,
        };

        let mut offset = header_size;
        for entry in &mut resources {
            entry.offset = offset;
            if entry.tag == TAG_LOW_RES {
                offset += self.low_res_data.len() as u32;
            }
        }

        let mut header = self.header;
        header.header_size = header_size;
        header.write(out).map_err(VtexError::Io)?;

        if minor >= 2 {
            let mut h73 = self.header_73.unwrap_or_else(|| {
                let mut h: VTFHeader73 = bytemuck::Zeroable::zeroed();
                h.depth = 1;
                h
            });
            h73.num_resources = if minor >= 3 { resources.len() as u32 } else { 0 };
            h73.write(out).map_err(VtexError::Io)?;
        } else {
            // 7.0/7.1 headers are padded out to 64 bytes
            out.write_all(&[0u8]).map_err(VtexError::Io)?;
        }

        for entry in &resources {
            entry.write(out).map_err(VtexError::Io)?;
        }

        if has_low_res {
            out.write_all(&self.low_res_data).map_err(VtexError::Io)?;
        }
        // mips are stored smallest to largest
        for block in self.high_res_data.iter().rev() {
            out.write_all(block).map_err(VtexError::Io)?;
        }
        Ok(())
    }

    /// Build an RGBA8888 texture from decoded raster frames, for imports.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        frames: Vec<Vec<u8>>,
        generate_mips: bool,
        minor: u32,
    ) -> VtexResult<Self> {
        if frames.is_empty() {
            return Err(VtexError::Format("no image data"));
        }
        let frame_size = (width * height * 4) as usize;
        if frames.iter().any(|f| f.len() != frame_size) {
            return Err(VtexError::Format("frame size does not match dimensions"));
        }

        let mip_count = if generate_mips {
            32 - width.max(height).leading_zeros()
        } else {
            1
        };

        // per-frame mip chains, then regroup by level
        let mut chains: Vec<Vec<Vec<u8>>> = Vec::with_capacity(frames.len());
        for frame in &frames {
            let mut chain = vec![frame.clone()];
            let (mut w, mut h) = (width as usize, height as usize);
            for _ in 1..mip_count {
                let (nw, nh, next) = convert::shrink_rgba8(chain.last().unwrap(), w, h);
                chain.push(next);
                w = nw;
                h = nh;
            }
            chains.push(chain);
        }

        let mut high_res_data = Vec::with_capacity(mip_count as usize);
        for mip in 0..mip_count as usize {
            let mut block = Vec::new();
            for chain in &chains {
                block.extend_from_slice(&chain[mip]);
            }
            high_res_data.push(block);
        }

        let mut reflectivity = [0f32; 3];
        for texel in frames[0].chunks(4) {
            for ch in 0..3 {
                reflectivity[ch] += texel[ch] as f32 / 255.0;
            }
        }
        let texels = (width * height) as f32;
        reflectivity.iter_mut().for_each(|c| *c /= texels);

        let mut header: VTFHeader = bytemuck::Zeroable::zeroed();
        header.signature = VTF_SIGNATURE;
        header.version = [7, minor];
        header.width = width as u16;
        header.height = height as u16;
        header.frames = frames.len() as u16;
        header.first_frame = 0;
        header.reflectivity = reflectivity;
        header.bumpmap_scale = 1.0;
        header.high_res_image_format = ImageFormat::RGBA8888;
        header.mipmap_count = mip_count as u8;
        header.low_res_image_format = ImageFormat::NONE;
        if !generate_mips {
            header.flags = TextureFlags::NOMIP as u32 | TextureFlags::NOLOD as u32;
        }

        let mut tex = Self {
            header,
            header_73: None,
            resources: Vec::new(),
            low_res_data: Vec::new(),
            high_res_data,
        };
        tex.set_version(minor)?;
        Ok(tex)
    }
}

fn read_low_res<R: Read + Seek>(
    header: &VTFHeader,
    buffer: &mut BufReader<R>,
) -> VtexResult<Vec<u8>> {
    let low_res_image_format = header.low_res_image_format;
    if low_res_image_format == ImageFormat::NONE {
        return Ok(Vec::new());
    }
    let low_res_size = low_res_image_format.bytes_for_size(
        header.low_res_image_width as usize,
        header.low_res_image_height as usize,
        0,
    );

    let mut low_res_data = vec![0; low_res_size];
    buffer.read_exact(&mut low_res_data[..])?;
    Ok(low_res_data)
}

fn read_high_res<R: Read + Seek>(
    header: &VTFHeader,
    buffer: &mut BufReader<R>,
) -> VtexResult<(Vec<Vec<u8>>, i64)> {
    let mips = header.mipmap_count as usize;
    let frames = header.frames.max(1) as usize;
    let faces = if header.flags & TextureFlags::ENVMAP as u32 != 0 {
        6
    } else {
        1
    };
    let format = header.high_res_image_format;

    let mut high_res_data = vec![Vec::new(); mips];
    let mut read = 0i64;

    // mips are stored smallest to largest; index 0 is the largest level
    for mip_level in (0..mips).rev() {
        let size = format.bytes_for_size(header.width as usize, header.height as usize, mip_level)
            * frames
            * faces;
        let mut block = vec![0; size];
        buffer.read_exact(&mut block[..])?;
        read += size as i64;
        high_res_data[mip_level] = block;
    }
    Ok((high_res_data, read))
}

#[cfg(test)]
mod vtf_tests {
    use std::io::{BufReader, Cursor};

    use super::*;

    fn checkerboard(width: u32, height: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let texel = if (x + y) % 2 == 0 { a } else { b };
                data.extend_from_slice(&texel);
            }
        }
        data
    }

    fn roundtrip(tex: &VTF) -> VTF {
        let mut bytes = Vec::new();
        tex.write(&mut bytes).unwrap();
        VTF::read(&mut BufReader::new(Cursor::new(bytes))).unwrap()
    }

    #[test]
    fn test_roundtrip_7_4() {
        let data = checkerboard(8, 4, [255, 0, 0, 255], [0, 0, 255, 255]);
        let tex = VTF::from_rgba8(8, 4, vec![data.clone()], true, 4).unwrap();
        assert_eq!(tex.mipmap_count(), 4);

        let back = roundtrip(&tex);
        assert_eq!(back.version(), (7, 4));
        assert_eq!((back.width(), back.height()), (8, 4));
        assert_eq!(back.frame_count(), 1);
        assert_eq!(back.format(), ImageFormat::RGBA8888);
        let (w, h, rgba) = back.decode_rgba8(0, 0, 0).unwrap();
        assert_eq!((w, h), (8, 4));
        assert_eq!(rgba, data);
    }

    #[test]
    fn test_roundtrip_legacy_versions() {
        for minor in [0, 1, 2] {
            let data = checkerboard(4, 4, [1, 2, 3, 4], [5, 6, 7, 8]);
            let tex = VTF::from_rgba8(4, 4, vec![data.clone()], false, minor).unwrap();
            let back = roundtrip(&tex);
            assert_eq!(back.version(), (7, minor));
            assert_eq!(back.mipmap_count(), 1);
            assert_eq!(back.decode_rgba8(0, 0, 0).unwrap().2, data);
        }
    }

    #[test]
    fn test_version_change_roundtrip() {
        let data = checkerboard(4, 4, [9, 9, 9, 9], [0, 0, 0, 0]);
        let mut tex = VTF::from_rgba8(4, 4, vec![data.clone()], false, 4).unwrap();
        tex.set_version(1).unwrap();
        let back = roundtrip(&tex);
        assert_eq!(back.version(), (7, 1));
        assert_eq!(back.decode_rgba8(0, 0, 0).unwrap().2, data);

        assert!(tex.set_version(6).is_err());
    }

    #[test]
    fn test_animation_frames() {
        let red = checkerboard(4, 4, [255, 0, 0, 255], [255, 0, 0, 255]);
        let blue = checkerboard(4, 4, [0, 0, 255, 255], [0, 0, 255, 255]);
        let tex = VTF::from_rgba8(4, 4, vec![red.clone(), blue.clone()], false, 4).unwrap();
        assert_eq!(tex.frame_count(), 2);

        let back = roundtrip(&tex);
        assert_eq!(back.frame_count(), 2);
        assert_eq!(back.decode_rgba8(0, 0, 0).unwrap().2, red);
        assert_eq!(back.decode_rgba8(1, 0, 0).unwrap().2, blue);
        assert!(back.face_data(2, 0, 0).is_none());
    }

    #[test]
    fn test_flags_roundtrip() {
        let data = checkerboard(4, 4, [1, 1, 1, 1], [2, 2, 2, 2]);
        let mut tex = VTF::from_rgba8(4, 4, vec![data], false, 4).unwrap();
        tex.set_flag(TextureFlags::CLAMPS, true);
        tex.set_flag(TextureFlags::CLAMPT, true);

        let back = roundtrip(&tex);
        assert!(back.flags().contains(TextureFlags::CLAMPS));
        assert!(back.flags().contains(TextureFlags::CLAMPT));
        assert!(!back.flags().contains(TextureFlags::POINTSAMPLE));
    }

    #[test]
    fn test_bad_signature_rejected() {
        let bytes = vec![0u8; 128];
        let err = VTF::read(&mut BufReader::new(Cursor::new(bytes)));
        assert!(matches!(err, Err(VtexError::Signature { .. })));
    }
}
