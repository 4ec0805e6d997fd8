use bytemuck::{Pod, Zeroable};
use flagset::{flags, FlagSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum ImageFormat {
    NONE = -1,
    RGBA8888 = 0,
    ABGR8888,
    RGB888,
    BGR888,
    RGB565,
    I8,
    IA88,
    P8,
    A8,
    RGB888BLUESCREEN,
    BGR888BLUESCREEN,
    ARGB8888,
    BGRA8888,
    DXT1,
    DXT3,
    DXT5,
    BGRX8888,
    BGR565,
    BGRX5551,
    BGRA4444,
    DXT1ONEBITALPHA,
    BGRA5551,
    UV88,
    UVWQ8888,
    RGBA16161616F,
    RGBA16161616,
    UVLX8888,
}

unsafe impl Zeroable for ImageFormat {}
unsafe impl Pod for ImageFormat {}

impl ImageFormat {
    /// Byte size of a single image (one frame, one face) at the given mip level.
    pub fn bytes_for_size(&self, width: usize, height: usize, mip_level: usize) -> usize {
        let width = (width >> mip_level).max(1);
        let height = (height >> mip_level).max(1);

        // block compressed formats operate on 4x4 texel blocks
        let block_width = width.max(4);
        let block_height = height.max(4);
        let block_count = block_width * block_height / 16;

        match self {
            ImageFormat::NONE => 0,
            ImageFormat::UVLX8888
            | ImageFormat::UVWQ8888
            | ImageFormat::BGRA8888
            | ImageFormat::ARGB8888
            | ImageFormat::RGBA8888
            | ImageFormat::ABGR8888
            | ImageFormat::BGRX8888 => width * height * 4,
            ImageFormat::RGB888BLUESCREEN
            | ImageFormat::BGR888BLUESCREEN
            | ImageFormat::RGB888
            | ImageFormat::BGR888 => width * height * 3,
            ImageFormat::I8 | ImageFormat::P8 | ImageFormat::A8 => width * height,
            ImageFormat::DXT1 | ImageFormat::DXT1ONEBITALPHA => block_count * 8,
            // 4x4 block has 64 bits of color and 64 bits of alpha
            ImageFormat::DXT3 | ImageFormat::DXT5 => block_count * 16,
            ImageFormat::IA88
            | ImageFormat::RGB565
            | ImageFormat::UV88
            | ImageFormat::BGRA5551
            | ImageFormat::BGRX5551
            | ImageFormat::BGR565
            | ImageFormat::BGRA4444 => width * height * 2,
            ImageFormat::RGBA16161616F | ImageFormat::RGBA16161616 => width * height * 8,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            -1 => ImageFormat::NONE,
            0 => ImageFormat::RGBA8888,
            1 => ImageFormat::ABGR8888,
            2 => ImageFormat::RGB888,
            3 => ImageFormat::BGR888,
            4 => ImageFormat::RGB565,
            5 => ImageFormat::I8,
            6 => ImageFormat::IA88,
            7 => ImageFormat::P8,
            8 => ImageFormat::A8,
            9 => ImageFormat::RGB888BLUESCREEN,
            10 => ImageFormat::BGR888BLUESCREEN,
            11 => ImageFormat::ARGB8888,
            12 => ImageFormat::BGRA8888,
            13 => ImageFormat::DXT1,
            14 => ImageFormat::DXT3,
            15 => ImageFormat::DXT5,
            16 => ImageFormat::BGRX8888,
            17 => ImageFormat::BGR565,
            18 => ImageFormat::BGRX5551,
            19 => ImageFormat::BGRA4444,
            20 => ImageFormat::DXT1ONEBITALPHA,
            21 => ImageFormat::BGRA5551,
            22 => ImageFormat::UV88,
            23 => ImageFormat::UVWQ8888,
            24 => ImageFormat::RGBA16161616F,
            25 => ImageFormat::RGBA16161616,
            26 => ImageFormat::UVLX8888,
            _ => return None,
        })
    }
}

flags! {
    #[repr(u32)]
    pub enum TextureFlags: u32 {
        // Flags from the *.txt config file
        POINTSAMPLE = 0x00000001,
        TRILINEAR = 0x00000002,
        CLAMPS = 0x00000004,
        CLAMPT = 0x00000008,
        ANISOTROPIC = 0x00000010,
        HINTDXT5 = 0x00000020,
        PWLCORRECTED = 0x00000040,
        NORMAL = 0x00000080,
        NOMIP = 0x00000100,
        NOLOD = 0x00000200,
        ALLMIPS = 0x00000400,
        PROCEDURAL = 0x00000800,

        // These are automatically generated by vtex from the texture data.
        ONEBITALPHA = 0x00001000,
        EIGHTBITALPHA = 0x00002000,

        // Newer flags from the *.txt config file
        ENVMAP = 0x00004000,
        RENDERTARGET = 0x00008000,
        DEPTHRENDERTARGET = 0x00010000,
        NODEBUGOVERRIDE = 0x00020000,
        SINGLECOPY = 0x00040000,
        PRESRGB = 0x00080000,
        NODEPTHBUFFER = 0x00800000,
        CLAMPU = 0x02000000,
        VERTEXTEXTURE = 0x04000000,
        SSBUMP = 0x08000000,
        BORDER = 0x20000000,
    }
}

/// Every flag, in bit order, for UI listings.
pub fn all_texture_flags() -> impl Iterator<Item = TextureFlags> {
    FlagSet::<TextureFlags>::full().into_iter()
}

#[cfg(test)]
mod consts_tests {
    use super::*;

    #[test]
    fn test_uncompressed_sizes() {
        assert_eq!(ImageFormat::RGBA8888.bytes_for_size(16, 16, 0), 16 * 16 * 4);
        assert_eq!(ImageFormat::RGB888.bytes_for_size(16, 16, 0), 16 * 16 * 3);
        assert_eq!(ImageFormat::I8.bytes_for_size(16, 16, 1), 8 * 8);
        // dimensions never collapse below one texel
        assert_eq!(ImageFormat::RGBA8888.bytes_for_size(4, 4, 6), 4);
    }

    #[test]
    fn test_block_compressed_sizes() {
        // 16x16 = 16 blocks
        assert_eq!(ImageFormat::DXT1.bytes_for_size(16, 16, 0), 16 * 8);
        assert_eq!(ImageFormat::DXT5.bytes_for_size(16, 16, 0), 16 * 16);
        // a 1x1 mip still occupies a full 4x4 block
        assert_eq!(ImageFormat::DXT1.bytes_for_size(16, 16, 4), 8);
        assert_eq!(ImageFormat::DXT5.bytes_for_size(4, 4, 0), 16);
    }

    #[test]
    fn test_format_roundtrip() {
        for raw in -1..27 {
            let fmt = ImageFormat::from_i32(raw).unwrap();
            assert_eq!(fmt as i32, raw);
        }
        assert!(ImageFormat::from_i32(27).is_none());
    }
}
