use crate::binaries::BinaryData;

use super::consts::ImageFormat;

pub const VTF_SIGNATURE: [i8; 4] = [b'V' as i8, b'T' as i8, b'F' as i8, 0];

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable)]
pub struct VTFHeader {
    pub signature: [i8; 4], // File signature ("VTF\0"). (or as little-endian integer, 0x00465456)
    pub version: [u32; 2],  // version[0].version[1]
    pub header_size: u32, // Size of the header struct (16 byte aligned) + size of the resource dictionary (7.3+).
    pub width: u16,       // Width of the largest mipmap in pixels. Must be a power of 2.
    pub height: u16,      // Height of the largest mipmap in pixels. Must be a power of 2.
    pub flags: u32,       // VTF flags.
    pub frames: u16,      // Number of frames, if animated (1 for no animation).
    pub first_frame: u16, // First frame in animation (0 based). Can be -1 in environment maps older than 7.5.
    pub(crate) padding0: [u8; 4], // reflectivity padding (16 byte alignment).
    pub reflectivity: [f32; 3], // reflectivity vector.
    pub(crate) padding1: [u8; 4], // reflectivity padding (8 byte packing).
    pub bumpmap_scale: f32, // Bumpmap scale.
    pub high_res_image_format: ImageFormat, // High resolution image format.
    pub mipmap_count: u8, // Number of mipmaps.
    pub low_res_image_format: ImageFormat, // Low resolution image format (always DXT1).
    pub low_res_image_width: u8, // Low resolution image width.
    pub low_res_image_height: u8, // Low resolution image height.
}

impl BinaryData for VTFHeader {}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable)]
pub struct VTFHeader73 {
    // 7.2+
    pub depth: i16, // Depth of the largest mipmap in pixels. Must be a power of 2. Is 1 for a 2D texture.

    // 7.3+
    pub(crate) padding2: [u8; 3], // depth padding (4 byte alignment).
    pub num_resources: u32,       // Number of resources this vtf has. The max appears to be 32.

    pub(crate) padding3: [u8; 8], // Necessary on certain compilers
}

impl BinaryData for VTFHeader73 {}

/// Tags
///    { '\x01', '\0', '\0' } - Low-res (thumbnail) image data.
///    { '\x30', '\0', '\0' } - High-res image data.
///    { '\x10', '\0', '\0' } - Animated particle sheet data.
///    { 'C', 'R', 'C' } - CRC data.
///    { 'L', 'O', 'D' } - Texture LOD control information.
///    { 'T', 'S', 'O' } - Game-defined "extended" VTF flags.
///    { 'K', 'V', 'D' } - Arbitrary KeyValues data.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, bytemuck::Zeroable)]
pub struct ResourceEntryInfo {
    pub tag: [u8; 3], // A three-byte "tag" that identifies what this resource is.
    pub flags: u8, // Resource entry flags. The only known flag is 0x2, which indicates that no data chunk corresponds to this resource.
    pub offset: u32, // The offset of this resource's data in the file.
}

impl BinaryData for ResourceEntryInfo {}

pub const TAG_LOW_RES: [u8; 3] = [0x01, 0, 0];
pub const TAG_HIGH_RES: [u8; 3] = [0x30, 0, 0];
pub const TAG_SHEET: [u8; 3] = [0x10, 0, 0];
pub const TAG_CRC: [u8; 3] = [b'C', b'R', b'C'];
pub const TAG_LOD: [u8; 3] = [b'L', b'O', b'D'];
pub const TAG_TSO: [u8; 3] = [b'T', b'S', b'O'];
pub const TAG_KVD: [u8; 3] = [b'K', b'V', b'D'];

/// Flag on a resource entry meaning no data chunk follows the dictionary.
pub const RSRC_NO_DATA_CHUNK: u8 = 0x02;

pub fn resource_name(tag: [u8; 3]) -> &'static str {
    match tag {
        TAG_LOW_RES => "Thumbnail image",
        TAG_HIGH_RES => "Image data",
        TAG_SHEET => "Particle sheet",
        TAG_CRC => "CRC checksum",
        TAG_LOD => "LOD control",
        TAG_TSO => "Extended flags",
        TAG_KVD => "KeyValues data",
        _ => "Unknown",
    }
}
