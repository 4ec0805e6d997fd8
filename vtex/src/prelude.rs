pub use crate::error::{VtexError, VtexResult};
pub use crate::vpk::{VPKDirectory, VPKEntry, VPK_SIGNATURE};
pub use crate::vtf::consts::{ImageFormat, TextureFlags};
pub use crate::vtf::VTF;
