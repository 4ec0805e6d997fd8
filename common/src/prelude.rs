pub use crate::vbuffer::VBuffer;
pub use crate::vinstance::StateInstance;
pub use crate::vtexture::VTexture;
