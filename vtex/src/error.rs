use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtexError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("bad signature, expected {expected}")]
    Signature { expected: &'static str },

    #[error("unsupported version {0}.{1}")]
    Unsupported(u32, u32),

    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Format(&'static str),
}

pub type VtexResult<T> = Result<T, VtexError>;
