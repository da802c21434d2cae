pub mod haar;

pub use haar::*;

pub type Result<T> = std::result::Result<T, ObjdetectError>;

#[derive(Debug, thiserror::Error)]
pub enum ObjdetectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cascade parse error: {0}")]
    Parse(String),

    #[error("Invalid cascade: {0}")]
    InvalidCascade(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
