pub mod geometry;
pub mod image;
pub mod runtime;

pub use geometry::*;
pub use self::image::*;
pub use runtime::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Channel layout error: {0}")]
    ChannelLayout(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
