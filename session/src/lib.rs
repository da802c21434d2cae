//! Image session: the loaded image, the operation menu and the status line.
//!
//! The session knows nothing about windows or widgets. A UI shell calls
//! [`ImageSession::load`], [`ImageSession::apply`] and
//! [`ImageSession::reset`], then renders [`ImageSession::current`] and shows
//! [`ImageSession::status`].

pub mod annotate;
pub mod config;
pub mod operation;
pub mod session;
pub mod vision;

pub use config::SessionConfig;
pub use operation::*;
pub use session::{ImageSession, SessionState};
pub use vision::{Applied, FaceDetector, VisionError};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to load image '{}': {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("No image loaded. Load an image first.")]
    NoImageLoaded,

    #[error("Face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Face detector unavailable: {0}")]
    Detector(#[from] cv_objdetect::ObjdetectError),

    #[error("Operation failed: {0}")]
    Vision(#[from] VisionError),
}
