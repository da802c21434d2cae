use std::env;
use std::path::{Path, PathBuf};

pub const HAAR_CASCADE_ENV: &str = "RUSTCV_HAAR_CASCADE";
pub const FRONTAL_FACE_CASCADE: &str = "haarcascade_frontalface_default.xml";

/// Directories searched for [`FRONTAL_FACE_CASCADE`] when no path is set.
pub const CASCADE_SEARCH_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "data/haarcascades",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Face cascade XML; face detection is unavailable when `None`.
    pub face_cascade: Option<PathBuf>,
}

impl SessionConfig {
    /// Read `RUSTCV_HAAR_CASCADE`, falling back to the well-known install
    /// directories.
    pub fn from_env() -> Self {
        let configured = env::var_os(HAAR_CASCADE_ENV).map(PathBuf::from);
        let dirs: Vec<&Path> = CASCADE_SEARCH_DIRS.iter().map(Path::new).collect();
        Self {
            face_cascade: resolve_cascade_path(configured, &dirs),
        }
    }

    pub fn with_face_cascade(mut self, path: impl Into<PathBuf>) -> Self {
        self.face_cascade = Some(path.into());
        self
    }
}

/// An explicit path wins even if it does not exist, so a typo surfaces as a
/// load error instead of silently picking another cascade.
pub fn resolve_cascade_path(configured: Option<PathBuf>, search_dirs: &[&Path]) -> Option<PathBuf> {
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    search_dirs
        .iter()
        .map(|dir| dir.join(FRONTAL_FACE_CASCADE))
        .find(|candidate| candidate.is_file())
}
