use crate::{Result, ViewerError};
use std::env;

pub const WINDOW_SIZE_ENV: &str = "RUSTCV_WINDOW_SIZE";
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1500, 800);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub title: String,
    /// Initial inner size (width, height) in logical points.
    pub window_size: (u32, u32),
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Image Processor".to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl ViewerConfig {
    /// Defaults overridden by `RUSTCV_WINDOW_SIZE`. A malformed value is an
    /// error rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        match env::var(WINDOW_SIZE_ENV) {
            Ok(raw) => config.window_size = parse_window_size(&raw)?,
            Err(env::VarError::NotPresent) => {}
            Err(e) => {
                return Err(ViewerError::Config(format!(
                    "failed to read {WINDOW_SIZE_ENV}: {e}"
                )))
            }
        }
        Ok(config)
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `1500x800`.
pub fn parse_window_size(raw: &str) -> Result<(u32, u32)> {
    let invalid = || {
        ViewerError::Config(format!(
            "{WINDOW_SIZE_ENV} must look like 1500x800, got '{raw}'"
        ))
    };
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok((width, height))
}
