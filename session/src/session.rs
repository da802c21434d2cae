use crate::config::SessionConfig;
use crate::operation::Operation;
use crate::vision::{self, Applied, FaceDetector};
use crate::{Result, SessionError};
use cv_core::PixelBuffer;
use cv_objdetect::HaarCascade;
use image::ImageReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded,
}

struct Images {
    original: PixelBuffer,
    /// Last non-annotated result; annotations are drawn on top of it.
    base: PixelBuffer,
    current: PixelBuffer,
}

/// The image being worked on plus the status line shown to the user.
///
/// Every call records its outcome in [`ImageSession::status`]. A failed call
/// leaves the images untouched.
pub struct ImageSession {
    config: SessionConfig,
    images: Option<Images>,
    detector: Option<Box<dyn FaceDetector>>,
    status: String,
}

impl ImageSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            images: None,
            detector: None,
            status: "Ready".to_string(),
        }
    }

    /// Use `detector` for face detection instead of loading the configured
    /// cascade.
    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_face_cascade(self, cascade: HaarCascade) -> Self {
        self.with_face_detector(Box::new(cascade))
    }

    pub fn state(&self) -> SessionState {
        if self.images.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Empty
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.images.is_some()
    }

    pub fn original(&self) -> Option<&PixelBuffer> {
        self.images.as_ref().map(|i| &i.original)
    }

    /// Last non-annotated result, the input of the next annotation.
    pub fn base(&self) -> Option<&PixelBuffer> {
        self.images.as_ref().map(|i| &i.base)
    }

    pub fn current(&self) -> Option<&PixelBuffer> {
        self.images.as_ref().map(|i| &i.current)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Decode a JPEG or PNG file, detecting the format from its contents. The
    /// result is always three-channel BGR.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&PixelBuffer> {
        let path = path.as_ref();
        let decoded = decode(path);
        let buffer = match decoded {
            Ok(buffer) => buffer,
            Err(err) => return Err(self.fail(err)),
        };

        tracing::info!(
            path = %path.display(),
            width = buffer.width(),
            height = buffer.height(),
            "image loaded"
        );
        self.status = "Image loaded successfully.".to_string();
        let images = self.images.insert(Images {
            original: buffer.clone(),
            base: buffer.clone(),
            current: buffer,
        });
        Ok(&images.current)
    }

    pub fn apply(&mut self, op: Operation) -> Result<&PixelBuffer> {
        if self.images.is_none() {
            return Err(self.fail(SessionError::NoImageLoaded));
        }
        if matches!(op, Operation::FaceDetect(_)) {
            if let Err(err) = self.ensure_detector() {
                return Err(self.fail(err));
            }
        }

        let Some(images) = self.images.as_ref() else {
            return Err(SessionError::NoImageLoaded);
        };
        // Annotations redraw on the last plain result so marks never stack;
        // transforms continue from what is on screen.
        let input = if op.is_annotation() {
            &images.base
        } else {
            &images.current
        };
        let outcome = vision::run(&op, input, self.detector.as_deref());
        let applied = match outcome {
            Ok(applied) => applied,
            Err(err) => return Err(self.fail(err.into())),
        };

        self.status = applied.status(&op);
        tracing::info!(operation = op.name(), status = %self.status, "operation applied");

        let Some(images) = self.images.as_mut() else {
            return Err(SessionError::NoImageLoaded);
        };
        match applied {
            Applied::Transformed(buffer) => {
                images.base = buffer.clone();
                images.current = buffer;
            }
            Applied::Annotated { buffer, .. } => images.current = buffer,
        }
        Ok(&images.current)
    }

    /// Discard every applied operation.
    pub fn reset(&mut self) -> Result<&PixelBuffer> {
        if self.images.is_none() {
            return Err(self.fail(SessionError::NoImageLoaded));
        }
        self.status = "Image reset to original.".to_string();
        let Some(images) = self.images.as_mut() else {
            return Err(SessionError::NoImageLoaded);
        };
        images.base = images.original.clone();
        images.current = images.original.clone();
        tracing::info!("image reset");
        Ok(&images.current)
    }

    fn ensure_detector(&mut self) -> Result<()> {
        if self.detector.is_some() {
            return Ok(());
        }
        let path = self.config.face_cascade.as_ref().ok_or_else(|| {
            SessionError::DetectorUnavailable(format!(
                "no face cascade configured; set {}",
                crate::config::HAAR_CASCADE_ENV
            ))
        })?;
        let cascade = HaarCascade::from_file(path)?;
        self.detector = Some(Box::new(cascade));
        Ok(())
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        tracing::warn!(error = %err, "session operation failed");
        self.status = err.to_string();
        err
    }
}

impl Default for ImageSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn decode(path: &Path) -> Result<PixelBuffer> {
    if path.as_os_str().is_empty() {
        return Err(SessionError::DecodeFailure {
            path: path.to_path_buf(),
            reason: "no file selected".to_string(),
        });
    }
    let decode_failure = |reason: String| SessionError::DecodeFailure {
        path: path.to_path_buf(),
        reason,
    };
    // Sniff the format from the file contents; the extension may lie.
    let image = ImageReader::open(path)
        .map_err(|e| decode_failure(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_failure(e.to_string()))?
        .decode()
        .map_err(|e| decode_failure(e.to_string()))?;
    PixelBuffer::from_rgb_image(&image.to_rgb8()).map_err(|e| decode_failure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_ready() {
        let session = ImageSession::default();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.status(), "Ready");
        assert!(session.current().is_none());
    }

    #[test]
    fn empty_path_is_a_decode_failure() {
        let mut session = ImageSession::default();
        let err = session.load("").unwrap_err();
        assert!(matches!(err, SessionError::DecodeFailure { ref reason, .. } if reason == "no file selected"));
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.status().starts_with("Failed to load image"));
    }

    #[test]
    fn face_detection_without_cascade_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let mut session = ImageSession::default();
        session.load(&path).unwrap();
        let before = session.current().cloned();

        let err = session.apply(Operation::face_detect()).unwrap_err();
        assert!(matches!(err, SessionError::DetectorUnavailable(_)));
        assert!(session.status().starts_with("Face detector unavailable"));
        assert_eq!(session.current().cloned(), before);
    }

    #[test]
    fn missing_cascade_file_is_a_detector_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        let config = SessionConfig::default().with_face_cascade(dir.path().join("missing.xml"));
        let mut session = ImageSession::new(config);
        session.load(&path).unwrap();
        assert!(matches!(
            session.apply(Operation::face_detect()),
            Err(SessionError::Detector(_))
        ));
    }
}
