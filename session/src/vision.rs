//! The six vision operations, as pure functions from an input buffer to a
//! new buffer.

use crate::annotate::{draw_rect_outline, recolor_masked};
use crate::operation::{BlurParams, CannyParams, FaceParams, HarrisParams, Operation, ThresholdParams};
use cv_core::{ChannelOrder, PixelBuffer, Rect};
use cv_features::{corner_mask, harris_response, FeatureError};
use cv_imgproc::{
    canny, dilate, gaussian_blur_buffer, gray_to_bgr, rect_kernel, threshold_binary, to_grayscale,
    ImgprocError,
};
use cv_objdetect::{DetectParams, HaarCascade, ObjdetectError};
use image::GrayImage;

pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error(transparent)]
    Imgproc(#[from] ImgprocError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Core(#[from] cv_core::Error),

    #[error(transparent)]
    Detector(#[from] ObjdetectError),

    #[error("Face detection needs a detector")]
    MissingDetector,
}

/// Anything that can find faces in a grayscale image.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, gray: &GrayImage, params: &FaceParams) -> std::result::Result<Vec<Rect>, ObjdetectError>;
}

impl FaceDetector for HaarCascade {
    fn detect(&self, gray: &GrayImage, params: &FaceParams) -> std::result::Result<Vec<Rect>, ObjdetectError> {
        let detect = DetectParams {
            scale_factor: params.scale_factor,
            min_neighbors: params.min_neighbors,
            min_size: params.min_size,
            max_size: None,
        };
        self.detect_multi_scale(gray, &detect)
    }
}

/// Result of running one operation.
#[derive(Debug, Clone)]
pub enum Applied {
    /// A new plain image.
    Transformed(PixelBuffer),
    /// The input with marks drawn on it.
    Annotated { buffer: PixelBuffer, detections: usize },
}

impl Applied {
    pub fn buffer(&self) -> &PixelBuffer {
        match self {
            Applied::Transformed(buffer) | Applied::Annotated { buffer, .. } => buffer,
        }
    }

    pub fn into_buffer(self) -> PixelBuffer {
        match self {
            Applied::Transformed(buffer) | Applied::Annotated { buffer, .. } => buffer,
        }
    }

    /// Status line reported after `op` produced this result.
    pub fn status(&self, op: &Operation) -> String {
        match (op, self) {
            (Operation::FaceDetect(_), Applied::Annotated { detections, .. }) => {
                format!("Detected {detections} face(s).")
            }
            (Operation::Grayscale, _) => "Converted to grayscale.".to_string(),
            (Operation::EdgeDetect(_), _) => "Edges detected.".to_string(),
            (Operation::Blur(_), _) => "Applied blur.".to_string(),
            (Operation::Threshold(_), _) => "Applied threshold.".to_string(),
            (Operation::CornerDetect(_), _) => "Detected corners.".to_string(),
            (Operation::FaceDetect(_), Applied::Transformed(_)) => "Detected 0 face(s).".to_string(),
        }
    }
}

/// Run `op` on `input`. The input is never modified; output always has the
/// input's dimensions and three BGR channels.
pub fn run(op: &Operation, input: &PixelBuffer, detector: Option<&dyn FaceDetector>) -> Result<Applied> {
    let input = as_bgr(input)?;
    match op {
        Operation::Grayscale => grayscale(&input).map(Applied::Transformed),
        Operation::EdgeDetect(params) => edges(&input, params).map(Applied::Transformed),
        Operation::Blur(params) => blur(&input, params).map(Applied::Transformed),
        Operation::Threshold(params) => threshold(&input, params).map(Applied::Transformed),
        Operation::FaceDetect(params) => {
            let detector = detector.ok_or(VisionError::MissingDetector)?;
            let (buffer, detections) = faces(input, params, detector)?;
            Ok(Applied::Annotated { buffer, detections })
        }
        Operation::CornerDetect(params) => {
            let (buffer, detections) = corners(input, params)?;
            Ok(Applied::Annotated { buffer, detections })
        }
    }
}

fn as_bgr(input: &PixelBuffer) -> Result<PixelBuffer> {
    if input.order() == ChannelOrder::Bgr {
        Ok(input.clone())
    } else {
        Ok(input.to_order(ChannelOrder::Bgr)?)
    }
}

pub fn grayscale(input: &PixelBuffer) -> Result<PixelBuffer> {
    Ok(gray_to_bgr(&to_grayscale(input))?)
}

pub fn edges(input: &PixelBuffer, params: &CannyParams) -> Result<PixelBuffer> {
    let gray = to_grayscale(input);
    Ok(gray_to_bgr(&canny(&gray, params.low, params.high))?)
}

pub fn blur(input: &PixelBuffer, params: &BlurParams) -> Result<PixelBuffer> {
    Ok(gaussian_blur_buffer(input, params.ksize, params.sigma)?)
}

pub fn threshold(input: &PixelBuffer, params: &ThresholdParams) -> Result<PixelBuffer> {
    let gray = to_grayscale(input);
    Ok(gray_to_bgr(&threshold_binary(&gray, params.thresh, params.max_value))?)
}

/// Outline every detected face on a copy of `input`.
pub fn faces(
    mut input: PixelBuffer,
    params: &FaceParams,
    detector: &dyn FaceDetector,
) -> Result<(PixelBuffer, usize)> {
    let gray = to_grayscale(&input);
    let found = detector.detect(&gray, params)?;
    for rect in &found {
        draw_rect_outline(&mut input, *rect, &params.color, params.thickness);
    }
    Ok((input, found.len()))
}

/// Recolor pixels whose dilated Harris response exceeds `ratio` of the
/// maximum. Returns the number of recolored pixels.
pub fn corners(mut input: PixelBuffer, params: &HarrisParams) -> Result<(PixelBuffer, usize)> {
    let gray = to_grayscale(&input);
    let response = harris_response(&gray, params.block_size, params.aperture, params.k)?;
    let dilated = dilate(&response, &rect_kernel(3, 3), 1);
    let mask = corner_mask(&dilated, params.ratio);
    let painted = recolor_masked(&mut input, &mask, &params.color);
    Ok((input, painted))
}
