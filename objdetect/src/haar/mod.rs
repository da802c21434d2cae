//! Haar Cascade Face Detection
//!
//! Implementation of the Viola-Jones object detection framework
//! using Haar-like features and boosted cascades.

mod grouping;
mod integral;
mod loader;

#[cfg(test)]
mod haar_test;

pub use grouping::group_rectangles;

use crate::{ObjdetectError, Result};
use cv_core::Rect;
use image::imageops::{self, FilterType};
use image::GrayImage;
use integral::IntegralImage;
use rayon::prelude::*;

/// Haar Cascade Classifier for object detection
///
/// Implements the Viola-Jones cascade classifier using Haar-like features.
/// A cascade of boosted decision trees enables fast detection by rejecting
/// non-object regions early in the pipeline.
///
/// # Algorithm Overview
///
/// The cascade evaluates a series of stages, each containing a set of boosted
/// weak classifiers over Haar features. Detection succeeds only if a window
/// passes all stages. Multi-scale detection shrinks the image by the scale
/// factor at each level while the detection window keeps the trained size.
///
/// # Usage
///
/// ```no_run
/// # use cv_objdetect::haar::{DetectParams, HaarCascade};
/// # use image::GrayImage;
/// let cascade = HaarCascade::from_file("haarcascade_frontalface_default.xml")?;
/// let image = GrayImage::new(640, 480);
/// let faces = cascade.detect_multi_scale(&image, &DetectParams::default())?;
/// # Ok::<(), cv_objdetect::ObjdetectError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HaarCascade {
    window: (u32, u32),
    stages: Vec<CascadeStage>,
    features: Vec<HaarFeature>,
}

/// A single stage in the Haar cascade classifier
///
/// The weak classifier outputs are summed; the window is rejected if the sum
/// falls below the stage threshold.
#[derive(Debug, Clone)]
pub struct CascadeStage {
    /// Decision threshold for this stage
    pub threshold: f32,
    /// Boosted weak classifiers evaluated in this stage
    pub classifiers: Vec<WeakClassifier>,
}

/// Boosted decision tree over Haar features.
///
/// Node children `<= 0` point into `leaves` (child `-i` is leaf `i`);
/// positive children index further nodes. A depth-one stump is a single
/// node with children `0` and `-1`.
#[derive(Debug, Clone)]
pub struct WeakClassifier {
    pub nodes: Vec<DecisionNode>,
    pub leaves: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionNode {
    pub left: i32,
    pub right: i32,
    /// Index into the cascade's feature table
    pub feature: usize,
    /// Threshold on the variance-normalized feature value
    pub threshold: f32,
}

/// A single Haar-like feature with multiple weighted rectangular regions
///
/// Haar features compute weighted sums of pixel values over axis-aligned
/// rectangles, positioned relative to the detection window. They approximate
/// local intensity differences and are O(1) to evaluate on integral images.
#[derive(Debug, Clone)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
}

#[derive(Debug, Clone, Copy)]
pub struct WeightedRect {
    pub rect: Rect,
    pub weight: f32,
}

/// Parameters for [`HaarCascade::detect_multi_scale`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Multiplicative scale increase per pyramid level (> 1.0)
    pub scale_factor: f32,
    /// Raw hits a cluster needs beyond this count to be reported;
    /// 0 disables grouping
    pub min_neighbors: u32,
    /// Smallest window (width, height) reported
    pub min_size: (u32, u32),
    /// Largest window (width, height) reported; unbounded when `None`
    pub max_size: Option<(u32, u32)>,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: (0, 0),
            max_size: None,
        }
    }
}

impl HaarCascade {
    /// Build a cascade, checking that every node references an existing
    /// feature and leaf and that every feature rectangle fits the window.
    pub fn new(
        window: (u32, u32),
        stages: Vec<CascadeStage>,
        features: Vec<HaarFeature>,
    ) -> Result<Self> {
        if window.0 < 3 || window.1 < 3 {
            return Err(ObjdetectError::InvalidCascade(format!(
                "window {}x{} is too small",
                window.0, window.1
            )));
        }

        for (fi, feature) in features.iter().enumerate() {
            if feature.rects.is_empty() {
                return Err(ObjdetectError::InvalidCascade(format!(
                    "feature {fi} has no rectangles"
                )));
            }
            for wr in &feature.rects {
                if wr.rect.right() > window.0 || wr.rect.bottom() > window.1 {
                    return Err(ObjdetectError::InvalidCascade(format!(
                        "feature {fi} rectangle {:?} exceeds the {}x{} window",
                        wr.rect, window.0, window.1
                    )));
                }
            }
        }

        for (si, stage) in stages.iter().enumerate() {
            for classifier in &stage.classifiers {
                if classifier.nodes.is_empty() {
                    return Err(ObjdetectError::InvalidCascade(format!(
                        "stage {si} has a classifier without nodes"
                    )));
                }
                for (ni, node) in classifier.nodes.iter().enumerate() {
                    if node.feature >= features.len() {
                        return Err(ObjdetectError::InvalidCascade(format!(
                            "stage {si} references missing feature {}",
                            node.feature
                        )));
                    }
                    // Inner children must point forward so evaluation terminates.
                    for child in [node.left, node.right] {
                        let ok = if child > 0 {
                            (child as usize) > ni && (child as usize) < classifier.nodes.len()
                        } else {
                            (child.unsigned_abs() as usize) < classifier.leaves.len()
                        };
                        if !ok {
                            return Err(ObjdetectError::InvalidCascade(format!(
                                "stage {si} has a dangling tree child {child}"
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self {
            window,
            stages,
            features,
        })
    }

    /// Trained detection window size (width, height).
    pub fn window_size(&self) -> (u32, u32) {
        self.window
    }

    pub fn stages(&self) -> &[CascadeStage] {
        &self.stages
    }

    pub fn features(&self) -> &[HaarFeature] {
        &self.features
    }

    /// Detect objects at all scales.
    ///
    /// # Algorithm Details
    ///
    /// 1. **Pyramid**: for scale `s = 1, f, f², ...` the image is resized to
    ///    `size / s` (bilinear) until the trained window no longer fits
    /// 2. **Size limits**: levels whose window `window * s` is smaller than
    ///    `min_size` are skipped; levels above `max_size` stop the search
    /// 3. **Cascade Evaluation**: each window position (step 2 px, or 1 px
    ///    once `s > 2`) runs through the stages with early rejection
    /// 4. **Grouping**: raw hits are clustered with [`group_rectangles`]
    ///
    /// Returned rectangles are in input image coordinates.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `scale_factor <= 1.0`.
    pub fn detect_multi_scale(&self, image: &GrayImage, params: &DetectParams) -> Result<Vec<Rect>> {
        if !(params.scale_factor > 1.0) {
            return Err(ObjdetectError::InvalidParameter(format!(
                "scale_factor must be > 1.0, got {}",
                params.scale_factor
            )));
        }

        let (img_w, img_h) = image.dimensions();
        let mut candidates = Vec::new();
        let mut factor = 1.0f64;

        loop {
            let win_w = (self.window.0 as f64 * factor).round() as u32;
            let win_h = (self.window.1 as f64 * factor).round() as u32;
            let scaled_w = (img_w as f64 / factor).round() as u32;
            let scaled_h = (img_h as f64 / factor).round() as u32;

            // A level exactly the window size still holds one window.
            if scaled_w < self.window.0 || scaled_h < self.window.1 {
                break;
            }
            if let Some((max_w, max_h)) = params.max_size {
                if win_w > max_w || win_h > max_h {
                    break;
                }
            }
            if win_w < params.min_size.0 || win_h < params.min_size.1 {
                factor *= params.scale_factor as f64;
                continue;
            }

            let level_hits = self.scan_level(image, factor, (scaled_w, scaled_h), (win_w, win_h));
            tracing::debug!(
                scale = factor,
                window = win_w,
                hits = level_hits.len(),
                "haar pyramid level"
            );
            candidates.extend(level_hits);
            factor *= params.scale_factor as f64;
        }

        let grouped = group_rectangles(&candidates, params.min_neighbors, 0.2);
        tracing::debug!(raw = candidates.len(), grouped = grouped.len(), "haar detection");
        Ok(grouped)
    }

    fn scan_level(
        &self,
        image: &GrayImage,
        factor: f64,
        scaled: (u32, u32),
        window: (u32, u32),
    ) -> Vec<Rect> {
        let resized;
        let level = if scaled == image.dimensions() {
            image
        } else {
            resized = imageops::resize(image, scaled.0, scaled.1, FilterType::Triangle);
            &resized
        };
        let integral = IntegralImage::new(level);
        let step = if factor > 2.0 { 1 } else { 2 };

        let rows: Vec<u32> = (0..=scaled.1 - self.window.1).step_by(step).collect();
        rows.par_iter()
            .flat_map_iter(|&y| {
                let integral = &integral;
                (0..=scaled.0 - self.window.0)
                    .step_by(step)
                    .filter(move |&x| self.evaluate_window(integral, x, y))
                    .map(move |x| {
                        Rect::new(
                            (x as f64 * factor).round() as u32,
                            (y as f64 * factor).round() as u32,
                            window.0,
                            window.1,
                        )
                    })
            })
            .collect()
    }

    fn evaluate_window(&self, integral: &IntegralImage, x: u32, y: u32) -> bool {
        // Variance normalization over the window without its 1px frame.
        let norm = Rect::new(x + 1, y + 1, self.window.0 - 2, self.window.1 - 2);
        let area = norm.area() as f64;
        let sum = integral.sum(&norm) as f64;
        let sq_sum = integral.sq_sum(&norm) as f64;
        let nf = area * sq_sum - sum * sum;
        let inv_norm = if nf > 0.0 { 1.0 / nf.sqrt() } else { 1.0 };

        for stage in &self.stages {
            let mut stage_sum = 0.0f32;
            for classifier in &stage.classifiers {
                stage_sum += classifier.evaluate(|fi| {
                    (self.features[fi].evaluate(integral, x, y) * inv_norm) as f32
                });
            }
            if stage_sum < stage.threshold {
                return false;
            }
        }
        true
    }
}

impl WeakClassifier {
    fn evaluate(&self, mut feature_value: impl FnMut(usize) -> f32) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            let next = if feature_value(node.feature) < node.threshold {
                node.left
            } else {
                node.right
            };
            if next <= 0 {
                return self.leaves[next.unsigned_abs() as usize];
            }
            idx = next as usize;
        }
    }
}

impl HaarFeature {
    fn evaluate(&self, integral: &IntegralImage, ox: u32, oy: u32) -> f64 {
        self.rects
            .iter()
            .map(|wr| {
                let r = Rect::new(ox + wr.rect.x, oy + wr.rect.y, wr.rect.width, wr.rect.height);
                integral.sum(&r) as f64 * wr.weight as f64
            })
            .sum()
    }
}
