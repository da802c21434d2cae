/// Canny thresholds on the L1 gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    pub low: f32,
    pub high: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low: 100.0,
            high: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceParams {
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_size: (u32, u32),
    /// Outline color, BGR
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for FaceParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (30, 30),
            color: [255, 0, 0],
            thickness: 2,
        }
    }
}

/// Gaussian kernel size and sigma; `sigma <= 0` derives it from the size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    pub ksize: usize,
    pub sigma: f32,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            ksize: 15,
            sigma: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdParams {
    pub thresh: u8,
    pub max_value: u8,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            thresh: 127,
            max_value: 255,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarrisParams {
    pub block_size: usize,
    pub aperture: usize,
    pub k: f32,
    /// Pixels above `ratio * max(response)` are highlighted
    pub ratio: f32,
    /// Highlight color, BGR
    pub color: [u8; 3],
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            block_size: 2,
            aperture: 3,
            k: 0.04,
            ratio: 0.01,
            color: [0, 0, 255],
        }
    }
}

/// One entry of the operation menu, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Grayscale,
    EdgeDetect(CannyParams),
    FaceDetect(FaceParams),
    Blur(BlurParams),
    Threshold(ThresholdParams),
    CornerDetect(HarrisParams),
}

impl Operation {
    pub fn edge_detect() -> Self {
        Operation::EdgeDetect(CannyParams::default())
    }

    pub fn face_detect() -> Self {
        Operation::FaceDetect(FaceParams::default())
    }

    pub fn blur() -> Self {
        Operation::Blur(BlurParams::default())
    }

    pub fn threshold() -> Self {
        Operation::Threshold(ThresholdParams::default())
    }

    pub fn corner_detect() -> Self {
        Operation::CornerDetect(HarrisParams::default())
    }

    /// The fixed menu, in button order, with default parameters.
    pub fn menu() -> [Operation; 6] {
        [
            Operation::Grayscale,
            Operation::edge_detect(),
            Operation::face_detect(),
            Operation::blur(),
            Operation::threshold(),
            Operation::corner_detect(),
        ]
    }

    /// Short identifier for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Grayscale => "grayscale",
            Operation::EdgeDetect(_) => "edge_detect",
            Operation::FaceDetect(_) => "face_detect",
            Operation::Blur(_) => "blur",
            Operation::Threshold(_) => "threshold",
            Operation::CornerDetect(_) => "corner_detect",
        }
    }

    /// Button caption.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Grayscale => "Convert to Grayscale",
            Operation::EdgeDetect(_) => "Detect Object",
            Operation::FaceDetect(_) => "Detect Faces",
            Operation::Blur(_) => "Apply Blur",
            Operation::Threshold(_) => "Apply Threshold",
            Operation::CornerDetect(_) => "Detect Corners",
        }
    }

    /// Annotations draw over the last plain result instead of replacing it.
    pub fn is_annotation(&self) -> bool {
        matches!(self, Operation::FaceDetect(_) | Operation::CornerDetect(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_uses_fixed_parameters() {
        let menu = Operation::menu();
        assert_eq!(menu.len(), 6);
        assert_eq!(
            menu[1],
            Operation::EdgeDetect(CannyParams {
                low: 100.0,
                high: 200.0
            })
        );
        let Operation::FaceDetect(face) = menu[2] else {
            panic!("third entry is face detection");
        };
        assert_eq!(face.min_neighbors, 5);
        assert_eq!(face.min_size, (30, 30));
        assert_eq!(menu[3], Operation::Blur(BlurParams { ksize: 15, sigma: 0.0 }));
        assert_eq!(
            menu[4],
            Operation::Threshold(ThresholdParams {
                thresh: 127,
                max_value: 255
            })
        );
    }

    #[test]
    fn only_detections_annotate() {
        let annotating: Vec<&str> = Operation::menu()
            .iter()
            .filter(|op| op.is_annotation())
            .map(|op| op.name())
            .collect();
        assert_eq!(annotating, vec!["face_detect", "corner_detect"]);
    }
}
