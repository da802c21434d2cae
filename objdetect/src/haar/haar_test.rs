use super::integral::IntegralImage;
use super::*;
use image::Luma;

const STEP_CASCADE_XML: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>24</height>
  <width>24</width>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>5.0000000000000000e-01</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 1.0000000000000000e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 24 12 -1.</_>
        <_>
          0 12 24 12 1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

/// Top half black, bottom half white.
fn step_image(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |_, y| Luma([if y < size / 2 { 0 } else { 255 }]))
}

#[test]
fn test_haar_integral_image() {
    let img = GrayImage::from_pixel(4, 4, Luma([2]));
    let integral = IntegralImage::new(&img);

    assert_eq!(integral.sum(&Rect::new(1, 1, 2, 2)), 8);
    assert_eq!(integral.sq_sum(&Rect::new(1, 1, 2, 2)), 16);
    assert_eq!(integral.sum(&Rect::new(0, 0, 4, 4)), 32);
}

#[test]
fn test_load_cascade_xml() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    assert_eq!(cascade.window_size(), (24, 24));
    assert_eq!(cascade.stages().len(), 1);
    assert_eq!(cascade.features().len(), 1);

    let feature = &cascade.features()[0];
    assert_eq!(feature.rects[1].rect, Rect::new(0, 12, 24, 12));
    assert_eq!(feature.rects[0].weight, -1.0);

    let node = cascade.stages()[0].classifiers[0].nodes[0];
    assert_eq!((node.left, node.right, node.feature), (0, -1, 0));
    assert!((node.threshold - 0.1).abs() < 1e-6);
}

#[test]
fn test_load_cascade_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("step.xml");
    std::fs::write(&path, STEP_CASCADE_XML).unwrap();

    let cascade = HaarCascade::from_file(&path).unwrap();
    assert_eq!(cascade.window_size(), (24, 24));
    assert!(matches!(
        HaarCascade::from_file(dir.path().join("missing.xml")),
        Err(ObjdetectError::Io(_))
    ));
}

#[test]
fn test_rejects_malformed_cascades() {
    assert!(matches!(
        HaarCascade::from_xml_str("<opencv_storage>"),
        Err(ObjdetectError::Parse(_))
    ));

    let bad_feature = STEP_CASCADE_XML.replace("0 12 24 12 1.", "0 12 24 13 1.");
    assert!(matches!(
        HaarCascade::from_xml_str(&bad_feature),
        Err(ObjdetectError::InvalidCascade(_))
    ));

    let bad_index = STEP_CASCADE_XML.replace("0 -1 0 1.0", "0 -1 3 1.0");
    assert!(matches!(
        HaarCascade::from_xml_str(&bad_index),
        Err(ObjdetectError::InvalidCascade(_))
    ));

    let lbp = STEP_CASCADE_XML.replace("<featureType>HAAR", "<featureType>LBP");
    assert!(HaarCascade::from_xml_str(&lbp).is_err());
}

#[test]
fn test_haar_detection_on_step_edge() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    let img = step_image(60);
    let params = DetectParams {
        scale_factor: 1.1,
        min_neighbors: 1,
        min_size: (0, 0),
        max_size: None,
    };

    let detections = cascade.detect_multi_scale(&img, &params).unwrap();
    assert!(!detections.is_empty());
    for r in &detections {
        assert!(r.y < 30 && r.bottom() > 30, "{r:?} does not straddle the edge");
    }
}

#[test]
fn test_image_of_window_size_is_scanned() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    let params = DetectParams {
        min_neighbors: 0,
        ..DetectParams::default()
    };

    let detections = cascade.detect_multi_scale(&step_image(24), &params).unwrap();
    assert_eq!(detections, vec![Rect::new(0, 0, 24, 24)]);
    assert!(cascade.detect_multi_scale(&step_image(23), &params).unwrap().is_empty());
}

#[test]
fn test_haar_no_detection_on_flat_image() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    let img = GrayImage::from_pixel(80, 80, Luma([128]));
    let detections = cascade.detect_multi_scale(&img, &DetectParams::default()).unwrap();
    assert!(detections.is_empty());
}

#[test]
fn test_min_size_filters_small_windows() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    let img = step_image(60);
    let params = DetectParams {
        min_size: (100, 100),
        ..DetectParams::default()
    };
    assert!(cascade.detect_multi_scale(&img, &params).unwrap().is_empty());
}

#[test]
fn test_rejects_bad_scale_factor() {
    let cascade = HaarCascade::from_xml_str(STEP_CASCADE_XML).unwrap();
    let params = DetectParams {
        scale_factor: 1.0,
        ..DetectParams::default()
    };
    assert!(cascade.detect_multi_scale(&step_image(30), &params).is_err());
}

#[test]
fn test_group_rectangles_merges_neighbors() {
    let rects = vec![
        Rect::new(10, 10, 30, 30),
        Rect::new(12, 10, 30, 30),
        Rect::new(10, 12, 30, 30),
        Rect::new(200, 200, 30, 30),
    ];

    let grouped = group_rectangles(&rects, 2, 0.2);
    assert_eq!(grouped, vec![Rect::new(11, 11, 30, 30)]);

    assert_eq!(group_rectangles(&rects, 0, 0.2), rects);
    assert!(group_rectangles(&rects, 3, 0.2).is_empty());
}
