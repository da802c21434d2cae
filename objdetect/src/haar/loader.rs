//! Reader for OpenCV cascade classifier XML (`opencv-cascade-classifier`,
//! BOOST stages over HAAR features).

use super::{CascadeStage, DecisionNode, HaarCascade, HaarFeature, WeakClassifier, WeightedRect};
use crate::{ObjdetectError, Result};
use cv_core::Rect;
use roxmltree::{Document, Node};
use std::path::Path;
use std::str::FromStr;

impl HaarCascade {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        let cascade = Self::from_xml_str(&xml)?;
        tracing::info!(
            path = %path.display(),
            stages = cascade.stages.len(),
            features = cascade.features.len(),
            "loaded haar cascade"
        );
        Ok(cascade)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml).map_err(|e| ObjdetectError::Parse(e.to_string()))?;
        let root = doc.root_element();
        let cascade = if root.has_tag_name("cascade") {
            root
        } else {
            child(root, "cascade")?
        };

        if let Some(stage_type) = opt_child(cascade, "stageType") {
            if text(stage_type).trim() != "BOOST" {
                return Err(ObjdetectError::InvalidCascade(format!(
                    "unsupported stage type '{}'",
                    text(stage_type).trim()
                )));
            }
        }
        if let Some(feature_type) = opt_child(cascade, "featureType") {
            if text(feature_type).trim() != "HAAR" {
                return Err(ObjdetectError::InvalidCascade(format!(
                    "unsupported feature type '{}'",
                    text(feature_type).trim()
                )));
            }
        }

        let width: u32 = parse_one(child(cascade, "width")?)?;
        let height: u32 = parse_one(child(cascade, "height")?)?;

        let stages = items(child(cascade, "stages")?)
            .map(parse_stage)
            .collect::<Result<Vec<_>>>()?;
        let features = items(child(cascade, "features")?)
            .map(parse_feature)
            .collect::<Result<Vec<_>>>()?;

        if stages.is_empty() {
            return Err(ObjdetectError::InvalidCascade("cascade has no stages".to_string()));
        }

        HaarCascade::new((width, height), stages, features)
    }
}

fn parse_stage(node: Node) -> Result<CascadeStage> {
    let threshold: f32 = parse_one(child(node, "stageThreshold")?)?;
    let classifiers = items(child(node, "weakClassifiers")?)
        .map(parse_classifier)
        .collect::<Result<Vec<_>>>()?;
    Ok(CascadeStage {
        threshold,
        classifiers,
    })
}

fn parse_classifier(node: Node) -> Result<WeakClassifier> {
    let raw: Vec<f64> = parse_list(child(node, "internalNodes")?)?;
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(ObjdetectError::Parse(format!(
            "internalNodes must hold groups of 4 values, got {}",
            raw.len()
        )));
    }
    let nodes = raw
        .chunks_exact(4)
        .map(|c| {
            if c[2] < 0.0 {
                return Err(ObjdetectError::Parse(format!("negative feature index {}", c[2])));
            }
            Ok(DecisionNode {
                left: c[0] as i32,
                right: c[1] as i32,
                feature: c[2] as usize,
                threshold: c[3] as f32,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let leaves: Vec<f32> = parse_list(child(node, "leafValues")?)?;
    Ok(WeakClassifier { nodes, leaves })
}

fn parse_feature(node: Node) -> Result<HaarFeature> {
    if let Some(tilted) = opt_child(node, "tilted") {
        if text(tilted).trim() != "0" {
            return Err(ObjdetectError::InvalidCascade(
                "tilted haar features are not supported".to_string(),
            ));
        }
    }
    let rects = items(child(node, "rects")?)
        .map(|r| {
            let v: Vec<f64> = parse_list(r)?;
            if v.len() != 5 || v[..4].iter().any(|&c| c < 0.0) {
                return Err(ObjdetectError::Parse(format!(
                    "feature rectangle must be 'x y w h weight', got {v:?}"
                )));
            }
            Ok(WeightedRect {
                rect: Rect::new(v[0] as u32, v[1] as u32, v[2] as u32, v[3] as u32),
                weight: v[4] as f32,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(HaarFeature { rects })
}

fn opt_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>> {
    opt_child(node, name).ok_or_else(|| {
        ObjdetectError::Parse(format!(
            "<{}> is missing <{name}>",
            node.tag_name().name()
        ))
    })
}

/// Sequence entries, which OpenCV writes as `<_>` elements.
fn items<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|c| c.has_tag_name("_"))
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("")
}

fn parse_list<T: FromStr>(node: Node) -> Result<Vec<T>> {
    text(node)
        .split_whitespace()
        .map(|tok| {
            tok.parse::<T>().map_err(|_| {
                ObjdetectError::Parse(format!(
                    "invalid number '{tok}' in <{}>",
                    node.tag_name().name()
                ))
            })
        })
        .collect()
}

fn parse_one<T: FromStr>(node: Node) -> Result<T> {
    let mut values = parse_list::<T>(node)?;
    if values.len() != 1 {
        return Err(ObjdetectError::Parse(format!(
            "<{}> must hold a single value",
            node.tag_name().name()
        )));
    }
    Ok(values.remove(0))
}
