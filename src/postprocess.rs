use std::cmp::Reverse;
use std::collections::BTreeMap;

use ndarray::{s, ArrayD, ArrayView2, Axis, Ix3};
use ordered_float::OrderedFloat;

use crate::error::{DetectError, DetectResult};

/// One detected box in model-input pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub conf: f32,
    pub class_id: usize,
}

/// Turns the raw `[1, 4+C, N]` prediction tensor into the final detection
/// set: confidence filtering, per-class greedy suppression, global cap.
///
/// The model family exports combined per-class scores with no separate
/// objectness, so a candidate's confidence is its best class score. Kept
/// detections come out class-major, confidence-descending within each class;
/// once the cap kicks in the list is re-sorted by confidence descending.
pub fn decode(
    raw: &ArrayD<f32>,
    conf_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
) -> DetectResult<Vec<Detection>> {
    let view = raw.view().into_dimensionality::<Ix3>().map_err(|_| {
        DetectError::Decode(format!(
            "expected prediction tensor of shape [1, 4+C, N], got {:?}",
            raw.shape()
        ))
    })?;
    let preds = view.index_axis(Axis(0), 0);
    if preds.shape()[0] <= 4 {
        return Err(DetectError::Decode(format!(
            "prediction tensor carries no class scores: {:?}",
            raw.shape()
        )));
    }

    let candidates = extract_candidates(&preds, conf_threshold);
    let kept = non_maximum_suppression(candidates, iou_threshold);
    Ok(apply_cap(kept, max_detections))
}

/// Walks the anchor columns of a `[4+C, N]` view, keeping every candidate at
/// or above the confidence threshold in corner form.
pub fn extract_candidates(preds: &ArrayView2<'_, f32>, conf_threshold: f32) -> Vec<Detection> {
    let num_anchors = preds.shape()[1];
    let mut candidates = Vec::new();

    for i in 0..num_anchors {
        let scores = preds.slice(s![4.., i]);
        let (class_id, conf) = scores.iter().enumerate().fold(
            (0usize, f32::NEG_INFINITY),
            |(best_id, best), (id, &score)| {
                if score > best { (id, score) } else { (best_id, best) }
            },
        );
        if conf < conf_threshold {
            continue;
        }

        let cx = preds[[0, i]];
        let cy = preds[[1, i]];
        let w = preds[[2, i]];
        let h = preds[[3, i]];
        candidates.push(Detection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            conf,
            class_id,
        });
    }
    candidates
}

/// Intersection over union of two boxes; 0 when the union has no area.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let inter_x1 = a.x1.max(b.x1);
    let inter_y1 = a.y1.max(b.y1);
    let inter_x2 = a.x2.min(b.x2);
    let inter_y2 = a.y2.min(b.y2);

    let inter_area = (inter_x2 - inter_x1).max(0.0) * (inter_y2 - inter_y1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union_area = area_a + area_b - inter_area;
    if union_area <= 0.0 {
        0.0
    } else {
        inter_area / union_area
    }
}

/// Greedy per-class suppression.
///
/// Candidates are grouped by class and sorted by confidence descending; the
/// sort is stable, so equal confidences keep their original extraction order.
/// The top remaining candidate of a group is kept and every group member with
/// IoU at or above the threshold against it is discarded.
pub fn non_maximum_suppression(candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, det) in candidates.iter().enumerate() {
        by_class.entry(det.class_id).or_default().push(idx);
    }

    let mut kept = Vec::new();
    for mut indices in by_class.into_values() {
        indices.sort_by_key(|&i| Reverse(OrderedFloat(candidates[i].conf)));

        let mut suppressed = vec![false; indices.len()];
        for i in 0..indices.len() {
            if suppressed[i] {
                continue;
            }
            let keep = &candidates[indices[i]];
            kept.push(keep.clone());
            for j in (i + 1)..indices.len() {
                if !suppressed[j] && iou(keep, &candidates[indices[j]]) >= iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
    }
    kept
}

fn apply_cap(mut kept: Vec<Detection>, max_detections: usize) -> Vec<Detection> {
    if kept.len() > max_detections {
        kept.sort_by_key(|det| Reverse(OrderedFloat(det.conf)));
        kept.truncate(max_detections);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    // (cx, cy, w, h, class, score)
    type Anchor = (f32, f32, f32, f32, usize, f32);

    fn raw_tensor(anchors: &[Anchor], num_classes: usize) -> ArrayD<f32> {
        let mut raw = Array3::<f32>::zeros((1, 4 + num_classes, anchors.len()));
        for (i, &(cx, cy, w, h, class_id, score)) in anchors.iter().enumerate() {
            raw[[0, 0, i]] = cx;
            raw[[0, 1, i]] = cy;
            raw[[0, 2, i]] = w;
            raw[[0, 3, i]] = h;
            raw[[0, 4 + class_id, i]] = score;
        }
        raw.into_dyn()
    }

    #[test]
    fn single_confident_candidate_survives() {
        let raw = raw_tensor(&[(100.0, 100.0, 40.0, 40.0, 0, 0.9)], 3);
        let dets = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 0);
        assert!((dets[0].conf - 0.9).abs() < 1e-6);
        assert!((dets[0].x1 - 80.0).abs() < 1e-4);
        assert!((dets[0].y1 - 80.0).abs() < 1e-4);
    }

    #[test]
    fn low_confidence_candidate_is_dropped() {
        let raw = raw_tensor(&[(100.0, 100.0, 40.0, 40.0, 0, 0.1)], 3);
        let dets = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn full_overlap_keeps_only_the_strongest() {
        let raw = raw_tensor(
            &[
                (100.0, 100.0, 40.0, 40.0, 1, 0.6),
                (100.0, 100.0, 40.0, 40.0, 1, 0.9),
            ],
            3,
        );
        let dets = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert_eq!(dets.len(), 1);
        assert!((dets[0].conf - 0.9).abs() < 1e-6);
    }

    #[test]
    fn disjoint_boxes_both_survive() {
        let raw = raw_tensor(
            &[
                (50.0, 50.0, 20.0, 20.0, 1, 0.9),
                (200.0, 200.0, 20.0, 20.0, 1, 0.6),
            ],
            3,
        );
        let dets = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert_eq!(dets.len(), 2);
    }

    #[test]
    fn same_geometry_different_classes_both_survive() {
        let raw = raw_tensor(
            &[
                (100.0, 100.0, 40.0, 40.0, 0, 0.9),
                (100.0, 100.0, 40.0, 40.0, 2, 0.8),
            ],
            3,
        );
        let dets = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert_eq!(dets.len(), 2);
    }

    #[test]
    fn raising_threshold_never_adds_detections() {
        let anchors = [
            (50.0, 50.0, 20.0, 20.0, 0, 0.3),
            (120.0, 50.0, 20.0, 20.0, 0, 0.5),
            (200.0, 50.0, 20.0, 20.0, 1, 0.7),
            (280.0, 50.0, 20.0, 20.0, 2, 0.95),
        ];
        let raw = raw_tensor(&anchors, 3);
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.25, 0.4, 0.6, 0.8, 0.99] {
            let count = decode(&raw, threshold, 0.45, 300).unwrap().len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn kept_detections_respect_the_iou_invariant() {
        // Chain of partially overlapping boxes in one class.
        let anchors = [
            (100.0, 100.0, 40.0, 40.0, 0, 0.9),
            (110.0, 100.0, 40.0, 40.0, 0, 0.8),
            (120.0, 100.0, 40.0, 40.0, 0, 0.7),
            (180.0, 100.0, 40.0, 40.0, 0, 0.6),
        ];
        let raw = raw_tensor(&anchors, 2);
        let iou_threshold = 0.45;
        let dets = decode(&raw, 0.25, iou_threshold, 300).unwrap();
        for a in 0..dets.len() {
            for b in (a + 1)..dets.len() {
                if dets[a].class_id == dets[b].class_id {
                    assert!(iou(&dets[a], &dets[b]) < iou_threshold);
                }
            }
        }
    }

    #[test]
    fn cap_keeps_the_top_confidences() {
        let anchors: Vec<Anchor> = (0..6)
            .map(|i| {
                let x = 50.0 + 100.0 * i as f32;
                (x, 50.0, 20.0, 20.0, i % 2, 0.3 + 0.1 * i as f32)
            })
            .collect();
        let raw = raw_tensor(&anchors, 2);
        let dets = decode(&raw, 0.25, 0.45, 3).unwrap();
        assert_eq!(dets.len(), 3);
        // After the cap the list is confidence non-increasing.
        for pair in dets.windows(2) {
            assert!(pair[0].conf >= pair[1].conf);
        }
        assert!((dets[0].conf - 0.8).abs() < 1e-6);
        assert!((dets[2].conf - 0.6).abs() < 1e-6);
    }

    #[test]
    fn equal_confidence_ties_break_on_extraction_order() {
        // Two disjoint boxes with identical confidence; the earlier anchor
        // must always come out first, run after run.
        let anchors = [
            (50.0, 50.0, 20.0, 20.0, 0, 0.7),
            (200.0, 200.0, 20.0, 20.0, 0, 0.7),
        ];
        let raw = raw_tensor(&anchors, 2);
        let first = decode(&raw, 0.25, 0.45, 300).unwrap();
        let second = decode(&raw, 0.25, 0.45, 300).unwrap();
        assert_eq!(first, second);
        assert!((first[0].x1 - 40.0).abs() < 1e-4);
        assert!((first[1].x1 - 190.0).abs() < 1e-4);
    }

    #[test]
    fn zero_area_boxes_have_zero_iou() {
        let a = Detection {
            x1: 10.0,
            y1: 10.0,
            x2: 10.0,
            y2: 10.0,
            conf: 0.9,
            class_id: 0,
        };
        let b = a.clone();
        assert_eq!(iou(&a, &b), 0.0);

        // Both survive suppression since their overlap is treated as zero.
        let kept = non_maximum_suppression(vec![a, b], 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn malformed_tensor_is_rejected() {
        let flat = ArrayD::zeros(ndarray::IxDyn(&[8400]));
        assert!(decode(&flat, 0.25, 0.45, 300).is_err());

        let no_classes = Array3::<f32>::zeros((1, 4, 10)).into_dyn();
        assert!(decode(&no_classes, 0.25, 0.45, 300).is_err());
    }
}
