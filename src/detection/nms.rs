//! Greedy per-class non-maximum suppression.

use crate::detection::Detection;

/// Suppress overlapping same-class detections, keeping the highest score.
///
/// Candidates are visited by descending score. Exact score ties are
/// visited in input order. A candidate is dropped when its IoU with an
/// already kept detection of the same class exceeds `iou_threshold`. The
/// result is in visiting order, so the output is fully determined by the
/// input sequence. Detections with a non-finite score are discarded.
pub fn non_max_suppression(detections: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut order: Vec<usize> = (0..detections.len())
        .filter(|&i| detections[i].score.is_finite())
        .collect();
    // sort_by is stable; equal scores keep their input order
    order.sort_by(|&a, &b| detections[b].score.total_cmp(&detections[a].score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for index in order {
        let candidate = detections[index];
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::detection::BBox;

    fn det(xmin: f32, ymin: f32, xmax: f32, ymax: f32, class_id: u32, score: f32) -> Detection {
        Detection::new(BBox::new(xmin, ymin, xmax, ymax), class_id, score)
    }

    #[test]
    fn test_nms_keeps_highest_in_cluster() {
        let input = vec![
            det(0.0, 0.0, 10.0, 10.0, 1, 0.7),
            det(1.0, 1.0, 11.0, 11.0, 1, 0.9),
            det(0.5, 0.5, 10.5, 10.5, 1, 0.8),
        ];
        let kept = non_max_suppression(&input, 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_is_per_class() {
        let input = vec![
            det(0.0, 0.0, 10.0, 10.0, 1, 0.9),
            det(0.0, 0.0, 10.0, 10.0, 2, 0.6),
        ];
        let kept = non_max_suppression(&input, 0.5);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_keeps_low_overlap() {
        let input = vec![
            det(0.0, 0.0, 10.0, 10.0, 1, 0.9),
            det(8.0, 0.0, 18.0, 10.0, 1, 0.8),
        ];
        // IoU = 20 / 180
        assert_eq!(non_max_suppression(&input, 0.5).len(), 2);
        assert_eq!(non_max_suppression(&input, 0.1).len(), 1);
    }

    #[test]
    fn test_nms_ties_resolve_by_input_order() {
        let first = det(0.0, 0.0, 10.0, 10.0, 3, 0.75);
        let second = det(0.5, 0.0, 10.5, 10.0, 3, 0.75);
        assert_eq!(non_max_suppression(&[first, second], 0.5), vec![first]);
        assert_eq!(non_max_suppression(&[second, first], 0.5), vec![second]);
    }

    #[test]
    fn test_nms_output_sorted_by_score() {
        let input = vec![
            det(0.0, 0.0, 5.0, 5.0, 1, 0.4),
            det(50.0, 50.0, 55.0, 55.0, 2, 0.95),
            det(100.0, 0.0, 105.0, 5.0, 1, 0.6),
        ];
        let scores: Vec<f32> = non_max_suppression(&input, 0.5)
            .iter()
            .map(|d| d.score)
            .collect();
        assert_eq!(scores, vec![0.95, 0.6, 0.4]);
    }

    #[test]
    fn test_nms_idempotent() {
        let input = vec![
            det(0.0, 0.0, 10.0, 10.0, 1, 0.9),
            det(2.0, 2.0, 12.0, 12.0, 1, 0.85),
            det(9.0, 9.0, 19.0, 19.0, 1, 0.8),
            det(0.0, 0.0, 10.0, 10.0, 2, 0.7),
            det(30.0, 30.0, 40.0, 40.0, 1, 0.3),
            det(31.0, 30.0, 41.0, 40.0, 1, 0.3),
        ];
        let once = non_max_suppression(&input, 0.4);
        let twice = non_max_suppression(&once, 0.4);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nms_discards_non_finite_scores() {
        let input: Vec<Detection> = (0..64_u16)
            .map(|i| {
                let x = f32::from(i) * 20.0;
                let score = match i % 3 {
                    0 => f32::NAN,
                    1 => f32::INFINITY,
                    _ => 0.5,
                };
                det(x, 0.0, x + 10.0, 10.0, 1, score)
            })
            .collect();
        let kept = non_max_suppression(&input, 0.5);
        assert_eq!(kept.len(), 21);
        assert!(kept.iter().all(|d| d.score == 0.5));
    }

    #[test]
    fn test_nms_empty() {
        assert!(non_max_suppression(&[], 0.5).is_empty());
    }
}
