use serde::Serialize;

use crate::postprocess::Detection;

/// One line of the output contract: display name, top-left corner,
/// confidence rounded to four decimals.
#[derive(Debug, Clone, Serialize)]
pub struct UnitRecord {
    pub champ: String,
    pub x: i32,
    pub y: i32,
    pub conf: f32,
}

/// Maps detections to output records, in the order received.
///
/// A class index outside the label table (including the empty-table case)
/// falls back to its decimal string form.
pub fn format_detections(detections: &[Detection], labels: &[String]) -> Vec<UnitRecord> {
    detections
        .iter()
        .map(|det| UnitRecord {
            champ: labels
                .get(det.class_id)
                .cloned()
                .unwrap_or_else(|| det.class_id.to_string()),
            x: det.x1 as i32,
            y: det.y1 as i32,
            conf: round_conf(det.conf),
        })
        .collect()
}

fn round_conf(conf: f32) -> f32 {
    (conf * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, conf: f32, class_id: usize) -> Detection {
        Detection {
            x1,
            y1,
            x2: x1 + 30.0,
            y2: y1 + 30.0,
            conf,
            class_id,
        }
    }

    #[test]
    fn labels_map_through_the_table() {
        let labels = vec!["Ahri".to_string(), "Braum".to_string()];
        let records = format_detections(&[det(12.7, 34.2, 0.88, 1)], &labels);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].champ, "Braum");
        assert_eq!(records[0].x, 12);
        assert_eq!(records[0].y, 34);
    }

    #[test]
    fn empty_table_falls_back_to_the_index() {
        let records = format_detections(&[det(0.0, 0.0, 0.9, 7)], &[]);
        assert_eq!(records[0].champ, "7");
    }

    #[test]
    fn out_of_range_index_falls_back_too() {
        let labels = vec!["Ahri".to_string()];
        let records = format_detections(&[det(0.0, 0.0, 0.9, 5)], &labels);
        assert_eq!(records[0].champ, "5");
    }

    #[test]
    fn confidence_is_rounded_to_four_decimals() {
        let records = format_detections(&[det(0.0, 0.0, 0.87654, 0)], &[]);
        assert!((records[0].conf - 0.8765).abs() < 1e-6);
    }

    #[test]
    fn record_order_is_preserved() {
        let dets = [det(0.0, 0.0, 0.5, 0), det(50.0, 0.0, 0.9, 1)];
        let records = format_detections(&dets, &[]);
        assert_eq!(records[0].champ, "0");
        assert_eq!(records[1].champ, "1");
    }

    #[test]
    fn record_serializes_to_the_output_contract() {
        let records = format_detections(&[det(123.0, 456.0, 0.88, 0)], &["Ahri".to_string()]);
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(json, r#"[{"champ":"Ahri","x":123,"y":456,"conf":0.88}]"#);
    }
}
