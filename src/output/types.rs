//! Output type definitions.

use crate::detection::{Detection, ReassembledResult};
use crate::inference::LabelMap;

/// A detection ready to be written, with its image and class name attached.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord<'a> {
    /// File name of the source image.
    pub image: &'a str,
    /// Detection in the configured coordinate space.
    pub detection: Detection,
    /// Class name from the label map, if one was loaded.
    pub class_name: Option<&'a str>,
}

/// Build output records for one image in result order.
pub fn records<'a>(
    image: &'a str,
    result: &ReassembledResult,
    labels: Option<&'a LabelMap>,
) -> Vec<OutputRecord<'a>> {
    result
        .iter()
        .map(|detection| OutputRecord {
            image,
            detection,
            class_name: labels.and_then(|l| l.name(detection.class_id)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BBox;

    #[test]
    fn test_records_attach_class_names() {
        let labels = LabelMap::parse_lines("animal\nperson\n");
        let result: ReassembledResult = [
            Detection::new(BBox::new(0.0, 0.0, 1.0, 1.0), 2, 0.9),
            Detection::new(BBox::new(2.0, 2.0, 3.0, 3.0), 9, 0.4),
        ]
        .into_iter()
        .collect();

        let out = records("a.jpg", &result, Some(&labels));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].class_name, Some("person"));
        assert_eq!(out[1].class_name, None);
        assert!(out.iter().all(|r| r.image == "a.jpg"));
    }
}
