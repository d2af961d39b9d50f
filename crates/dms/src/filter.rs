//! Eye-position filtering within a face region

use crate::analysis::FaceDetection;
use crate::detector::BBox;

/// Fraction of the face height, from the top, where eyes are accepted
pub const DEFAULT_UPPER_RATIO: f64 = 0.65;

/// Rejects eye candidates whose vertical center is not in the upper part
/// of the face. The bound is strict: a center exactly on it is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePositionFilter {
    upper_ratio: f64,
}

impl Default for EyePositionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_UPPER_RATIO)
    }
}

impl EyePositionFilter {
    pub fn new(upper_ratio: f64) -> Self {
        Self { upper_ratio }
    }

    pub fn upper_ratio(&self) -> f64 {
        self.upper_ratio
    }

    /// Whether an eye box (relative to the face) lies high enough
    pub fn accepts(&self, eye: &BBox, face_height: u32) -> bool {
        eye.vertical_center() < f64::from(face_height) * self.upper_ratio
    }

    /// Keep the accepted candidates, in order
    pub fn apply(&self, candidates: impl IntoIterator<Item = BBox>, face_height: u32) -> Vec<BBox> {
        candidates
            .into_iter()
            .filter(|eye| self.accepts(eye, face_height))
            .collect()
    }
}

/// A frame has visible eyes iff some face kept at least one eye
pub fn eyes_visible(faces: &[FaceDetection]) -> bool {
    faces.iter().any(|face| !face.eyes.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_center_on_bound_is_rejected() {
        let filter = EyePositionFilter::default();
        // center = 60 + 10 * 0.5 = 65 = 0.65 * 100
        assert!(!filter.accepts(&BBox::new(0, 60, 10, 10), 100));
        assert!(filter.accepts(&BBox::new(0, 59, 10, 10), 100));
    }

    #[test]
    fn test_center_at_top_is_accepted() {
        let filter = EyePositionFilter::default();
        assert!(filter.accepts(&BBox::new(5, 0, 10, 0), 100));
    }

    #[test]
    fn test_apply_keeps_order() {
        let filter = EyePositionFilter::default();
        let eyes = vec![
            BBox::new(10, 20, 20, 20),
            BBox::new(40, 80, 20, 20),
            BBox::new(60, 25, 20, 20),
        ];

        let kept = filter.apply(eyes, 120);
        assert_eq!(kept, vec![BBox::new(10, 20, 20, 20), BBox::new(60, 25, 20, 20)]);
    }

    #[test]
    fn test_eyes_visible_needs_one_face_with_eyes() {
        let face = BBox::new(0, 0, 100, 100);
        let without = FaceDetection {
            face,
            eyes: vec![],
        };
        let with = FaceDetection {
            face,
            eyes: vec![BBox::new(10, 10, 20, 20)],
        };

        assert!(!eyes_visible(&[]));
        assert!(!eyes_visible(&[without.clone()]));
        assert!(eyes_visible(&[without, with]));
    }

    proptest! {
        #[test]
        fn prop_upper_half_always_accepted(
            face_height in 2u32..2_000,
            y_frac in 0.0f64..0.25,
            h_frac in 0.0f64..0.25,
        ) {
            let y = (f64::from(face_height) * y_frac) as u32;
            let h = (f64::from(face_height) * h_frac) as u32;
            let filter = EyePositionFilter::default();
            prop_assert!(filter.accepts(&BBox::new(0, y, 10, h), face_height));
        }

        #[test]
        fn prop_boxes_starting_below_bound_rejected(
            face_height in 1u32..2_000,
            extra in 0u32..500,
            h in 0u32..500,
        ) {
            let y = (f64::from(face_height) * DEFAULT_UPPER_RATIO).ceil() as u32 + extra;
            let filter = EyePositionFilter::default();
            prop_assert!(!filter.accepts(&BBox::new(0, y, 10, h), face_height));
        }
    }
}
