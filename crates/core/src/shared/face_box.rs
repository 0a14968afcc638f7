/// An axis-aligned face detection in frame pixel coordinates.
///
/// Corners are kept as floats straight from the detector; integer pixel
/// bounds are only derived when cropping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

/// Integer pixel bounds of a box clamped to a frame; `x2`/`y2` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl FaceBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Rounds outward to whole pixels and clamps to `width` x `height`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<PixelBounds> {
        let clamp = |v: f64, max: u32| v.max(0.0).min(max as f64) as u32;
        let bounds = PixelBounds {
            x1: clamp(self.x1.floor(), width),
            y1: clamp(self.y1.floor(), height),
            x2: clamp(self.x2.ceil(), width),
            y2: clamp(self.y2.ceil(), height),
        };
        if bounds.x2 > bounds.x1 && bounds.y2 > bounds.y1 {
            Some(bounds)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceBox {
        FaceBox::new(x1, y1, x2, y2, 1.0)
    }

    #[test]
    fn test_area() {
        assert_relative_eq!(face(0.0, 0.0, 10.0, 5.0).area(), 50.0);
    }

    #[test]
    fn test_inverted_box_has_no_area() {
        assert_relative_eq!(face(10.0, 10.0, 0.0, 0.0).area(), 0.0);
    }

    #[rstest]
    #[case::no_overlap(face(0.0, 0.0, 10.0, 10.0), face(20.0, 20.0, 30.0, 30.0), 0.0)]
    #[case::identical(face(0.0, 0.0, 10.0, 10.0), face(0.0, 0.0, 10.0, 10.0), 1.0)]
    #[case::partial(face(0.0, 0.0, 10.0, 10.0), face(5.0, 5.0, 15.0, 15.0), 25.0 / 175.0)]
    #[case::contained(face(0.0, 0.0, 10.0, 10.0), face(0.0, 0.0, 5.0, 10.0), 0.5)]
    fn test_iou(#[case] a: FaceBox, #[case] b: FaceBox, #[case] expected: f64) {
        assert_relative_eq!(a.iou(&b), expected, epsilon = 1e-9);
        assert_relative_eq!(b.iou(&a), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_clamp_rounds_outward() {
        let bounds = face(1.4, 2.6, 5.2, 7.0).clamp_to(100, 100).unwrap();
        assert_eq!(
            bounds,
            PixelBounds {
                x1: 1,
                y1: 2,
                x2: 6,
                y2: 7
            }
        );
    }

    #[test]
    fn test_clamp_to_frame_edges() {
        let bounds = face(-10.0, -10.0, 150.0, 50.0).clamp_to(100, 80).unwrap();
        assert_eq!(
            bounds,
            PixelBounds {
                x1: 0,
                y1: 0,
                x2: 100,
                y2: 50
            }
        );
    }

    #[test]
    fn test_clamp_outside_frame_is_none() {
        assert!(face(120.0, 0.0, 130.0, 10.0).clamp_to(100, 100).is_none());
    }
}
