use thiserror::Error;

use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::face_encoder::EncodedFace;
use crate::recognition::domain::reference_embedding::ReferenceEmbedding;
use crate::shared::constants::DEFAULT_TOLERANCE;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("tolerance must be in (0, 1], got {0}")]
pub struct ToleranceError(pub f64);

/// Maximum cosine distance at which two faces count as the same person.
///
/// Lower is stricter. The default 0.6 accepts cosine similarity 0.4 and up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    pub fn new(value: f64) -> Result<Self, ToleranceError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ToleranceError(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

/// `distance <= tolerance` means the candidate is the reference identity.
pub fn is_match(reference: &Embedding, candidate: &Embedding, tolerance: Tolerance) -> bool {
    reference.distance(candidate) <= tolerance.value()
}

/// Reduces the faces of one frame to a single present/absent decision.
pub struct FaceMatcher {
    reference: ReferenceEmbedding,
    tolerance: Tolerance,
}

impl FaceMatcher {
    pub fn new(reference: ReferenceEmbedding, tolerance: Tolerance) -> Self {
        Self {
            reference,
            tolerance,
        }
    }

    /// True if any face in the frame matches the reference, regardless of
    /// how many faces were found or which one matched.
    pub fn frame_matches(&self, faces: &[EncodedFace]) -> bool {
        faces
            .iter()
            .any(|f| is_match(self.reference.embedding(), &f.embedding, self.tolerance))
    }

    /// Smallest distance between the reference and any face; for diagnostics.
    pub fn closest_distance(&self, faces: &[EncodedFace]) -> Option<f64> {
        faces
            .iter()
            .map(|f| self.reference.embedding().distance(&f.embedding))
            .min_by(f64::total_cmp)
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_box::FaceBox;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn encoded(embedding: Vec<f32>) -> EncodedFace {
        EncodedFace {
            face_box: FaceBox::new(0.0, 0.0, 10.0, 10.0, 0.9),
            embedding: Embedding::from_raw(embedding),
        }
    }

    fn matcher(tolerance: f64) -> FaceMatcher {
        let reference = ReferenceEmbedding::from_faces(vec![encoded(vec![1.0, 0.0])]).unwrap();
        FaceMatcher::new(reference, Tolerance::new(tolerance).unwrap())
    }

    #[rstest]
    #[case::smallest(0.01)]
    #[case::default(0.6)]
    #[case::upper_bound(1.0)]
    fn test_tolerance_accepts_unit_interval(#[case] value: f64) {
        assert_eq!(Tolerance::new(value).unwrap().value(), value);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-0.5)]
    #[case::above_one(1.2)]
    #[case::nan(f64::NAN)]
    fn test_tolerance_rejects_out_of_range(#[case] value: f64) {
        assert!(Tolerance::new(value).is_err());
    }

    #[test]
    fn test_default_tolerance() {
        assert_relative_eq!(Tolerance::default().value(), 0.6);
    }

    #[test]
    fn test_is_match_at_boundary_is_inclusive() {
        let a = Embedding::from_raw(vec![1.0, 0.0]);
        let orthogonal = Embedding::from_raw(vec![0.0, 1.0]);
        let opposite = Embedding::from_raw(vec![-1.0, 0.0]);
        // cosine distance of orthogonal vectors is exactly 1
        assert!(is_match(&a, &orthogonal, Tolerance::new(1.0).unwrap()));
        assert!(!is_match(&a, &opposite, Tolerance::new(1.0).unwrap()));
        assert!(is_match(&a, &a, Tolerance::new(0.01).unwrap()));
    }

    /// Unit vector at the given cosine similarity to `[1, 0]`.
    fn at_similarity(cos: f32) -> Embedding {
        Embedding::from_raw(vec![cos, (1.0 - cos * cos).sqrt()])
    }

    #[rstest]
    #[case::same_crop(0.95, true)]
    #[case::pose_change(0.6, true)]
    #[case::just_inside(0.41, true)]
    #[case::just_outside(0.39, false)]
    #[case::stranger(0.1, false)]
    fn test_default_tolerance_accepts_arcface_same_identity_range(
        #[case] cos: f32,
        #[case] expected: bool,
    ) {
        let reference = Embedding::from_raw(vec![1.0, 0.0]);
        assert_eq!(
            is_match(&reference, &at_similarity(cos), Tolerance::default()),
            expected
        );
    }

    #[test]
    fn test_frame_without_faces_does_not_match() {
        assert!(!matcher(0.6).frame_matches(&[]));
        assert!(matcher(0.6).closest_distance(&[]).is_none());
    }

    #[test]
    fn test_any_matching_face_is_sufficient() {
        let faces = vec![
            encoded(vec![0.0, 1.0]),  // stranger
            encoded(vec![1.0, 0.05]), // reference, slightly off
            encoded(vec![-1.0, 0.0]), // stranger
        ];
        assert!(matcher(0.6).frame_matches(&faces));
    }

    #[test]
    fn test_only_strangers_do_not_match() {
        let faces = vec![encoded(vec![0.0, 1.0]), encoded(vec![-1.0, 0.2])];
        assert!(!matcher(0.6).frame_matches(&faces));
    }

    #[test]
    fn test_tolerance_controls_strictness() {
        // cosine similarity 0.6, so distance 0.4
        let faces = vec![encoded(vec![0.6, 0.8])];
        assert!(matcher(0.6).frame_matches(&faces));
        assert!(!matcher(0.3).frame_matches(&faces));
    }

    #[test]
    fn test_closest_distance_picks_minimum() {
        let faces = vec![encoded(vec![0.0, 1.0]), encoded(vec![1.0, 0.0])];
        assert_relative_eq!(
            matcher(0.6).closest_distance(&faces).unwrap(),
            0.0,
            epsilon = 1e-9
        );
    }
}
