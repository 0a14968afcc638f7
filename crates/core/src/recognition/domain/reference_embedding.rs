use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::face_encoder::EncodedFace;
use crate::shared::face_box::FaceBox;

/// The descriptor of the identity being searched for.
///
/// Built once per run from the reference image and never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceEmbedding {
    embedding: Embedding,
    face_box: FaceBox,
}

impl ReferenceEmbedding {
    /// Picks the reference face among the faces found in the reference image.
    ///
    /// With several faces the largest one wins; with none there is no
    /// reference and the run cannot proceed.
    pub fn from_faces(faces: Vec<EncodedFace>) -> Option<Self> {
        if faces.len() > 1 {
            log::warn!(
                "Reference image contains {} faces; using the largest",
                faces.len()
            );
        }
        faces
            .into_iter()
            .max_by(|a, b| a.face_box.area().total_cmp(&b.face_box.area()))
            .map(|face| Self {
                embedding: face.embedding,
                face_box: face.face_box,
            })
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Where the reference face was found in the reference image.
    pub fn face_box(&self) -> &FaceBox {
        &self.face_box
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: f64, embedding: Vec<f32>) -> EncodedFace {
        EncodedFace {
            face_box: FaceBox::new(0.0, 0.0, size, size, 0.9),
            embedding: Embedding::from_raw(embedding),
        }
    }

    #[test]
    fn test_no_faces_is_none() {
        assert!(ReferenceEmbedding::from_faces(Vec::new()).is_none());
    }

    #[test]
    fn test_single_face_is_used() {
        let reference = ReferenceEmbedding::from_faces(vec![face(50.0, vec![1.0, 0.0])]).unwrap();
        assert_eq!(reference.embedding().as_slice(), &[1.0, 0.0]);
        assert_eq!(reference.face_box().x2, 50.0);
    }

    #[test]
    fn test_largest_face_wins() {
        let reference = ReferenceEmbedding::from_faces(vec![
            face(20.0, vec![1.0, 0.0]),
            face(80.0, vec![0.0, 1.0]),
            face(40.0, vec![1.0, 1.0]),
        ])
        .unwrap();
        assert_eq!(reference.embedding().as_slice(), &[0.0, 1.0]);
    }
}
