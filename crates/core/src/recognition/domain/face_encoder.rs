use crate::recognition::domain::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One detected face and its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedFace {
    pub face_box: FaceBox,
    pub embedding: Embedding,
}

/// Domain interface for face detection plus embedding extraction.
///
/// Returns zero or more faces per frame in no particular order.
/// Implementations may hold model sessions, hence `&mut self`.
pub trait FaceEncoder: Send {
    fn detect_and_encode(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<EncodedFace>, Box<dyn std::error::Error>>;
}
