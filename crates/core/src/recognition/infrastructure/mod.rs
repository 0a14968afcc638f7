pub mod onnx_face_detector;
pub mod onnx_face_embedder;
pub mod onnx_face_encoder;
mod onnx_session;
