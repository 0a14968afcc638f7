use ndarray::{s, ArrayView3};

use crate::shared::face_box::FaceBox;

/// A decoded picture: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the readers; everything past them
/// sees packed RGB24.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of the frame in decode order (0 for still images).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `face` (clamped to the frame) into a new frame.
    ///
    /// Returns `None` when the clamped box has no area.
    pub fn crop(&self, face: &FaceBox) -> Option<Frame> {
        let clamped = face.clamp_to(self.width, self.height)?;
        let x1 = clamped.x1 as usize;
        let y1 = clamped.y1 as usize;
        let x2 = clamped.x2 as usize;
        let y2 = clamped.y2 as usize;
        let channels = self.channels as usize;
        let row_len = self.width as usize * channels;

        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            let start = row * row_len + x1 * channels;
            let end = row * row_len + x2 * channels;
            data.extend_from_slice(&self.data[start..end]);
        }

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        ))
    }

    /// Copy of the frame turned clockwise by `degrees`.
    ///
    /// Only quarter turns rotate; any other angle yields an unrotated copy.
    pub fn rotated_clockwise(&self, degrees: u32) -> Frame {
        let view = self.as_ndarray();
        let turned = match degrees % 360 {
            90 => view.permuted_axes([1, 0, 2]).slice_move(s![.., ..;-1, ..]),
            180 => view.slice_move(s![..;-1, ..;-1, ..]),
            270 => view.permuted_axes([1, 0, 2]).slice_move(s![..;-1, .., ..]),
            _ => view,
        };
        let (height, width, _) = turned.dim();
        Frame::new(
            turned.iter().copied().collect(),
            width as u32,
            height as u32,
            self.channels,
            self.index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        Frame::new(data, w, h, 3, 7)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape_and_pixel_access() {
        let frame = gradient_frame(4, 2);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
        assert_eq!(arr[[1, 3, 0]], 3);
        assert_eq!(arr[[1, 3, 1]], 1);
    }

    #[test]
    fn test_crop_copies_region_pixels() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&FaceBox::new(2.0, 3.0, 5.0, 7.0, 0.9)).unwrap();
        assert_eq!(crop.width(), 3);
        assert_eq!(crop.height(), 4);
        assert_eq!(crop.index(), 7);
        // top-left pixel of the crop is (x=2, y=3) in the source
        assert_eq!(&crop.data()[0..3], &[2, 3, 0]);
        let arr = crop.as_ndarray();
        assert_eq!(arr[[3, 2, 0]], 4);
        assert_eq!(arr[[3, 2, 1]], 6);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&FaceBox::new(-5.0, 8.0, 4.0, 20.0, 0.9)).unwrap();
        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 2);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = gradient_frame(10, 10);
        assert!(frame.crop(&FaceBox::new(20.0, 20.0, 30.0, 30.0, 0.9)).is_none());
    }

    /// 3x2 single-channel frame:
    /// ```text
    /// 1 2 3
    /// 4 5 6
    /// ```
    fn numbered_frame() -> Frame {
        Frame::new(vec![1, 2, 3, 4, 5, 6], 3, 2, 1, 4)
    }

    #[rstest]
    #[case::quarter(90, 2, 3, vec![4, 1, 5, 2, 6, 3])]
    #[case::half(180, 3, 2, vec![6, 5, 4, 3, 2, 1])]
    #[case::three_quarter(270, 2, 3, vec![3, 6, 2, 5, 1, 4])]
    #[case::none(0, 3, 2, vec![1, 2, 3, 4, 5, 6])]
    #[case::full_turn(360, 3, 2, vec![1, 2, 3, 4, 5, 6])]
    fn test_rotated_clockwise(
        #[case] degrees: u32,
        #[case] width: u32,
        #[case] height: u32,
        #[case] expected: Vec<u8>,
    ) {
        let turned = numbered_frame().rotated_clockwise(degrees);
        assert_eq!(turned.width(), width);
        assert_eq!(turned.height(), height);
        assert_eq!(turned.data(), &expected[..]);
        assert_eq!(turned.index(), 4);
    }

    #[test]
    fn test_rotated_clockwise_keeps_pixels_together() {
        let frame = gradient_frame(4, 2);
        let turned = frame.rotated_clockwise(90);
        // top-left of the upright frame was bottom-left of the source
        assert_eq!(&turned.data()[0..3], &[0, 1, 0]);
        assert_eq!(turned.as_ndarray()[[3, 1, 0]], 3);
        assert_eq!(turned.as_ndarray()[[3, 1, 1]], 0);
    }
}
