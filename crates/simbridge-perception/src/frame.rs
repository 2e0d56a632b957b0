//! Capture payload decoding.
//!
//! Simulators report the camera image as base64 text, usually wrapped in a
//! `data:image/png;base64,` URL.  [`decode_capture_image`] accepts both forms
//! and returns a [`GrayFrame`] using BT.601 luma weights.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::PerceptionError;

/// A single-channel 8-bit image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// `width * height` luma samples.
    pub data: Vec<u8>,
}

impl GrayFrame {
    /// Build a frame from raw samples.  Returns `None` if the buffer length
    /// does not match the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Luma at `(x, y)`.  Out-of-range coordinates read as white.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return u8::MAX;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Pixel coordinates of the frame centre.
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// Strip an optional `data:...;base64,` prefix.
fn base64_body(payload: &str) -> &str {
    payload.rsplit(',').next().unwrap_or(payload).trim()
}

/// Decode a capture's `image` field into a grayscale frame.
///
/// # Errors
///
/// - [`PerceptionError::EmptyPayload`] if there is nothing after the prefix.
/// - [`PerceptionError::Base64`] if the body is not valid base64.
/// - [`PerceptionError::Image`] if the bytes are not a supported image.
pub fn decode_capture_image(payload: &str) -> Result<GrayFrame, PerceptionError> {
    let body = base64_body(payload);
    if body.is_empty() {
        return Err(PerceptionError::EmptyPayload);
    }
    let bytes = STANDARD.decode(body)?;
    let rgb = image::load_from_memory(&bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb.pixels().map(|p| luma(p[0], p[1], p[2])).collect();
    debug!(width, height, encoded_len = body.len(), "decoded capture frame");
    Ok(GrayFrame {
        width,
        height,
        data,
    })
}
