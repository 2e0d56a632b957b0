//! `simbridge-perception` – turning simulator captures into obstacles.
//!
//! # Modules
//!
//! - [`frame`] – [`GrayFrame`][frame::GrayFrame] and
//!   [`decode_capture_image`][frame::decode_capture_image], which unwraps a
//!   base64 (optionally `data:` URL) capture payload into grayscale pixels.
//! - [`detector`] – the [`ObstacleDetector`][detector::ObstacleDetector]
//!   seam and the default threshold-and-contour
//!   [`ContourDetector`][detector::ContourDetector].

use thiserror::Error;

pub mod detector;
pub mod frame;

pub use detector::{ContourDetector, Obstacle, ObstacleDetector};
pub use frame::{decode_capture_image, GrayFrame};

/// Reasons a capture payload could not become a frame.
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("capture payload is empty")]
    EmptyPayload,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("undecodable image: {0}")]
    Image(#[from] image::ImageError),
}
