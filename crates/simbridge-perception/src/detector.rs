//! Obstacle detection over grayscale frames.
//!
//! [`ContourDetector`] treats dark pixels as obstacle material:
//!
//! 1. Inverse-binary threshold: a pixel is foreground when its luma is at or
//!    below the threshold (150 by default).
//! 2. Holes are filled: background that cannot reach the frame border is
//!    folded into the enclosing blob, so only outer outlines count.
//! 3. 8-connected blobs become bounding boxes; boxes whose `w * h` does not
//!    exceed `min_area` are dropped.
//!
//! # Example
//!
//! ```rust
//! use simbridge_perception::{ContourDetector, GrayFrame, ObstacleDetector};
//!
//! let mut data = vec![255u8; 40 * 30];
//! for y in 10..20 {
//!     for x in 5..25 {
//!         data[y * 40 + x] = 0;
//!     }
//! }
//! let frame = GrayFrame::new(40, 30, data).unwrap();
//!
//! let found = ContourDetector::new(100).detect(&frame);
//! assert_eq!(found.len(), 1);
//! assert_eq!((found[0].center_x, found[0].center_y), (15, 15));
//! assert_eq!((found[0].width, found[0].height), (20, 10));
//! ```

use tracing::trace;

use crate::frame::GrayFrame;

/// Luma at or below which a pixel is considered obstacle.
pub const DEFAULT_THRESHOLD: u8 = 150;

/// A detected obstacle in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub center_x: u32,
    pub center_y: u32,
    pub width: u32,
    pub height: u32,
}

impl Obstacle {
    fn from_box(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        Self {
            center_x: min_x + width / 2,
            center_y: min_y + height / 2,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Anything that can find obstacles in a frame.
pub trait ObstacleDetector: Send + Sync {
    fn detect(&self, frame: &GrayFrame) -> Vec<Obstacle>;
}

/// Threshold-and-outline detector.  See the module docs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourDetector {
    pub threshold: u8,
    pub min_area: u32,
}

impl ContourDetector {
    pub fn new(min_area: u32) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_area,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Foreground mask with enclosed holes filled in.
    fn solid_mask(&self, frame: &GrayFrame) -> Vec<bool> {
        let (w, h) = (frame.width as usize, frame.height as usize);
        let mut mask: Vec<bool> = frame.data.iter().map(|&v| v <= self.threshold).collect();

        // Background reachable from the border, 4-connected so it cannot
        // slip between diagonally touching foreground pixels.
        let mut outside = vec![false; w * h];
        let mut stack = Vec::new();
        for x in 0..w {
            stack.push(x);
            stack.push((h - 1) * w + x);
        }
        for y in 0..h {
            stack.push(y * w);
            stack.push(y * w + w - 1);
        }
        while let Some(i) = stack.pop() {
            if mask[i] || outside[i] {
                continue;
            }
            outside[i] = true;
            let (x, y) = (i % w, i / w);
            if x > 0 {
                stack.push(i - 1);
            }
            if x + 1 < w {
                stack.push(i + 1);
            }
            if y > 0 {
                stack.push(i - w);
            }
            if y + 1 < h {
                stack.push(i + w);
            }
        }

        for (m, o) in mask.iter_mut().zip(&outside) {
            *m = !*o;
        }
        mask
    }
}

impl Default for ContourDetector {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ObstacleDetector for ContourDetector {
    fn detect(&self, frame: &GrayFrame) -> Vec<Obstacle> {
        if frame.width == 0 || frame.height == 0 {
            return Vec::new();
        }
        let (w, h) = (frame.width as usize, frame.height as usize);
        let mask = self.solid_mask(frame);
        let mut seen = vec![false; w * h];
        let mut obstacles = Vec::new();
        let mut stack = Vec::new();

        for start in 0..w * h {
            if !mask[start] || seen[start] {
                continue;
            }
            seen[start] = true;
            stack.push(start);
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0, 0);

            while let Some(i) = stack.pop() {
                let (x, y) = (i % w, i / w);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);

                for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                        let j = ny * w + nx;
                        if mask[j] && !seen[j] {
                            seen[j] = true;
                            stack.push(j);
                        }
                    }
                }
            }

            let obstacle =
                Obstacle::from_box(min_x as u32, min_y as u32, max_x as u32, max_y as u32);
            if obstacle.area() > u64::from(self.min_area) {
                obstacles.push(obstacle);
            } else {
                trace!(?obstacle, min_area = self.min_area, "blob below area cut-off");
            }
        }
        obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 64;
    const H: u32 = 48;

    fn blank() -> Vec<u8> {
        vec![255; (W * H) as usize]
    }

    fn fill(data: &mut [u8], x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
        for y in y0..y1 {
            for x in x0..x1 {
                data[(y * W + x) as usize] = value;
            }
        }
    }

    fn frame(data: Vec<u8>) -> GrayFrame {
        GrayFrame::new(W, H, data).unwrap()
    }

    #[test]
    fn blank_frame_has_no_obstacles() {
        assert!(ContourDetector::new(0).detect(&frame(blank())).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut data = blank();
        fill(&mut data, 0, 0, 20, 20, 150);
        fill(&mut data, 40, 20, 60, 40, 151);
        let found = ContourDetector::new(0).detect(&frame(data));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].width, 20);
    }

    #[test]
    fn area_cut_off_is_strict() {
        let mut data = blank();
        fill(&mut data, 0, 0, 10, 10, 0);
        fill(&mut data, 30, 30, 41, 40, 0);
        let found = ContourDetector::new(100).detect(&frame(data));
        assert_eq!(found, vec![Obstacle { center_x: 35, center_y: 35, width: 11, height: 10 }]);
    }

    #[test]
    fn diagonal_pixels_join_one_blob() {
        let mut data = blank();
        for i in 0..20 {
            data[(i * W + i) as usize] = 0;
        }
        let found = ContourDetector::new(0).detect(&frame(data));
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].width, found[0].height), (20, 20));
    }

    #[test]
    fn blobs_inside_holes_are_not_reported() {
        let mut data = blank();
        fill(&mut data, 10, 10, 50, 40, 0);
        fill(&mut data, 15, 15, 45, 35, 255);
        fill(&mut data, 25, 20, 35, 30, 0);
        let found = ContourDetector::new(0).detect(&frame(data));
        assert_eq!(found, vec![Obstacle { center_x: 30, center_y: 25, width: 40, height: 30 }]);
    }

    #[test]
    fn separate_blobs_are_reported_separately() {
        let mut data = blank();
        fill(&mut data, 2, 2, 22, 22, 10);
        fill(&mut data, 40, 10, 60, 30, 10);
        let mut found = ContourDetector::default().detect(&frame(data));
        found.sort_by_key(|o| o.center_x);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].center_x, found[1].center_x), (12, 50));
    }

    #[test]
    fn empty_frame_is_handled() {
        let empty = GrayFrame::new(0, 0, Vec::new()).unwrap();
        assert!(ContourDetector::default().detect(&empty).is_empty());
    }
}
