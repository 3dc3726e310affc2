//! Debug overlay rasterization.
//!
//! Draws directly into the mono8 wire image: rectangle outlines for boxes
//! and tracked regions, crosses for landmarks. All drawing is clamped to
//! the image, so callers never pre-validate coordinates.

use crate::detection::domain::face_detector::FaceDetection;
use crate::io::domain::messages::ImageMessage;
use crate::shared::region::RegionRect;

/// Outline intensity for detector boxes and landmark crosses.
pub const DETECTION_VALUE: u8 = 255;

/// Outline intensity for the two tracked regions.
pub const REGION_VALUE: u8 = 200;

const LANDMARK_ARM: i32 = 3;

/// One-pixel rectangle outline.
pub fn draw_rect(image: &mut ImageMessage, rect: &RegionRect, value: u8) {
    let clamped = rect.clamped(image.width, image.height);
    if clamped.is_empty() {
        return;
    }
    let (x1, y1) = clamped.top_left();
    let (x2, y2) = clamped.bottom_right();

    for x in x1..x2 {
        put(image, x, y1, value);
        put(image, x, y2 - 1, value);
    }
    for y in y1..y2 {
        put(image, x1, y, value);
        put(image, x2 - 1, y, value);
    }
}

/// Plus-shaped marker centered on (x, y).
pub fn draw_cross(image: &mut ImageMessage, x: i32, y: i32, value: u8) {
    for d in -LANDMARK_ARM..=LANDMARK_ARM {
        put(image, x + d, y, value);
        put(image, x, y + d, value);
    }
}

/// Draws every detection: box outline plus visible landmarks.
pub fn draw_detections(image: &mut ImageMessage, detections: &[FaceDetection]) {
    for det in detections {
        let rect = RegionRect::new(
            det.bbox.0.round() as i32,
            det.bbox.1.round() as i32,
            det.width().round() as i32,
            det.height().round() as i32,
        );
        draw_rect(image, &rect, DETECTION_VALUE);

        if let Some(ref lm) = det.landmarks {
            for &(px, py) in lm.points() {
                if px > 0.0 {
                    draw_cross(image, px.round() as i32, py.round() as i32, DETECTION_VALUE);
                }
            }
        }
    }
}

fn put(image: &mut ImageMessage, x: i32, y: i32, value: u8) {
    if x < 0 || y < 0 || x >= image.width as i32 || y >= image.height as i32 {
        return;
    }
    image.data[y as usize * image.width as usize + x as usize] = value;
}
