use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    EYE_HALF_HEIGHT_RATIO, EYE_HALF_WIDTH_RATIO, MOUTH_HALF_HEIGHT_RATIO, MOUTH_HALF_WIDTH_RATIO,
    SPAN_FLOOR_RATIO,
};
use crate::shared::region::RegionRect;

use super::face_detector::BBox;
use super::face_landmarks::FaceLandmarks;

/// Half-extent ratios for one derived region.
///
/// `half_width_ratio`/`half_height_ratio` scale with the face box;
/// `span_floor` sets the minimum half extent as a fraction of the
/// landmark spread so the region always covers its landmark pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionRatios {
    pub half_width_ratio: f64,
    pub half_height_ratio: f64,
    pub span_floor: f64,
}

impl RegionRatios {
    pub fn eye_defaults() -> Self {
        Self {
            half_width_ratio: EYE_HALF_WIDTH_RATIO,
            half_height_ratio: EYE_HALF_HEIGHT_RATIO,
            span_floor: SPAN_FLOOR_RATIO,
        }
    }

    pub fn mouth_defaults() -> Self {
        Self {
            half_width_ratio: MOUTH_HALF_WIDTH_RATIO,
            half_height_ratio: MOUTH_HALF_HEIGHT_RATIO,
            span_floor: SPAN_FLOOR_RATIO,
        }
    }
}

/// The two tracking regions derived from a single detection event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacialRegions {
    pub eye: RegionRect,
    pub mouth: RegionRect,
}

/// Converts one face (box + landmarks) into eye and mouth rectangles.
///
/// Both rectangles come from the same detection event: landmark midpoints
/// set the centers, face-proportional half extents set the size, and the
/// landmark spread floors the size from below. Results are clamped to the
/// frame.
pub struct FacialRegionBuilder {
    eye: RegionRatios,
    mouth: RegionRatios,
}

impl FacialRegionBuilder {
    pub fn new(eye: RegionRatios, mouth: RegionRatios) -> Self {
        Self { eye, mouth }
    }

    /// Returns `None` when either landmark pair is not visible; the
    /// caller treats that as a failed detection.
    pub fn build(
        &self,
        bbox: BBox,
        landmarks: &FaceLandmarks,
        frame_w: u32,
        frame_h: u32,
    ) -> Option<FacialRegions> {
        let face_w = bbox.2 - bbox.0;
        let face_h = bbox.3 - bbox.1;

        let eye_center = landmarks.eye_midpoint()?;
        let mouth_center = landmarks.mouth_midpoint()?;
        let eye_span = landmarks.eye_span()?;
        let mouth_span = landmarks.mouth_span()?;

        let eye = derive(eye_center, face_w, face_h, eye_span, &self.eye)
            .clamped(frame_w, frame_h);
        let mouth = derive(mouth_center, face_w, face_h, mouth_span, &self.mouth)
            .clamped(frame_w, frame_h);

        Some(FacialRegions { eye, mouth })
    }
}

impl Default for FacialRegionBuilder {
    fn default() -> Self {
        Self::new(RegionRatios::eye_defaults(), RegionRatios::mouth_defaults())
    }
}

fn derive(
    center: (f64, f64),
    face_w: f64,
    face_h: f64,
    span: f64,
    ratios: &RegionRatios,
) -> RegionRect {
    let floor = span * ratios.span_floor;
    let half_w = (face_w * ratios.half_width_ratio).max(floor);
    let half_h = (face_h * ratios.half_height_ratio).max(floor);
    RegionRect::from_center(center.0, center.1, half_w, half_h)
}
