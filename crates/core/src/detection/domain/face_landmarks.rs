//! 5-point face landmarks: eyes, nose, mouth corners.
//!
//! Eye and mouth midpoints anchor the derived tracking regions; the spans
//! between the paired landmarks set a lower bound on region size.

const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;
#[allow(dead_code)]
const NOSE: usize = 2;
const LEFT_MOUTH: usize = 3;
const RIGHT_MOUTH: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// Points with x <= 0 are treated as invisible.
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn has_visible(&self) -> bool {
        self.points.iter().any(|(x, _)| *x > 0.0)
    }

    pub fn eyes_visible(&self) -> bool {
        self.points[LEFT_EYE].0 > 0.0 && self.points[RIGHT_EYE].0 > 0.0
    }

    pub fn mouth_visible(&self) -> bool {
        self.points[LEFT_MOUTH].0 > 0.0 && self.points[RIGHT_MOUTH].0 > 0.0
    }

    /// Midpoint between the two eye landmarks, if both are visible.
    pub fn eye_midpoint(&self) -> Option<(f64, f64)> {
        self.eyes_visible()
            .then(|| midpoint(self.points[LEFT_EYE], self.points[RIGHT_EYE]))
    }

    /// Midpoint between the two mouth corners, if both are visible.
    pub fn mouth_midpoint(&self) -> Option<(f64, f64)> {
        self.mouth_visible()
            .then(|| midpoint(self.points[LEFT_MOUTH], self.points[RIGHT_MOUTH]))
    }

    /// Euclidean distance between the eye landmarks.
    pub fn eye_span(&self) -> Option<f64> {
        self.eyes_visible()
            .then(|| distance(self.points[LEFT_EYE], self.points[RIGHT_EYE]))
    }

    /// Euclidean distance between the mouth corners.
    pub fn mouth_span(&self) -> Option<f64> {
        self.mouth_visible()
            .then(|| distance(self.points[LEFT_MOUTH], self.points[RIGHT_MOUTH]))
    }
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
