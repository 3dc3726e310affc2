/// Normalized cross-correlation template tracker.
///
/// Matches the patch captured at `init` against a bounded search window
/// each frame. The template is never refreshed: tracks are short-lived by
/// contract and re-seeded from detection, so drift resistance matters more
/// than long-horizon adaptation.
use crate::shared::frame::ThermalFrame;
use crate::shared::region::RegionRect;
use crate::tracking::domain::region_tracker::RegionTracker;

pub const DEFAULT_SEARCH_RADIUS: i32 = 12;
pub const DEFAULT_MIN_CORRELATION: f32 = 0.4;

struct TrackState {
    /// Zero-mean template values, row-major.
    template: Vec<f32>,
    template_norm: f32,
    region: RegionRect,
}

pub struct TemplateTracker {
    search_radius: i32,
    min_correlation: f32,
    state: Option<TrackState>,
}

impl TemplateTracker {
    pub fn new(search_radius: i32, min_correlation: f32) -> Self {
        Self {
            search_radius: search_radius.max(1),
            min_correlation,
            state: None,
        }
    }
}

impl Default for TemplateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RADIUS, DEFAULT_MIN_CORRELATION)
    }
}

impl RegionTracker for TemplateTracker {
    fn init(&mut self, frame: &ThermalFrame, region: RegionRect) {
        self.state = None;

        let region = region.clamped(frame.width(), frame.height());
        let Some(patch) = extract(frame, &region) else {
            return;
        };
        let (template, template_norm) = zero_mean(patch);
        if template_norm <= f32::EPSILON {
            // A flat template matches everything equally; treat as untrackable.
            return;
        }
        self.state = Some(TrackState {
            template,
            template_norm,
            region,
        });
    }

    fn update(&mut self, frame: &ThermalFrame) -> Option<RegionRect> {
        let state = self.state.as_mut()?;

        let mut best: Option<(f32, (i32, i32))> = None;
        for dy in -self.search_radius..=self.search_radius {
            for dx in -self.search_radius..=self.search_radius {
                let candidate = state.region.translated(dx, dy);
                let Some(patch) = extract(frame, &candidate) else {
                    continue;
                };
                let score = correlation(&state.template, state.template_norm, &patch);
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, (dx, dy)));
                }
            }
        }

        match best {
            Some((score, (dx, dy))) if score >= self.min_correlation => {
                state.region = state.region.translated(dx, dy);
                Some(state.region)
            }
            _ => {
                self.state = None;
                None
            }
        }
    }
}

/// Copies the rectangle out of the frame, or `None` if it is empty or
/// not fully inside the frame.
fn extract(frame: &ThermalFrame, rect: &RegionRect) -> Option<Vec<f32>> {
    if rect.is_empty()
        || rect.x < 0
        || rect.y < 0
        || rect.x + rect.width > frame.width() as i32
        || rect.y + rect.height > frame.height() as i32
    {
        return None;
    }

    let src = frame.as_ndarray();
    let mut out = Vec::with_capacity((rect.width * rect.height) as usize);
    for row in rect.y..rect.y + rect.height {
        for col in rect.x..rect.x + rect.width {
            out.push(src[[row as usize, col as usize]] as f32);
        }
    }
    Some(out)
}

fn zero_mean(mut values: Vec<f32>) -> (Vec<f32>, f32) {
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    for v in &mut values {
        *v -= mean;
    }
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    (values, norm)
}

/// Normalized cross-correlation in [-1, 1]; 0 when either patch is flat.
fn correlation(template: &[f32], template_norm: f32, patch: &[f32]) -> f32 {
    debug_assert_eq!(template.len(), patch.len());
    let (patch, patch_norm) = zero_mean(patch.to_vec());
    if patch_norm <= f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = template.iter().zip(&patch).map(|(a, b)| a * b).sum();
    dot / (template_norm * patch_norm)
}
