use crate::shared::frame::ThermalFrame;
use crate::shared::region::RegionRect;

/// Domain interface for short-horizon region tracking.
///
/// A tracker follows one rectangle frame-to-frame without re-detection.
/// `init` replaces any previous track; `update` advances it and returns
/// the new rectangle, or `None` once the track is lost. After a loss the
/// tracker stays lost until the next `init`.
pub trait RegionTracker: Send {
    fn init(&mut self, frame: &ThermalFrame, region: RegionRect);

    fn update(&mut self, frame: &ThermalFrame) -> Option<RegionRect>;
}
