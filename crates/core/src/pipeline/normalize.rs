//! Intensity normalization for thermal frames.
//!
//! Raw thermal counts drift with scene temperature; stretching each frame
//! to full range gives the detector and trackers a consistent input.

use crate::io::domain::messages::ImageMessage;
use crate::shared::frame::ThermalFrame;

/// Stretches the frame so min maps to 0 and max to `u16::MAX`.
///
/// Returns `None` for frames with zero dynamic range (blank sensor).
pub fn rescale_full_range(frame: &ThermalFrame) -> Option<ThermalFrame> {
    let min = *frame.data().iter().min()?;
    let max = *frame.data().iter().max()?;
    if min == max {
        return None;
    }

    let range = (max - min) as u32;
    let data = frame
        .data()
        .iter()
        .map(|&v| ((v - min) as u32 * u16::MAX as u32 / range) as u16)
        .collect();
    Some(ThermalFrame::new(
        data,
        frame.width(),
        frame.height(),
        frame.stamp(),
    ))
}

/// Down-converts to the mono8 wire format by dropping the low byte.
pub fn to_mono8(frame: &ThermalFrame) -> ImageMessage {
    let data = frame.data().iter().map(|&v| (v >> 8) as u8).collect();
    ImageMessage::new(frame.stamp(), frame.width(), frame.height(), data)
}
