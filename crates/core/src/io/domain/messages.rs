//! Wire types for the node's output topics.
//!
//! Schemas mirror the transport middleware's primitives: a polygon is two
//! corner points, images are mono8, and every message carries the stamp of
//! the frame it was derived from.

use serde::{Deserialize, Serialize};

use crate::shared::region::RegionRect;

/// A rectangle on the wire: top-left and bottom-right corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonMessage {
    pub stamp: f64,
    pub points: [(i32, i32); 2],
}

impl PolygonMessage {
    pub fn from_region(stamp: f64, region: &RegionRect) -> Self {
        Self {
            stamp,
            points: [region.top_left(), region.bottom_right()],
        }
    }
}

/// A mono8 image, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub stamp: f64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageMessage {
    pub fn new(stamp: f64, width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            stamp,
            width,
            height,
            data,
        }
    }
}

/// Whether the node currently has a face lock (detected or tracked).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub stamp: f64,
    pub detected: bool,
}
