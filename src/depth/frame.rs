// SPDX-License-Identifier: GPL-3.0-only

//! Depth frame storage

use crate::constants::depth::{DEPTH_INVALID_MM, DEPTH_MAX_VALID_MM};
use crate::errors::{SensorError, SensorResult};
use std::sync::Arc;

/// Per-pixel distance readings in meters, row-major
///
/// Pixels that are non-finite or <= 0 carry no data. Frames are cheap to
/// clone; the sampler only reads them and never keeps one around.
#[derive(Clone)]
pub struct DepthFrame {
    width: u32,
    height: u32,
    meters: Arc<[f32]>,
}

impl DepthFrame {
    /// Create a frame from meter readings
    ///
    /// Fails if the data length does not match `width * height`.
    pub fn new(width: u32, height: u32, meters: impl Into<Arc<[f32]>>) -> SensorResult<Self> {
        let meters = meters.into();
        let expected = width as usize * height as usize;
        if meters.len() != expected {
            return Err(SensorError::InvalidFrame(format!(
                "{}x{} frame needs {} readings, got {}",
                width,
                height,
                expected,
                meters.len()
            )));
        }
        Ok(Self {
            width,
            height,
            meters,
        })
    }

    /// Create a frame filled with one reading
    pub fn filled(width: u32, height: u32, meters: f32) -> Self {
        Self {
            width,
            height,
            meters: vec![meters; width as usize * height as usize].into(),
        }
    }

    /// Convert raw millimeter readings from a depth camera
    ///
    /// `0` and anything above the valid range become NaN (no data).
    pub fn from_millimeters(width: u32, height: u32, millimeters: &[u16]) -> SensorResult<Self> {
        let meters: Vec<f32> = millimeters
            .iter()
            .map(|&mm| {
                if mm == DEPTH_INVALID_MM || mm > DEPTH_MAX_VALID_MM {
                    f32::NAN
                } else {
                    mm as f32 / 1000.0
                }
            })
            .collect();
        Self::new(width, height, meters)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw readings, row-major
    pub fn readings(&self) -> &[f32] {
        &self.meters
    }

    /// Reading at (x, y), or None outside the frame
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.meters
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// One row of readings
    pub fn row(&self, y: u32) -> &[f32] {
        let start = y as usize * self.width as usize;
        &self.meters[start..start + self.width as usize]
    }

    /// Whether a reading carries distance data
    pub fn is_valid_reading(meters: f32) -> bool {
        meters.is_finite() && meters > 0.0
    }
}

impl std::fmt::Debug for DepthFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DepthFrame({}x{})", self.width, self.height)
    }
}
