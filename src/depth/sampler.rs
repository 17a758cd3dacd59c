// SPDX-License-Identifier: GPL-3.0-only

//! Nearest-obstacle distance from a depth frame
//!
//! Looks at a small centered window (what is straight ahead of the user),
//! drops dropout pixels and reports a low percentile of what remains. A low
//! percentile ignores isolated noise spikes but still reports a close edge
//! that a mean or median would average away.

use super::frame::DepthFrame;
use crate::config::SamplerConfig;
use tracing::trace;

/// Pixel rectangle inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionOfInterest {
    /// Centered region covering `fraction` of each frame dimension
    ///
    /// Edges are at least `min_pixels` long and never exceed the frame.
    pub fn centered(frame_width: u32, frame_height: u32, fraction: f32, min_pixels: u32) -> Self {
        let edge = |len: u32| ((len as f32 * fraction) as u32).max(min_pixels).min(len);
        let width = edge(frame_width);
        let height = edge(frame_height);
        Self {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Extracts one distance estimate per frame
///
/// Stateless: the same frame always yields the same estimate.
#[derive(Debug, Clone, Copy)]
pub struct DepthSampler {
    config: SamplerConfig,
}

impl DepthSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Region the sampler reads for a frame of this size
    pub fn region_for(&self, frame: &DepthFrame) -> RegionOfInterest {
        RegionOfInterest::centered(
            frame.width(),
            frame.height(),
            self.config.roi_fraction,
            self.config.min_roi_pixels,
        )
    }

    /// Distance to the nearest obstacle straight ahead in meters
    ///
    /// `None` when the region holds no valid reading (featureless surface,
    /// out of range). That is a normal outcome, not an error.
    pub fn sample(&self, frame: &DepthFrame) -> Option<f32> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }

        let roi = self.region_for(frame);
        let mut readings = Vec::with_capacity(roi.pixel_count());
        for y in roi.y..roi.y + roi.height {
            let row = frame.row(y);
            readings.extend(
                row[roi.x as usize..(roi.x + roi.width) as usize]
                    .iter()
                    .copied()
                    .filter(|&d| DepthFrame::is_valid_reading(d)),
            );
        }

        if readings.is_empty() {
            trace!(?roi, "No valid depth readings in region");
            return None;
        }

        readings.sort_unstable_by(f32::total_cmp);
        let index = percentile_index(readings.len(), self.config.percentile);
        let distance = readings[index];

        trace!(
            valid = readings.len(),
            total = roi.pixel_count(),
            index,
            distance,
            "Sampled depth region"
        );
        Some(distance)
    }
}

impl Default for DepthSampler {
    fn default() -> Self {
        Self::new(SamplerConfig::default())
    }
}

/// Rank of the percentile within `count` sorted readings
///
/// Uses `floor(p * (count - 1))`, not `floor(p * count)`: ten readings
/// 0.2..1.0 must report 0.2, which only this rank gives. From 20 readings on
/// the two rules pick neighbouring indices (1 vs 2 at 20 readings).
fn percentile_index(count: usize, percentile: f32) -> usize {
    let last = count.saturating_sub(1);
    let rank = (percentile.clamp(0.0, 1.0) * last as f32).floor() as usize;
    rank.min(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 25x10 frame: the default region is the 5x2 block at (10, 4)
    fn frame_with_region(region: &[f32], background: f32) -> DepthFrame {
        let (width, height) = (25u32, 10u32);
        let mut data = vec![background; (width * height) as usize];
        for (i, &value) in region.iter().enumerate() {
            let x = 10 + (i as u32 % 5);
            let y = 4 + (i as u32 / 5);
            data[(y * width + x) as usize] = value;
        }
        DepthFrame::new(width, height, data).unwrap()
    }

    #[test]
    fn test_region_geometry() {
        let roi = RegionOfInterest::centered(25, 10, 0.2, 2);
        assert_eq!(
            roi,
            RegionOfInterest {
                x: 10,
                y: 4,
                width: 5,
                height: 2
            }
        );

        // Small frames still get the 2x2 minimum
        let roi = RegionOfInterest::centered(4, 4, 0.2, 2);
        assert_eq!((roi.x, roi.y, roi.width, roi.height), (1, 1, 2, 2));

        // ...but never more than the frame itself
        let roi = RegionOfInterest::centered(1, 3, 0.2, 2);
        assert_eq!((roi.x, roi.width), (0, 1));
    }

    #[test]
    fn test_hand_computed_percentile() {
        let region = [0.5, 0.9, 0.2, 0.8, 1.0, 0.3, 0.7, 0.4, 0.8, 0.6];
        // Closer background outside the region must not leak in
        let frame = frame_with_region(&region, 0.05);
        assert_eq!(DepthSampler::default().sample(&frame), Some(0.2));
    }

    #[test]
    fn test_percentile_index_grows_with_count() {
        assert_eq!(percentile_index(1, 0.1), 0);
        assert_eq!(percentile_index(10, 0.1), 0);
        assert_eq!(percentile_index(11, 0.1), 1);
        assert_eq!(percentile_index(100, 0.1), 9);
        assert_eq!(percentile_index(5, 1.0), 4);
    }

    #[test]
    fn test_twenty_readings_use_second_lowest() {
        assert_eq!(percentile_index(20, 0.1), 1);

        // 25x10 frame with a 0.5 fraction: 12x5 region of 60 pixels at (6, 2)
        let sampler = DepthSampler::new(SamplerConfig {
            roi_fraction: 0.5,
            ..SamplerConfig::default()
        });
        let readings: Vec<f32> = (1..=20).map(|i| i as f32 / 10.0).collect();
        let mut data = vec![f32::NAN; 250];
        for (i, &value) in readings.iter().enumerate() {
            let x = 6 + (i as u32 % 12);
            let y = 2 + (i as u32 / 12);
            data[(y * 25 + x) as usize] = value;
        }
        let frame = DepthFrame::new(25, 10, data).unwrap();
        assert_eq!(sampler.region_for(&frame).pixel_count(), 60);
        assert_eq!(sampler.sample(&frame), Some(0.2));
    }

    #[test]
    fn test_ignores_single_noise_spike() {
        let mut region = vec![1.2f32; 40];
        region[17] = 0.01;
        let width = 50u32;
        let height = 20u32;
        // 50x20 frame -> 10x4 region of 40 pixels at (20, 8)
        let mut data = vec![3.0f32; (width * height) as usize];
        for (i, &value) in region.iter().enumerate() {
            let x = 20 + (i as u32 % 10);
            let y = 8 + (i as u32 / 10);
            data[(y * width + x) as usize] = value;
        }
        let frame = DepthFrame::new(width, height, data).unwrap();
        assert_eq!(DepthSampler::default().sample(&frame), Some(1.2));
    }

    #[test]
    fn test_no_valid_pixels() {
        let region = [0.0, f32::NAN, -1.0, f32::INFINITY, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let frame = frame_with_region(&region, 0.8);
        assert_eq!(DepthSampler::default().sample(&frame), None);

        let empty = DepthFrame::new(0, 0, Vec::new()).unwrap();
        assert_eq!(DepthSampler::default().sample(&empty), None);
    }

    #[test]
    fn test_mixed_valid_and_invalid() {
        let region = [f32::NAN, 0.0, 0.9, f32::NAN, 0.6, 0.0, 1.4, f32::NAN, 0.0, 0.0];
        let frame = frame_with_region(&region, 0.1);
        assert_eq!(DepthSampler::default().sample(&frame), Some(0.6));
    }
}
