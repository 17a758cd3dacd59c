// SPDX-License-Identifier: GPL-3.0-only

//! Depth frames and distance sampling

pub mod frame;
pub mod sampler;

pub use frame::DepthFrame;
pub use sampler::{DepthSampler, RegionOfInterest};
