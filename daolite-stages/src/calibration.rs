// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Pixel calibration: dark subtraction, flat-field division and bad pixel
//! handling.
//!
//! Each pixel costs 3 operations. The raw pixel is read at the camera bit
//! depth and the dark, flat and result are 32-bit words.

use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_zero, require_positive};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::algorithm_ops::{BITS_PER_WORD, Cost};
use crate::grouping::{
    group_count, require_group_count, schedule, uniform_group_size, upstream_groups,
};
use crate::params::{ParamMap, ParamReader};

pub const OPS_PER_PIXEL: f64 = 3.0;
pub const DEFAULT_BIT_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationParams {
    pub n_pixels: usize,
    /// Number of groups; defaults to the number of upstream groups.
    pub group: Option<usize>,
    pub scale: f64,
    pub bit_depth: usize,
    pub flop_scale: f64,
    pub mem_scale: f64,
    /// Workers sharing each group.
    pub n_workers: usize,
}

/// Operation and memory counts for calibrating `n_pixels` pixels.
#[must_use]
pub fn calibration_cost(n_pixels: usize, bit_depth: usize) -> Cost {
    let n = n_pixels as f64;
    Cost::new(
        OPS_PER_PIXEL * n,
        n * bit_depth as f64 + 3.0 * n * BITS_PER_WORD,
    )
}

impl CalibrationParams {
    #[must_use]
    pub fn new(n_pixels: usize) -> Self {
        Self {
            n_pixels,
            group: None,
            scale: 1.0,
            bit_depth: DEFAULT_BIT_DEPTH,
            flop_scale: 1.0,
            mem_scale: 1.0,
            n_workers: 1,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let p = Self {
            n_pixels: reader.required_count("n_pixels")?,
            group: reader.count("group")?,
            scale: reader.number("scale")?.unwrap_or(1.0),
            bit_depth: reader.count("bit_depth")?.unwrap_or(DEFAULT_BIT_DEPTH),
            flop_scale: reader.number("flop_scale")?.unwrap_or(1.0),
            mem_scale: reader.number("mem_scale")?.unwrap_or(1.0),
            n_workers: reader.count("n_workers")?.unwrap_or(1),
        };
        reader.finish()?;
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        require_non_zero(&format!("{component}: n_pixels"), self.n_pixels)?;
        if let Some(group) = self.group {
            require_group_count(&format!("{component}: group"), group)?;
        }
        require_non_zero(&format!("{component}: bit_depth"), self.bit_depth)?;
        require_non_zero(&format!("{component}: n_workers"), self.n_workers)?;
        require_positive(&format!("{component}: scale"), self.scale)?;
        require_positive(&format!("{component}: flop_scale"), self.flop_scale)?;
        require_positive(&format!("{component}: mem_scale"), self.mem_scale)?;
        Ok(())
    }
}

impl StageTiming for CalibrationParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Calibration")?;
        let groups = group_count("Calibration", self.group, None, upstream_groups(upstream))?;
        let pixels_per_group = uniform_group_size(self.n_pixels, groups, self.n_workers);
        let cost = calibration_cost(pixels_per_group, self.bit_depth);
        let per_group =
            cost.scaled_time_on(resource, self.flop_scale, self.mem_scale) / self.scale;
        Ok(schedule(upstream, groups, 0.0, |_| per_group))
    }
}
