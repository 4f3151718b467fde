// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Deformable mirror control.
//!
//! The whole actuator vector goes through an integrator (run twice and
//! weighted by `combine`), an offset, a saturation clamp and a power
//! estimate once the full frame of commands is available.

use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_negative, require_non_zero, require_positive};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::algorithm_ops::Cost;
use crate::grouping::frame_ready;
use crate::params::{ParamMap, ParamReader};

/// Fixed time in µs added once per frame.
pub const DEFAULT_OVERHEAD: f64 = 8.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ControlParams {
    pub n_acts: usize,
    pub scale: f64,
    pub combine: f64,
    pub overhead: f64,
}

#[must_use]
pub fn integrator_cost(n_acts: usize) -> Cost {
    let m = n_acts as f64;
    Cost::words(2.0 * m, 2.0 * m)
}

#[must_use]
pub fn offset_cost(n_acts: usize) -> Cost {
    let m = n_acts as f64;
    Cost::words(m, 2.0 * m)
}

#[must_use]
pub fn saturation_cost(n_acts: usize) -> Cost {
    let m = n_acts as f64;
    Cost::words(2.0 * m, 2.0 * m)
}

#[must_use]
pub fn dm_power_cost(n_acts: usize) -> Cost {
    let m = n_acts as f64;
    Cost::words(2.0 * m, 2.0 * m)
}

impl ControlParams {
    #[must_use]
    pub fn new(n_acts: usize) -> Self {
        Self {
            n_acts,
            scale: 1.0,
            combine: 1.0,
            overhead: DEFAULT_OVERHEAD,
        }
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let p = Self {
            n_acts: reader.required_count("n_acts")?,
            scale: reader.number("scale")?.unwrap_or(1.0),
            combine: reader.number("combine")?.unwrap_or(1.0),
            overhead: reader.number("overhead")?.unwrap_or(DEFAULT_OVERHEAD),
        };
        reader.finish()?;
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        require_non_zero(&format!("{component}: n_acts"), self.n_acts)?;
        require_positive(&format!("{component}: scale"), self.scale)?;
        require_non_negative(&format!("{component}: combine"), self.combine)?;
        require_non_negative(&format!("{component}: overhead"), self.overhead)?;
        Ok(())
    }

    /// Time in µs for one frame, including the fixed overhead.
    #[must_use]
    pub fn frame_time(&self, resource: &ComputeResource) -> f64 {
        let m = self.n_acts;
        let integrator = integrator_cost(m).time_on(resource) * self.combine * 2.0;
        let chain = integrator
            + offset_cost(m).time_on(resource)
            + saturation_cost(m).time_on(resource)
            + dm_power_cost(m).time_on(resource);
        chain / self.scale + self.overhead
    }
}

impl StageTiming for ControlParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Control")?;
        let start = frame_ready(upstream);
        Ok(TimingArray::single(start, start + self.frame_time(resource)))
    }
}
