// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Wavefront reconstruction by matrix-vector multiplication of the slopes
//! with an `n_acts x n_slopes` reconstructor.
//!
//! The slopes arrive in groups, so each group multiplies its slice of the
//! slope vector with the matching columns of the reconstructor. In full
//! frame mode the whole multiplication runs once after the last slope.

use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_zero, require_positive};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::algorithm_ops::{self, Cost};
use crate::grouping::{agenda_group_size, frame_ready, group_count, schedule, uniform_group_size};
use crate::params::{ParamMap, ParamReader};

pub const DEFAULT_GROUP: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructionParams {
    pub n_slopes: usize,
    pub n_acts: usize,
    pub group: Option<usize>,
    pub scale: f64,
    pub n_workers: usize,
    /// Number of slopes that become ready in each group.
    pub agenda: Option<Vec<usize>>,
    pub flop_scale: f64,
    pub mem_scale: f64,
    pub full_frame: bool,
}

/// Operation and memory counts for `n_slopes` slopes against `n_acts`
/// actuators.
#[must_use]
pub fn reconstruction_cost(n_slopes: usize, n_acts: usize) -> Cost {
    algorithm_ops::mvm(n_slopes as f64, n_acts as f64)
}

/// Operation and memory counts of one multiplication over the whole frame:
/// the slopes, the commands and the reconstructor are each loaded once.
#[must_use]
pub fn full_frame_reconstruction_cost(n_slopes: usize, n_acts: usize) -> Cost {
    let (n, m) = (n_slopes as f64, n_acts as f64);
    Cost::words(2.0 * n * m, n + m + n * m)
}

impl ReconstructionParams {
    #[must_use]
    pub fn new(n_slopes: usize, n_acts: usize) -> Self {
        Self {
            n_slopes,
            n_acts,
            group: None,
            scale: 1.0,
            n_workers: 1,
            agenda: None,
            flop_scale: 1.0,
            mem_scale: 1.0,
            full_frame: false,
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

    #[must_use]
    pub fn with_full_frame(mut self, full_frame: bool) -> Self {
        self.full_frame = full_frame;
        self
    }

    #[must_use]
    pub fn with_agenda(mut self, agenda: Vec<usize>) -> Self {
        self.agenda = Some(agenda);
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let p = Self {
            n_slopes: reader.required_count("n_slopes")?,
            n_acts: reader.required_count("n_acts")?,
            group: reader.count("group")?,
            scale: reader.number("scale")?.unwrap_or(1.0),
            n_workers: reader.count("n_workers")?.unwrap_or(1),
            agenda: reader.counts("agenda")?,
            flop_scale: reader.number("flop_scale")?.unwrap_or(1.0),
            mem_scale: reader.number("mem_scale")?.unwrap_or(1.0),
            full_frame: reader.flag("full_frame")?.unwrap_or(false),
        };
        reader.finish()?;
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        require_non_zero(&format!("{component}: n_slopes"), self.n_slopes)?;
        require_non_zero(&format!("{component}: n_acts"), self.n_acts)?;
        require_non_zero(&format!("{component}: n_workers"), self.n_workers)?;
        require_positive(&format!("{component}: scale"), self.scale)?;
        require_positive(&format!("{component}: flop_scale"), self.flop_scale)?;
        require_positive(&format!("{component}: mem_scale"), self.mem_scale)?;
        group_count(component, self.group, self.agenda.as_deref(), DEFAULT_GROUP)?;
        Ok(())
    }

    /// Time in µs to fold `n_slopes` slopes into the actuator commands.
    #[must_use]
    pub fn group_time(&self, resource: &ComputeResource, n_slopes: usize) -> f64 {
        if n_slopes == 0 {
            return 0.0;
        }
        reconstruction_cost(n_slopes, self.n_acts).scaled_time_on(
            resource,
            self.flop_scale,
            self.mem_scale,
        ) / self.scale
    }

    /// Time in µs of the whole reconstruction run in one go.
    #[must_use]
    pub fn full_frame_time(&self, resource: &ComputeResource) -> f64 {
        full_frame_reconstruction_cost(self.n_slopes, self.n_acts).scaled_time_on(
            resource,
            self.flop_scale,
            self.mem_scale,
        ) / self.scale
    }
}

impl StageTiming for ReconstructionParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Reconstruction")?;

        if self.full_frame {
            let start = frame_ready(upstream);
            return Ok(TimingArray::single(start, start + self.full_frame_time(resource)));
        }

        if self.n_slopes == 1 {
            let start = frame_ready(upstream);
            let time = self.group_time(resource, 1) / self.n_workers as f64;
            return Ok(TimingArray::single(start, start + time));
        }

        let agenda = self.agenda.as_deref();
        let groups = group_count("Reconstruction", self.group, agenda, DEFAULT_GROUP)?;
        let uniform = uniform_group_size(self.n_slopes, groups, self.n_workers);
        Ok(schedule(upstream, groups, 0.0, |i| {
            let n_slopes = match agenda {
                Some(agenda) => agenda_group_size(agenda, i, self.n_workers),
                None => uniform,
            };
            self.group_time(resource, n_slopes)
        }))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use daolite_hardware::default_resource;

    use super::*;

    #[test]
    fn mvm_counts() {
        let cost = reconstruction_cost(100, 50);
        assert_relative_eq!(cost.ops, 2.0 * 100.0 * 50.0);
        assert_relative_eq!(cost.bits, 4.0 * 100.0 * 50.0 * 32.0);
    }

    #[test]
    fn full_frame_counts() {
        let cost = full_frame_reconstruction_cost(100, 50);
        assert_relative_eq!(cost.ops, 2.0 * 100.0 * 50.0);
        assert_relative_eq!(cost.bits, (100.0 + 50.0 + 100.0 * 50.0) * 32.0);
    }

    #[test]
    fn full_frame_waits_for_every_slope() {
        let resource = default_resource();
        let upstream = TimingArray::from_rows(&[(0.0, 10.0), (10.0, 20.0), (20.0, 35.0)]).unwrap();
        let p = ReconstructionParams::new(1000, 500)
            .with_group(3)
            .with_full_frame(true);
        let timing = p.timing(&resource, Some(&upstream)).unwrap();
        assert_eq!(timing.len(), 1);
        assert_relative_eq!(timing[0].start, 35.0);

        let expected = resource.load_time((1000.0 + 500.0 + 1000.0 * 500.0) * 32.0)
            + resource.calc_time(2.0 * 1000.0 * 500.0);
        assert_relative_eq!(timing[0].duration(), expected, max_relative = 1e-12);

        let faster = p.clone().with_scale(2.0).timing(&resource, Some(&upstream)).unwrap();
        assert_relative_eq!(faster[0].duration(), expected / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn full_frame_from_params() {
        let p = ReconstructionParams::from_params(
            "recon",
            &crate::params! { "n_slopes" => 100, "n_acts" => 50, "full_frame" => true },
        )
        .unwrap();
        assert!(p.full_frame);
        assert!(!ReconstructionParams::new(100, 50).full_frame);
    }

    #[test]
    fn workers_share_groups() {
        let resource = default_resource();
        let one = ReconstructionParams::new(1000, 500).with_group(10);
        let four = one.clone().with_workers(4);
        let t1 = one.timing(&resource, None).unwrap();
        let t4 = four.timing(&resource, None).unwrap();
        assert!(t4.span() < t1.span());
        assert_relative_eq!(t1[0].duration(), one.group_time(&resource, 100));
        assert_relative_eq!(t4[0].duration(), one.group_time(&resource, 25));
    }

    #[test]
    fn agenda_sizes_groups() {
        let resource = default_resource();
        let p = ReconstructionParams::new(300, 100).with_agenda(vec![100, 0, 200]);
        let timing = p.timing(&resource, None).unwrap();
        assert_eq!(timing.len(), 3);
        assert_relative_eq!(timing[1].duration(), 0.0);
        assert_relative_eq!(timing[2].duration(), p.group_time(&resource, 200));
    }
}
