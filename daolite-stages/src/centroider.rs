// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Wavefront sensor centroiding.
//!
//! Each sub-aperture is either cross-correlated against a reference (two
//! forward FFTs, a conjugate, an element-wise product and an inverse FFT)
//! followed by a centre-of-gravity, or compared with a square-difference
//! search. Reference slopes are then subtracted and the slope error
//! computed.

use daolite_engine::invalid_config;
use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_zero, require_positive};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::algorithm_ops::{self, Cost};
use crate::grouping::{agenda_group_size, frame_ready, group_count, schedule, uniform_group_size};
use crate::params::{ParamMap, ParamReader};

pub const DEFAULT_GROUP: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct CentroiderParams {
    pub n_valid_subaps: usize,
    /// Side of a sub-aperture in pixels.
    pub n_pix_per_subap: usize,
    pub group: Option<usize>,
    pub scale: f64,
    pub square_diff: bool,
    pub n_workers: usize,
    pub sort: bool,
    /// Number of sub-apertures that become ready in each group.
    pub agenda: Option<Vec<usize>>,
    /// Hold the first group until this upstream group has finished.
    pub delay_start: usize,
}

/// Cross-correlation of `n_subs` sub-apertures of `n_pix` x `n_pix` pixels.
#[must_use]
pub fn cross_correlate_cost(n_subs: usize, n_pix: usize) -> Cost {
    let m = n_pix as f64;
    let per_subap = algorithm_ops::fft(m, m)
        + algorithm_ops::fft(m, m)
        + algorithm_ops::conjugate(m, m)
        + algorithm_ops::mmm(m, m)
        + algorithm_ops::fft(m, m);
    per_subap * n_subs as f64
}

/// Square-difference search of `n_subs` sub-apertures.
#[must_use]
pub fn square_diff_cost(n_subs: usize, n_pix: usize) -> Cost {
    let m = n_pix as f64;
    algorithm_ops::square_diff(m, 2.0 * m) * n_subs as f64
}

/// Centre-of-gravity of `n_subs` sub-apertures, optionally sorting the
/// pixels of each first.
#[must_use]
pub fn centroid_cost(n_subs: usize, n_pix: usize, sort: bool) -> Cost {
    let m = n_pix as f64;
    let mut per_subap = algorithm_ops::centroid(m);
    if sort {
        per_subap = per_subap + algorithm_ops::merge_sort(m * m);
    }
    per_subap * n_subs as f64
}

/// Subtraction of the reference slopes.
#[must_use]
pub fn reference_slopes_cost(n_subs: usize) -> Cost {
    let n = n_subs as f64;
    Cost::words(2.0 * n, 2.0 * n)
}

/// Slope error computation.
#[must_use]
pub fn error_cost(n_subs: usize) -> Cost {
    let n = n_subs as f64;
    Cost::words(8.0 * n, 2.0 * n)
}

impl CentroiderParams {
    #[must_use]
    pub fn new(n_valid_subaps: usize, n_pix_per_subap: usize) -> Self {
        Self {
            n_valid_subaps,
            n_pix_per_subap,
            group: None,
            scale: 1.0,
            square_diff: false,
            n_workers: 1,
            sort: false,
            agenda: None,
            delay_start: 0,
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
    pub fn with_agenda(mut self, agenda: Vec<usize>) -> Self {
        self.agenda = Some(agenda);
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let p = Self {
            n_valid_subaps: reader.required_count("n_valid_subaps")?,
            n_pix_per_subap: reader.required_count("n_pix_per_subap")?,
            group: reader.count("group")?,
            scale: reader.number("scale")?.unwrap_or(1.0),
            square_diff: reader.flag("square_diff")?.unwrap_or(false),
            n_workers: reader.count("n_workers")?.unwrap_or(1),
            sort: reader.flag("sort")?.unwrap_or(false),
            agenda: reader.counts("agenda")?,
            delay_start: reader.count("delay_start")?.unwrap_or(0),
        };
        reader.finish()?;
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        require_non_zero(&format!("{component}: n_valid_subaps"), self.n_valid_subaps)?;
        require_non_zero(&format!("{component}: n_pix_per_subap"), self.n_pix_per_subap)?;
        require_non_zero(&format!("{component}: n_workers"), self.n_workers)?;
        require_positive(&format!("{component}: scale"), self.scale)?;
        group_count(component, self.group, self.agenda.as_deref(), DEFAULT_GROUP)?;
        Ok(())
    }

    /// Time in µs to process `n_subs` sub-apertures.
    #[must_use]
    pub fn group_time(&self, resource: &ComputeResource, n_subs: usize) -> f64 {
        if n_subs == 0 {
            return 0.0;
        }
        let n_pix = self.n_pix_per_subap;
        let matching = if self.square_diff {
            square_diff_cost(n_subs, n_pix).time_on(resource)
        } else {
            cross_correlate_cost(n_subs, n_pix).time_on(resource)
                + centroid_cost(n_subs, n_pix, self.sort).time_on(resource)
        };
        let slopes =
            reference_slopes_cost(n_subs).time_on(resource) + error_cost(n_subs).time_on(resource);
        (matching + slopes) / self.scale
    }
}

impl StageTiming for CentroiderParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Centroider")?;

        if self.n_valid_subaps == 1 {
            let start = frame_ready(upstream);
            let time = centroid_cost(1, self.n_pix_per_subap, self.sort).time_on(resource)
                / self.n_workers as f64
                / self.scale;
            return Ok(TimingArray::single(start, start + time));
        }

        let agenda = self.agenda.as_deref();
        let groups = group_count("Centroider", self.group, agenda, DEFAULT_GROUP)?;

        let first_ready = match upstream {
            Some(upstream) if self.delay_start > 0 => {
                if self.delay_start >= upstream.len() {
                    return invalid_config!(
                        "Centroider: delay_start {} is beyond the {} upstream groups",
                        self.delay_start,
                        upstream.len()
                    );
                }
                upstream[self.delay_start].finish
            }
            _ => 0.0,
        };

        let uniform = uniform_group_size(self.n_valid_subaps, groups, self.n_workers);
        Ok(schedule(upstream, groups, first_ready, |i| {
            let n_subs = match agenda {
                Some(agenda) => agenda_group_size(agenda, i, self.n_workers),
                None => uniform,
            };
            self.group_time(resource, n_subs)
        }))
    }
}
