// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::fmt;

use daolite_engine::types::{LatencyResult, require_non_negative, require_positive};
use serde::{Deserialize, Serialize};

const US_PER_S: f64 = 1e6;

/// The kind of device a resource describes.
///
/// The timing model is the same for both. For GPUs `cores` counts streaming
/// multiprocessors (or compute units) and `flops_per_cycle` is per SM.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    #[default]
    Cpu,
    Gpu,
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HardwareKind::Cpu => write!(f, "cpu"),
            HardwareKind::Gpu => write!(f, "gpu"),
        }
    }
}

/// Peak-throughput model of a processor, its memory and its network link.
///
/// Instances can only be created through [`ComputeResourceBuilder`] so every
/// rate is known to be finite and positive. Once built a resource is
/// immutable and is normally shared between components behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComputeResource {
    name: String,
    hardware: HardwareKind,
    cores: f64,
    core_frequency: f64,
    flops_per_cycle: f64,
    memory_channels: f64,
    memory_width: f64,
    memory_frequency: f64,
    network_speed: f64,
    time_in_driver: f64,
    core_fudge: f64,
    mem_fudge: f64,
    network_fudge: f64,
}

impl ComputeResource {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn hardware(&self) -> HardwareKind {
        self.hardware
    }

    #[must_use]
    pub fn cores(&self) -> f64 {
        self.cores
    }

    /// Core clock in Hz.
    #[must_use]
    pub fn core_frequency(&self) -> f64 {
        self.core_frequency
    }

    #[must_use]
    pub fn flops_per_cycle(&self) -> f64 {
        self.flops_per_cycle
    }

    #[must_use]
    pub fn memory_channels(&self) -> f64 {
        self.memory_channels
    }

    /// Width of one memory channel in bits.
    #[must_use]
    pub fn memory_width(&self) -> f64 {
        self.memory_width
    }

    /// Memory transfer rate in Hz.
    #[must_use]
    pub fn memory_frequency(&self) -> f64 {
        self.memory_frequency
    }

    /// Network link speed in bits/s.
    #[must_use]
    pub fn network_speed(&self) -> f64 {
        self.network_speed
    }

    /// Fixed driver overhead added to every network transfer, in µs.
    #[must_use]
    pub fn time_in_driver(&self) -> f64 {
        self.time_in_driver
    }

    #[must_use]
    pub fn core_fudge(&self) -> f64 {
        self.core_fudge
    }

    #[must_use]
    pub fn mem_fudge(&self) -> f64 {
        self.mem_fudge
    }

    #[must_use]
    pub fn network_fudge(&self) -> f64 {
        self.network_fudge
    }

    /// Peak arithmetic rate in operations per second.
    #[must_use]
    pub fn peak_flops(&self) -> f64 {
        self.cores * self.core_frequency * self.flops_per_cycle * self.core_fudge
    }

    /// Peak memory bandwidth in bits per second.
    #[must_use]
    pub fn memory_bandwidth(&self) -> f64 {
        self.memory_channels * self.memory_width * self.memory_frequency * self.mem_fudge
    }

    /// Effective network bandwidth in bits per second.
    #[must_use]
    pub fn network_bandwidth(&self) -> f64 {
        self.network_speed * self.network_fudge
    }

    /// Time in µs to move `bits` through memory at peak bandwidth.
    #[must_use]
    pub fn load_time(&self, bits: f64) -> f64 {
        bits / self.memory_bandwidth() * US_PER_S
    }

    /// Time in µs to perform `ops` operations at the peak arithmetic rate.
    #[must_use]
    pub fn calc_time(&self, ops: f64) -> f64 {
        ops / self.peak_flops() * US_PER_S
    }

    /// Time in µs for a workload that moves `bits` and performs `ops`.
    ///
    /// Memory and compute are assumed not to overlap, so the two times are
    /// added rather than taking the larger.
    #[must_use]
    pub fn total_time(&self, bits: f64, ops: f64) -> f64 {
        self.load_time(bits) + self.calc_time(ops)
    }

    /// Time in µs to send `bits` over the network including the driver
    /// overhead.
    #[must_use]
    pub fn network_time(&self, bits: f64) -> f64 {
        self.network_time_with_driver(bits, self.time_in_driver)
    }

    /// As [`network_time`](Self::network_time) but with a caller supplied
    /// driver overhead in µs.
    #[must_use]
    pub fn network_time_with_driver(&self, bits: f64, time_in_driver: f64) -> f64 {
        bits / self.network_bandwidth() * US_PER_S + time_in_driver
    }
}

impl fmt::Display for ComputeResource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}): {:.1} GFLOP/s, {:.1} GB/s memory, {:.1} Gb/s network",
            self.name,
            self.hardware,
            self.peak_flops() / 1e9,
            self.memory_bandwidth() / 8e9,
            self.network_bandwidth() / 1e9
        )
    }
}

/// Builder for a [`ComputeResource`].
///
/// Every attribute starts at the value of the [`default_resource`] so only
/// the attributes that differ need to be set.
///
/// # Example
///
/// ```rust
/// use daolite_hardware::{ComputeResourceBuilder, HardwareKind};
///
/// let gpu = ComputeResourceBuilder::new("small-gpu")
///     .hardware(HardwareKind::Gpu)
///     .cores(40.0)
///     .flops_per_cycle(128.0)
///     .build()
///     .unwrap();
/// assert_eq!(gpu.cores(), 40.0);
/// ```
#[derive(Clone, Debug)]
pub struct ComputeResourceBuilder {
    resource: ComputeResource,
}

impl ComputeResourceBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            resource: ComputeResource {
                name: name.to_string(),
                hardware: HardwareKind::Cpu,
                cores: 16.0,
                core_frequency: 2.6e9,
                flops_per_cycle: 32.0,
                memory_channels: 4.0,
                memory_width: 64.0,
                memory_frequency: 3.2e9,
                network_speed: 100e9,
                time_in_driver: 5.0,
                core_fudge: 1.0,
                mem_fudge: 1.0,
                network_fudge: 1.0,
            },
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.resource.name = name.to_string();
        self
    }

    #[must_use]
    pub fn hardware(mut self, hardware: HardwareKind) -> Self {
        self.resource.hardware = hardware;
        self
    }

    #[must_use]
    pub fn cores(mut self, cores: f64) -> Self {
        self.resource.cores = cores;
        self
    }

    #[must_use]
    pub fn core_frequency(mut self, hz: f64) -> Self {
        self.resource.core_frequency = hz;
        self
    }

    #[must_use]
    pub fn flops_per_cycle(mut self, flops: f64) -> Self {
        self.resource.flops_per_cycle = flops;
        self
    }

    #[must_use]
    pub fn memory_channels(mut self, channels: f64) -> Self {
        self.resource.memory_channels = channels;
        self
    }

    #[must_use]
    pub fn memory_width(mut self, bits: f64) -> Self {
        self.resource.memory_width = bits;
        self
    }

    #[must_use]
    pub fn memory_frequency(mut self, hz: f64) -> Self {
        self.resource.memory_frequency = hz;
        self
    }

    #[must_use]
    pub fn network_speed(mut self, bits_per_second: f64) -> Self {
        self.resource.network_speed = bits_per_second;
        self
    }

    #[must_use]
    pub fn time_in_driver(mut self, us: f64) -> Self {
        self.resource.time_in_driver = us;
        self
    }

    #[must_use]
    pub fn core_fudge(mut self, fudge: f64) -> Self {
        self.resource.core_fudge = fudge;
        self
    }

    #[must_use]
    pub fn mem_fudge(mut self, fudge: f64) -> Self {
        self.resource.mem_fudge = fudge;
        self
    }

    #[must_use]
    pub fn network_fudge(mut self, fudge: f64) -> Self {
        self.resource.network_fudge = fudge;
        self
    }

    /// Validate the attributes and create the resource.
    pub fn build(self) -> LatencyResult<ComputeResource> {
        let r = self.resource;
        let check = |what: &str, value: f64| require_positive(&format!("{}: {what}", r.name), value);
        check("cores", r.cores)?;
        check("core_frequency", r.core_frequency)?;
        check("flops_per_cycle", r.flops_per_cycle)?;
        check("memory_channels", r.memory_channels)?;
        check("memory_width", r.memory_width)?;
        check("memory_frequency", r.memory_frequency)?;
        check("network_speed", r.network_speed)?;
        check("core_fudge", r.core_fudge)?;
        check("mem_fudge", r.mem_fudge)?;
        check("network_fudge", r.network_fudge)?;
        require_non_negative(&format!("{}: time_in_driver", r.name), r.time_in_driver)?;
        Ok(r)
    }
}

/// The resource used when a component does not name one, or names one that
/// cannot be found.
///
/// 16 cores at 2.6 GHz with 32 flops/cycle, four 64-bit memory channels at
/// 3.2 GHz, a 100 Gb/s network link and 5 µs of driver overhead.
#[must_use]
pub fn default_resource() -> ComputeResource {
    ComputeResourceBuilder::new("default").resource
}
