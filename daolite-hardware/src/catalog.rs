// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Reference profiles of common processors.
//!
//! The figures are vendor peak numbers for single-precision arithmetic. For
//! GPUs a "core" is a streaming multiprocessor (or compute unit) and the
//! memory is described as a set of 1024-bit HBM stacks or a single GDDR bus.

use daolite_engine::types::LatencyResult;

use crate::{ComputeResource, ComputeResourceBuilder, HardwareKind};

struct Profile {
    name: &'static str,
    hardware: HardwareKind,
    cores: f64,
    core_frequency: f64,
    flops_per_cycle: f64,
    memory_channels: f64,
    memory_width: f64,
    memory_frequency: f64,
    network_speed: f64,
    time_in_driver: f64,
}

const fn cpu(
    name: &'static str,
    cores: f64,
    core_frequency: f64,
    flops_per_cycle: f64,
    memory_channels: f64,
    memory_frequency: f64,
) -> Profile {
    Profile {
        name,
        hardware: HardwareKind::Cpu,
        cores,
        core_frequency,
        flops_per_cycle,
        memory_channels,
        memory_width: 64.0,
        memory_frequency,
        network_speed: 100e9,
        time_in_driver: 5.0,
    }
}

const fn gpu(
    name: &'static str,
    cores: f64,
    core_frequency: f64,
    flops_per_cycle: f64,
    memory_channels: f64,
    memory_width: f64,
    memory_frequency: f64,
) -> Profile {
    Profile {
        name,
        hardware: HardwareKind::Gpu,
        cores,
        core_frequency,
        flops_per_cycle,
        memory_channels,
        memory_width,
        memory_frequency,
        network_speed: 200e9,
        time_in_driver: 10.0,
    }
}

const PROFILES: &[Profile] = &[
    cpu("amd_epyc_7763", 64.0, 2.45e9, 32.0, 8.0, 3.2e9),
    cpu("amd_epyc_9654", 96.0, 2.4e9, 32.0, 12.0, 4.8e9),
    cpu("intel_xeon_8480", 56.0, 2.0e9, 64.0, 8.0, 4.8e9),
    cpu("intel_xeon_8462", 32.0, 2.8e9, 64.0, 8.0, 5.6e9),
    cpu("amd_ryzen_7950x", 16.0, 4.5e9, 32.0, 2.0, 5.2e9),
    gpu("nvidia_a100_80gb", 108.0, 1.41e9, 128.0, 5.0, 1024.0, 3.2e9),
    gpu("nvidia_a100_40gb", 108.0, 1.41e9, 128.0, 5.0, 1024.0, 2.43e9),
    gpu("nvidia_h100_80gb", 132.0, 1.83e9, 256.0, 5.0, 1024.0, 5.23e9),
    gpu("nvidia_rtx_6000_ada", 142.0, 2.505e9, 256.0, 1.0, 384.0, 20e9),
    gpu("nvidia_rtx_4090", 128.0, 2.52e9, 256.0, 1.0, 384.0, 21e9),
    gpu("nvidia_v100_32gb", 80.0, 1.53e9, 128.0, 4.0, 1024.0, 1.75e9),
    gpu("amd_mi250x", 220.0, 1.7e9, 128.0, 8.0, 1024.0, 3.2e9),
    gpu("amd_mi300x", 304.0, 2.1e9, 128.0, 8.0, 1024.0, 5.2e9),
];

/// Names of all the built-in profiles.
pub fn names() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.name)
}

/// Build all the built-in profiles.
pub fn builtin_resources() -> LatencyResult<Vec<ComputeResource>> {
    PROFILES
        .iter()
        .map(|p| {
            ComputeResourceBuilder::new(p.name)
                .hardware(p.hardware)
                .cores(p.cores)
                .core_frequency(p.core_frequency)
                .flops_per_cycle(p.flops_per_cycle)
                .memory_channels(p.memory_channels)
                .memory_width(p.memory_width)
                .memory_frequency(p.memory_frequency)
                .network_speed(p.network_speed)
                .time_in_driver(p.time_in_driver)
                .build()
        })
        .collect()
}
