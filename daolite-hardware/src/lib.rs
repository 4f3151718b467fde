// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Performance models of the hardware that runs each pipeline stage.
//!
//! A [`ComputeResource`] turns a workload (bits moved, operations performed)
//! into a time in microseconds using a peak-throughput roofline model:
//! memory time and compute time are summed and never overlapped.
//!
//! Resources are built with the validating [`ComputeResourceBuilder`], read
//! from hardware YAML files, or looked up by name in a
//! [`HardwareRegistry`](registry::HardwareRegistry) which carries a built-in
//! catalogue of common CPUs and GPUs.

pub mod catalog;
pub mod registry;
mod resource;
pub mod test_helpers;
pub mod types;

pub use registry::{HardwareRegistry, Resolved, ResourceWarning};
pub use resource::{ComputeResource, ComputeResourceBuilder, HardwareKind, default_resource};
