// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Data transfers between stages.
//!
//! Three models are supported:
//!  - a single transfer over the resource's network link
//!  - a grouped PCIe transfer that follows the upstream groups
//!  - an end-to-end network transfer over cables and switches

use daolite_engine::invalid_config;
use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyResult, require_non_negative, require_non_zero};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::grouping::{frame_ready, schedule, uniform_group_size, upstream_groups};
use crate::params::{ParamMap, ParamReader};

const US_PER_S: f64 = 1e6;
const SPEED_OF_LIGHT: f64 = 3e8;

/// Host-side staging of PCIe data runs at this fraction of the memory
/// bandwidth.
pub const PCIE_STAGING_FRACTION: f64 = 0.125;
pub const DEFAULT_PCIE_LANES: usize = 16;

/// Per-lane transfer rate in GT/s of a PCIe generation.
pub fn pcie_rate(generation: usize) -> LatencyResult<f64> {
    match generation {
        1 => Ok(2.0),
        2 => Ok(5.0),
        3 => Ok(8.0),
        4 => Ok(32.0),
        5 => Ok(64.0),
        _ => invalid_config!("Unknown PCIe generation: {generation}"),
    }
}

/// Time in µs to move `n_bits` over a PCIe bus.
pub fn pcie_bus_time(n_bits: f64, generation: usize, lanes: usize) -> LatencyResult<f64> {
    let bandwidth = lanes as f64 * 8.0 * pcie_rate(generation)? * 1e9;
    Ok(n_bits / bandwidth * US_PER_S)
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransferMode {
    /// One transfer of everything over the network link.
    Simple,
    Pcie { generation: usize, lanes: usize },
    EndToEnd {
        /// Cable length in metres between hops.
        cable_length: f64,
        num_switch_hops: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetworkParams {
    pub n_bits: usize,
    /// Overrides the resource's driver overhead (µs).
    pub time_in_driver: Option<f64>,
    pub mode: TransferMode,
}

impl NetworkParams {
    #[must_use]
    pub fn new(n_bits: usize) -> Self {
        Self {
            n_bits,
            time_in_driver: None,
            mode: TransferMode::Simple,
        }
    }

    #[must_use]
    pub fn with_driver_time(mut self, time_in_driver: f64) -> Self {
        self.time_in_driver = Some(time_in_driver);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let n_bits = reader.required_count("n_bits")?;
        let time_in_driver = reader.number("time_in_driver")?;
        let pcie_gen = reader.count("pcie_gen")?;
        let pcie_lanes = reader.count("pcie_lanes")?;
        let cable_length = reader.number("cable_length")?;
        let num_switch_hops = reader.count("num_switch_hops")?;
        reader.finish()?;

        let mode = match (pcie_gen, cable_length) {
            (Some(_), Some(_)) => {
                return invalid_config!(
                    "Component '{component}' cannot set both 'pcie_gen' and 'cable_length'"
                );
            }
            (Some(generation), None) => TransferMode::Pcie {
                generation,
                lanes: pcie_lanes.unwrap_or(DEFAULT_PCIE_LANES),
            },
            (None, Some(cable_length)) => TransferMode::EndToEnd {
                cable_length,
                num_switch_hops: num_switch_hops.unwrap_or(0),
            },
            (None, None) => TransferMode::Simple,
        };
        if pcie_lanes.is_some() && !matches!(mode, TransferMode::Pcie { .. }) {
            return invalid_config!("Component '{component}' sets 'pcie_lanes' without 'pcie_gen'");
        }
        if num_switch_hops.is_some() && !matches!(mode, TransferMode::EndToEnd { .. }) {
            return invalid_config!(
                "Component '{component}' sets 'num_switch_hops' without 'cable_length'"
            );
        }

        let p = Self {
            n_bits,
            time_in_driver,
            mode,
        };
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        if let Some(time_in_driver) = self.time_in_driver {
            require_non_negative(&format!("{component}: time_in_driver"), time_in_driver)?;
        }
        match &self.mode {
            TransferMode::Simple => {}
            TransferMode::Pcie { generation, lanes } => {
                pcie_rate(*generation)?;
                require_non_zero(&format!("{component}: pcie_lanes"), *lanes)?;
            }
            TransferMode::EndToEnd { cable_length, .. } => {
                require_non_negative(&format!("{component}: cable_length"), *cable_length)?;
            }
        }
        Ok(())
    }

    fn driver_time(&self, resource: &ComputeResource) -> f64 {
        self.time_in_driver.unwrap_or(resource.time_in_driver())
    }

    /// Time in µs for an end-to-end transfer: propagation and switching at
    /// every hop, serialisation of the data and a driver delay at each end.
    #[must_use]
    pub fn end_to_end_time(
        &self,
        resource: &ComputeResource,
        cable_length: f64,
        num_switch_hops: usize,
    ) -> f64 {
        let bandwidth = resource.network_bandwidth();
        let transmission = self.n_bits as f64 / bandwidth * US_PER_S;
        let per_hop = cable_length / SPEED_OF_LIGHT * US_PER_S + transmission;
        per_hop * (num_switch_hops as f64 + 1.0) + transmission + 2.0 * self.driver_time(resource)
    }
}

impl StageTiming for NetworkParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Network")?;
        match &self.mode {
            TransferMode::Simple => {
                let start = frame_ready(upstream);
                let time = resource
                    .network_time_with_driver(self.n_bits as f64, self.driver_time(resource));
                Ok(TimingArray::single(start, start + time))
            }
            TransferMode::EndToEnd {
                cable_length,
                num_switch_hops,
            } => {
                let start = frame_ready(upstream);
                let time = self.end_to_end_time(resource, *cable_length, *num_switch_hops);
                Ok(TimingArray::single(start, start + time))
            }
            TransferMode::Pcie { generation, lanes } => {
                let groups = upstream_groups(upstream);
                let chunk = uniform_group_size(self.n_bits, groups, 1) as f64;
                let per_group = resource.load_time(chunk) / PCIE_STAGING_FRACTION
                    + pcie_bus_time(chunk, *generation, *lanes)?;
                Ok(schedule(upstream, groups, 0.0, |_| per_group))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use daolite_hardware::default_resource;

    use super::*;
    use crate::params;

    #[test]
    fn simple_transfer() {
        let resource = default_resource();
        let upstream = TimingArray::single(0.0, 50.0);
        let timing = NetworkParams::new(100_000)
            .timing(&resource, Some(&upstream))
            .unwrap();
        assert_relative_eq!(timing[0].start, 50.0);
        assert_relative_eq!(timing[0].finish, 50.0 + 1.0 + 5.0);

        let timing = NetworkParams::new(100_000)
            .with_driver_time(0.0)
            .timing(&resource, None)
            .unwrap();
        assert_relative_eq!(timing[0].finish, 1.0);
    }

    #[test]
    fn pcie_follows_groups() {
        let resource = default_resource();
        let upstream = TimingArray::from_rows(&[(0.0, 1.0), (1.0, 2.0)]).unwrap();
        let timing = NetworkParams::new(1_024_000)
            .with_mode(TransferMode::Pcie { generation: 4, lanes: 16 })
            .timing(&resource, Some(&upstream))
            .unwrap();
        assert_eq!(timing.len(), 2);
        let chunk = 512_000.0;
        let per_group = resource.load_time(chunk) * 8.0 + chunk / (16.0 * 8.0 * 32e9) * 1e6;
        assert_relative_eq!(timing[0].start, 1.0);
        assert_relative_eq!(timing[0].duration(), per_group);
        assert_relative_eq!(timing[1].start, timing[0].finish.max(2.0));
    }

    #[test]
    fn end_to_end() {
        let resource = default_resource();
        let p = NetworkParams::new(100_000).with_mode(TransferMode::EndToEnd {
            cable_length: 300.0,
            num_switch_hops: 1,
        });
        let timing = p.timing(&resource, None).unwrap();
        // 1 µs propagation + 1 µs switching per hop, 2 hops, 1 µs on the wire
        // and 5 µs of driver at each end.
        assert_relative_eq!(timing[0].finish, 2.0 * 2.0 + 1.0 + 10.0, max_relative = 1e-12);
    }

    #[test]
    fn end_to_end_any_hop_count() {
        let resource = default_resource();
        let p = NetworkParams::new(100_000).with_mode(TransferMode::EndToEnd {
            cable_length: 300.0,
            num_switch_hops: usize::MAX,
        });
        let timing = p.timing(&resource, None).unwrap();
        assert!(timing[0].finish.is_finite());
        assert!(timing[0].finish > 1e19);
    }

    #[test]
    fn parameter_modes() {
        let p = NetworkParams::from_params("net", &params! { "n_bits" => 10, "pcie_gen" => 3 })
            .unwrap();
        assert_eq!(p.mode, TransferMode::Pcie { generation: 3, lanes: 16 });
        let p = NetworkParams::from_params(
            "net",
            &params! { "n_bits" => 10, "cable_length" => 5.0, "num_switch_hops" => 2 },
        )
        .unwrap();
        assert_eq!(
            p.mode,
            TransferMode::EndToEnd {
                cable_length: 5.0,
                num_switch_hops: 2
            }
        );
        assert!(
            NetworkParams::from_params(
                "net",
                &params! { "n_bits" => 10, "cable_length" => 5.0, "pcie_gen" => 3 }
            )
            .is_err()
        );
        assert!(
            NetworkParams::from_params("net", &params! { "n_bits" => 10, "pcie_gen" => 6 }).is_err()
        );
        assert!(
            NetworkParams::from_params("net", &params! { "n_bits" => 10, "pcie_lanes" => 8 })
                .is_err()
        );
    }
}
