// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The hardware file format.
//!
//! ```yaml
//! resources:
//!   - name: rtc-node
//!     hardware: cpu
//!     cores: 32
//!     core_frequency: 3.0e9
//!     network_speed: 100Gb
//! ```
//!
//! Any attribute that is not given takes the value of the
//! [`default_resource`](crate::default_resource).

use byte_unit::Byte;
use daolite_engine::types::LatencyResult;
use serde::{Deserialize, de};
use serde_yaml::Value;

use crate::{ComputeResource, ComputeResourceBuilder, HardwareKind};

/// Parse a rate which could be a number of bits per second or a string and
/// return the value in bits per second
///
/// The string is a Byte string that specifies units per second. Some examples
/// are:
///  100Gb, 100Gbit (bits)
///  12.5GB, 10GiB (bytes)
pub fn parse_bit_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: de::Deserializer<'de>,
{
    // First deserialize to a generic `Value` so that plain numbers are
    // supported as well as strings.
    let value: Value = Deserialize::deserialize(deserializer)?;

    if let Some(number) = value.as_f64() {
        return Ok(number);
    }

    let s = match value.as_str() {
        Some(s) => s.to_owned(),
        None => {
            return Err(de::Error::custom(format!(
                "'{value:?}': Unsupported type for Deserialize (should be number or String)"
            )));
        }
    };

    let ignore_case = false;
    let num_bytes = Byte::parse_str(&s, ignore_case)
        .map_err(|e| de::Error::custom(format!("Unable to parse {s} as Byte string: {e}")))?;
    Ok(num_bytes.as_u64() as f64 * 8.0)
}

pub fn parse_optional_bit_rate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    Ok(Some(parse_bit_rate(deserializer)?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareConfig {
    pub resources: Vec<ResourceSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSection {
    pub name: String,
    pub hardware: Option<HardwareKind>,
    pub cores: Option<f64>,
    pub core_frequency: Option<f64>,
    pub flops_per_cycle: Option<f64>,
    pub memory_channels: Option<f64>,
    pub memory_width: Option<f64>,
    pub memory_frequency: Option<f64>,
    #[serde(default, deserialize_with = "parse_optional_bit_rate")]
    pub network_speed: Option<f64>,
    pub time_in_driver: Option<f64>,
    pub core_fudge: Option<f64>,
    pub mem_fudge: Option<f64>,
    pub network_fudge: Option<f64>,
}

impl ResourceSection {
    /// Convert this section into a validated resource.
    pub fn build(&self) -> LatencyResult<ComputeResource> {
        let mut builder = ComputeResourceBuilder::new(&self.name);
        if let Some(hardware) = self.hardware {
            builder = builder.hardware(hardware);
        }
        if let Some(v) = self.cores {
            builder = builder.cores(v);
        }
        if let Some(v) = self.core_frequency {
            builder = builder.core_frequency(v);
        }
        if let Some(v) = self.flops_per_cycle {
            builder = builder.flops_per_cycle(v);
        }
        if let Some(v) = self.memory_channels {
            builder = builder.memory_channels(v);
        }
        if let Some(v) = self.memory_width {
            builder = builder.memory_width(v);
        }
        if let Some(v) = self.memory_frequency {
            builder = builder.memory_frequency(v);
        }
        if let Some(v) = self.network_speed {
            builder = builder.network_speed(v);
        }
        if let Some(v) = self.time_in_driver {
            builder = builder.time_in_driver(v);
        }
        if let Some(v) = self.core_fudge {
            builder = builder.core_fudge(v);
        }
        if let Some(v) = self.mem_fudge {
            builder = builder.mem_fudge(v);
        }
        if let Some(v) = self.network_fudge {
            builder = builder.network_fudge(v);
        }
        builder.build()
    }
}
