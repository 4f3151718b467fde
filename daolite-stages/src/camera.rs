// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Camera readout.
//!
//! The sensor is read out for a fixed time and the pixels are then sent over
//! the camera link in groups, back-to-back. There is no compute.

use std::str::FromStr;

use daolite_engine::invalid_config;
use daolite_engine::timing::TimingArray;
use daolite_engine::types::{LatencyError, LatencyResult, require_non_negative, require_non_zero};
use daolite_hardware::ComputeResource;

use crate::StageTiming;
use crate::grouping::{frame_ready, require_group_count, uniform_group_size};
use crate::params::{ParamMap, ParamReader};

pub const DEFAULT_GROUP: usize = 50;
pub const DEFAULT_BITS_PER_PIXEL: usize = 16;

/// Camera interfaces with known sensor readout times.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CameraModel {
    #[default]
    PcoCamLink,
    GigeVision,
    RollingShutter,
}

impl CameraModel {
    /// Sensor readout time in µs.
    #[must_use]
    pub fn readout(&self) -> f64 {
        match self {
            CameraModel::PcoCamLink => 500.0,
            CameraModel::GigeVision => 600.0,
            CameraModel::RollingShutter => 700.0,
        }
    }
}

impl FromStr for CameraModel {
    type Err = LatencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pco_camlink" | "PCOCamLink" => Ok(CameraModel::PcoCamLink),
            "gige_vision" | "GigeVisionCamera" => Ok(CameraModel::GigeVision),
            "rolling_shutter" | "RollingShutterCamera" => Ok(CameraModel::RollingShutter),
            _ => invalid_config!("Unknown camera '{s}'"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub n_pixels: usize,
    pub group: usize,
    /// Sensor readout time in µs.
    pub readout: f64,
    pub bits_per_pixel: usize,
}

impl CameraParams {
    #[must_use]
    pub fn new(n_pixels: usize) -> Self {
        Self {
            n_pixels,
            group: DEFAULT_GROUP,
            readout: CameraModel::default().readout(),
            bits_per_pixel: DEFAULT_BITS_PER_PIXEL,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    #[must_use]
    pub fn with_readout(mut self, readout: f64) -> Self {
        self.readout = readout;
        self
    }

    pub fn from_params(component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let mut reader = ParamReader::new(component, params);
        let n_pixels = reader.required_count("n_pixels")?;
        // Pipelines saved by the designer name the model `camera_function`.
        let model = match (reader.text("camera")?, reader.text("camera_function")?) {
            (Some(_), Some(_)) => {
                return invalid_config!(
                    "Component '{component}' sets both 'camera' and 'camera_function'"
                );
            }
            (Some(name), None) | (None, Some(name)) => name.parse()?,
            (None, None) => CameraModel::default(),
        };
        let p = Self {
            n_pixels,
            group: reader.count("group")?.unwrap_or(DEFAULT_GROUP),
            readout: reader.number("readout")?.unwrap_or(model.readout()),
            bits_per_pixel: reader
                .count("bits_per_pixel")?
                .unwrap_or(DEFAULT_BITS_PER_PIXEL),
        };
        reader.finish()?;
        p.validate(component)?;
        Ok(p)
    }

    pub fn validate(&self, component: &str) -> LatencyResult {
        require_non_zero(&format!("{component}: n_pixels"), self.n_pixels)?;
        require_group_count(&format!("{component}: group"), self.group)?;
        require_non_zero(&format!("{component}: bits_per_pixel"), self.bits_per_pixel)?;
        require_non_negative(&format!("{component}: readout"), self.readout)?;
        Ok(())
    }
}

impl StageTiming for CameraParams {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        self.validate("Camera")?;
        let pixels_per_group = uniform_group_size(self.n_pixels, self.group, 1);
        let bits_per_group = pixels_per_group as f64 * self.bits_per_pixel as f64;
        let transfer = resource.network_time(bits_per_group);

        let mut timing = TimingArray::with_capacity(self.group);
        let first = frame_ready(upstream) + self.readout;
        for _ in 0..self.group {
            timing.push_after(first, transfer);
        }
        Ok(timing)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use daolite_hardware::default_resource;

    use super::*;
    use crate::params;

    #[test]
    fn readout_then_transfer() {
        let resource = default_resource();
        let timing = CameraParams::new(100).with_group(2).timing(&resource, None).unwrap();
        // 50 pixels of 16 bits per group
        let transfer = 800.0 / 100e9 * 1e6 + 5.0;
        assert_eq!(timing.len(), 2);
        assert_relative_eq!(timing[0].start, 500.0);
        assert_relative_eq!(timing[0].finish, 500.0 + transfer);
        assert_relative_eq!(timing[1].start, timing[0].finish);
        assert_relative_eq!(timing[1].finish, 500.0 + 2.0 * transfer);
    }

    #[test]
    fn upstream_offsets_readout() {
        let resource = default_resource();
        let trigger = TimingArray::single(0.0, 100.0);
        let timing = CameraParams::new(100)
            .with_group(2)
            .timing(&resource, Some(&trigger))
            .unwrap();
        assert_relative_eq!(timing[0].start, 600.0);
    }

    #[test]
    fn camera_models() {
        let p = CameraParams::from_params("cam", &params! { "n_pixels" => 10, "camera" => "gige_vision" })
            .unwrap();
        assert_relative_eq!(p.readout, 600.0);
        let p = CameraParams::from_params(
            "cam",
            &params! { "n_pixels" => 10, "camera" => "rolling_shutter", "readout" => 20 },
        )
        .unwrap();
        assert_relative_eq!(p.readout, 20.0);
        assert!(
            CameraParams::from_params("cam", &params! { "n_pixels" => 10, "camera" => "webcam" })
                .is_err()
        );
    }

    #[test]
    fn designer_camera_function() {
        let p = CameraParams::from_params(
            "cam",
            &params! { "n_pixels" => 10, "camera_function" => "GigeVisionCamera" },
        )
        .unwrap();
        assert_relative_eq!(p.readout, 600.0);

        let err = CameraParams::from_params(
            "cam",
            &params! {
                "n_pixels" => 10,
                "camera" => "pco_camlink",
                "camera_function" => "GigeVisionCamera",
            },
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid configuration: Component 'cam' sets both 'camera' and 'camera_function'"
        );
    }

    #[test]
    fn huge_counts_are_rejected() {
        let resource = default_resource();
        let err = CameraParams::new(10)
            .with_group(usize::MAX)
            .timing(&resource, None)
            .unwrap_err();
        assert!(err.to_string().contains("Camera: group must be at most"));

        assert!(
            CameraParams::from_params("cam", &params! { "n_pixels" => 1.0e20, "group" => 1 })
                .is_err()
        );

        let p = CameraParams {
            bits_per_pixel: usize::MAX,
            ..CameraParams::new(usize::MAX).with_group(1)
        };
        let timing = p.timing(&resource, None).unwrap();
        assert_eq!(timing.len(), 1);
        assert!(timing[0].finish.is_finite());
    }
}
