// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Timing models of the stages of an adaptive optics real-time controller.
//!
//! Every stage takes its parameters, the [`ComputeResource`] it runs on and
//! the [`TimingArray`] of the stage feeding it, and returns its own
//! [`TimingArray`]. Work is split into groups which start as soon as both the
//! previous group and their input are ready (see [`grouping`]).
//!
//! Stage timings are pure functions of their inputs.

use std::fmt;

use daolite_engine::timing::TimingArray;
use daolite_engine::types::LatencyResult;
use daolite_hardware::ComputeResource;
use serde::{Deserialize, Serialize};

pub mod algorithm_ops;
pub mod calibration;
pub mod camera;
pub mod centroider;
pub mod control;
pub mod grouping;
pub mod network;
pub mod params;
pub mod reconstruction;

pub use calibration::CalibrationParams;
pub use camera::{CameraModel, CameraParams};
pub use centroider::CentroiderParams;
pub use control::ControlParams;
pub use network::{NetworkParams, TransferMode};
pub use params::{ParamMap, ParamValue};
pub use reconstruction::ReconstructionParams;

/// The timing function shared by all stages.
pub trait StageTiming {
    /// Compute when each group of this stage starts and finishes.
    ///
    /// `upstream` is the (combined) timing of the stages this one depends on,
    /// or `None` for a stage at the head of the pipeline.
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray>;
}

/// The kinds of stage a pipeline can contain.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    #[serde(alias = "CAMERA", alias = "Camera")]
    Camera,
    #[serde(alias = "CALIBRATION", alias = "Calibration")]
    Calibration,
    #[serde(alias = "CENTROIDER", alias = "Centroider")]
    Centroider,
    #[serde(alias = "RECONSTRUCTION", alias = "Reconstruction")]
    Reconstruction,
    #[serde(alias = "CONTROL", alias = "Control")]
    Control,
    #[serde(
        alias = "NETWORK",
        alias = "Network",
        alias = "network_transfer",
        alias = "NETWORK_TRANSFER"
    )]
    Network,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StageKind::Camera => "camera",
            StageKind::Calibration => "calibration",
            StageKind::Centroider => "centroider",
            StageKind::Reconstruction => "reconstruction",
            StageKind::Control => "control",
            StageKind::Network => "network",
        };
        write!(f, "{name}")
    }
}

/// A stage with its typed parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Camera(CameraParams),
    Calibration(CalibrationParams),
    Centroider(CentroiderParams),
    Reconstruction(ReconstructionParams),
    Control(ControlParams),
    Network(NetworkParams),
}

impl Stage {
    /// Build the typed parameters of a `kind` stage from a parameter map.
    ///
    /// Fails if a required parameter is missing, a value has the wrong type
    /// or is out of range, or a parameter is not known to the stage.
    pub fn from_params(kind: StageKind, component: &str, params: &ParamMap) -> LatencyResult<Self> {
        let stage = match kind {
            StageKind::Camera => Stage::Camera(CameraParams::from_params(component, params)?),
            StageKind::Calibration => {
                Stage::Calibration(CalibrationParams::from_params(component, params)?)
            }
            StageKind::Centroider => {
                Stage::Centroider(CentroiderParams::from_params(component, params)?)
            }
            StageKind::Reconstruction => {
                Stage::Reconstruction(ReconstructionParams::from_params(component, params)?)
            }
            StageKind::Control => Stage::Control(ControlParams::from_params(component, params)?),
            StageKind::Network => Stage::Network(NetworkParams::from_params(component, params)?),
        };
        Ok(stage)
    }

    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Camera(_) => StageKind::Camera,
            Stage::Calibration(_) => StageKind::Calibration,
            Stage::Centroider(_) => StageKind::Centroider,
            Stage::Reconstruction(_) => StageKind::Reconstruction,
            Stage::Control(_) => StageKind::Control,
            Stage::Network(_) => StageKind::Network,
        }
    }

    /// Check the parameters are in range.
    pub fn validate(&self, component: &str) -> LatencyResult {
        match self {
            Stage::Camera(p) => p.validate(component),
            Stage::Calibration(p) => p.validate(component),
            Stage::Centroider(p) => p.validate(component),
            Stage::Reconstruction(p) => p.validate(component),
            Stage::Control(p) => p.validate(component),
            Stage::Network(p) => p.validate(component),
        }
    }
}

impl StageTiming for Stage {
    fn timing(
        &self,
        resource: &ComputeResource,
        upstream: Option<&TimingArray>,
    ) -> LatencyResult<TimingArray> {
        match self {
            Stage::Camera(p) => p.timing(resource, upstream),
            Stage::Calibration(p) => p.timing(resource, upstream),
            Stage::Centroider(p) => p.timing(resource, upstream),
            Stage::Reconstruction(p) => p.timing(resource, upstream),
            Stage::Control(p) => p.timing(resource, upstream),
            Stage::Network(p) => p.timing(resource, upstream),
        }
    }
}

impl From<CameraParams> for Stage {
    fn from(p: CameraParams) -> Self {
        Stage::Camera(p)
    }
}

impl From<CalibrationParams> for Stage {
    fn from(p: CalibrationParams) -> Self {
        Stage::Calibration(p)
    }
}

impl From<CentroiderParams> for Stage {
    fn from(p: CentroiderParams) -> Self {
        Stage::Centroider(p)
    }
}

impl From<ReconstructionParams> for Stage {
    fn from(p: ReconstructionParams) -> Self {
        Stage::Reconstruction(p)
    }
}

impl From<ControlParams> for Stage {
    fn from(p: ControlParams) -> Self {
        Stage::Control(p)
    }
}

impl From<NetworkParams> for Stage {
    fn from(p: NetworkParams) -> Self {
        Stage::Network(p)
    }
}
