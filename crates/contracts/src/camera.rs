//! Camera models and camera rigs.
//!
//! A camera model carries intrinsics, distortion and rolling-shutter timing.
//! `line_count == 1` denotes a global-shutter sensor. For vision depth maps a
//! line is an image row; for 3D lidar depth images it is a column.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, RigidTransform, SensorId};

/// Pinhole intrinsics in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Lens distortion model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Distortion {
    #[default]
    None,
    RadialTangential { k1: f64, k2: f64, p1: f64, p2: f64 },
    Equidistant { k1: f64, k2: f64, k3: f64, k4: f64 },
}

/// Direction along which a rolling shutter sweeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutterLine {
    #[default]
    Row,
    Column,
}

/// Intrinsic and timing description of one camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CameraModel {
    pub id: SensorId,

    #[validate(range(min = 1))]
    pub width: u32,

    #[validate(range(min = 1))]
    pub height: u32,

    pub intrinsics: Intrinsics,

    #[serde(default)]
    pub distortion: Distortion,

    /// Number of sequentially exposed lines (1 = global shutter)
    #[validate(range(min = 1))]
    #[serde(default = "default_line_count")]
    pub line_count: u32,

    /// Delay between two consecutive lines
    #[validate(range(min = 0))]
    #[serde(default)]
    pub line_delay_ns: i64,

    #[serde(default)]
    pub shutter_line: ShutterLine,
}

fn default_line_count() -> u32 {
    1
}

impl CameraModel {
    /// Global-shutter pinhole camera without distortion
    pub fn pinhole(id: impl Into<SensorId>, width: u32, height: u32, intrinsics: Intrinsics) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            intrinsics,
            distortion: Distortion::None,
            line_count: 1,
            line_delay_ns: 0,
            shutter_line: ShutterLine::Row,
        }
    }

    /// Same camera with rolling-shutter timing
    #[must_use]
    pub fn with_rolling_shutter(mut self, line_count: u32, line_delay_ns: i64) -> Self {
        self.line_count = line_count;
        self.line_delay_ns = line_delay_ns;
        self
    }

    pub fn is_rolling_shutter(&self) -> bool {
        self.line_count > 1
    }
}

/// One camera of a rig together with its extrinsics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigCamera {
    /// Transform mapping rig coordinates into camera coordinates
    pub t_c_rig: RigidTransform,
    pub camera: CameraModel,
}

/// Fixed assembly of cameras with known relative extrinsics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub id: SensorId,
    pub cameras: Vec<RigCamera>,
}

impl CameraRig {
    pub fn num_cameras(&self) -> usize {
        self.cameras.len()
    }

    /// Camera model of frame `frame_idx`
    pub fn camera(&self, frame_idx: usize) -> Result<&CameraModel, ContractError> {
        self.rig_camera(frame_idx).map(|c| &c.camera)
    }

    /// Transform mapping camera `frame_idx` coordinates into rig coordinates
    pub fn t_rig_c(&self, frame_idx: usize) -> Result<RigidTransform, ContractError> {
        self.rig_camera(frame_idx).map(|c| c.t_c_rig.inverse())
    }

    fn rig_camera(&self, frame_idx: usize) -> Result<&RigCamera, ContractError> {
        self.cameras
            .get(frame_idx)
            .ok_or_else(|| ContractError::InvalidFrameIndex {
                rig: self.id.clone(),
                frame_idx,
                num_cameras: self.cameras.len(),
            })
    }
}
