//! Rigid-body transforms between reference, mission, body, rig and sensor frames.
//!
//! Naming follows `T_A_B`: the transform that maps coordinates expressed in
//! frame `B` into frame `A`. Chains compose left to right,
//! `T_G_C = T_G_M * T_M_B * T_B_C`.

use std::ops::Mul;

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A rigid transform (rotation + translation), immutable once constructed.
///
/// # Example
///
/// ```
/// use contracts::RigidTransform;
///
/// let t_a_b = RigidTransform::from_translation(1.0, 0.0, 0.0);
/// let t_b_c = RigidTransform::from_translation(0.0, 2.0, 0.0);
/// let t_a_c = t_a_b * t_b_c;
/// assert!((t_a_c.translation().y - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformData", into = "TransformData")]
pub struct RigidTransform {
    isometry: Isometry3<f64>,
}

/// Serialized layout: translation `[x, y, z]`, rotation quaternion `[x, y, z, w]`
#[derive(Serialize, Deserialize)]
struct TransformData {
    translation: [f64; 3],
    #[serde(default = "identity_quaternion")]
    rotation: [f64; 4],
}

fn identity_quaternion() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl From<TransformData> for RigidTransform {
    fn from(data: TransformData) -> Self {
        let [x, y, z, w] = data.rotation;
        let [tx, ty, tz] = data.translation;
        // from_quaternion normalizes
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
        Self::new(Vector3::new(tx, ty, tz), rotation)
    }
}

impl From<RigidTransform> for TransformData {
    fn from(transform: RigidTransform) -> Self {
        let q = transform.isometry.rotation;
        let t = transform.isometry.translation.vector;
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [q.i, q.j, q.k, q.w],
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            isometry: Isometry3::identity(),
        }
    }

    #[must_use]
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            isometry: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    #[must_use]
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Rotation from roll/pitch/yaw in radians (applied yaw, then pitch, then roll)
    #[must_use]
    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(
            Vector3::zeros(),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }

    #[must_use]
    pub fn from_isometry(isometry: Isometry3<f64>) -> Self {
        Self { isometry }
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            isometry: self.isometry.inverse(),
        }
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.isometry.translation.vector
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.isometry.rotation
    }

    pub fn as_isometry(&self) -> &Isometry3<f64> {
        &self.isometry
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.isometry.transform_point(point)
    }

    /// Linear blend of translation and spherical blend of rotation, `alpha` in `[0, 1]`
    #[must_use]
    pub fn interpolate(&self, other: &Self, alpha: f64) -> Self {
        Self {
            isometry: self.isometry.lerp_slerp(&other.isometry, alpha),
        }
    }

    /// Component-wise comparison with tolerance `eps` (rotation compared by angle)
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        let dt = (self.translation() - other.translation()).norm();
        let dr = self.rotation().angle_to(&other.rotation());
        dt <= eps && dr <= eps
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> Self::Output {
        Self {
            isometry: self.isometry * rhs.isometry,
        }
    }
}

impl Mul<&RigidTransform> for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &RigidTransform) -> Self::Output {
        RigidTransform {
            isometry: self.isometry * rhs.isometry,
        }
    }
}
