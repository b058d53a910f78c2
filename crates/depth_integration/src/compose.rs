//! Reference-to-sensor transform chains.

use contracts::RigidTransform;

/// `T_G_S = T_G_M * T_M_B * T_B_rig * T_rig_S`
pub fn compose(
    t_g_m: &RigidTransform,
    t_m_b: &RigidTransform,
    t_b_rig: &RigidTransform,
    t_rig_s: &RigidTransform,
) -> RigidTransform {
    &(&(t_g_m * t_m_b) * t_b_rig) * t_rig_s
}

/// Chain with fixed mission and sensor extrinsics, varying body pose.
///
/// The sensor extrinsics `T_B_S = T_B_rig * T_rig_S` are folded once, so a
/// rolling-shutter resource only pays one product per line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComposer {
    t_g_m: RigidTransform,
    t_b_s: RigidTransform,
}

impl TransformComposer {
    pub fn new(t_g_m: RigidTransform, t_b_rig: RigidTransform, t_rig_s: RigidTransform) -> Self {
        Self {
            t_g_m,
            t_b_s: t_b_rig * t_rig_s,
        }
    }

    pub fn t_b_s(&self) -> &RigidTransform {
        &self.t_b_s
    }

    /// Sensor pose in the reference frame for one body pose
    pub fn t_g_s(&self, t_m_b: &RigidTransform) -> RigidTransform {
        &(&self.t_g_m * t_m_b) * &self.t_b_s
    }

    /// One sensor pose per body pose, order preserved
    pub fn compose_all(&self, poses_m_b: &[RigidTransform]) -> Vec<RigidTransform> {
        poses_m_b.iter().map(|t_m_b| self.t_g_s(t_m_b)).collect()
    }
}
