//! Integrator used by the `run` command.
//!
//! Fusion itself lives outside this tool; [`LogIntegrator`] logs every posed
//! depth map and keeps counts for the final summary.

use contracts::{CameraModel, ContractError, DepthIntegrator, ImageBuffer, RigidTransform};
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct LogIntegrator {
    pub depth_maps: u64,
    pub poses: u64,
    pub with_companion: u64,
}

impl LogIntegrator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DepthIntegrator for LogIntegrator {
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError> {
        self.depth_maps += 1;
        self.poses += poses.len() as u64;
        if image.is_some() {
            self.with_companion += 1;
        }

        debug!(
            camera = %camera.id,
            poses = poses.len(),
            width = depth_map.width,
            height = depth_map.height,
            companion = image.is_some(),
            "Depth map integrated"
        );

        if let (Some(first), Some(last)) = (poses.first(), poses.last()) {
            let (p0, p1) = (first.translation(), last.translation());
            trace!(
                camera = %camera.id,
                first = ?[p0.x, p0.y, p0.z],
                last = ?[p1.x, p1.y, p1.z],
                "Line poses"
            );
        }
        Ok(())
    }
}
