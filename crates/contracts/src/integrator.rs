//! DepthIntegrator trait - the downstream fusion routine
//!
//! Plus the cancellation source polled by long-running integration loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{CameraModel, ContractError, ImageBuffer, RigidTransform};

/// Fusion callback receiving posed depth maps.
///
/// `poses` holds one `T_G_C` per shutter line, so `poses.len()` equals the
/// camera's line count (1 for global shutter). `image` is the optional
/// companion intensity/color image and may be absent.
pub trait DepthIntegrator {
    /// # Errors
    /// Returns an error if the fusion routine cannot consume the input;
    /// the error aborts the whole integration call.
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError>;
}

impl<T: DepthIntegrator + ?Sized> DepthIntegrator for &mut T {
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError> {
        (**self).integrate(poses, depth_map, image, camera)
    }
}

/// Adapts a closure taking the full pose list
pub struct FnIntegrator<F>(pub F);

impl<F> DepthIntegrator for FnIntegrator<F>
where
    F: FnMut(&[RigidTransform], &ImageBuffer, Option<&ImageBuffer>, &CameraModel) -> Result<(), ContractError>,
{
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError> {
        (self.0)(poses, depth_map, image, camera)
    }
}

/// Adapts a closure that integrates with a single pose.
///
/// Only valid for global-shutter input; any other pose count is rejected with
/// [`ContractError::PoseCountMismatch`].
pub struct SinglePoseIntegrator<F>(pub F);

impl<F> DepthIntegrator for SinglePoseIntegrator<F>
where
    F: FnMut(&RigidTransform, &ImageBuffer, Option<&ImageBuffer>, &CameraModel) -> Result<(), ContractError>,
{
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError> {
        match poses {
            [t_g_c] => (self.0)(t_g_c, depth_map, image, camera),
            _ => Err(ContractError::PoseCountMismatch { count: poses.len() }),
        }
    }
}

/// Cooperative cancellation, polled by the integration loops
pub trait CancellationSource {
    fn is_abort_requested(&self) -> bool;
}

impl CancellationSource for AtomicBool {
    fn is_abort_requested(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Shared abort flag, typically set from a signal handler
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl CancellationSource for AbortFlag {
    fn is_abort_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
