//! # Depth Integration
//!
//! Pose assembly for depth maps: computes the globally referenced pose of
//! every depth map (one per shutter line for rolling-shutter sensors) and
//! hands it to a downstream [`DepthIntegrator`].
//!
//! 负责：
//! - 卷帘快门逐行时间偏移
//! - 时间戳校正与轨迹范围钳位
//! - 批量位姿插值
//! - 刚体变换链组合
//! - 伴随图像查找
//! - 可取消的集成循环与进度上报
//!
//! ## 使用示例
//!
//! ```ignore
//! use depth_integration::{IntegrationContext, IntegrationDriver, memory::RecordingIntegrator};
//!
//! let driver = IntegrationDriver::new(IntegrationContext::from_map(&map), IntegrationConfig::default())
//!     .with_cancellation(&abort_flag);
//!
//! let mut recorder = RecordingIntegrator::new();
//! let report = driver.integrate_sensor_depth_maps(&missions, ResourceType::OptimizedDepthMap, &mut recorder)?;
//! ```

mod batch;
mod cancel;
mod companion;
mod compose;
mod driver;
pub mod memory;
mod progress;
mod rolling_shutter;
mod timestamp;

pub use batch::{BatchPoseResolver, ResolvedPoses, TimestampBatch};
pub use cancel::CancellationGate;
pub use companion::{CompanionImage, CompanionImageResolver};
pub use compose::{compose, TransformComposer};
pub use driver::{IntegrationContext, IntegrationDriver};
pub use progress::{Progress, ProgressReporter};
pub use rolling_shutter::{line_offsets, RollingShutterModel};
pub use timestamp::{correct, TimestampCorrector};

// Re-export contracts types
pub use contracts::{
    AbortFlag, CancellationSource, ContractError, DepthIntegrator, FnIntegrator, IntegrationConfig,
    IntegrationMode, IntegrationOutcome, IntegrationReport, SinglePoseIntegrator,
};
