//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the depth integration
//! workspace: data model, collaborator traits, configuration and error taxonomy.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are signed 64-bit nanoseconds ([`TimestampNs`])
//! - A trajectory is only valid inside its [`TimeRange`]; values are clamped, never extrapolated

mod camera;
mod config;
mod error;
mod ids;
mod integrator;
mod map;
mod report;
mod resource;
mod time;
mod transform;

pub use camera::*;
pub use config::*;
pub use error::*;
pub use ids::{MissionId, ResourceId, SensorId, VertexId};
pub use integrator::*;
pub use map::*;
pub use report::*;
pub use resource::*;
pub use time::*;
pub use transform::RigidTransform;
