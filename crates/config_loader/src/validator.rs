//! 配置校验模块
//!
//! 作业文件校验规则：
//! - input_type 为深度图类型
//! - progress_every > 0
//! - 伴随图像优先级列表非空且无重复
//! - mission_id 唯一
//!
//! 地图快照校验规则：
//! - mission / vertex / sensor id 唯一
//! - 相机模型合法 (line_count >= 1, line_delay_ns >= 0, 图像尺寸 > 0)

use std::collections::HashSet;
use std::hash::Hash;

use contracts::{CompanionImageType, ContractError, DepthMapInputType, IntegrationJob};
use depth_integration::memory::MapSnapshot;
use validator::Validate;

/// 校验作业配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate_job(job: &IntegrationJob) -> Result<(), ContractError> {
    validate_input_type(job)?;
    validate_progress(job)?;
    validate_preference("integration.frame_companion_preference", &job.integration.frame_companion_preference)?;
    validate_preference("integration.sensor_companion_preference", &job.integration.sensor_companion_preference)?;
    validate_unique("missions", job.missions.iter(), "duplicate mission_id")?;
    Ok(())
}

fn validate_input_type(job: &IntegrationJob) -> Result<(), ContractError> {
    DepthMapInputType::try_from(job.input_type).map_err(|_| {
        ContractError::config_validation(
            "input_type",
            format!(
                "'{}' is not a depth map type (expected raw_depth_map or optimized_depth_map)",
                job.input_type
            ),
        )
    })?;
    Ok(())
}

fn validate_progress(job: &IntegrationJob) -> Result<(), ContractError> {
    if job.integration.progress_every == 0 {
        return Err(ContractError::config_validation(
            "integration.progress_every",
            "progress_every must be > 0",
        ));
    }
    Ok(())
}

fn validate_preference(field: &str, preference: &[CompanionImageType]) -> Result<(), ContractError> {
    if preference.is_empty() {
        return Err(ContractError::config_validation(field, "preference list cannot be empty"));
    }
    validate_unique(field, preference.iter(), "duplicate companion image type")
}

fn validate_unique<'a, T, I>(field: &str, items: I, message: &str) -> Result<(), ContractError>
where
    T: Eq + Hash + std::fmt::Debug + 'a,
    I: Iterator<Item = &'a T>,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(ContractError::config_validation(
                format!("{field}[{item:?}]"),
                message,
            ));
        }
    }
    Ok(())
}

/// 校验地图快照
pub fn validate_map(snapshot: &MapSnapshot) -> Result<(), ContractError> {
    validate_unique("missions", snapshot.missions.iter().map(|m| &m.id), "duplicate mission_id")?;
    validate_unique("vertices", snapshot.vertices.iter().map(|v| &v.id), "duplicate vertex_id")?;
    validate_unique("sensors", snapshot.sensors.iter().map(|s| &s.id), "duplicate sensor_id")?;
    validate_cameras(snapshot)?;
    Ok(())
}

/// 校验相机模型 (validator derive)
fn validate_cameras(snapshot: &MapSnapshot) -> Result<(), ContractError> {
    for sensor in &snapshot.sensors {
        for (idx, rig_camera) in sensor.cameras.iter().enumerate() {
            rig_camera.camera.validate().map_err(|e| {
                ContractError::config_validation(format!("sensors[{}].cameras[{idx}]", sensor.id), e.to_string())
            })?;
        }
    }
    Ok(())
}
