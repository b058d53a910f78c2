//! 配置解析模块
//!
//! 支持 TOML 和 JSON 格式，作业文件与地图快照共用同一解析入口。

use contracts::ContractError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (作业文件推荐)
    Toml,
    /// JSON 格式 (地图快照推荐)
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析
pub fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 根据格式序列化
pub fn serialize<T: Serialize>(value: &T, format: ConfigFormat) -> Result<String, ContractError> {
    match format {
        ConfigFormat::Toml => toml::to_string_pretty(value)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}"))),
        ConfigFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{IntegrationJob, IntegrationMode, ResourceType};

    #[test]
    fn test_parse_toml_job() {
        let content = r#"
map = "map.json"
input_type = "raw_depth_map"
mode = "both"
missions = ["m0", "m1"]

[integration]
timestamp_shift_ns = -2500
rolling_shutter_compensation = false
"#;
        let job: IntegrationJob = parse_toml(content).unwrap();
        assert_eq!(job.input_type, ResourceType::RawDepthMap);
        assert_eq!(job.mode, IntegrationMode::Both);
        assert_eq!(job.missions.len(), 2);
        assert_eq!(job.integration.timestamp_shift_ns, -2500);
        assert!(!job.integration.rolling_shutter_compensation);
        assert_eq!(job.integration.progress_every, 20);
    }

    #[test]
    fn test_parse_json_job() {
        let content = r#"{"map": "map.json", "input_type": "optimized_depth_map"}"#;
        let job: IntegrationJob = parse_json(content).unwrap();
        assert_eq!(job.mode, IntegrationMode::Sensor);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result: Result<IntegrationJob, _> = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_unknown_resource_type_is_parse_error() {
        let result: Result<IntegrationJob, _> =
            parse_json(r#"{"map": "map.json", "input_type": "thermal"}"#);
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
