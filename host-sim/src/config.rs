//! # Config 模块
//!
//! 模拟器配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（`--config` 指定的 JSON）
//! 3. 默认值（最低）

use map_bridge::{BridgeConfig, CameraPosition, ConfigError, LatLng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{Level, info, warn};

/// 模拟器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// 桥接层配置
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,

    /// 模拟引擎的初始相机
    #[serde(default = "default_initial_camera")]
    pub initial_camera: CameraPosition,

    /// 手动时钟的起始时间（毫秒）
    #[serde(default = "default_clock_start_ms")]
    pub clock_start_ms: u64,

    /// 交给引擎的定位来源名称，不设置则不提供定位
    #[serde(default)]
    pub location_source: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// 最大日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            log: LogConfig::default(),
            initial_camera: default_initial_camera(),
            clock_start_ms: default_clock_start_ms(),
            location_source: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// 默认值函数
fn default_initial_camera() -> CameraPosition {
    // 首尔市厅
    CameraPosition::new(LatLng::new(37.5666, 126.9784), 11.0, 0.0, 0.0)
}

fn default_clock_start_ms() -> u64 {
    1_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LogConfig {
    /// 解析日志级别
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        self.level
            .parse::<Level>()
            .map_err(|_| ConfigError::Validation(format!("未知的日志级别 '{}'", self.level)))
    }
}

impl SimConfig {
    /// 读取并验证配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在、解析失败或验证失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件不可用，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bridge.validate()?;
        self.log.max_level()?;

        let target = self.initial_camera.target;
        if !(-90.0..=90.0).contains(&target.latitude) {
            return Err(ConfigError::Validation(format!(
                "initial_camera 纬度超出范围: {}",
                target.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&target.longitude) {
            return Err(ConfigError::Validation(format!(
                "initial_camera 经度超出范围: {}",
                target.longitude
            )));
        }

        Ok(())
    }
}
