//! # Error 模块
//!
//! 定义 map-bridge 中使用的错误类型。
//!
//! 宿主边界（`MapView` 的命令接口）不向外抛错：这些错误只在解析/加载路径上
//! 返回，边界方法把它们记录为日志后按 no-op 处理。

use thiserror::Error;

/// 桥接层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// 无效的定位追踪模式
    #[error("无效的定位追踪模式 {mode}，有效范围是 0..=3")]
    InvalidTrackingMode { mode: i32 },

    /// 未知的地图类型
    #[error("未知的地图类型 '{name}'")]
    UnknownMapType { name: String },

    /// 引擎已交付过一次
    #[error("地图引擎已就绪，忽略重复交付（当前状态：{state}）")]
    EngineAlreadyDelivered { state: String },
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 解析失败
    #[error("配置解析失败: {0}")]
    Parse(String),

    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialization(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// Result 类型别名
pub type BridgeResult<T> = Result<T, BridgeError>;
