//! # Config 模块
//!
//! 桥接层的可调参数。所有字段都有默认值，JSON 中缺省的字段回落到默认值。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feature::NodeId;

/// 桥接层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 手势事件防抖间隔（毫秒）
    ///
    /// 同一次连续手势会触发多次 camera change，间隔内只上报第一次。
    #[serde(default = "default_gesture_debounce_ms")]
    pub gesture_debounce_ms: u64,

    /// 引擎用来表示"用户手势"的 reason 值
    #[serde(default = "default_gesture_reason")]
    pub gesture_reason: i32,

    /// `MoveCameraFitBounds` 的飞行动画时长（毫秒）
    #[serde(default = "default_fit_bounds_animation_ms")]
    pub fit_bounds_animation_ms: u64,

    /// 离屏容器配置
    #[serde(default)]
    pub offscreen: OffscreenConfig,
}

/// 离屏容器配置
///
/// 某些覆盖物视图只有挂在活动的视图树里、并至少短暂可见过，才会执行懒加载
/// （例如异步图片解码）。离屏容器让它们满足这个条件而不在画面上留下痕迹。
/// 目标平台没有这个问题时可以关闭。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffscreenConfig {
    #[serde(default = "default_offscreen_enabled")]
    pub enabled: bool,

    /// 容器的左/上外边距（像素），把容器推出可见区域
    #[serde(default = "default_offscreen_margin")]
    pub margin: i64,

    /// 容器节点标识，缺省时自动分配
    #[serde(default)]
    pub node: Option<NodeId>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            gesture_debounce_ms: default_gesture_debounce_ms(),
            gesture_reason: default_gesture_reason(),
            fit_bounds_animation_ms: default_fit_bounds_animation_ms(),
            offscreen: OffscreenConfig::default(),
        }
    }
}

impl Default for OffscreenConfig {
    fn default() -> Self {
        Self {
            enabled: default_offscreen_enabled(),
            margin: default_offscreen_margin(),
            node: None,
        }
    }
}

// 默认值函数
fn default_gesture_debounce_ms() -> u64 {
    500
}

fn default_gesture_reason() -> i32 {
    -1
}

fn default_fit_bounds_animation_ms() -> u64 {
    500
}

fn default_offscreen_enabled() -> bool {
    true
}

fn default_offscreen_margin() -> i64 {
    99_999_999
}

impl BridgeConfig {
    /// 从 JSON 文本解析并验证
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gesture_reason >= 0 {
            return Err(ConfigError::Validation(format!(
                "gesture_reason 必须为负数（引擎约定非负值表示程序调用），当前为 {}",
                self.gesture_reason
            )));
        }

        if self.offscreen.margin < 0 {
            return Err(ConfigError::Validation(
                "offscreen.margin 不能为负数".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.gesture_debounce_ms, 500);
        assert_eq!(config.gesture_reason, -1);
        assert_eq!(config.fit_bounds_animation_ms, 500);
        assert!(config.offscreen.enabled);
        assert_eq!(config.offscreen.margin, 99_999_999);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BridgeConfig::from_json(r#"{"gesture_debounce_ms": 250}"#).unwrap();
        assert_eq!(config.gesture_debounce_ms, 250);
        assert_eq!(config.gesture_reason, -1);
        assert!(config.offscreen.enabled);

        let config = BridgeConfig::from_json(r#"{"offscreen": {"enabled": false}}"#).unwrap();
        assert!(!config.offscreen.enabled);
        assert_eq!(config.offscreen.margin, 99_999_999);
    }

    #[test]
    fn test_validation_rejects_non_negative_gesture_reason() {
        let result = BridgeConfig::from_json(r#"{"gesture_reason": 0}"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = BridgeConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let mut config = BridgeConfig::default();
        config.offscreen.node = Some(NodeId::new(42));
        let json = config.to_json().unwrap();
        assert_eq!(BridgeConfig::from_json(&json).unwrap(), config);
    }
}
