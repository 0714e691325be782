//! # Command 模块
//!
//! 定义宿主向地图发出的所有指令，以及指令落到引擎上时使用的词汇。
//!
//! ## 设计原则
//!
//! - **声明式**：`MapCommand` 描述"做什么"，由执行器翻译成引擎调用
//! - **可延迟**：引擎就绪前的指令原样排队，就绪后按提交顺序执行
//! - **可序列化**：宿主可以用 JSON 描述指令

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;
use crate::geo::{CameraPosition, EdgeInsets, LatLng, LatLngBounds};

/// 相机动画
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAnimation {
    /// 立即跳转
    None,
    /// 缓动（引擎默认时长）
    Easing,
    /// 飞行动画
    Fly { duration_ms: u64 },
}

/// 相机更新
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraUpdate {
    /// 平移到目标点，保持缩放/倾斜/方位
    ScrollTo { target: LatLng },
    /// 移动到完整相机位置
    ToPosition { position: CameraPosition },
    /// 只改变缩放级别
    ZoomTo { zoom: f64 },
    /// 让包围盒完整落在视图内
    FitBounds {
        bounds: LatLngBounds,
        padding: EdgeInsets,
    },
}

/// 手势开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Scroll,
    Zoom,
    Tilt,
    Rotate,
    Stop,
}

/// UI 控件开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    LocationButton,
    Compass,
    ScaleBar,
    ZoomControl,
}

/// 定位追踪模式
///
/// 宿主以整数传入，顺序与引擎枚举一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTrackingMode {
    None,
    NoFollow,
    Follow,
    Face,
}

impl TryFrom<i32> for LocationTrackingMode {
    type Error = BridgeError;

    fn try_from(mode: i32) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(Self::None),
            1 => Ok(Self::NoFollow),
            2 => Ok(Self::Follow),
            3 => Ok(Self::Face),
            _ => Err(BridgeError::InvalidTrackingMode { mode }),
        }
    }
}

/// 地图类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    Basic,
    Navi,
    Satellite,
    Hybrid,
    Terrain,
    None,
}

impl FromStr for MapType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "navi" => Ok(Self::Navi),
            "satellite" => Ok(Self::Satellite),
            "hybrid" => Ok(Self::Hybrid),
            "terrain" => Ok(Self::Terrain),
            "none" => Ok(Self::None),
            _ => Err(BridgeError::UnknownMapType {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "Basic",
            Self::Navi => "Navi",
            Self::Satellite => "Satellite",
            Self::Hybrid => "Hybrid",
            Self::Terrain => "Terrain",
            Self::None => "None",
        };
        f.write_str(name)
    }
}

/// UI 设置项（对应引擎的 UI settings 对象）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "setting", rename_all = "snake_case")]
pub enum UiSetting {
    Gesture { gesture: Gesture, enabled: bool },
    Control { control: Control, enabled: bool },
    LogoMargin { margin: EdgeInsets },
    LogoGravity { gravity: i32 },
}

/// 地图选项（直接挂在引擎上的设置）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "option", rename_all = "snake_case")]
pub enum MapOption {
    LocationTrackingMode { mode: LocationTrackingMode },
    MapType { map_type: MapType },
    MinZoom { zoom: f64 },
    MaxZoom { zoom: f64 },
    BuildingHeight { height: f64 },
    LayerGroup { name: String, enabled: bool },
    NightMode { enabled: bool },
    LiteMode { enabled: bool },
}

/// 宿主向地图发出的指令
///
/// 所有指令都经过 `ReadinessGate`：引擎就绪时立即执行，否则排队。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapCommand {
    /// 平移到目标点（缓动）
    SetCenter { target: LatLng },

    /// 移动到目标点，可同时指定缩放/倾斜/方位（缺省项沿用当前相机）
    SetCameraPosition {
        target: LatLng,
        #[serde(default)]
        zoom: Option<f64>,
        #[serde(default)]
        tilt: Option<f64>,
        #[serde(default)]
        bearing: Option<f64>,
    },

    /// 缩放到包围盒，四边统一留白
    ZoomTo { bounds: LatLngBounds, padding_px: i32 },

    SetTilt { tilt: i32 },
    SetBearing { bearing: i32 },
    SetZoom { zoom: f64 },

    /// 内容留白
    SetMapPadding { padding: EdgeInsets },

    SetGestureEnabled { gesture: Gesture, enabled: bool },
    SetControlEnabled { control: Control, enabled: bool },

    SetLocationTrackingMode { mode: LocationTrackingMode },
    SetMapType { map_type: MapType },
    SetMinZoom { zoom: f64 },
    SetMaxZoom { zoom: f64 },
    SetBuildingHeight { height: f64 },
    SetLayerGroupEnabled { group: String, enabled: bool },
    SetNightModeEnabled { enabled: bool },
    SetLogoMargin { margin: EdgeInsets },
    SetLogoGravity { gravity: i32 },
    SetLiteModeEnabled { enabled: bool },

    /// 缩放到包围盒，四边分别留白（飞行动画）
    MoveCameraFitBounds {
        bounds: LatLngBounds,
        padding: EdgeInsets,
    },
}

impl MapCommand {
    /// 指令名（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetCenter { .. } => "set_center",
            Self::SetCameraPosition { .. } => "set_camera_position",
            Self::ZoomTo { .. } => "zoom_to",
            Self::SetTilt { .. } => "set_tilt",
            Self::SetBearing { .. } => "set_bearing",
            Self::SetZoom { .. } => "set_zoom",
            Self::SetMapPadding { .. } => "set_map_padding",
            Self::SetGestureEnabled { .. } => "set_gesture_enabled",
            Self::SetControlEnabled { .. } => "set_control_enabled",
            Self::SetLocationTrackingMode { .. } => "set_location_tracking_mode",
            Self::SetMapType { .. } => "set_map_type",
            Self::SetMinZoom { .. } => "set_min_zoom",
            Self::SetMaxZoom { .. } => "set_max_zoom",
            Self::SetBuildingHeight { .. } => "set_building_height",
            Self::SetLayerGroupEnabled { .. } => "set_layer_group_enabled",
            Self::SetNightModeEnabled { .. } => "set_night_mode_enabled",
            Self::SetLogoMargin { .. } => "set_logo_margin",
            Self::SetLogoGravity { .. } => "set_logo_gravity",
            Self::SetLiteModeEnabled { .. } => "set_lite_mode_enabled",
            Self::MoveCameraFitBounds { .. } => "move_camera_fit_bounds",
        }
    }

    /// 是否会移动相机（会触发引擎的 camera change / idle 回调）
    pub fn moves_camera(&self) -> bool {
        matches!(
            self,
            Self::SetCenter { .. }
                | Self::SetCameraPosition { .. }
                | Self::ZoomTo { .. }
                | Self::SetTilt { .. }
                | Self::SetBearing { .. }
                | Self::SetZoom { .. }
                | Self::MoveCameraFitBounds { .. }
        )
    }
}
