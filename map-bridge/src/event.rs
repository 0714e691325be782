//! # Event 模块
//!
//! 桥接层发给宿主的事件。
//!
//! 序列化后的形状就是宿主看到的线格式：
//!
//! ```text
//! {"event":"onCameraChange","latitude":..,"longitude":..,"zoom":..,
//!  "tilt":..,"bearing":..,"contentRegion":[..],"coveringRegion":[..]}
//! ```

use serde::{Deserialize, Serialize};

use crate::geo::{CameraSnapshot, LatLng, ScreenPoint};

/// 引擎报告的相机变化原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraChangeReason {
    /// 程序调用
    Developer,
    /// 用户手势
    Gesture,
    /// 地图控件（缩放按钮、指南针等）
    Control,
    /// 定位追踪
    Location,
    Other(i32),
}

impl From<i32> for CameraChangeReason {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Developer,
            -1 => Self::Gesture,
            -2 => Self::Control,
            -3 => Self::Location,
            other => Self::Other(other),
        }
    }
}

impl From<CameraChangeReason> for i32 {
    fn from(reason: CameraChangeReason) -> Self {
        match reason {
            CameraChangeReason::Developer => 0,
            CameraChangeReason::Gesture => -1,
            CameraChangeReason::Control => -2,
            CameraChangeReason::Location => -3,
            CameraChangeReason::Other(code) => code,
        }
    }
}

/// 相机停止后的完整快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraChangeEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub tilt: f64,
    pub bearing: f64,
    pub content_region: Vec<LatLng>,
    pub covering_region: Vec<LatLng>,
}

impl From<&CameraSnapshot> for CameraChangeEvent {
    fn from(snapshot: &CameraSnapshot) -> Self {
        let position = &snapshot.position;
        Self {
            latitude: position.target.latitude,
            longitude: position.target.longitude,
            zoom: position.zoom,
            tilt: position.tilt,
            bearing: position.bearing,
            content_region: snapshot.content_region.clone(),
            covering_region: snapshot.covering_region.clone(),
        }
    }
}

/// 用户手势引起的相机变化
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub reason: i32,
    pub animated: bool,
}

/// 地图点击
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapClickEvent {
    pub x: f64,
    pub y: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl MapClickEvent {
    pub fn new(point: ScreenPoint, coordinate: LatLng) -> Self {
        Self {
            x: point.x,
            y: point.y,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}

/// 发给宿主的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum MapEvent {
    /// 引擎就绪，每个视图只发一次
    #[serde(rename = "onInitialized")]
    Initialized,
    #[serde(rename = "onCameraChange")]
    CameraChange(CameraChangeEvent),
    #[serde(rename = "onTouch")]
    Touch(TouchEvent),
    #[serde(rename = "onMapClick")]
    MapClick(MapClickEvent),
}

impl MapEvent {
    /// 宿主侧的事件名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "onInitialized",
            Self::CameraChange(_) => "onCameraChange",
            Self::Touch(_) => "onTouch",
            Self::MapClick(_) => "onMapClick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::CameraPosition;
    use serde_json::json;

    #[test]
    fn test_reason_codes() {
        assert_eq!(CameraChangeReason::from(0), CameraChangeReason::Developer);
        assert_eq!(CameraChangeReason::from(-1), CameraChangeReason::Gesture);
        assert_eq!(CameraChangeReason::from(-2), CameraChangeReason::Control);
        assert_eq!(CameraChangeReason::from(-3), CameraChangeReason::Location);
        assert_eq!(CameraChangeReason::from(7), CameraChangeReason::Other(7));
        assert_eq!(i32::from(CameraChangeReason::Other(7)), 7);
        assert_eq!(i32::from(CameraChangeReason::Gesture), -1);
    }

    #[test]
    fn test_touch_wire_shape() {
        let event = MapEvent::Touch(TouchEvent {
            reason: -1,
            animated: false,
        });
        insta::assert_yaml_snapshot!(event, @r"
        event: onTouch
        reason: -1
        animated: false
        ");
    }

    #[test]
    fn test_initialized_wire_shape() {
        insta::assert_yaml_snapshot!(MapEvent::Initialized, @"event: onInitialized");
    }

    #[test]
    fn test_camera_change_from_snapshot() {
        let snapshot = CameraSnapshot {
            position: CameraPosition::new(LatLng::new(37.5, 127.0), 14.0, 30.0, 90.0),
            content_region: vec![LatLng::new(37.4, 126.9), LatLng::new(37.6, 127.1)],
            covering_region: vec![LatLng::new(37.3, 126.8)],
        };

        let event = MapEvent::CameraChange(CameraChangeEvent::from(&snapshot));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "event": "onCameraChange",
                "latitude": 37.5,
                "longitude": 127.0,
                "zoom": 14.0,
                "tilt": 30.0,
                "bearing": 90.0,
                "contentRegion": [
                    {"latitude": 37.4, "longitude": 126.9},
                    {"latitude": 37.6, "longitude": 127.1}
                ],
                "coveringRegion": [
                    {"latitude": 37.3, "longitude": 126.8}
                ]
            })
        );
    }

    #[test]
    fn test_map_click_wire_shape() {
        let event = MapEvent::MapClick(MapClickEvent::new(
            ScreenPoint::new(120.0, 48.0),
            LatLng::new(37.5, 127.0),
        ));
        assert_eq!(event.name(), "onMapClick");

        let text = serde_json::to_string(&event).unwrap();
        let parsed: MapEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"event": "onMapClick", "x": 120.0, "y": 48.0, "latitude": 37.5, "longitude": 127.0})
        );
    }
}
