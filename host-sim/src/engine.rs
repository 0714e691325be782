//! # Engine 模块
//!
//! 无渲染的模拟地图引擎。
//!
//! 记录收到的每一次调用，并像真实引擎一样在相机移动后排队回调：
//!
//! ```text
//! move_camera        → Change { reason: 0 }  → Idle
//! simulate_gesture   → Change { reason: -1 } × frames → Idle
//! simulate_click     → Click
//! ```
//!
//! 回调不会自己投递，由 `ScenarioRunner` 调用 `drain_callbacks` 取出后转发给 `MapView`。

use std::collections::VecDeque;

use map_bridge::{
    CameraAnimation, CameraChangeReason, CameraPosition, CameraUpdate, EdgeInsets,
    EngineListeners, LatLng, LatLngBounds, LocationSource, MapEngine, MapOption, ScreenPoint, UiSetting,
};
use serde::Serialize;
use tracing::trace;

/// 视口尺寸（像素）
const VIEWPORT_WIDTH: f64 = 1080.0;
const VIEWPORT_HEIGHT: f64 = 1920.0;

/// 覆盖区域相对内容区域的放大倍数
const COVERING_SCALE: f64 = 1.25;

const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 22.0;

/// 引擎待投递的回调
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCallback {
    Change { reason: i32, animated: bool },
    Idle,
    Click { point: ScreenPoint, coordinate: LatLng },
}

/// 引擎收到的调用
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineCall {
    MoveCamera {
        update: CameraUpdate,
        animation: CameraAnimation,
    },
    ContentPadding {
        padding: EdgeInsets,
    },
    UiSetting {
        setting: UiSetting,
    },
    MapOption {
        option: MapOption,
    },
    RegisterListeners,
    LocationSource {
        name: String,
    },
}

/// 模拟引擎
#[derive(Debug)]
pub struct SimEngine {
    camera: CameraPosition,
    padding: EdgeInsets,
    min_zoom: f64,
    max_zoom: f64,
    ui_settings: Vec<UiSetting>,
    options: Vec<MapOption>,
    listeners: Option<EngineListeners>,
    location_source: Option<LocationSource>,
    calls: Vec<EngineCall>,
    callbacks: VecDeque<EngineCallback>,
}

impl SimEngine {
    pub fn new(camera: CameraPosition) -> Self {
        Self {
            camera,
            padding: EdgeInsets::default(),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            ui_settings: Vec::new(),
            options: Vec::new(),
            listeners: None,
            location_source: None,
            calls: Vec::new(),
            callbacks: VecDeque::new(),
        }
    }

    pub fn camera(&self) -> CameraPosition {
        self.camera
    }

    pub fn location_source(&self) -> Option<&LocationSource> {
        self.location_source.as_ref()
    }

    pub fn padding(&self) -> EdgeInsets {
        self.padding
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn ui_settings(&self) -> &[UiSetting] {
        &self.ui_settings
    }

    pub fn options(&self) -> &[MapOption] {
        &self.options
    }

    pub fn listeners(&self) -> Option<EngineListeners> {
        self.listeners
    }

    /// 取出所有待投递的回调
    pub fn drain_callbacks(&mut self) -> Vec<EngineCallback> {
        self.callbacks.drain(..).collect()
    }

    /// 模拟一次用户手势
    ///
    /// 手势持续 `frames` 帧，每帧报告一次 change，最后报告 idle。
    pub fn simulate_gesture(&mut self, target: Option<LatLng>, zoom: Option<f64>, frames: u32) {
        if let Some(target) = target {
            self.camera.target = target;
        }
        if let Some(zoom) = zoom {
            self.camera.zoom = self.clamp_zoom(zoom);
        }
        let reason = i32::from(CameraChangeReason::Gesture);
        for _ in 0..frames.max(1) {
            self.callbacks.push_back(EngineCallback::Change {
                reason,
                animated: false,
            });
        }
        self.callbacks.push_back(EngineCallback::Idle);
    }

    /// 模拟一次点击
    pub fn simulate_click(&mut self, point: ScreenPoint) {
        let coordinate = self.screen_to_coordinate(point);
        self.callbacks
            .push_back(EngineCallback::Click { point, coordinate });
    }

    /// 屏幕坐标换算为经纬度（等距近似）
    pub fn screen_to_coordinate(&self, point: ScreenPoint) -> LatLng {
        let span = half_span(self.camera.zoom) * 2.0;
        let target = self.camera.target;
        LatLng::new(
            target.latitude + (0.5 - point.y / VIEWPORT_HEIGHT) * span,
            target.longitude + (point.x / VIEWPORT_WIDTH - 0.5) * span,
        )
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    fn region(&self, scale: f64) -> Vec<LatLng> {
        let half = half_span(self.camera.zoom) * scale;
        let LatLng {
            latitude,
            longitude,
        } = self.camera.target;
        // 西南、东南、东北、西北
        vec![
            LatLng::new(latitude - half, longitude - half),
            LatLng::new(latitude - half, longitude + half),
            LatLng::new(latitude + half, longitude + half),
            LatLng::new(latitude + half, longitude - half),
        ]
    }

    fn fit(&self, bounds: LatLngBounds) -> CameraPosition {
        let lat_span = (bounds.north_east.latitude - bounds.south_west.latitude).abs();
        let lng_span = (bounds.north_east.longitude - bounds.south_west.longitude).abs();
        let span = lat_span.max(lng_span).max(f64::EPSILON);
        // half_span(zoom) * 2 == span
        let zoom = (360.0 / span).log2();
        CameraPosition {
            target: bounds.center(),
            zoom: self.clamp_zoom(zoom),
            ..self.camera
        }
    }
}

/// 缩放级别对应的半跨度（度）
fn half_span(zoom: f64) -> f64 {
    180.0 / 2f64.powf(zoom)
}

impl MapEngine for SimEngine {
    fn camera_position(&self) -> CameraPosition {
        self.camera
    }

    fn move_camera(&mut self, update: CameraUpdate, animation: CameraAnimation) {
        trace!(update = ?update, animation = ?animation, "move_camera");
        self.calls.push(EngineCall::MoveCamera { update, animation });

        self.camera = match update {
            CameraUpdate::ScrollTo { target } => CameraPosition {
                target,
                ..self.camera
            },
            CameraUpdate::ToPosition { position } => CameraPosition {
                zoom: self.clamp_zoom(position.zoom),
                ..position
            },
            CameraUpdate::ZoomTo { zoom } => CameraPosition {
                zoom: self.clamp_zoom(zoom),
                ..self.camera
            },
            CameraUpdate::FitBounds { bounds, .. } => self.fit(bounds),
        };

        self.callbacks.push_back(EngineCallback::Change {
            reason: i32::from(CameraChangeReason::Developer),
            animated: animation != CameraAnimation::None,
        });
        self.callbacks.push_back(EngineCallback::Idle);
    }

    fn content_region(&self) -> Vec<LatLng> {
        self.region(1.0)
    }

    fn covering_region(&self) -> Vec<LatLng> {
        self.region(COVERING_SCALE)
    }

    fn set_content_padding(&mut self, padding: EdgeInsets) {
        self.calls.push(EngineCall::ContentPadding { padding });
        self.padding = padding;
    }

    fn apply_ui_setting(&mut self, setting: UiSetting) {
        self.calls.push(EngineCall::UiSetting {
            setting: setting.clone(),
        });
        self.ui_settings.push(setting);
    }

    fn apply_map_option(&mut self, option: MapOption) {
        self.calls.push(EngineCall::MapOption {
            option: option.clone(),
        });
        match option {
            MapOption::MinZoom { zoom } => self.min_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            MapOption::MaxZoom { zoom } => self.max_zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            _ => {}
        }
        self.options.push(option);
    }

    fn register_listeners(&mut self, listeners: EngineListeners) {
        self.calls.push(EngineCall::RegisterListeners);
        self.listeners = Some(listeners);
    }

    fn set_location_source(&mut self, source: LocationSource) {
        self.calls.push(EngineCall::LocationSource {
            name: source.name.clone(),
        });
        self.location_source = Some(source);
    }
}
