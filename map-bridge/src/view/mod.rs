//! # View 模块
//!
//! `MapView` 是宿主唯一接触的对象：指令和引擎回调从这里进，事件从这里出。
//!
//! ## 模块结构
//!
//! - [`executor`]：`MapCommand` 到引擎调用的转换
//! - [`lifecycle`]：销毁流程
//!
//! ## 数据流
//!
//! ```text
//! 宿主指令 ──► ReadinessGate ──(Ready)──► CommandExecutor ──► MapEngine
//!                   │
//!                   └─(未就绪)─► 排队，on_engine_ready 时按序执行
//!
//! MapEngine 回调 ──► on_camera_idle / on_camera_change / on_map_click
//!                        └──► EventBridge 发件箱 ──take_events()──► 宿主
//! ```

pub mod executor;
pub mod lifecycle;

use tracing::{debug, info, warn};

use crate::bridge::EventBridge;
use crate::clock::{Clock, SystemClock};
use crate::command::{Control, Gesture, LocationTrackingMode, MapCommand, MapType};
use crate::config::BridgeConfig;
use crate::coordinator::VisibilityCoordinator;
use crate::engine::{EngineHandle, EngineListeners, LocationSource};
use crate::error::{BridgeError, BridgeResult};
use crate::event::MapEvent;
use crate::feature::{FeatureId, FeatureKind, MapFeature};
use crate::gate::{ReadinessGate, ReadinessState, Submission};
use crate::geo::{EdgeInsets, LatLng, LatLngBounds, ScreenPoint};
use crate::registry::FeatureRegistry;

pub use executor::CommandExecutor;
pub use lifecycle::TeardownReport;

/// 等待引擎就绪的操作
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredOp {
    /// 地图指令
    Command(MapCommand),
    /// 把已登记的覆盖物挂到引擎
    Attach(FeatureId),
}

/// 地图视图
///
/// 单线程对象，所有方法都应在宿主的 UI 线程上调用。
/// 丢弃时自动执行 [`MapView::teardown`]。
pub struct MapView {
    config: BridgeConfig,
    gate: ReadinessGate<DeferredOp>,
    engine: Option<EngineHandle>,
    location_source: Option<LocationSource>,
    registry: FeatureRegistry,
    container: Option<VisibilityCoordinator>,
    bridge: EventBridge,
    executor: CommandExecutor,
    clock: Box<dyn Clock>,
}

impl MapView {
    /// 使用系统时钟创建视图
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }

    /// 使用指定时钟创建视图
    pub fn with_clock<C: Clock + 'static>(config: BridgeConfig, clock: C) -> Self {
        let container = VisibilityCoordinator::new(&config.offscreen);
        Self {
            gate: ReadinessGate::new(),
            engine: None,
            location_source: None,
            registry: FeatureRegistry::new(),
            container: Some(container),
            bridge: EventBridge::new(&config),
            executor: CommandExecutor::new(config.fit_bounds_animation_ms),
            clock: Box::new(clock),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn readiness(&self) -> ReadinessState {
        self.gate.state()
    }

    /// 排队等待引擎的操作数
    pub fn pending_ops(&self) -> usize {
        self.gate.pending_len()
    }

    /// 当前持有的引擎句柄（就绪前和销毁后为 `None`）
    pub fn engine(&self) -> Option<&EngineHandle> {
        self.engine.as_ref()
    }

    /// 离屏容器（销毁后为 `None`）
    pub fn container(&self) -> Option<&VisibilityCoordinator> {
        self.container.as_ref()
    }

    // ========== 引擎生命周期 ==========

    /// 请求异步创建引擎
    ///
    /// 只在 Uninitialized 时生效。
    pub fn request_engine(&mut self) -> bool {
        let started = self.gate.begin();
        if started {
            debug!("已请求地图引擎");
        } else {
            debug!(state = %self.gate.state(), "重复请求引擎，忽略");
        }
        started
    }

    /// 引擎创建完成
    ///
    /// 交付定位来源 → 注册监听 → 发出 `onInitialized` → 按提交顺序执行积压操作。
    /// 只接受一次交付，之后的交付记录警告后忽略。返回执行的积压操作数。
    pub fn on_engine_ready(&mut self, engine: EngineHandle) -> Option<usize> {
        if let Err(e) = self.check_engine_delivery() {
            warn!(error = %e, "忽略引擎交付");
            return None;
        }

        {
            let mut engine = engine.borrow_mut();
            if let Some(source) = &self.location_source {
                engine.set_location_source(source.clone());
            }
            engine.register_listeners(EngineListeners::all());
        }
        self.engine = Some(engine);

        let backlog = self.gate.open().unwrap_or_default();
        self.bridge.initialized();
        info!(backlog = backlog.len(), "地图引擎就绪");

        let drained = backlog.len();
        for op in backlog {
            self.run(op);
        }
        Some(drained)
    }

    /// 设置定位来源
    ///
    /// 就绪前只记下，等引擎交付时第一个交给它；就绪后立即生效；销毁后忽略。
    pub fn set_location_source(&mut self, source: LocationSource) {
        match self.gate.state() {
            ReadinessState::Destroyed => {
                debug!(source = %source.name, "视图已销毁，忽略定位来源");
                return;
            }
            ReadinessState::Ready => {
                if let Some(engine) = &self.engine {
                    engine.borrow_mut().set_location_source(source.clone());
                }
            }
            ReadinessState::Uninitialized | ReadinessState::Pending => {}
        }
        debug!(source = %source.name, "已设置定位来源");
        self.location_source = Some(source);
    }

    pub fn location_source(&self) -> Option<&LocationSource> {
        self.location_source.as_ref()
    }

    fn check_engine_delivery(&self) -> BridgeResult<()> {
        match self.gate.state() {
            ReadinessState::Uninitialized | ReadinessState::Pending => Ok(()),
            state => Err(BridgeError::EngineAlreadyDelivered {
                state: state.to_string(),
            }),
        }
    }

    // ========== 指令 ==========

    /// 提交一条指令
    pub fn dispatch(&mut self, command: MapCommand) {
        self.submit(DeferredOp::Command(command));
    }

    pub fn set_center(&mut self, target: LatLng) {
        self.dispatch(MapCommand::SetCenter { target });
    }

    /// 移动到目标点，未指定的部分沿用执行时的相机
    pub fn set_camera_position(
        &mut self,
        target: LatLng,
        zoom: Option<f64>,
        tilt: Option<f64>,
        bearing: Option<f64>,
    ) {
        self.dispatch(MapCommand::SetCameraPosition {
            target,
            zoom,
            tilt,
            bearing,
        });
    }

    pub fn zoom_to(&mut self, bounds: LatLngBounds, padding_px: i32) {
        self.dispatch(MapCommand::ZoomTo { bounds, padding_px });
    }

    pub fn set_tilt(&mut self, tilt: i32) {
        self.dispatch(MapCommand::SetTilt { tilt });
    }

    pub fn set_bearing(&mut self, bearing: i32) {
        self.dispatch(MapCommand::SetBearing { bearing });
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.dispatch(MapCommand::SetZoom { zoom });
    }

    pub fn set_map_padding(&mut self, padding: EdgeInsets) {
        self.dispatch(MapCommand::SetMapPadding { padding });
    }

    pub fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool) {
        self.dispatch(MapCommand::SetGestureEnabled { gesture, enabled });
    }

    pub fn set_scroll_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_enabled(Gesture::Scroll, enabled);
    }

    pub fn set_zoom_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_enabled(Gesture::Zoom, enabled);
    }

    pub fn set_tilt_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_enabled(Gesture::Tilt, enabled);
    }

    pub fn set_rotate_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_enabled(Gesture::Rotate, enabled);
    }

    pub fn set_stop_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_enabled(Gesture::Stop, enabled);
    }

    pub fn set_control_enabled(&mut self, control: Control, enabled: bool) {
        self.dispatch(MapCommand::SetControlEnabled { control, enabled });
    }

    pub fn set_location_button_enabled(&mut self, enabled: bool) {
        self.set_control_enabled(Control::LocationButton, enabled);
    }

    pub fn set_compass_enabled(&mut self, enabled: bool) {
        self.set_control_enabled(Control::Compass, enabled);
    }

    pub fn set_scale_bar_enabled(&mut self, enabled: bool) {
        self.set_control_enabled(Control::ScaleBar, enabled);
    }

    pub fn set_zoom_control_enabled(&mut self, enabled: bool) {
        self.set_control_enabled(Control::ZoomControl, enabled);
    }

    /// 设置定位追踪模式（0..=3），越界值记录警告后忽略
    pub fn set_location_tracking_mode(&mut self, mode: i32) {
        match LocationTrackingMode::try_from(mode) {
            Ok(mode) => self.dispatch(MapCommand::SetLocationTrackingMode { mode }),
            Err(e) => warn!(error = %e, "忽略定位追踪模式"),
        }
    }

    pub fn set_map_type(&mut self, map_type: MapType) {
        self.dispatch(MapCommand::SetMapType { map_type });
    }

    /// 按名称设置地图类型，未知名称记录警告后忽略
    pub fn set_map_type_name(&mut self, name: &str) {
        match name.parse::<MapType>() {
            Ok(map_type) => self.set_map_type(map_type),
            Err(e) => warn!(error = %e, "忽略地图类型"),
        }
    }

    pub fn set_min_zoom(&mut self, zoom: f64) {
        self.dispatch(MapCommand::SetMinZoom { zoom });
    }

    pub fn set_max_zoom(&mut self, zoom: f64) {
        self.dispatch(MapCommand::SetMaxZoom { zoom });
    }

    pub fn set_building_height(&mut self, height: f64) {
        self.dispatch(MapCommand::SetBuildingHeight { height });
    }

    pub fn set_layer_group_enabled(&mut self, group: impl Into<String>, enabled: bool) {
        self.dispatch(MapCommand::SetLayerGroupEnabled {
            group: group.into(),
            enabled,
        });
    }

    pub fn set_night_mode_enabled(&mut self, enabled: bool) {
        self.dispatch(MapCommand::SetNightModeEnabled { enabled });
    }

    pub fn set_logo_margin(&mut self, margin: EdgeInsets) {
        self.dispatch(MapCommand::SetLogoMargin { margin });
    }

    pub fn set_logo_gravity(&mut self, gravity: i32) {
        self.dispatch(MapCommand::SetLogoGravity { gravity });
    }

    pub fn set_lite_mode_enabled(&mut self, enabled: bool) {
        self.dispatch(MapCommand::SetLiteModeEnabled { enabled });
    }

    pub fn move_camera_fit_bounds(&mut self, bounds: LatLngBounds, padding: EdgeInsets) {
        self.dispatch(MapCommand::MoveCameraFitBounds { bounds, padding });
    }

    // ========== 覆盖物 ==========

    /// 登记覆盖物并在引擎就绪后挂载
    ///
    /// `index` 越界时追加到末尾。视图已销毁时丢弃覆盖物并返回 `None`。
    pub fn add_feature(&mut self, feature: Box<dyn MapFeature>, index: i32) -> Option<FeatureId> {
        if self.gate.is_destroyed() {
            warn!(kind = %feature.kind(), "视图已销毁，忽略覆盖物");
            return None;
        }

        let (id, position) = self.registry.insert(feature, index);
        debug!(feature = %id, index, position, "覆盖物已登记");
        self.submit(DeferredOp::Attach(id));
        Some(id)
    }

    /// 删除指定位置的覆盖物，越界时什么也不做
    ///
    /// 尚未挂载的覆盖物不会再被挂载。
    pub fn remove_feature_at(&mut self, index: i32) -> Option<Box<dyn MapFeature>> {
        self.registry.remove_at(index, self.container.as_mut())
    }

    pub fn feature_count(&self) -> usize {
        self.registry.len()
    }

    pub fn feature_at(&self, index: i32) -> Option<&dyn MapFeature> {
        self.registry.get(index)
    }

    /// 按当前顺序列出覆盖物标识
    pub fn feature_ids(&self) -> Vec<FeatureId> {
        self.registry.ids()
    }

    /// 按当前顺序列出覆盖物种类
    pub fn feature_kinds(&self) -> Vec<FeatureKind> {
        self.registry.kinds()
    }

    /// 覆盖物是否已挂到引擎
    pub fn is_feature_attached(&self, id: FeatureId) -> bool {
        self.registry
            .iter()
            .any(|entry| entry.id() == id && entry.is_attached())
    }

    // ========== 引擎回调 ==========

    /// 引擎回调：相机停止
    pub fn on_camera_idle(&mut self) {
        if !self.accepts_callback("camera_idle") {
            return;
        }
        if let Some(engine) = self.engine.as_ref() {
            let snapshot = engine.borrow().snapshot();
            self.bridge.camera_idle(&snapshot);
        }
    }

    /// 引擎回调：相机变化
    pub fn on_camera_change(&mut self, reason: i32, animated: bool) {
        if !self.accepts_callback("camera_change") {
            return;
        }
        let now = self.clock.now_ms();
        self.bridge.camera_change(reason, animated, now);
    }

    /// 引擎回调：地图点击
    pub fn on_map_click(&mut self, point: ScreenPoint, coordinate: LatLng) {
        if !self.accepts_callback("map_click") {
            return;
        }
        self.bridge.map_click(point, coordinate);
    }

    // ========== 事件 ==========

    /// 取走所有待发事件
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        self.bridge.take_events()
    }

    pub fn pending_events(&self) -> &[MapEvent] {
        self.bridge.pending()
    }

    // ========== 内部 ==========

    fn submit(&mut self, op: DeferredOp) {
        match self.gate.submit(op) {
            Submission::Run(op) => self.run(op),
            Submission::Queued => {
                debug!(pending = self.gate.pending_len(), "引擎未就绪，操作已排队");
            }
            Submission::Discarded => {
                debug!("视图已销毁，操作被丢弃");
            }
        }
    }

    fn run(&mut self, op: DeferredOp) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        match op {
            DeferredOp::Command(command) => {
                self.executor.execute(command, &mut *engine.borrow_mut());
            }
            DeferredOp::Attach(id) => {
                let outcome = self.registry.attach(id, engine, self.container.as_mut());
                debug!(feature = %id, outcome = ?outcome, "处理覆盖物挂载");
            }
        }
    }

    fn accepts_callback(&self, callback: &'static str) -> bool {
        if self.gate.is_ready() {
            return true;
        }
        warn!(callback, state = %self.gate.state(), "引擎回调不在就绪期内，已丢弃");
        false
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::command::{CameraAnimation, CameraUpdate, MapOption, UiSetting};
    use crate::engine::MapEngine;
    use crate::geo::CameraPosition;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        moves: Vec<CameraUpdate>,
        options: Vec<MapOption>,
        listeners: Option<EngineListeners>,
        setup: Vec<String>,
    }

    struct LogEngine(Rc<RefCell<Log>>);

    impl MapEngine for LogEngine {
        fn camera_position(&self) -> CameraPosition {
            CameraPosition::new(LatLng::new(0.0, 0.0), 10.0, 0.0, 0.0)
        }
        fn move_camera(&mut self, update: CameraUpdate, _animation: CameraAnimation) {
            self.0.borrow_mut().moves.push(update);
        }
        fn content_region(&self) -> Vec<LatLng> {
            vec![LatLng::new(-1.0, -1.0), LatLng::new(1.0, 1.0)]
        }
        fn covering_region(&self) -> Vec<LatLng> {
            vec![LatLng::new(-2.0, -2.0), LatLng::new(2.0, 2.0)]
        }
        fn set_content_padding(&mut self, _padding: EdgeInsets) {}
        fn apply_ui_setting(&mut self, _setting: UiSetting) {}
        fn apply_map_option(&mut self, option: MapOption) {
            self.0.borrow_mut().options.push(option);
        }
        fn register_listeners(&mut self, listeners: EngineListeners) {
            let mut log = self.0.borrow_mut();
            log.listeners = Some(listeners);
            log.setup.push("listeners".to_string());
        }
        fn set_location_source(&mut self, source: LocationSource) {
            self.0.borrow_mut().setup.push(format!("source:{}", source.name));
        }
    }

    fn engine() -> (EngineHandle, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (EngineHandle::new(LogEngine(log.clone())), log)
    }

    #[test]
    fn test_ready_registers_listeners_and_emits_initialized() {
        let mut view = MapView::with_clock(BridgeConfig::default(), ManualClock::new(0));
        assert!(view.request_engine());
        assert!(!view.request_engine());
        assert_eq!(view.readiness(), ReadinessState::Pending);

        let (handle, log) = engine();
        assert_eq!(view.on_engine_ready(handle), Some(0));

        assert_eq!(view.readiness(), ReadinessState::Ready);
        assert_eq!(log.borrow().listeners, Some(EngineListeners::all()));
        assert_eq!(view.take_events(), vec![MapEvent::Initialized]);
    }

    #[test]
    fn test_second_engine_delivery_is_ignored() {
        let mut view = MapView::new(BridgeConfig::default());
        let (first, _) = engine();
        let (second, second_log) = engine();

        view.on_engine_ready(first.clone());
        assert_eq!(view.on_engine_ready(second), None);

        assert!(view.engine().is_some_and(|e| e.same_engine(&first)));
        assert!(second_log.borrow().listeners.is_none());
        assert_eq!(view.take_events(), vec![MapEvent::Initialized]);
    }

    #[test]
    fn test_location_source_delivered_first() {
        let mut view = MapView::new(BridgeConfig::default());
        view.request_engine();
        view.set_location_source(LocationSource::new("fused"));

        let (handle, log) = engine();
        view.on_engine_ready(handle);
        assert_eq!(log.borrow().setup, vec!["source:fused", "listeners"]);

        // 就绪后替换来源立即生效
        view.set_location_source(LocationSource::new("gps"));
        assert_eq!(log.borrow().setup.last().map(String::as_str), Some("source:gps"));
        assert_eq!(view.location_source(), Some(&LocationSource::new("gps")));

        view.teardown();
        assert!(view.location_source().is_none());
        view.set_location_source(LocationSource::new("late"));
        assert!(view.location_source().is_none());
        assert_eq!(log.borrow().setup.len(), 3);
    }

    #[test]
    fn test_first_gesture_forwarded_with_system_clock() {
        // 单调时钟从 0 起算，刚创建的视图也要转发第一次手势
        let mut view = MapView::new(BridgeConfig::default());
        let (handle, _) = engine();
        view.on_engine_ready(handle);
        view.take_events();

        view.on_camera_change(-1, true);
        view.on_camera_change(-1, true);
        assert_eq!(view.take_events().len(), 1);
    }

    #[test]
    fn test_ready_without_location_source() {
        let mut view = MapView::new(BridgeConfig::default());
        let (handle, log) = engine();
        view.on_engine_ready(handle);
        assert_eq!(log.borrow().setup, vec!["listeners"]);
    }

    #[test]
    fn test_commands_queue_until_ready() {
        let mut view = MapView::new(BridgeConfig::default());
        view.request_engine();
        view.set_zoom(3.0);
        view.set_center(LatLng::new(1.0, 1.0));
        assert_eq!(view.pending_ops(), 2);

        let (handle, log) = engine();
        assert_eq!(view.on_engine_ready(handle), Some(2));
        assert_eq!(
            log.borrow().moves,
            vec![
                CameraUpdate::ZoomTo { zoom: 3.0 },
                CameraUpdate::ScrollTo {
                    target: LatLng::new(1.0, 1.0)
                }
            ]
        );
        assert_eq!(view.pending_ops(), 0);
    }

    #[test]
    fn test_invalid_tracking_mode_is_noop() {
        let mut view = MapView::new(BridgeConfig::default());
        let (handle, log) = engine();
        view.on_engine_ready(handle);

        view.set_location_tracking_mode(9);
        view.set_location_tracking_mode(-1);
        view.set_map_type_name("moon");
        assert!(log.borrow().options.is_empty());

        view.set_location_tracking_mode(2);
        view.set_map_type_name("SATELLITE");
        assert_eq!(
            log.borrow().options,
            vec![
                MapOption::LocationTrackingMode {
                    mode: LocationTrackingMode::Follow
                },
                MapOption::MapType {
                    map_type: MapType::Satellite
                }
            ]
        );
    }

    #[test]
    fn test_callbacks_before_ready_are_dropped() {
        let mut view = MapView::new(BridgeConfig::default());
        view.request_engine();
        view.on_camera_idle();
        view.on_camera_change(-1, false);
        view.on_map_click(ScreenPoint::new(0.0, 0.0), LatLng::new(0.0, 0.0));
        assert!(view.pending_events().is_empty());
    }

    #[test]
    fn test_idle_snapshot_is_queried_fresh() {
        let mut view = MapView::new(BridgeConfig::default());
        let (handle, _) = engine();
        view.on_engine_ready(handle);
        view.take_events();

        view.on_camera_idle();
        let events = view.take_events();
        let [MapEvent::CameraChange(change)] = events.as_slice() else {
            panic!("期望一个 onCameraChange，实际 {events:?}");
        };
        assert_eq!(change.zoom, 10.0);
        assert_eq!(change.content_region.len(), 2);
        assert_eq!(change.covering_region[1], LatLng::new(2.0, 2.0));
    }
}
