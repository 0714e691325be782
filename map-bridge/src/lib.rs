//! # Map Bridge
//!
//! 声明式宿主与命令式地图引擎之间的同步与事件桥接层。
//!
//! ## 架构概述
//!
//! `map-bridge` 不渲染任何东西，也不依赖具体引擎。引擎和覆盖物通过
//! [`MapEngine`] / [`MapFeature`] 两个 trait 接入，宿主只和 [`MapView`] 打交道：
//!
//! ```text
//! Host                                   MapView
//!   │── 指令 / add_feature ─────────────►│ ReadinessGate（未就绪则排队）
//!   │── on_engine_ready(handle) ────────►│ 注册监听 → onInitialized → 执行积压
//!   │── on_camera_* / on_map_click ─────►│ EventBridge（回声抑制）
//!   │◄── take_events() ──────────────────│
//!   │── teardown() / drop ──────────────►│ 摘下覆盖物 → 释放引擎 → Destroyed
//! ```
//!
//! ## 核心类型
//!
//! - [`MapView`]：宿主入口
//! - [`MapCommand`]：可序列化的地图指令
//! - [`MapEvent`]：发给宿主的事件
//! - [`BridgeConfig`]：可调参数（防抖间隔、离屏容器等）
//!
//! ## 使用示例
//!
//! ```ignore
//! use map_bridge::{BridgeConfig, EngineHandle, LatLng, MapView};
//!
//! let mut view = MapView::new(BridgeConfig::default());
//! view.request_engine();
//! view.set_center(LatLng::new(37.5665, 126.978)); // 排队
//!
//! // 引擎异步创建完成
//! view.on_engine_ready(EngineHandle::new(engine));
//!
//! for event in view.take_events() {
//!     host.emit(event.name(), serde_json::to_value(&event)?);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`gate`]：就绪门与延迟操作队列
//! - [`registry`]：覆盖物登记表
//! - [`coordinator`]：离屏容器
//! - [`bridge`]：引擎回调到宿主事件
//! - [`view`]：`MapView`、指令执行、销毁流程

pub mod bridge;
pub mod clock;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod event;
pub mod feature;
pub mod gate;
pub mod geo;
pub mod registry;
pub mod view;

// 重导出核心类型
pub use bridge::{EchoFilter, EventBridge};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{
    CameraAnimation, CameraUpdate, Control, Gesture, LocationTrackingMode, MapCommand, MapOption,
    MapType, UiSetting,
};
pub use config::{BridgeConfig, OffscreenConfig};
pub use coordinator::{ContainerLayout, VisibilityCoordinator};
pub use engine::{EngineHandle, EngineListeners, LocationSource, MapEngine};
pub use error::{BridgeError, BridgeResult, ConfigError};
pub use event::{CameraChangeEvent, CameraChangeReason, MapClickEvent, MapEvent, TouchEvent};
pub use feature::{FeatureId, FeatureKind, MapFeature, NodeId, Visibility};
pub use gate::{ReadinessGate, ReadinessState, Submission};
pub use geo::{CameraPosition, CameraSnapshot, EdgeInsets, LatLng, LatLngBounds, ScreenPoint};
pub use registry::{AttachOutcome, FeatureEntry, FeatureRegistry};
pub use view::{CommandExecutor, DeferredOp, MapView, TeardownReport};
