//! # Bridge 模块
//!
//! 把引擎回调整理成宿主事件，放进发件箱，由宿主通过 `take_events` 取走。
//!
//! ## 回声抑制
//!
//! 组件自己发出的相机指令也会让引擎回报 camera change，宿主不应该把这些
//! 变化当成用户操作。只有 reason 等于手势标记值的变化才是候选，
//! 并且距离上一次上报超过防抖间隔才上报：
//!
//! ```text
//! reason == gesture_reason && (从未上报 || now - last > interval)
//! ```
//!
//! 被抑制的候选不更新时间戳。

use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::event::{CameraChangeEvent, MapClickEvent, MapEvent, TouchEvent};
use crate::geo::{CameraSnapshot, LatLng, ScreenPoint};

/// 手势回声过滤器
#[derive(Debug, Clone)]
pub struct EchoFilter {
    interval_ms: u64,
    gesture_reason: i32,
    last_accepted: Option<u64>,
}

impl EchoFilter {
    pub fn new(interval_ms: u64, gesture_reason: i32) -> Self {
        Self {
            interval_ms,
            gesture_reason,
            last_accepted: None,
        }
    }

    /// 判断一次 camera change 是否应该上报，接受时记录时间
    pub fn accept(&mut self, reason: i32, now_ms: u64) -> bool {
        if reason != self.gesture_reason {
            return false;
        }

        let accepted = match self.last_accepted {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.interval_ms,
        };
        if accepted {
            self.last_accepted = Some(now_ms);
        }
        accepted
    }

    /// 上一次上报的时间
    pub fn last_accepted(&self) -> Option<u64> {
        self.last_accepted
    }
}

/// 事件桥
#[derive(Debug)]
pub struct EventBridge {
    filter: EchoFilter,
    outbox: Vec<MapEvent>,
    initialized: bool,
}

impl EventBridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            filter: EchoFilter::new(config.gesture_debounce_ms, config.gesture_reason),
            outbox: Vec::new(),
            initialized: false,
        }
    }

    /// 发出 `onInitialized`，只有第一次调用有效
    pub fn initialized(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.outbox.push(MapEvent::Initialized);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 相机停止：用现查的快照发出 `onCameraChange`
    pub fn camera_idle(&mut self, snapshot: &CameraSnapshot) {
        self.outbox
            .push(MapEvent::CameraChange(CameraChangeEvent::from(snapshot)));
    }

    /// 相机变化：通过回声过滤后发出 `onTouch`
    pub fn camera_change(&mut self, reason: i32, animated: bool, now_ms: u64) -> bool {
        if !self.filter.accept(reason, now_ms) {
            trace!(reason, now_ms, "camera change 被抑制");
            return false;
        }
        debug!(reason, animated, now_ms, "上报手势 camera change");
        self.outbox
            .push(MapEvent::Touch(TouchEvent { reason, animated }));
        true
    }

    /// 地图点击：不过滤
    pub fn map_click(&mut self, point: ScreenPoint, coordinate: LatLng) {
        self.outbox
            .push(MapEvent::MapClick(MapClickEvent::new(point, coordinate)));
    }

    /// 取走所有待发事件
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// 查看待发事件（不取走）
    pub fn pending(&self) -> &[MapEvent] {
        &self.outbox
    }

    /// 丢弃待发事件，返回丢弃数量
    pub fn clear(&mut self) -> usize {
        let dropped = self.outbox.len();
        self.outbox.clear();
        dropped
    }
}
