//! # Engine 模块
//!
//! 地图引擎协作者接口。
//!
//! 引擎本身（渲染、瓦片、测地计算）不在本 crate 内实现，这里只约定桥接层
//! 需要用到的能力：
//!
//! - 相机读写
//! - content / covering 区域查询
//! - UI 设置与地图选项的修改
//! - 监听器注册（引擎回调由宿主转发到 `MapView::on_*`）
//! - 定位来源

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::command::{CameraAnimation, CameraUpdate, MapOption, UiSetting};
use crate::geo::{CameraPosition, CameraSnapshot, EdgeInsets, LatLng};

/// 需要引擎投递的回调集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineListeners {
    pub camera_idle: bool,
    pub camera_change: bool,
    pub map_click: bool,
}

impl EngineListeners {
    /// 桥接层需要的全部回调
    pub fn all() -> Self {
        Self {
            camera_idle: true,
            camera_change: true,
            map_click: true,
        }
    }
}

/// 定位来源
///
/// 由宿主提供（例如融合定位服务）。定位追踪模式只有在引擎拿到来源后才会生效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSource {
    pub name: String,
}

impl LocationSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 地图引擎
///
/// 所有方法都在宿主的 UI 线程上调用。
pub trait MapEngine {
    /// 当前相机位置
    fn camera_position(&self) -> CameraPosition;

    /// 移动相机
    fn move_camera(&mut self, update: CameraUpdate, animation: CameraAnimation);

    /// 内容区域（扣除 content padding 后的可见多边形）
    fn content_region(&self) -> Vec<LatLng>;

    /// 覆盖区域（整个视图覆盖的多边形）
    fn covering_region(&self) -> Vec<LatLng>;

    fn set_content_padding(&mut self, padding: EdgeInsets);

    fn apply_ui_setting(&mut self, setting: UiSetting);

    fn apply_map_option(&mut self, option: MapOption);

    /// 就绪时调用一次，告知引擎需要投递哪些回调
    fn register_listeners(&mut self, listeners: EngineListeners);

    /// 设置定位来源。就绪时先于其他调用执行
    fn set_location_source(&mut self, _source: LocationSource) {}

    /// 现查一份相机快照
    fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.camera_position(),
            content_region: self.content_region(),
            covering_region: self.covering_region(),
        }
    }
}

/// 引擎句柄
///
/// 单线程共享引用。构造后异步交付一次，teardown 时释放。
/// 覆盖物在 attach 期间可以克隆并持有它。
#[derive(Clone)]
pub struct EngineHandle(Rc<RefCell<dyn MapEngine>>);

impl EngineHandle {
    pub fn new<E: MapEngine + 'static>(engine: E) -> Self {
        Self(Rc::new(RefCell::new(engine)))
    }

    /// 包装一个宿主已经持有的引擎
    ///
    /// 宿主保留 `Rc` 的另一份克隆，可以在桥接层之外直接观察引擎状态。
    pub fn from_shared<E: MapEngine + 'static>(engine: Rc<RefCell<E>>) -> Self {
        Self(engine)
    }

    pub fn borrow(&self) -> Ref<'_, dyn MapEngine + 'static> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn MapEngine + 'static> {
        self.0.borrow_mut()
    }

    /// 两个句柄是否指向同一个引擎
    pub fn same_engine(&self, other: &EngineHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// 当前共享计数（含本句柄）
    pub fn share_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("shares", &self.share_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;

    struct StillEngine {
        position: CameraPosition,
    }

    impl MapEngine for StillEngine {
        fn camera_position(&self) -> CameraPosition {
            self.position
        }
        fn move_camera(&mut self, update: CameraUpdate, _animation: CameraAnimation) {
            if let CameraUpdate::ZoomTo { zoom } = update {
                self.position.zoom = zoom;
            }
        }
        fn content_region(&self) -> Vec<LatLng> {
            vec![self.position.target]
        }
        fn covering_region(&self) -> Vec<LatLng> {
            vec![self.position.target, self.position.target]
        }
        fn set_content_padding(&mut self, _padding: EdgeInsets) {}
        fn apply_ui_setting(&mut self, _setting: UiSetting) {}
        fn apply_map_option(&mut self, _option: MapOption) {}
        fn register_listeners(&mut self, _listeners: EngineListeners) {}
    }

    #[test]
    fn test_snapshot_reads_engine() {
        let engine = StillEngine {
            position: CameraPosition::new(LatLng::new(1.0, 2.0), 10.0, 0.0, 0.0),
        };
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.position.zoom, 10.0);
        assert_eq!(snapshot.content_region.len(), 1);
        assert_eq!(snapshot.covering_region.len(), 2);
    }

    #[test]
    fn test_handle_shares_engine() {
        let shared = Rc::new(RefCell::new(StillEngine {
            position: CameraPosition::new(LatLng::new(0.0, 0.0), 5.0, 0.0, 0.0),
        }));
        let handle = EngineHandle::from_shared(shared.clone());
        let clone = handle.clone();
        assert!(handle.same_engine(&clone));
        assert_eq!(handle.share_count(), 3);

        clone
            .borrow_mut()
            .move_camera(CameraUpdate::ZoomTo { zoom: 12.0 }, CameraAnimation::None);
        assert_eq!(shared.borrow().position.zoom, 12.0);
        assert_eq!(handle.borrow().camera_position().zoom, 12.0);
    }
}
