//! # Lifecycle 模块
//!
//! 视图销毁。
//!
//! ## 销毁顺序
//!
//! ```text
//! 卸载离屏容器并摘下子节点 → 逐个从引擎摘下覆盖物 → 清空登记表
//!   → 释放引擎句柄与容器 → 进入 Destroyed（丢弃积压操作）
//! ```
//!
//! 引擎句柄一定在所有覆盖物摘下之后才释放。

use serde::Serialize;
use tracing::{debug, info};

use super::MapView;

/// 销毁报告
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// 从引擎摘下的覆盖物数
    pub detached: usize,
    /// 从容器摘下的视图节点数
    pub released_nodes: usize,
    /// 清出登记表的覆盖物数
    pub cleared: usize,
    /// 未执行就被丢弃的积压操作数
    pub discarded_ops: usize,
}

impl TeardownReport {
    /// 是否什么都没做（重复销毁）
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl MapView {
    /// 销毁视图
    ///
    /// 可重复调用，第二次起什么也不做并返回空报告。
    pub fn teardown(&mut self) -> TeardownReport {
        if self.gate.is_destroyed() {
            debug!("视图已销毁，跳过");
            return TeardownReport::default();
        }

        let mut report = TeardownReport::default();

        if let Some(container) = self.container.as_mut() {
            let children = container.unmount();
            report.released_nodes = self.registry.release_nodes(&children);
        }

        report.detached = self.registry.detach_all();
        report.cleared = self.registry.clear().len();

        self.engine = None;
        self.container = None;
        self.location_source = None;
        report.discarded_ops = self.gate.close();

        info!(
            detached = report.detached,
            released_nodes = report.released_nodes,
            cleared = report.cleared,
            discarded_ops = report.discarded_ops,
            "地图视图已销毁"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CameraAnimation, CameraUpdate, MapOption, UiSetting};
    use crate::config::BridgeConfig;
    use crate::engine::{EngineHandle, EngineListeners, MapEngine};
    use crate::feature::{FeatureKind, MapFeature, NodeId, Visibility};
    use crate::gate::ReadinessState;
    use crate::geo::{CameraPosition, EdgeInsets, LatLng};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Still;

    impl MapEngine for Still {
        fn camera_position(&self) -> CameraPosition {
            CameraPosition::new(LatLng::new(0.0, 0.0), 1.0, 0.0, 0.0)
        }
        fn move_camera(&mut self, _update: CameraUpdate, _animation: CameraAnimation) {}
        fn content_region(&self) -> Vec<LatLng> {
            Vec::new()
        }
        fn covering_region(&self) -> Vec<LatLng> {
            Vec::new()
        }
        fn set_content_padding(&mut self, _padding: EdgeInsets) {}
        fn apply_ui_setting(&mut self, _setting: UiSetting) {}
        fn apply_map_option(&mut self, _option: MapOption) {}
        fn register_listeners(&mut self, _listeners: EngineListeners) {}
    }

    #[derive(Default)]
    struct Counts {
        detach: usize,
        parent: Option<NodeId>,
        /// 摘下时引擎是否仍被持有
        engine_alive_at_detach: Option<bool>,
        engine: Option<EngineHandle>,
    }

    struct Marker(Rc<RefCell<Counts>>);

    impl MapFeature for Marker {
        fn kind(&self) -> FeatureKind {
            FeatureKind::Marker
        }
        fn attach_to_engine(&mut self, engine: &EngineHandle) {
            self.0.borrow_mut().engine = Some(engine.clone());
        }
        fn detach_from_engine(&mut self) {
            let mut counts = self.0.borrow_mut();
            counts.detach += 1;
            let alive = counts.engine.as_ref().map(|e| e.share_count() > 1);
            counts.engine_alive_at_detach = alive;
            counts.engine = None;
        }
        fn visibility(&self) -> Visibility {
            Visibility::Visible
        }
        fn set_visibility(&mut self, _visibility: Visibility) {}
        fn parent(&self) -> Option<NodeId> {
            self.0.borrow().parent
        }
        fn attach_to_parent(&mut self, parent: NodeId) {
            self.0.borrow_mut().parent = Some(parent);
        }
        fn detach_from_parent(&mut self) {
            self.0.borrow_mut().parent = None;
        }
    }

    #[test]
    fn test_teardown_detaches_before_releasing_engine() {
        let mut view = MapView::new(BridgeConfig::default());
        view.on_engine_ready(EngineHandle::new(Still));

        let counts = Rc::new(RefCell::new(Counts::default()));
        view.add_feature(Box::new(Marker(counts.clone())), 0);
        assert!(counts.borrow().parent.is_some());

        let report = view.teardown();
        assert_eq!(report.detached, 1);
        assert_eq!(report.released_nodes, 1);
        assert_eq!(report.cleared, 1);

        let counts = counts.borrow();
        assert_eq!(counts.detach, 1);
        assert_eq!(counts.parent, None);
        assert_eq!(counts.engine_alive_at_detach, Some(true));

        assert_eq!(view.feature_count(), 0);
        assert!(view.feature_at(0).is_none());
        assert!(view.engine().is_none());
        assert!(view.container().is_none());
        assert_eq!(view.readiness(), ReadinessState::Destroyed);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut view = MapView::new(BridgeConfig::default());
        view.request_engine();
        view.set_zoom(4.0);

        let first = view.teardown();
        assert_eq!(first.discarded_ops, 1);
        assert!(view.teardown().is_empty());
    }

    #[test]
    fn test_unattached_features_are_not_detached() {
        let mut view = MapView::new(BridgeConfig::default());
        view.request_engine();

        let counts = Rc::new(RefCell::new(Counts::default()));
        view.add_feature(Box::new(Marker(counts.clone())), 0);

        let report = view.teardown();
        assert_eq!(report.detached, 0);
        assert_eq!(report.cleared, 1);
        // 积压的挂载操作随销毁丢弃
        assert_eq!(report.discarded_ops, 1);
        assert_eq!(counts.borrow().detach, 0);
    }

    #[test]
    fn test_drop_runs_teardown() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        {
            let mut view = MapView::new(BridgeConfig::default());
            view.on_engine_ready(EngineHandle::new(Still));
            view.add_feature(Box::new(Marker(counts.clone())), 0);
        }
        assert_eq!(counts.borrow().detach, 1);
        assert_eq!(counts.borrow().parent, None);
    }
}
