//! # Feature 模块
//!
//! 模拟覆盖物。状态放在共享的探针里，覆盖物交给 `MapView` 之后仍可从外部观察。

use std::cell::RefCell;
use std::rc::Rc;

use map_bridge::{EngineHandle, FeatureKind, MapFeature, NodeId, Visibility};
use serde::Serialize;
use tracing::trace;

/// 覆盖物探针
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayProbe {
    pub label: String,
    pub kind: Option<FeatureKind>,
    pub attach_count: usize,
    pub detach_count: usize,
    pub parent: Option<NodeId>,
    pub visibility: Visibility,
    /// 当前是否持有引擎句柄
    pub engine_attached: bool,
}

pub type SharedProbe = Rc<RefCell<OverlayProbe>>;

/// 模拟覆盖物
pub struct SimOverlay {
    kind: FeatureKind,
    probe: SharedProbe,
    engine: Option<EngineHandle>,
}

impl SimOverlay {
    /// 创建覆盖物，同时返回它的探针
    pub fn new(kind: FeatureKind, label: impl Into<String>) -> (Self, SharedProbe) {
        let probe = Rc::new(RefCell::new(OverlayProbe {
            label: label.into(),
            kind: Some(kind),
            ..Default::default()
        }));
        let overlay = Self {
            kind,
            probe: probe.clone(),
            engine: None,
        };
        (overlay, probe)
    }

    pub fn probe(&self) -> &SharedProbe {
        &self.probe
    }
}

impl MapFeature for SimOverlay {
    fn kind(&self) -> FeatureKind {
        self.kind
    }

    fn attach_to_engine(&mut self, engine: &EngineHandle) {
        self.engine = Some(engine.clone());
        let mut probe = self.probe.borrow_mut();
        probe.attach_count += 1;
        probe.engine_attached = true;
        trace!(label = %probe.label, "覆盖物挂到引擎");
    }

    fn detach_from_engine(&mut self) {
        self.engine = None;
        let mut probe = self.probe.borrow_mut();
        probe.detach_count += 1;
        probe.engine_attached = false;
        trace!(label = %probe.label, "覆盖物从引擎摘下");
    }

    fn visibility(&self) -> Visibility {
        self.probe.borrow().visibility
    }

    fn set_visibility(&mut self, visibility: Visibility) {
        self.probe.borrow_mut().visibility = visibility;
    }

    fn parent(&self) -> Option<NodeId> {
        self.probe.borrow().parent
    }

    fn attach_to_parent(&mut self, parent: NodeId) {
        self.probe.borrow_mut().parent = Some(parent);
    }

    fn detach_from_parent(&mut self) {
        self.probe.borrow_mut().parent = None;
    }
}
