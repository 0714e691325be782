//! # Registry 模块
//!
//! 覆盖物登记表：按宿主观察到的顺序保存覆盖物，并记录每个覆盖物是否已挂到引擎上。
//!
//! ## 设计说明
//!
//! - 索引只在这里出现：宿主传入的索引在边界处解析成 `FeatureId`，
//!   之后的引擎挂载逻辑只认 `FeatureId`
//! - 越界策略是宽松的：插入越界时追加到末尾，删除/读取越界时什么也不做
//! - 删除顺序：先从列表移除（宿主立刻看到数量变化），再从引擎摘下，最后摘下视图节点

use tracing::debug;

use crate::coordinator::VisibilityCoordinator;
use crate::engine::EngineHandle;
use crate::feature::{FeatureId, FeatureKind, MapFeature};

/// 登记表条目
pub struct FeatureEntry {
    id: FeatureId,
    feature: Box<dyn MapFeature>,
    attached: bool,
}

impl FeatureEntry {
    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn feature(&self) -> &dyn MapFeature {
        self.feature.as_ref()
    }

    /// 是否已挂到引擎上
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// 取回覆盖物的所有权
    pub fn into_feature(self) -> Box<dyn MapFeature> {
        self.feature
    }
}

impl std::fmt::Debug for FeatureEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEntry")
            .field("id", &self.id)
            .field("kind", &self.feature.kind())
            .field("attached", &self.attached)
            .finish()
    }
}

/// 挂载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// 本次挂上
    Attached,
    /// 之前已经挂上，未重复挂载
    AlreadyAttached,
    /// 覆盖物已不在登记表中（挂载前被删除）
    Missing,
}

/// 覆盖物登记表
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    entries: Vec<FeatureEntry>,
    next_id: u64,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 登记覆盖物
    ///
    /// `index` 不在 `[0, len]` 内时追加到末尾。返回分配的标识和实际位置。
    pub fn insert(&mut self, feature: Box<dyn MapFeature>, index: i32) -> (FeatureId, usize) {
        self.next_id += 1;
        let id = FeatureId::new(self.next_id);
        let len = self.entries.len();

        let position = match usize::try_from(index) {
            Ok(i) if i <= len => i,
            _ => {
                debug!(index, len, "插入索引越界，追加到末尾");
                len
            }
        };

        self.entries.insert(
            position,
            FeatureEntry {
                id,
                feature,
                attached: false,
            },
        );
        (id, position)
    }

    /// 按索引读取，越界返回 `None`
    pub fn get(&self, index: i32) -> Option<&dyn MapFeature> {
        self.entry_at(index).map(FeatureEntry::feature)
    }

    /// 按索引读取条目，越界返回 `None`
    pub fn entry_at(&self, index: i32) -> Option<&FeatureEntry> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    pub fn position_of(&self, id: FeatureId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.position_of(id).is_some()
    }

    /// 按当前顺序列出所有标识
    pub fn ids(&self) -> Vec<FeatureId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// 按当前顺序列出所有种类
    pub fn kinds(&self) -> Vec<FeatureKind> {
        self.entries.iter().map(|e| e.feature.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureEntry> {
        self.entries.iter()
    }

    /// 把覆盖物挂到引擎上，并交给协调器挂载视图
    ///
    /// 同一个覆盖物最多挂一次；挂载前已被删除的覆盖物直接跳过。
    pub fn attach(
        &mut self,
        id: FeatureId,
        engine: &EngineHandle,
        coordinator: Option<&mut VisibilityCoordinator>,
    ) -> AttachOutcome {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return AttachOutcome::Missing;
        };
        if entry.attached {
            return AttachOutcome::AlreadyAttached;
        }

        entry.feature.attach_to_engine(engine);
        entry.attached = true;

        if let Some(coordinator) = coordinator {
            coordinator.adopt(id, entry.feature.as_mut());
        }

        debug!(feature = %id, kind = %entry.feature.kind(), "覆盖物已挂到引擎");
        AttachOutcome::Attached
    }

    /// 按索引删除覆盖物，返回其所有权
    ///
    /// 越界时什么也不做。未挂上引擎的覆盖物不会被摘下（它的挂载操作会被跳过）。
    pub fn remove_at(
        &mut self,
        index: i32,
        coordinator: Option<&mut VisibilityCoordinator>,
    ) -> Option<Box<dyn MapFeature>> {
        let position = usize::try_from(index)
            .ok()
            .filter(|i| *i < self.entries.len())?;

        // 先移除，宿主立刻看到数量变化
        let mut entry = self.entries.remove(position);

        if entry.attached {
            entry.feature.detach_from_engine();
            entry.attached = false;
        }

        match coordinator {
            Some(coordinator) => coordinator.release(entry.id, entry.feature.as_mut()),
            None => {
                if entry.feature.parent().is_some() {
                    entry.feature.detach_from_parent();
                }
            }
        }

        debug!(feature = %entry.id, index, remaining = self.entries.len(), "覆盖物已删除");
        Some(entry.into_feature())
    }

    /// 摘下指定覆盖物的视图节点，返回实际摘下的数量
    pub fn release_nodes(&mut self, ids: &[FeatureId]) -> usize {
        let mut released = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            if entry.feature.parent().is_some() {
                entry.feature.detach_from_parent();
                released += 1;
            }
        }
        released
    }

    /// 把所有已挂载的覆盖物从引擎摘下，返回摘下的数量
    ///
    /// 每个覆盖物只摘一次；条目仍保留在登记表中。
    pub fn detach_all(&mut self) -> usize {
        let mut detached = 0;
        for entry in self.entries.iter_mut().filter(|e| e.attached) {
            entry.feature.detach_from_engine();
            entry.attached = false;
            detached += 1;
        }
        detached
    }

    /// 清空登记表，返回被丢弃的覆盖物
    pub fn clear(&mut self) -> Vec<Box<dyn MapFeature>> {
        self.entries
            .drain(..)
            .map(FeatureEntry::into_feature)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CameraAnimation, CameraUpdate, MapOption, UiSetting};
    use crate::config::OffscreenConfig;
    use crate::engine::{EngineListeners, MapEngine};
    use crate::feature::{NodeId, Visibility};
    use crate::geo::{CameraPosition, EdgeInsets, LatLng};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullEngine;

    impl MapEngine for NullEngine {
        fn camera_position(&self) -> CameraPosition {
            CameraPosition::new(LatLng::new(0.0, 0.0), 0.0, 0.0, 0.0)
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
    struct Probe {
        attach: usize,
        detach: usize,
        parent: Option<NodeId>,
    }

    struct Tagged {
        tag: &'static str,
        probe: Rc<RefCell<Probe>>,
    }

    fn tagged(tag: &'static str) -> (Box<dyn MapFeature>, Rc<RefCell<Probe>>) {
        let probe = Rc::new(RefCell::new(Probe::default()));
        (
            Box::new(Tagged {
                tag,
                probe: probe.clone(),
            }),
            probe,
        )
    }

    impl MapFeature for Tagged {
        fn kind(&self) -> FeatureKind {
            match self.tag.chars().next() {
                Some('p') => FeatureKind::Polygon,
                _ => FeatureKind::Marker,
            }
        }
        fn attach_to_engine(&mut self, _engine: &EngineHandle) {
            self.probe.borrow_mut().attach += 1;
        }
        fn detach_from_engine(&mut self) {
            self.probe.borrow_mut().detach += 1;
        }
        fn visibility(&self) -> Visibility {
            Visibility::Visible
        }
        fn set_visibility(&mut self, _visibility: Visibility) {}
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

    #[test]
    fn test_out_of_range_insert_appends() {
        let mut registry = FeatureRegistry::new();
        let mut ids = Vec::new();
        for index in [-1, 5, 100, i32::MIN, i32::MAX] {
            let (feature, _) = tagged("m");
            let (id, position) = registry.insert(feature, index);
            assert_eq!(position, ids.len());
            ids.push(id);
        }

        assert_eq!(registry.len(), 5);
        assert_eq!(registry.ids(), ids);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut registry = FeatureRegistry::new();
        let (a, _) = registry.insert(tagged("m").0, 0);
        let (b, _) = registry.insert(tagged("m").0, 1);
        let (c, position) = registry.insert(tagged("p").0, 1);

        assert_eq!(position, 1);
        assert_eq!(registry.ids(), vec![a, c, b]);
        assert_eq!(
            registry.kinds(),
            vec![FeatureKind::Marker, FeatureKind::Polygon, FeatureKind::Marker]
        );
    }

    #[test]
    fn test_out_of_range_remove_is_noop() {
        let mut registry = FeatureRegistry::new();
        registry.insert(tagged("m").0, 0);
        registry.insert(tagged("p").0, 1);
        let before = registry.ids();

        for index in [-1, 2, 3, i32::MAX, i32::MIN] {
            assert!(registry.remove_at(index, None).is_none());
        }
        assert_eq!(registry.ids(), before);
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let mut registry = FeatureRegistry::new();
        assert!(registry.get(0).is_none());

        registry.insert(tagged("p").0, 0);
        assert_eq!(registry.get(0).map(|f| f.kind()), Some(FeatureKind::Polygon));
        assert!(registry.get(1).is_none());
        assert!(registry.get(-1).is_none());
    }

    #[test]
    fn test_attach_once_then_remove_detaches_once() {
        let engine = EngineHandle::new(NullEngine);
        let mut coordinator = VisibilityCoordinator::new(&OffscreenConfig::default());
        let mut registry = FeatureRegistry::new();

        let (feature, probe) = tagged("m");
        let (id, _) = registry.insert(feature, 0);

        assert_eq!(
            registry.attach(id, &engine, Some(&mut coordinator)),
            AttachOutcome::Attached
        );
        assert_eq!(
            registry.attach(id, &engine, Some(&mut coordinator)),
            AttachOutcome::AlreadyAttached
        );
        assert_eq!(probe.borrow().attach, 1);
        assert_eq!(probe.borrow().parent, Some(coordinator.node()));

        let removed = registry.remove_at(0, Some(&mut coordinator));
        assert!(removed.is_some());
        assert_eq!(registry.len(), 0);
        assert_eq!(probe.borrow().detach, 1);
        assert_eq!(probe.borrow().parent, None);
        assert_eq!(coordinator.child_count(), 0);
    }

    #[test]
    fn test_attach_after_removal_is_skipped() {
        let engine = EngineHandle::new(NullEngine);
        let mut registry = FeatureRegistry::new();

        let (feature, probe) = tagged("m");
        let (id, _) = registry.insert(feature, 0);
        registry.remove_at(0, None);

        assert_eq!(registry.attach(id, &engine, None), AttachOutcome::Missing);
        assert_eq!(probe.borrow().attach, 0);
        // 从未挂上，也就不摘
        assert_eq!(probe.borrow().detach, 0);
    }

    #[test]
    fn test_detach_all_touches_each_attached_feature_once() {
        let engine = EngineHandle::new(NullEngine);
        let mut registry = FeatureRegistry::new();

        let (a, probe_a) = tagged("m");
        let (b, probe_b) = tagged("p");
        let (id_a, _) = registry.insert(a, 0);
        registry.insert(b, 1);
        registry.attach(id_a, &engine, None);

        assert_eq!(registry.detach_all(), 1);
        assert_eq!(registry.detach_all(), 0);
        assert_eq!(probe_a.borrow().detach, 1);
        assert_eq!(probe_b.borrow().detach, 0);

        assert_eq!(registry.clear().len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = FeatureRegistry::new();
        let (first, _) = registry.insert(tagged("m").0, 0);
        registry.remove_at(0, None);
        let (second, _) = registry.insert(tagged("m").0, 0);
        assert_ne!(first, second);
        assert!(!registry.contains(first));
        assert_eq!(registry.position_of(second), Some(0));
    }
}
