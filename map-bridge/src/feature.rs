//! # Feature 模块
//!
//! 覆盖物（marker、path、polygon 等）的能力约定。
//!
//! ## 设计说明
//!
//! - 不同种类的覆盖物只通过 `MapFeature` 这一个 trait 暴露能力，
//!   它们之间不需要继承关系
//! - 覆盖物同时是一个视图节点：它有父节点、有可见性，
//!   `VisibilityCoordinator` 会把它挂到离屏容器下
//! - 覆盖物的生命周期由 `FeatureRegistry` 独占

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::EngineHandle;

/// 覆盖物标识
///
/// 由 `FeatureRegistry` 在登记时分配，单调递增，不复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(u64);

impl FeatureId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature#{}", self.0)
    }
}

/// 视图节点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 分配一个进程内唯一的节点标识
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// 视图可见性
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    /// 不可见但仍参与布局
    Invisible,
    /// 不可见且不参与布局
    Gone,
}

/// 覆盖物种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Marker,
    Path,
    Polyline,
    Polygon,
    Circle,
    Other,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Marker => "marker",
            Self::Path => "path",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
            Self::Circle => "circle",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// 覆盖物
///
/// 桥接层只依赖这里列出的能力，具体的绘制（图标解码、路径描边等）由实现方负责。
pub trait MapFeature {
    fn kind(&self) -> FeatureKind;

    /// 挂到引擎上。实现方可以克隆并持有 `engine`，直到 `detach_from_engine`。
    fn attach_to_engine(&mut self, engine: &EngineHandle);

    /// 从引擎上摘下。只会在对应的 `attach_to_engine` 之后调用，从未挂上的覆盖物不会收到
    fn detach_from_engine(&mut self);

    fn visibility(&self) -> Visibility;

    fn set_visibility(&mut self, visibility: Visibility);

    /// 视图节点当前的父节点
    fn parent(&self) -> Option<NodeId>;

    /// 把视图节点挂到 `parent` 下
    fn attach_to_parent(&mut self, parent: NodeId);

    /// 把视图节点从当前父节点上摘下
    fn detach_from_parent(&mut self);
}

impl fmt::Debug for dyn MapFeature + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapFeature")
            .field("kind", &self.kind())
            .field("visibility", &self.visibility())
            .field("parent", &self.parent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_display() {
        assert_eq!(FeatureId::new(3).to_string(), "feature#3");
        assert_eq!(NodeId::new(9).to_string(), "node#9");
        assert_eq!(FeatureKind::Polygon.to_string(), "polygon");
        assert_eq!(Visibility::default(), Visibility::Visible);
    }
}
