//! # Coordinator 模块
//!
//! 离屏容器：一个零尺寸、推到可见区域之外的容器节点，挂在地图表面上。
//!
//! 覆盖物视图被挂到这里，从而进入活动的视图树并收到可见性变化，
//! 懒加载类的副作用（如图片解码）得以触发，而画面上不会出现任何东西。
//!
//! ## 挂载流程
//!
//! ```text
//! 记录可见性 → 设为 Invisible → 从旧父节点摘下 → 挂到容器 → 恢复可见性
//! ```
//!
//! 对同一个覆盖物重复执行结果不变。

use tracing::debug;

use crate::config::OffscreenConfig;
use crate::feature::{FeatureId, MapFeature, NodeId, Visibility};

/// 容器布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerLayout {
    pub width: i32,
    pub height: i32,
    pub left_margin: i64,
    pub top_margin: i64,
}

impl ContainerLayout {
    /// 零尺寸、推出可见区域
    pub fn offscreen(margin: i64) -> Self {
        Self {
            width: 0,
            height: 0,
            left_margin: margin,
            top_margin: margin,
        }
    }
}

/// 可见性协调器
#[derive(Debug)]
pub struct VisibilityCoordinator {
    node: NodeId,
    layout: ContainerLayout,
    enabled: bool,
    /// 是否挂在地图表面上
    mounted: bool,
    children: Vec<FeatureId>,
}

impl VisibilityCoordinator {
    /// 创建容器并挂到地图表面
    pub fn new(config: &OffscreenConfig) -> Self {
        let node = config.node.unwrap_or_else(NodeId::next);
        debug!(node = %node, enabled = config.enabled, "离屏容器已挂载");
        Self {
            node,
            layout: ContainerLayout::offscreen(config.margin),
            enabled: config.enabled,
            mounted: true,
            children: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn layout(&self) -> ContainerLayout {
        self.layout
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.children.contains(&id)
    }

    /// 把覆盖物视图挂到容器下
    ///
    /// 容器关闭或已卸载时什么也不做，返回 `false`。
    pub fn adopt(&mut self, id: FeatureId, feature: &mut dyn MapFeature) -> bool {
        if !self.enabled || !self.mounted {
            return false;
        }

        let visibility = feature.visibility();
        feature.set_visibility(Visibility::Invisible);

        if feature.parent().is_some() {
            feature.detach_from_parent();
        }
        feature.attach_to_parent(self.node);
        if !self.children.contains(&id) {
            self.children.push(id);
        }

        feature.set_visibility(visibility);
        true
    }

    /// 把覆盖物视图从当前父节点上摘下，并从容器的子节点中移除
    pub fn release(&mut self, id: FeatureId, feature: &mut dyn MapFeature) {
        self.children.retain(|child| *child != id);
        if feature.parent().is_some() {
            feature.detach_from_parent();
        }
    }

    /// 卸载容器：清空子节点并从地图表面摘下
    ///
    /// 返回原有子节点，调用方负责逐个摘下视图。
    pub fn unmount(&mut self) -> Vec<FeatureId> {
        self.mounted = false;
        std::mem::take(&mut self.children)
    }
}
