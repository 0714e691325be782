//! # Geo 模块
//!
//! 桥接层使用的几何与相机值类型。
//!
//! 这里只定义数据，不做任何投影或测地计算，那是引擎的职责。

use serde::{Deserialize, Serialize};

/// 经纬度坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// 经纬度包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    /// 西南角
    pub south_west: LatLng,
    /// 东北角
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// 由一组坐标点构造最小包围盒
    ///
    /// 空输入返回 `None`。
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.south_west.latitude = bounds.south_west.latitude.min(p.latitude);
            bounds.south_west.longitude = bounds.south_west.longitude.min(p.longitude);
            bounds.north_east.latitude = bounds.north_east.latitude.max(p.latitude);
            bounds.north_east.longitude = bounds.north_east.longitude.max(p.longitude);
        }
        Some(bounds)
    }

    /// 包围盒中心
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.latitude >= self.south_west.latitude
            && point.latitude <= self.north_east.latitude
            && point.longitude >= self.south_west.longitude
            && point.longitude <= self.north_east.longitude
    }
}

/// 屏幕坐标（像素）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 四边留白（像素）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl EdgeInsets {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// 四边相同的留白
    pub fn uniform(px: i32) -> Self {
        Self::new(px, px, px, px)
    }
}

/// 相机位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    /// 相机中心
    pub target: LatLng,
    pub zoom: f64,
    /// 倾斜角（度）
    pub tilt: f64,
    /// 方位角（度）
    pub bearing: f64,
}

impl CameraPosition {
    pub fn new(target: LatLng, zoom: f64, tilt: f64, bearing: f64) -> Self {
        Self {
            target,
            zoom,
            tilt,
            bearing,
        }
    }

    /// 替换倾斜角，其余保持不变
    pub fn with_tilt(self, tilt: f64) -> Self {
        Self { tilt, ..self }
    }

    /// 替换方位角，其余保持不变
    pub fn with_bearing(self, bearing: f64) -> Self {
        Self { bearing, ..self }
    }

    /// 以当前位置为底，按需覆盖缩放、倾斜、方位
    pub fn merged(
        self,
        target: LatLng,
        zoom: Option<f64>,
        tilt: Option<f64>,
        bearing: Option<f64>,
    ) -> Self {
        Self {
            target,
            zoom: zoom.unwrap_or(self.zoom),
            tilt: tilt.unwrap_or(self.tilt),
            bearing: bearing.unwrap_or(self.bearing),
        }
    }
}

/// 相机快照
///
/// 每次 camera idle 时从引擎现查，不跨事件缓存。
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSnapshot {
    pub position: CameraPosition,
    /// 内容区域（不含 content padding 的可见多边形）
    pub content_region: Vec<LatLng>,
    /// 覆盖区域（整个地图视图覆盖的多边形）
    pub covering_region: Vec<LatLng>,
}
