//! # Executor 模块
//!
//! 将 `MapCommand` 翻译成引擎调用。
//!
//! ## 职责
//!
//! - 相机类指令：读取当前相机，构造 `CameraUpdate` 并选择动画
//! - 设置类指令：转成 `UiSetting` / `MapOption` 交给引擎
//!
//! 执行器不关心就绪状态，调用方保证只在 Ready 时调用。

use tracing::debug;

use crate::command::{CameraAnimation, CameraUpdate, MapCommand, MapOption, UiSetting};
use crate::engine::MapEngine;
use crate::geo::EdgeInsets;

/// 指令执行器
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    fit_bounds_animation_ms: u64,
}

impl CommandExecutor {
    pub fn new(fit_bounds_animation_ms: u64) -> Self {
        Self {
            fit_bounds_animation_ms,
        }
    }

    /// 对引擎执行一条指令
    pub fn execute(&self, command: MapCommand, engine: &mut dyn MapEngine) {
        debug!(command = command.name(), "执行地图指令");

        match command {
            MapCommand::SetCenter { target } => {
                engine.move_camera(CameraUpdate::ScrollTo { target }, CameraAnimation::Easing);
            }
            MapCommand::SetCameraPosition {
                target,
                zoom,
                tilt,
                bearing,
            } => {
                let position = engine
                    .camera_position()
                    .merged(target, zoom, tilt, bearing);
                engine.move_camera(
                    CameraUpdate::ToPosition { position },
                    CameraAnimation::Easing,
                );
            }
            MapCommand::ZoomTo { bounds, padding_px } => {
                engine.move_camera(
                    CameraUpdate::FitBounds {
                        bounds,
                        padding: EdgeInsets::uniform(padding_px),
                    },
                    CameraAnimation::Easing,
                );
            }
            MapCommand::SetTilt { tilt } => {
                let position = engine.camera_position().with_tilt(f64::from(tilt));
                engine.move_camera(CameraUpdate::ToPosition { position }, CameraAnimation::None);
            }
            MapCommand::SetBearing { bearing } => {
                let position = engine.camera_position().with_bearing(f64::from(bearing));
                engine.move_camera(CameraUpdate::ToPosition { position }, CameraAnimation::None);
            }
            MapCommand::SetZoom { zoom } => {
                engine.move_camera(CameraUpdate::ZoomTo { zoom }, CameraAnimation::None);
            }
            MapCommand::MoveCameraFitBounds { bounds, padding } => {
                engine.move_camera(
                    CameraUpdate::FitBounds { bounds, padding },
                    CameraAnimation::Fly {
                        duration_ms: self.fit_bounds_animation_ms,
                    },
                );
            }
            MapCommand::SetMapPadding { padding } => engine.set_content_padding(padding),

            MapCommand::SetGestureEnabled { gesture, enabled } => {
                engine.apply_ui_setting(UiSetting::Gesture { gesture, enabled });
            }
            MapCommand::SetControlEnabled { control, enabled } => {
                engine.apply_ui_setting(UiSetting::Control { control, enabled });
            }
            MapCommand::SetLogoMargin { margin } => {
                engine.apply_ui_setting(UiSetting::LogoMargin { margin });
            }
            MapCommand::SetLogoGravity { gravity } => {
                engine.apply_ui_setting(UiSetting::LogoGravity { gravity });
            }

            MapCommand::SetLocationTrackingMode { mode } => {
                engine.apply_map_option(MapOption::LocationTrackingMode { mode });
            }
            MapCommand::SetMapType { map_type } => {
                engine.apply_map_option(MapOption::MapType { map_type });
            }
            MapCommand::SetMinZoom { zoom } => engine.apply_map_option(MapOption::MinZoom { zoom }),
            MapCommand::SetMaxZoom { zoom } => engine.apply_map_option(MapOption::MaxZoom { zoom }),
            MapCommand::SetBuildingHeight { height } => {
                engine.apply_map_option(MapOption::BuildingHeight { height });
            }
            MapCommand::SetLayerGroupEnabled { group, enabled } => {
                engine.apply_map_option(MapOption::LayerGroup {
                    name: group,
                    enabled,
                });
            }
            MapCommand::SetNightModeEnabled { enabled } => {
                engine.apply_map_option(MapOption::NightMode { enabled });
            }
            MapCommand::SetLiteModeEnabled { enabled } => {
                engine.apply_map_option(MapOption::LiteMode { enabled });
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(500)
    }
}
