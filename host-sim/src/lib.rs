//! # Host Sim
//!
//! 无界面的宿主模拟器，用于演示、手动检查和端到端测试。
//!
//! ```text
//! Scenario(JSON) ──► ScenarioRunner ──► MapView ◄──回调── SimEngine
//!                          │                 │
//!                          │                 └── SimOverlay（探针记录状态）
//!                          ▼
//!                   ScenarioOutcome（事件、覆盖物、销毁报告）
//! ```
//!
//! ## 模块结构
//!
//! - [`engine`]：模拟引擎
//! - [`feature`]：模拟覆盖物
//! - [`scenario`]：场景格式与回放
//! - [`config`]：模拟器配置

pub mod config;
pub mod engine;
pub mod error;
pub mod feature;
pub mod scenario;

pub use config::{LogConfig, SimConfig};
pub use engine::{EngineCall, EngineCallback, SimEngine};
pub use error::{SimError, SimResult};
pub use feature::{OverlayProbe, SharedProbe, SimOverlay};
pub use scenario::{Scenario, ScenarioOutcome, ScenarioRunner, Step};

/// 加载并回放场景文件
pub fn run_scenario_file(
    path: impl AsRef<std::path::Path>,
    config: &SimConfig,
) -> SimResult<ScenarioOutcome> {
    let scenario = Scenario::load(path)?;
    Ok(ScenarioRunner::new(config).run(&scenario))
}
