//! # Scenario 模块
//!
//! 场景脚本：按顺序描述宿主和引擎发生了什么，由 `ScenarioRunner` 逐步回放。
//!
//! ## 格式
//!
//! ```text
//! {
//!   "name": "basic",
//!   "steps": [
//!     {"step": "request_engine"},
//!     {"step": "command", "command": {"type": "set_zoom", "zoom": 14.0}},
//!     {"step": "add_feature", "kind": "marker", "label": "m1"},
//!     {"step": "engine_ready"},
//!     {"step": "gesture", "zoom": 15.0, "frames": 3},
//!     {"step": "advance", "ms": 600},
//!     {"step": "teardown"}
//!   ]
//! }
//! ```
//!
//! 每一步之后，模拟引擎排队的回调都会转发给 `MapView`，产生的事件收集到结果里。

use std::cell::{Ref, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use map_bridge::{
    EngineHandle, FeatureKind, LatLng, LocationSource, ManualClock, MapCommand, MapEvent, MapView,
    ReadinessState, ScreenPoint, TeardownReport,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::engine::{EngineCallback, SimEngine};
use crate::error::{SimError, SimResult};
use crate::feature::{OverlayProbe, SharedProbe, SimOverlay};

/// 场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

/// 场景步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// 宿主请求创建引擎
    RequestEngine,
    /// 引擎创建完成
    EngineReady,
    /// 宿主发出指令
    Command { command: MapCommand },
    /// 宿主以整数设置定位追踪模式（越界值应被忽略）
    TrackingMode { mode: i32 },
    /// 宿主添加覆盖物
    AddFeature {
        kind: FeatureKind,
        #[serde(default)]
        label: Option<String>,
        #[serde(default = "default_append_index")]
        index: i32,
    },
    /// 宿主删除覆盖物
    RemoveFeature { index: i32 },
    /// 用户手势
    Gesture {
        #[serde(default)]
        target: Option<LatLng>,
        #[serde(default)]
        zoom: Option<f64>,
        #[serde(default = "default_frames")]
        frames: u32,
    },
    /// 用户点击
    Click { x: f64, y: f64 },
    /// 推进时钟
    Advance { ms: u64 },
    /// 宿主销毁视图
    Teardown,
}

fn default_append_index() -> i32 {
    -1
}

fn default_frames() -> u32 {
    1
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestEngine => "request_engine",
            Self::EngineReady => "engine_ready",
            Self::Command { .. } => "command",
            Self::TrackingMode { .. } => "tracking_mode",
            Self::AddFeature { .. } => "add_feature",
            Self::RemoveFeature { .. } => "remove_feature",
            Self::Gesture { .. } => "gesture",
            Self::Click { .. } => "click",
            Self::Advance { .. } => "advance",
            Self::Teardown => "teardown",
        }
    }
}

impl Scenario {
    pub fn from_json(text: &str) -> SimResult<Self> {
        let scenario: Self =
            serde_json::from_str(text).map_err(|e| SimError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SimError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    /// 结构检查：至少一步，引擎最多交付一次声明
    pub fn validate(&self) -> SimResult<()> {
        if self.steps.is_empty() {
            return Err(self.invalid("没有任何步骤"));
        }
        let deliveries = self
            .steps
            .iter()
            .filter(|s| matches!(s, Step::EngineReady))
            .count();
        if deliveries > 1 {
            warn!(scenario = %self.name, deliveries, "场景多次交付引擎，只有第一次生效");
        }
        Ok(())
    }

    /// 不影响运行、但值得提示的问题
    pub fn lint(&self) -> Vec<String> {
        let mut notes = Vec::new();
        let ready_at = self
            .steps
            .iter()
            .position(|s| matches!(s, Step::EngineReady));
        let teardown_at = self.steps.iter().position(|s| matches!(s, Step::Teardown));

        if ready_at.is_none() {
            notes.push("没有 engine_ready 步骤，所有指令都只会排队".to_string());
        }
        if let Some(t) = teardown_at
            && t + 1 < self.steps.len()
        {
            notes.push(format!(
                "teardown 之后还有 {} 个步骤，它们不会产生效果",
                self.steps.len() - t - 1
            ));
        }
        notes
    }

    fn invalid(&self, reason: &str) -> SimError {
        SimError::InvalidScenario {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// 场景运行结果
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub steps: usize,
    pub events: Vec<MapEvent>,
    pub feature_count: usize,
    pub feature_kinds: Vec<FeatureKind>,
    pub readiness: ReadinessState,
    /// 模拟引擎收到的调用次数
    pub engine_calls: usize,
    pub teardown: Option<TeardownReport>,
    /// 所有添加过的覆盖物的最终状态（按添加顺序）
    pub overlays: Vec<OverlayProbe>,
}

impl ScenarioOutcome {
    /// 按名称统计事件
    pub fn count(&self, event_name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == event_name).count()
    }
}

/// 场景执行器
pub struct ScenarioRunner {
    view: MapView,
    engine: Rc<RefCell<SimEngine>>,
    clock: ManualClock,
    probes: Vec<SharedProbe>,
    events: Vec<MapEvent>,
    teardown: Option<TeardownReport>,
}

impl ScenarioRunner {
    pub fn new(config: &SimConfig) -> Self {
        let clock = ManualClock::new(config.clock_start_ms);
        let mut view = MapView::with_clock(config.bridge.clone(), clock.clone());
        if let Some(name) = &config.location_source {
            view.set_location_source(LocationSource::new(name.clone()));
        }
        Self {
            view,
            engine: Rc::new(RefCell::new(SimEngine::new(config.initial_camera))),
            clock,
            probes: Vec::new(),
            events: Vec::new(),
            teardown: None,
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn engine(&self) -> Ref<'_, SimEngine> {
        self.engine.borrow()
    }

    /// 回放整个场景
    pub fn run(mut self, scenario: &Scenario) -> ScenarioOutcome {
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "开始回放场景");
        for (i, step) in scenario.steps.iter().enumerate() {
            debug!(index = i, step = step.name(), "执行场景步骤");
            self.step(step);
        }

        let outcome = ScenarioOutcome {
            name: scenario.name.clone(),
            steps: scenario.steps.len(),
            events: std::mem::take(&mut self.events),
            feature_count: self.view.feature_count(),
            feature_kinds: self.view.feature_kinds(),
            readiness: self.view.readiness(),
            engine_calls: self.engine.borrow().calls().len(),
            teardown: self.teardown,
            overlays: self.probes.iter().map(|p| p.borrow().clone()).collect(),
        };
        info!(
            scenario = %outcome.name,
            events = outcome.events.len(),
            features = outcome.feature_count,
            "场景回放完成"
        );
        outcome
    }

    /// 执行一步，并转发引擎回调
    pub fn step(&mut self, step: &Step) {
        match step {
            Step::RequestEngine => {
                self.view.request_engine();
            }
            Step::EngineReady => {
                let handle = EngineHandle::from_shared(self.engine.clone());
                self.view.on_engine_ready(handle);
            }
            Step::Command { command } => self.view.dispatch(command.clone()),
            Step::TrackingMode { mode } => self.view.set_location_tracking_mode(*mode),
            Step::AddFeature { kind, label, index } => {
                let label = label
                    .clone()
                    .unwrap_or_else(|| format!("{}-{}", kind, self.probes.len() + 1));
                let (overlay, probe) = SimOverlay::new(*kind, label);
                self.probes.push(probe);
                self.view.add_feature(Box::new(overlay), *index);
            }
            Step::RemoveFeature { index } => {
                self.view.remove_feature_at(*index);
            }
            Step::Gesture {
                target,
                zoom,
                frames,
            } => {
                self.engine
                    .borrow_mut()
                    .simulate_gesture(*target, *zoom, *frames);
            }
            Step::Click { x, y } => {
                self.engine
                    .borrow_mut()
                    .simulate_click(ScreenPoint::new(*x, *y));
            }
            Step::Advance { ms } => self.clock.advance(*ms),
            Step::Teardown => {
                let report = self.view.teardown();
                if self.teardown.is_none() {
                    self.teardown = Some(report);
                }
            }
        }
        self.pump();
    }

    /// 把引擎排队的回调转发给视图，并收集产生的事件
    fn pump(&mut self) {
        let callbacks = self.engine.borrow_mut().drain_callbacks();
        for callback in callbacks {
            match callback {
                EngineCallback::Change { reason, animated } => {
                    self.view.on_camera_change(reason, animated);
                }
                EngineCallback::Idle => self.view.on_camera_idle(),
                EngineCallback::Click { point, coordinate } => {
                    self.view.on_map_click(point, coordinate);
                }
            }
        }
        self.events.extend(self.view.take_events());
    }
}
