//! # Clock 模块
//!
//! 手势防抖需要"当前时间"。桥接层不直接读系统时钟，而是通过 `Clock` 注入，
//! 测试和模拟宿主可以手动推进时间。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// 毫秒时钟
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// 系统时钟
///
/// 单调时钟，从创建时刻开始计毫秒，不受系统时间回拨影响。
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// 手动时钟
///
/// 克隆出来的实例共享同一个时间，宿主持有一份用于推进。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    /// 推进时间
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
