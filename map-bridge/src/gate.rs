//! # Gate 模块
//!
//! 引擎就绪门：引擎可用之前提交的操作先排队，就绪时按提交顺序一次性放出。
//!
//! ## 状态转换
//!
//! ```text
//! Uninitialized ──begin()──► Pending ──open()──► Ready ──close()──► Destroyed
//!       │                                  ▲
//!       └──────────────open()──────────────┘
//! ```
//!
//! 只能前进，不能回退。`close()` 可以从任何状态进入 `Destroyed`。
//!
//! 门本身不执行操作：`submit` 返回 `Submission::Run` 时由调用方立即执行，
//! `open` 返回排队的操作由调用方依次执行。

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// 就绪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// 刚构造，尚未请求引擎
    Uninitialized,
    /// 已请求引擎，等待回调
    Pending,
    /// 引擎可用
    Ready,
    /// 已销毁
    Destroyed,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// 提交结果
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    /// 已就绪，调用方应立即执行
    Run(T),
    /// 未就绪，已排队
    Queued,
    /// 已销毁，操作被丢弃
    Discarded,
}

/// 就绪门
#[derive(Debug)]
pub struct ReadinessGate<T> {
    state: ReadinessState,
    queue: VecDeque<T>,
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        Self {
            state: ReadinessState::Uninitialized,
            queue: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::Ready
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ReadinessState::Destroyed
    }

    /// 排队中的操作数
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// 请求引擎：Uninitialized → Pending
    ///
    /// 其他状态下返回 `false`，状态不变。
    pub fn begin(&mut self) -> bool {
        if self.state == ReadinessState::Uninitialized {
            self.state = ReadinessState::Pending;
            true
        } else {
            false
        }
    }

    /// 提交操作
    pub fn submit(&mut self, op: T) -> Submission<T> {
        match self.state {
            ReadinessState::Ready => Submission::Run(op),
            ReadinessState::Uninitialized | ReadinessState::Pending => {
                self.queue.push_back(op);
                Submission::Queued
            }
            ReadinessState::Destroyed => Submission::Discarded,
        }
    }

    /// 引擎就绪：进入 Ready，返回按提交顺序排列的积压操作
    ///
    /// 已经 Ready 或 Destroyed 时返回 `None`，保证积压只放出一次。
    pub fn open(&mut self) -> Option<Vec<T>> {
        match self.state {
            ReadinessState::Uninitialized | ReadinessState::Pending => {
                self.state = ReadinessState::Ready;
                Some(self.queue.drain(..).collect())
            }
            ReadinessState::Ready | ReadinessState::Destroyed => None,
        }
    }

    /// 销毁：进入 Destroyed，丢弃积压，返回丢弃数量
    pub fn close(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.state = ReadinessState::Destroyed;
        discarded
    }
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self::new()
    }
}
