//! # Error 模块
//!
//! 模拟器错误类型。二进制入口用 `anyhow` 汇总，库内部返回这里的类型。

use thiserror::Error;

/// 模拟器错误
#[derive(Error, Debug)]
pub enum SimError {
    /// 文件读写失败
    #[error("读取 {path} 失败: {message}")]
    Io { path: String, message: String },

    /// 场景 JSON 解析失败
    #[error("场景解析失败: {0}")]
    Parse(String),

    /// 场景内容无效
    #[error("场景 '{name}' 无效: {reason}")]
    InvalidScenario { name: String, reason: String },
}

pub type SimResult<T> = Result<T, SimError>;
