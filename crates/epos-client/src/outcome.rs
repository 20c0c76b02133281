//! 运动指令选项与结果

use epos_cmd::ErrorReport;
use epos_driver::{EposError, Result};
use epos_protocol::DEFAULT_WAIT_TIMEOUT_MS;

/// 运动指令选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOptions {
    /// 绝对位置（`false` 为相对当前位置）
    pub absolute: bool,
    /// 立即执行（`false` 时排在当前运动之后）
    pub immediate: bool,
    /// 等待到位的超时（毫秒），0 表示不等待
    pub wait_timeout_ms: u32,
}

impl Default for MoveOptions {
    /// 绝对、立即、等待 1000 ms
    fn default() -> Self {
        Self {
            absolute: true,
            immediate: true,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl MoveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn with_wait_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.wait_timeout_ms = timeout_ms;
        self
    }

    /// 只发出指令，不等待到位
    pub fn no_wait(self) -> Self {
        self.with_wait_timeout_ms(0)
    }
}

/// 运动指令结果
///
/// 指令一旦被设备接受就视为成功；到位确认只是尽力而为。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 指令已接受，且在超时内确认到位
    Reached,
    /// 指令已接受，未等待到位
    Accepted,
    /// 指令已接受，但到位确认失败（软警告）
    TargetReachedTimeout(ErrorReport),
}

impl MoveOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, MoveOutcome::Reached)
    }

    /// 到位确认失败的报告（如有）
    pub fn warning(&self) -> Option<&ErrorReport> {
        match self {
            MoveOutcome::TargetReachedTimeout(report) => Some(report),
            _ => None,
        }
    }

    /// 把软超时升级为错误
    ///
    /// `Accepted`（未等待）不视为失败。
    pub fn require_reached(self) -> Result<()> {
        match self {
            MoveOutcome::Reached | MoveOutcome::Accepted => Ok(()),
            MoveOutcome::TargetReachedTimeout(report) => {
                Err(EposError::TargetReachedTimeout(report))
            },
        }
    }
}
