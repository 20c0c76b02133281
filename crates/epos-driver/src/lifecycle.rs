//! 生命周期状态机
//!
//! ```text
//! Unopened → Opened → Ready → Enabled ⇄ Disabled
//!     └────────┴────────┴────────┴────────┴──→ Closed
//! ```
//!
//! 连接句柄保存在状态变体内部：只有处于已连接状态时才能拿到句柄，
//! 关闭后句柄随状态一起消失。每个转换都先匹配当前状态，
//! 非法转换返回 [`EposError::InvalidState`]，不发出任何硬件调用。

use std::fmt;

use epos_cmd::Handle;

use crate::error::EposError;

/// 生命周期状态（携带连接句柄）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 尚未打开
    #[default]
    Unopened,
    /// 已打开，故障未清除
    Opened(Handle),
    /// 故障已清除，可以使能
    Ready(Handle),
    /// 已使能，可以运动
    Enabled(Handle),
    /// 已去使能
    Disabled(Handle),
    /// 已关闭（终态）
    Closed,
}

/// 生命周期阶段（不含句柄的投影，用于错误和日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    Unopened,
    Opened,
    Ready,
    Enabled,
    Disabled,
    Closed,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Unopened => "Unopened",
            LifecycleStage::Opened => "Opened",
            LifecycleStage::Ready => "Ready",
            LifecycleStage::Enabled => "Enabled",
            LifecycleStage::Disabled => "Disabled",
            LifecycleStage::Closed => "Closed",
        };
        f.write_str(name)
    }
}

impl LifecycleState {
    /// 当前阶段
    pub fn stage(&self) -> LifecycleStage {
        match self {
            LifecycleState::Unopened => LifecycleStage::Unopened,
            LifecycleState::Opened(_) => LifecycleStage::Opened,
            LifecycleState::Ready(_) => LifecycleStage::Ready,
            LifecycleState::Enabled(_) => LifecycleStage::Enabled,
            LifecycleState::Disabled(_) => LifecycleStage::Disabled,
            LifecycleState::Closed => LifecycleStage::Closed,
        }
    }

    /// 连接句柄（仅已连接状态）
    pub fn handle(&self) -> Option<Handle> {
        match *self {
            LifecycleState::Opened(handle)
            | LifecycleState::Ready(handle)
            | LifecycleState::Enabled(handle)
            | LifecycleState::Disabled(handle) => Some(handle),
            LifecycleState::Unopened | LifecycleState::Closed => None,
        }
    }

    /// 是否持有打开的连接
    pub fn is_connected(&self) -> bool {
        self.handle().is_some()
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LifecycleState::Enabled(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LifecycleState::Closed)
    }

    fn invalid(&self, attempted: &'static str) -> EposError {
        match self {
            LifecycleState::Closed => EposError::AlreadyClosed,
            _ => EposError::InvalidState {
                attempted,
                current: self.stage(),
            },
        }
    }

    /// 任意已连接状态下的句柄
    pub fn require_connected(&self, attempted: &'static str) -> Result<Handle, EposError> {
        self.handle().ok_or_else(|| self.invalid(attempted))
    }

    /// 仅 `Enabled` 状态下的句柄
    pub fn require_enabled(&self, attempted: &'static str) -> Result<Handle, EposError> {
        match *self {
            LifecycleState::Enabled(handle) => Ok(handle),
            _ => Err(self.invalid(attempted)),
        }
    }

    /// 清除故障的前置条件：`Opened`，或为恢复而在 `Ready`/`Disabled` 中重复清除
    pub fn check_clear_fault(&self) -> Result<Handle, EposError> {
        match *self {
            LifecycleState::Opened(handle)
            | LifecycleState::Ready(handle)
            | LifecycleState::Disabled(handle) => Ok(handle),
            _ => Err(self.invalid("clear fault")),
        }
    }

    /// 配置协议栈的前置条件：已打开且未使能
    pub fn check_protocol_stack(&self) -> Result<Handle, EposError> {
        match *self {
            LifecycleState::Opened(handle)
            | LifecycleState::Ready(handle)
            | LifecycleState::Disabled(handle) => Ok(handle),
            _ => Err(self.invalid("set protocol stack")),
        }
    }

    /// 使能的前置条件：`Ready` 或 `Disabled`
    pub fn check_enable(&self) -> Result<Handle, EposError> {
        match *self {
            LifecycleState::Ready(handle) | LifecycleState::Disabled(handle) => Ok(handle),
            _ => Err(self.invalid("enable")),
        }
    }

    /// 去使能的前置条件：`Enabled`
    pub fn check_disable(&self) -> Result<Handle, EposError> {
        self.require_enabled("disable")
    }

    /// 关闭的前置条件：除 `Closed` 外任意状态
    ///
    /// 返回 `Ok(None)` 表示尚未打开，无需硬件调用。
    pub fn check_close(&self) -> Result<Option<Handle>, EposError> {
        match self {
            LifecycleState::Closed => Err(EposError::AlreadyClosed),
            _ => Ok(self.handle()),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handle() {
            Some(handle) => write!(f, "{}({})", self.stage(), handle),
            None => write!(f, "{}", self.stage()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Handle {
        Handle::new(0x42).unwrap()
    }

    fn all_states() -> [LifecycleState; 6] {
        [
            LifecycleState::Unopened,
            LifecycleState::Opened(handle()),
            LifecycleState::Ready(handle()),
            LifecycleState::Enabled(handle()),
            LifecycleState::Disabled(handle()),
            LifecycleState::Closed,
        ]
    }

    #[test]
    fn test_handle_only_in_connected_states() {
        for state in all_states() {
            let connected = !matches!(state, LifecycleState::Unopened | LifecycleState::Closed);
            assert_eq!(state.handle().is_some(), connected, "{:?}", state);
        }
    }

    #[test]
    fn test_enable_guard() {
        for state in all_states() {
            let allowed = matches!(state, LifecycleState::Ready(_) | LifecycleState::Disabled(_));
            assert_eq!(state.check_enable().is_ok(), allowed, "{:?}", state);
        }
        let err = LifecycleState::Opened(handle()).check_enable().unwrap_err();
        assert_eq!(
            err,
            EposError::InvalidState {
                attempted: "enable",
                current: LifecycleStage::Opened
            }
        );
    }

    #[test]
    fn test_disable_guard_is_uniform() {
        for state in all_states() {
            assert_eq!(
                state.check_disable().is_ok(),
                state.is_enabled(),
                "{:?}",
                state
            );
        }
    }

    #[test]
    fn test_clear_fault_guard() {
        assert!(LifecycleState::Opened(handle()).check_clear_fault().is_ok());
        assert!(LifecycleState::Ready(handle()).check_clear_fault().is_ok());
        assert!(LifecycleState::Disabled(handle()).check_clear_fault().is_ok());
        assert!(LifecycleState::Enabled(handle()).check_clear_fault().is_err());
        assert!(LifecycleState::Unopened.check_clear_fault().is_err());
    }

    #[test]
    fn test_close_guard() {
        assert_eq!(LifecycleState::Unopened.check_close(), Ok(None));
        assert_eq!(
            LifecycleState::Enabled(handle()).check_close(),
            Ok(Some(handle()))
        );
        assert_eq!(
            LifecycleState::Closed.check_close(),
            Err(EposError::AlreadyClosed)
        );
    }

    #[test]
    fn test_require_connected_after_close() {
        assert_eq!(
            LifecycleState::Closed.require_connected("read position"),
            Err(EposError::AlreadyClosed)
        );
        assert!(matches!(
            LifecycleState::Unopened.require_connected("read position"),
            Err(EposError::InvalidState { .. })
        ));
        assert_eq!(
            LifecycleState::Closed.check_enable(),
            Err(EposError::AlreadyClosed)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(LifecycleState::Unopened.to_string(), "Unopened");
        assert_eq!(LifecycleState::Ready(handle()).to_string(), "Ready(0x42)");
    }
}
