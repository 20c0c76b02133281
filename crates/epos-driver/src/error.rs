//! 驱动层错误类型定义

use epos_cmd::{ErrorReport, LibraryError};
use epos_protocol::OperationMode;
use thiserror::Error;

use crate::lifecycle::LifecycleStage;

/// 统一错误类型
///
/// 所有公开操作都返回 `Result<T, EposError>`，不存在"返回 false 表示失败"的路径。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EposError {
    /// 硬件调用失败
    #[error("Hardware call failed: {0}")]
    HardwareCallFailed(ErrorReport),

    /// 当前生命周期状态不允许该操作（未发出任何硬件调用）
    #[error("Cannot {attempted} in state {current}")]
    InvalidState {
        attempted: &'static str,
        current: LifecycleStage,
    },

    /// 设备存在未处理的错误，拒绝使能
    #[error("Device has {count} outstanding error(s), clear faults before enabling")]
    DeviceHasOutstandingErrors { count: u8 },

    /// 设备返回了未知的操作模式编码
    #[error("Unknown operation mode code: {raw}")]
    UnknownMode { raw: i8 },

    /// 枚举调用失败
    #[error("{selection} discovery failed{}", detail(.report))]
    DiscoveryFailed {
        selection: &'static str,
        report: Option<ErrorReport>,
    },

    /// 会话已关闭
    #[error("Session already closed")]
    AlreadyClosed,

    /// 运动指令被设备拒绝（致命）
    #[error("Move command rejected: {0}")]
    MoveRejected(ErrorReport),

    /// 等待到位超时（软错误：运动指令已被接受）
    #[error("Target reached confirmation failed: {0}")]
    TargetReachedTimeout(ErrorReport),

    /// 命令返回成功，但复查状态未生效
    #[error("{operation} was accepted but the device did not confirm the new state")]
    StateNotConfirmed { operation: &'static str },

    /// 运动指令要求的操作模式与当前模式不符
    #[error("Operation mode mismatch: required {required}, device is in {actual}")]
    OperationModeMismatch {
        required: OperationMode,
        actual: OperationMode,
    },

    /// 参数无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: &'static str, reason: String },

    /// 命令库加载失败
    #[error("Command library error: {0}")]
    Library(#[from] LibraryError),
}

fn detail(report: &Option<ErrorReport>) -> String {
    match report {
        Some(report) => format!(": {}", report),
        None => String::new(),
    }
}

impl EposError {
    /// 是否为致命错误（必须立即中止后续指令序列）
    pub fn is_fatal(&self) -> bool {
        matches!(self, EposError::MoveRejected(_))
    }

    /// 是否可由调用方重试（例如清除新故障后再次使能）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EposError::HardwareCallFailed(_)
                | EposError::DeviceHasOutstandingErrors { .. }
                | EposError::DiscoveryFailed { .. }
                | EposError::TargetReachedTimeout(_)
                | EposError::StateNotConfirmed { .. }
        )
    }

    /// 是否为软错误（指令已被接受，仅确认失败）
    pub fn is_soft(&self) -> bool {
        matches!(self, EposError::TargetReachedTimeout(_))
    }

    /// 关联的命令失败报告（如有）
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            EposError::HardwareCallFailed(report)
            | EposError::MoveRejected(report)
            | EposError::TargetReachedTimeout(report) => Some(report),
            EposError::DiscoveryFailed { report, .. } => report.as_ref(),
            _ => None,
        }
    }
}

/// 驱动层结果类型
pub type Result<T> = std::result::Result<T, EposError>;

#[cfg(test)]
mod tests {
    use super::*;
    use epos_protocol::ErrorCode;

    fn report() -> ErrorReport {
        ErrorReport::new("VCS_MoveToPosition", ErrorCode(0x1234), "Some error")
    }

    #[test]
    fn test_display() {
        let err = EposError::InvalidState {
            attempted: "enable",
            current: LifecycleStage::Opened,
        };
        assert_eq!(err.to_string(), "Cannot enable in state Opened");

        let err = EposError::DeviceHasOutstandingErrors { count: 2 };
        assert!(err.to_string().contains("2 outstanding"));

        let err = EposError::DiscoveryFailed {
            selection: "port",
            report: None,
        };
        assert_eq!(err.to_string(), "port discovery failed");

        let err = EposError::MoveRejected(report());
        assert!(err.to_string().contains("0x00001234"));
    }

    #[test]
    fn test_classification() {
        assert!(EposError::MoveRejected(report()).is_fatal());
        assert!(!EposError::MoveRejected(report()).is_retryable());

        let timeout = EposError::TargetReachedTimeout(report());
        assert!(timeout.is_soft());
        assert!(timeout.is_retryable());
        assert!(!timeout.is_fatal());

        assert!(EposError::HardwareCallFailed(report()).is_retryable());
        assert!(EposError::DeviceHasOutstandingErrors { count: 1 }.is_retryable());
        assert!(!EposError::AlreadyClosed.is_retryable());
        assert!(!EposError::UnknownMode { raw: 42 }.is_fatal());
    }

    #[test]
    fn test_report_accessor() {
        assert_eq!(
            EposError::HardwareCallFailed(report()).report(),
            Some(&report())
        );
        assert_eq!(EposError::AlreadyClosed.report(), None);
    }

    #[test]
    fn test_from_library_error() {
        let err: EposError = LibraryError::Load {
            path: "libEposCmd.so".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        assert!(matches!(err, EposError::Library(_)));
        assert!(err.to_string().contains("libEposCmd.so"));
    }
}
