//! 命令库错误码
//!
//! 每个 `VCS_*` 调用都通过输出参数 `pErrorCode` 返回一个 32 位错误码，
//! `0` 表示没有错误。

use std::fmt;

/// 命令库错误码（NewType）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// 无错误
    pub const NO_ERROR: Self = ErrorCode(0x0000_0000);

    /// 命令库内部错误
    pub const INTERNAL_ERROR: Self = ErrorCode(0x1000_0001);

    /// 空指针
    pub const NULL_POINTER: Self = ErrorCode(0x1000_0002);

    /// 句柄无效
    pub const HANDLE_NOT_VALID: Self = ErrorCode(0x1000_0003);

    /// 超时
    pub const TIMEOUT: Self = ErrorCode(0x1000_000B);

    /// 参数错误
    pub const BAD_PARAMETER: Self = ErrorCode(0x1000_000C);

    /// 创建错误码
    #[inline]
    pub const fn new(value: u32) -> Self {
        ErrorCode(value)
    }

    /// 获取原始值
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// 是否表示"无错误"
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// 是否为超时错误
    #[inline]
    pub const fn is_timeout(self) -> bool {
        self.0 == Self::TIMEOUT.0
    }

    /// 已知通用错误码的描述
    ///
    /// 仅在命令库无法提供描述（`VCS_GetErrorInfo` 失败）时作为后备。
    pub fn known_description(self) -> Option<&'static str> {
        match self {
            Self::NO_ERROR => Some("No error"),
            Self::INTERNAL_ERROR => Some("Internal error"),
            Self::NULL_POINTER => Some("Null pointer"),
            Self::HANDLE_NOT_VALID => Some("Handle not valid"),
            Self::TIMEOUT => Some("Timeout"),
            Self::BAD_PARAMETER => Some("Bad parameter"),
            _ => None,
        }
    }
}

impl From<u32> for ErrorCode {
    fn from(value: u32) -> Self {
        ErrorCode(value)
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
