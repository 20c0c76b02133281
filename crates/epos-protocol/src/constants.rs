//! 协议常量定义

/// 默认设备名称
pub const DEFAULT_DEVICE_NAME: &str = "EPOS4";

/// 默认协议栈名称
pub const DEFAULT_PROTOCOL_STACK_NAME: &str = "MAXON SERIAL V2";

/// 默认接口名称
pub const DEFAULT_INTERFACE_NAME: &str = "USB";

/// 默认节点 ID
pub const DEFAULT_NODE_ID: u16 = 1;

/// 协议栈默认波特率（bit/s）
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;

/// 协议栈默认通信超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u32 = 500;

/// 枚举设备/协议栈/接口/端口名称时使用的字符串缓冲区大小
pub const MAX_SELECTION_STR_LEN: u16 = 100;

/// 错误描述缓冲区大小
///
/// `VCS_GetErrorInfo` 的描述会被截断到此长度（含结尾 NUL）。
pub const MAX_ERROR_INFO_LEN: u16 = 40;

/// 等待到位的默认超时（毫秒）
pub const DEFAULT_WAIT_TIMEOUT_MS: u32 = 1000;
