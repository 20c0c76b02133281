//! # EPOS Command Layer
//!
//! 厂商命令库（`libEposCmd`）的类型化抽象层。
//!
//! ## 分层
//!
//! ```text
//! CommandGateway (此 crate)    失败时解析错误描述，返回 ErrorReport
//!     ↓ VcsApi trait
//! VcsLibrary (native)  / MockVcs (mock)
//!     ↓ BOOL + pErrorCode 约定
//! libEposCmd.so
//! ```
//!
//! `VcsApi` 的每个方法对应一个 `VCS_*` 函数，返回 `CallResult<T>`：
//! 后端负责把 "BOOL 返回值 + 输出参数错误码" 的 C 约定转换为 `Result`。
//! 上层代码只通过 [`CommandGateway`] 调用，不直接接触原始错误码。

use std::fmt;
use std::num::NonZeroUsize;

use epos_protocol::ErrorCode;
use thiserror::Error;

pub mod gateway;

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "mock")]
pub mod mock;

pub use gateway::{CommandGateway, ErrorReport};

#[cfg(feature = "native")]
pub use native::VcsLibrary;

#[cfg(feature = "mock")]
pub use mock::{MockCall, MockVcs};

/// 单次命令调用的结果：成功值或原始错误码
pub type CallResult<T> = Result<T, ErrorCode>;

/// 设备连接句柄
///
/// `VCS_OpenDevice` 返回的不透明句柄。原始值 0 表示"未打开"，
/// 因此 `Handle` 只能持有非零值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(NonZeroUsize);

impl Handle {
    /// 从原始值创建，0 返回 `None`
    pub fn new(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Handle)
    }

    /// 获取原始值
    pub fn raw(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// CANopen 节点 ID（≥ 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// 创建节点 ID，0 返回 `None`
    pub const fn new(id: u16) -> Option<Self> {
        if id == 0 { None } else { Some(NodeId(id)) }
    }

    /// 获取原始值
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId(epos_protocol::DEFAULT_NODE_ID)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 枚举调用的单步结果
///
/// 命令库的 `*Selection` 函数每次返回一项，并通过 `end_of_selection`
/// 标记是否为最后一项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T> {
    /// 本次返回的条目
    pub value: T,
    /// 是否已到达列表末尾
    pub end_of_selection: bool,
}

impl<T> Selection<T> {
    /// 创建单步结果
    pub fn new(value: T, end_of_selection: bool) -> Self {
        Self {
            value,
            end_of_selection,
        }
    }
}

/// 动态库加载错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// 无法加载动态库
    #[error("Failed to load command library '{path}': {reason}")]
    Load { path: String, reason: String },

    /// 动态库缺少所需符号
    #[error("Command library is missing symbol '{symbol}': {reason}")]
    MissingSymbol {
        symbol: &'static str,
        reason: String,
    },
}

/// 厂商命令库接口
///
/// 方法与 `VCS_*` 函数一一对应，参数使用原始编码（例如操作模式为 `i8`、
/// 传感器类型为 `u16`），类型转换由上层负责。
///
/// 所有调用都是阻塞的同步往返。
pub trait VcsApi {
    // ==================== 枚举 ====================

    /// `VCS_GetDeviceNameSelection`
    fn device_name_selection(&mut self, start: bool, max_len: u16) -> CallResult<Selection<String>>;

    /// `VCS_GetProtocolStackNameSelection`
    fn protocol_stack_name_selection(
        &mut self,
        device: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>>;

    /// `VCS_GetInterfaceNameSelection`
    fn interface_name_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>>;

    /// `VCS_GetPortNameSelection`
    fn port_name_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>>;

    /// `VCS_GetBaudrateSelection`
    fn baudrate_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        port: &str,
        start: bool,
    ) -> CallResult<Selection<u32>>;

    // ==================== 连接 ====================

    /// `VCS_OpenDevice`，返回原始句柄
    fn open_device(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        port: &str,
    ) -> CallResult<usize>;

    /// `VCS_CloseDevice`
    fn close_device(&mut self, handle: Handle) -> CallResult<()>;

    /// `VCS_SetProtocolStackSettings`
    fn set_protocol_stack_settings(
        &mut self,
        handle: Handle,
        baudrate: u32,
        timeout_ms: u32,
    ) -> CallResult<()>;

    // ==================== 状态机 ====================

    /// `VCS_ClearFault`
    fn clear_fault(&mut self, handle: Handle, node: NodeId) -> CallResult<()>;

    /// `VCS_SetEnableState`
    fn set_enable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<()>;

    /// `VCS_GetEnableState`
    fn get_enable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<bool>;

    /// `VCS_SetDisableState`
    fn set_disable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<()>;

    /// `VCS_GetDisableState`
    fn get_disable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<bool>;

    /// `VCS_GetNbOfDeviceError`
    fn get_nb_of_device_error(&mut self, handle: Handle, node: NodeId) -> CallResult<u8>;

    // ==================== 操作模式与运动 ====================

    /// `VCS_SetOperationMode`
    fn set_operation_mode(&mut self, handle: Handle, node: NodeId, mode: i8) -> CallResult<()>;

    /// `VCS_GetOperationMode`
    fn get_operation_mode(&mut self, handle: Handle, node: NodeId) -> CallResult<i8>;

    /// `VCS_SetPositionProfile`
    fn set_position_profile(
        &mut self,
        handle: Handle,
        node: NodeId,
        velocity: u32,
        acceleration: u32,
        deceleration: u32,
    ) -> CallResult<()>;

    /// `VCS_GetPositionProfile`，返回 `(velocity, acceleration, deceleration)`
    fn get_position_profile(&mut self, handle: Handle, node: NodeId)
    -> CallResult<(u32, u32, u32)>;

    /// `VCS_MoveToPosition`
    fn move_to_position(
        &mut self,
        handle: Handle,
        node: NodeId,
        target: i32,
        absolute: bool,
        immediately: bool,
    ) -> CallResult<()>;

    /// `VCS_WaitForTargetReached`（阻塞，最长 `timeout_ms`）
    fn wait_for_target_reached(
        &mut self,
        handle: Handle,
        node: NodeId,
        timeout_ms: u32,
    ) -> CallResult<()>;

    // ==================== 读取 ====================

    /// `VCS_GetPositionIs`
    fn get_position_is(&mut self, handle: Handle, node: NodeId) -> CallResult<i32>;

    /// `VCS_GetSensorType`
    fn get_sensor_type(&mut self, handle: Handle, node: NodeId) -> CallResult<u16>;

    /// `VCS_GetIncEncoderParameter`，返回 `(resolution, inverted_polarity)`
    fn get_inc_encoder_parameter(&mut self, handle: Handle, node: NodeId)
    -> CallResult<(u32, bool)>;

    // ==================== 错误信息 ====================

    /// `VCS_GetErrorInfo`
    ///
    /// 描述最长 `max_len - 1` 字节；查询失败返回 `None`。
    fn get_error_info(&mut self, code: ErrorCode, max_len: u16) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_rejects_zero() {
        assert!(Handle::new(0).is_none());
        let handle = Handle::new(0x1f).unwrap();
        assert_eq!(handle.raw(), 0x1f);
        assert_eq!(handle.to_string(), "0x1f");
    }

    #[test]
    fn test_node_id_rejects_zero() {
        assert!(NodeId::new(0).is_none());
        assert_eq!(NodeId::new(3).unwrap().get(), 3);
        assert_eq!(NodeId::default().get(), 1);
    }

    #[test]
    fn test_library_error_display() {
        let err = LibraryError::MissingSymbol {
            symbol: "VCS_OpenDevice",
            reason: "undefined symbol".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("VCS_OpenDevice"));
        assert!(msg.contains("undefined symbol"));
    }
}
