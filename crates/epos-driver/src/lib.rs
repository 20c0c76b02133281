//! # EPOS Driver
//!
//! 设备会话与生命周期状态机。
//!
//! ## 生命周期
//!
//! ```text
//! Unopened ─open→ Opened ─clear_fault→ Ready ─enable→ Enabled ⇄ Disabled
//!                                                    (disable / enable)
//! 任意非 Closed 状态 ─close→ Closed
//! ```
//!
//! 每个转换只在合法状态下执行；否则返回 [`EposError::InvalidState`]，
//! 且不会触碰硬件。使能前必须确认设备错误数为 0。
//!
//! ## 模块
//!
//! - [`session`]: [`DeviceSession`]，连接与生命周期操作
//! - [`discovery`]: 有界枚举（设备/协议栈/接口/端口/波特率）
//! - [`lifecycle`]: [`LifecycleState`]（携带句柄）与 [`LifecycleStage`]
//! - [`error`]: 统一错误类型 [`EposError`]

pub mod address;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod session;

pub use address::DeviceAddress;
pub use discovery::{MAX_SELECTION_ITEMS, SelectionIter};
pub use error::{EposError, Result};
pub use lifecycle::{LifecycleStage, LifecycleState};
pub use session::{DeviceSession, DiscoveryReport, ProtocolStackSettings};

// 命令层常用类型
pub use epos_cmd::{CommandGateway, ErrorReport, Handle, LibraryError, NodeId, VcsApi};

#[cfg(feature = "native")]
pub use epos_cmd::VcsLibrary;

#[cfg(feature = "mock")]
pub use epos_cmd::{MockCall, MockVcs};
