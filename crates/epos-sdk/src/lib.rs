//! EPOS SDK - maxon EPOS 伺服控制器 Rust SDK
//!
//! 通过厂商命令库 `libEposCmd` 驱动 EPOS 控制器：设备枚举、生命周期管理、
//! 操作模式配置、位置指令，以及物理角度与编码器计数之间的换算。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 数据模型、操作模式、单位换算
//! - **命令层** (`cmd`): `VcsApi` 接口、命令网关、原生/Mock 后端
//! - **驱动层** (`driver`): 设备会话、生命周期状态机、统一错误类型
//! - **客户端层** (`client`): 运动控制器、作用域收尾、构建器
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use epos_sdk::prelude::*;
//!
//! epos_sdk::init_logging();
//! let mut controller = EposBuilder::new().port("USB0").build()?;
//! with_teardown(&mut controller, |c| {
//!     c.initialize()?;
//!     c.enable()?;
//!     c.set_operation_mode(OperationMode::ProfilePosition)?;
//!     c.set_profile_parameters(ProfileParameters::new(800, 10000, 10000))?;
//!     c.move_to_angle(Rad::FRAC_PI_2, MoveOptions::default())?;
//!     Ok(())
//! })?;
//! ```

pub use epos_client as client;
pub use epos_cmd as cmd;
pub use epos_driver as driver;
pub use epos_protocol as protocol;

pub mod config;
pub mod logging;
pub mod prelude;

// --- 公共 API（Facade） ---

pub use crate::client::{EposBuilder, MotionController, MoveOptions, MoveOutcome, with_teardown};
pub use crate::config::{ConfigError, EposConfig};
pub use crate::driver::{
    DeviceAddress, DeviceSession, EposError, LifecycleStage, LifecycleState, ProtocolStackSettings,
};
pub use crate::logging::{init_logging, try_init_logging};
pub use crate::protocol::{
    EncoderGeometry, ErrorCode, IncEncoderParameters, OperationMode, ProfileParameters, Rad,
    SensorType,
};

#[cfg(feature = "native")]
pub use crate::cmd::VcsLibrary;

#[cfg(feature = "mock")]
pub use crate::cmd::{MockCall, MockVcs};

/// SDK 结果类型
pub type Result<T> = std::result::Result<T, EposError>;
