//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use epos_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use crate::client::{EposBuilder, MotionController, MoveOptions, MoveOutcome, with_teardown};

// 驱动层
pub use crate::driver::{DeviceAddress, DeviceSession, LifecycleStage, ProtocolStackSettings};

// 数据模型
pub use crate::protocol::{EncoderGeometry, OperationMode, ProfileParameters, Rad, SensorType};

// 命令层 trait
pub use crate::cmd::VcsApi;

// 错误类型
pub use crate::cmd::ErrorReport;
pub use crate::config::ConfigError;
pub use crate::driver::EposError;
