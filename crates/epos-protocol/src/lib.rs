//! # EPOS Protocol
//!
//! maxon EPOS 控制器的数据模型定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（默认设备名称、波特率、缓冲区大小）
//! - `error_code`: 命令库错误码
//! - `mode`: 操作模式（CiA 402 Modes of Operation）
//! - `sensor`: 位置传感器类型
//! - `profile`: 运动参数（Profile Position Mode）
//! - `units`: 角度与编码器计数之间的换算
//!
//! ## 换算定律
//!
//! ```text
//! counts = round(angle * counts_per_revolution / 2π)
//! counts_per_revolution = quadrature(4) * resolution(1024) * gear_ratio(35)
//! ```

pub mod constants;
pub mod error_code;
pub mod mode;
pub mod profile;
pub mod sensor;
pub mod units;

// 重新导出常用类型
pub use constants::*;
pub use error_code::ErrorCode;
pub use mode::OperationMode;
pub use profile::{IncEncoderParameters, ProfileParameters};
pub use sensor::SensorType;
pub use units::{EncoderGeometry, Rad, angle_to_encoder, encoder_to_angle};
