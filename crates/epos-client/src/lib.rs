//! # EPOS Client
//!
//! 面向用户的运动控制接口。
//!
//! - [`MotionController`]: 操作模式、运动参数、位置指令与读取
//! - [`with_teardown`]: 保证去使能和关闭总会执行
//! - [`EposBuilder`]: 构建控制器
//!
//! # 示例
//!
//! ```rust,ignore
//! use epos_client::{EposBuilder, MoveOptions, with_teardown};
//! use epos_protocol::{OperationMode, ProfileParameters, Rad};
//!
//! let mut controller = EposBuilder::new().build()?;
//! with_teardown(&mut controller, |c| {
//!     c.initialize()?;
//!     c.enable()?;
//!     c.set_operation_mode(OperationMode::ProfilePosition)?;
//!     c.set_profile_parameters(ProfileParameters::new(800, 10000, 10000))?;
//!     c.move_to_angle(Rad::FRAC_PI_2, MoveOptions::default())?;
//!     Ok(())
//! })?;
//! ```

pub mod builder;
pub mod motion;
pub mod outcome;
pub mod teardown;

pub use builder::EposBuilder;
pub use motion::MotionController;
pub use outcome::{MoveOptions, MoveOutcome};
pub use teardown::with_teardown;
