//! 操作模式定义
//!
//! 对应 CiA 402 对象 `0x6060 Modes of operation`，以有符号 8 位整数编码。
//! 负值为厂商自定义模式。

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// 操作模式
///
/// 同一时刻设备只处于一种操作模式。
///
/// # 示例
///
/// ```rust
/// use epos_protocol::OperationMode;
///
/// let mode = OperationMode::try_from(1i8).unwrap();
/// assert_eq!(mode, OperationMode::ProfilePosition);
/// assert_eq!(i8::from(OperationMode::CyclicPosition), -1);
/// assert!(OperationMode::try_from(42i8).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum OperationMode {
    /// Profile Position Mode (PPM)
    ProfilePosition = 1,
    /// Profile Velocity Mode (PVM)
    ProfileVelocity = 3,
    /// Homing Mode (HM)
    Homing = 6,
    /// Interpolated Position Mode (IPM)
    InterpolatedPosition = 7,
    /// Position Mode (PM, CSP)
    CyclicPosition = -1,
    /// Velocity Mode (VM, CSV)
    CyclicVelocity = -2,
    /// Current Mode (CM, CST)
    CyclicCurrent = -3,
    /// Master Encoder Mode
    MasterEncoder = -5,
    /// Step Direction Mode
    StepDirection = -6,
}

impl OperationMode {
    /// 全部操作模式
    pub const ALL: [OperationMode; 9] = [
        OperationMode::ProfilePosition,
        OperationMode::ProfileVelocity,
        OperationMode::Homing,
        OperationMode::InterpolatedPosition,
        OperationMode::CyclicPosition,
        OperationMode::CyclicVelocity,
        OperationMode::CyclicCurrent,
        OperationMode::MasterEncoder,
        OperationMode::StepDirection,
    ];

    /// 获取原始编码
    #[inline]
    pub fn code(self) -> i8 {
        self.into()
    }

    /// 可读描述
    pub fn description(self) -> &'static str {
        match self {
            OperationMode::ProfilePosition => "Profile Position Mode (PPM)",
            OperationMode::ProfileVelocity => "Profile Velocity Mode (PVM)",
            OperationMode::Homing => "Homing Mode (HM)",
            OperationMode::InterpolatedPosition => "Interpolated Position Mode (IPM)",
            OperationMode::CyclicPosition => "Position Mode (PM, CSP)",
            OperationMode::CyclicVelocity => "Velocity Mode (VM, CSV)",
            OperationMode::CyclicCurrent => "Current Mode (CM, CST)",
            OperationMode::MasterEncoder => "Master Encoder Mode",
            OperationMode::StepDirection => "Step Direction Mode",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_device_table() {
        let expected: [(OperationMode, i8); 9] = [
            (OperationMode::ProfilePosition, 1),
            (OperationMode::ProfileVelocity, 3),
            (OperationMode::Homing, 6),
            (OperationMode::InterpolatedPosition, 7),
            (OperationMode::CyclicPosition, -1),
            (OperationMode::CyclicVelocity, -2),
            (OperationMode::CyclicCurrent, -3),
            (OperationMode::MasterEncoder, -5),
            (OperationMode::StepDirection, -6),
        ];
        for (mode, code) in expected {
            assert_eq!(mode.code(), code);
            assert_eq!(OperationMode::try_from(code).unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        for raw in [0i8, 2, 4, 5, 8, -4, -7, i8::MIN, i8::MAX] {
            let err = OperationMode::try_from(raw).unwrap_err();
            assert_eq!(err.number, raw);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            OperationMode::ProfilePosition.to_string(),
            "Profile Position Mode (PPM)"
        );
        assert_eq!(OperationMode::StepDirection.to_string(), "Step Direction Mode");
    }
}
