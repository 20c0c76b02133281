//! 位置传感器类型

use num_enum::FromPrimitive;
use std::fmt;

/// 位置传感器类型（`VCS_GetSensorType` 返回值）
///
/// 未列出的编码保存在 `Other` 中，不会被强制归类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum SensorType {
    /// 未知 / 无传感器
    Unknown = 0,
    /// 增量编码器 1，带 Index（3 通道）
    IncrementalEncoder1WithIndex = 1,
    /// 增量编码器 1，无 Index（2 通道）
    IncrementalEncoder1WithoutIndex = 2,
    /// 霍尔传感器
    HallSensors = 3,
    /// SSI 编码器（二进制码）
    SsiBinary = 4,
    /// SSI 编码器（格雷码）
    SsiGrey = 5,
    /// 增量编码器 2，带 Index（3 通道）
    IncrementalEncoder2WithIndex = 6,
    /// 增量编码器 2，无 Index（2 通道）
    IncrementalEncoder2WithoutIndex = 7,
    /// 模拟增量编码器，带 Index（3 通道）
    AnalogIncrementalWithIndex = 8,
    /// 模拟增量编码器，无 Index（2 通道）
    AnalogIncrementalWithoutIndex = 9,
    /// 其他编码
    #[num_enum(catch_all)]
    Other(u16),
}

impl SensorType {
    /// 获取原始编码
    pub fn code(self) -> u16 {
        match self {
            SensorType::Unknown => 0,
            SensorType::IncrementalEncoder1WithIndex => 1,
            SensorType::IncrementalEncoder1WithoutIndex => 2,
            SensorType::HallSensors => 3,
            SensorType::SsiBinary => 4,
            SensorType::SsiGrey => 5,
            SensorType::IncrementalEncoder2WithIndex => 6,
            SensorType::IncrementalEncoder2WithoutIndex => 7,
            SensorType::AnalogIncrementalWithIndex => 8,
            SensorType::AnalogIncrementalWithoutIndex => 9,
            SensorType::Other(raw) => raw,
        }
    }

    /// 是否为增量编码器（数字或模拟）
    pub fn is_incremental_encoder(self) -> bool {
        matches!(
            self,
            SensorType::IncrementalEncoder1WithIndex
                | SensorType::IncrementalEncoder1WithoutIndex
                | SensorType::IncrementalEncoder2WithIndex
                | SensorType::IncrementalEncoder2WithoutIndex
                | SensorType::AnalogIncrementalWithIndex
                | SensorType::AnalogIncrementalWithoutIndex
        )
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Unknown => f.write_str("Unknown / No sensor"),
            SensorType::IncrementalEncoder1WithIndex => {
                f.write_str("Incremental encoder 1 with index (3-channel)")
            },
            SensorType::IncrementalEncoder1WithoutIndex => {
                f.write_str("Incremental encoder 1 without index (2-channel)")
            },
            SensorType::HallSensors => f.write_str("Hall Sensors"),
            SensorType::SsiBinary => f.write_str("SSI encoder binary coded"),
            SensorType::SsiGrey => f.write_str("SSI encoder Grey coded"),
            SensorType::IncrementalEncoder2WithIndex => {
                f.write_str("Incremental encoder 2 with index (3-channel)")
            },
            SensorType::IncrementalEncoder2WithoutIndex => {
                f.write_str("Incremental encoder 2 without index (2-channel)")
            },
            SensorType::AnalogIncrementalWithIndex => {
                f.write_str("Analog incremental encoder with index (3-channel)")
            },
            SensorType::AnalogIncrementalWithoutIndex => {
                f.write_str("Analog incremental encoder without index (2-channel)")
            },
            SensorType::Other(raw) => write!(f, "Unknown Sensor Type (Value: {})", raw),
        }
    }
}
