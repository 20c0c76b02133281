//! 运动参数定义

use std::fmt;

/// Profile Position Mode 运动参数
///
/// 单位均为编码器单位：速度 `inc/s`，加速度/减速度 `inc/s²`。
/// 在位置模式下发送运动指令前应先设置，以保证运动轨迹确定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfileParameters {
    /// 速度
    pub velocity: u32,
    /// 加速度
    pub acceleration: u32,
    /// 减速度
    pub deceleration: u32,
}

impl ProfileParameters {
    /// 创建运动参数
    pub const fn new(velocity: u32, acceleration: u32, deceleration: u32) -> Self {
        Self {
            velocity,
            acceleration,
            deceleration,
        }
    }

    /// 任意一项为 0 时，驱动器不会产生运动
    pub fn is_degenerate(&self) -> bool {
        self.velocity == 0 || self.acceleration == 0 || self.deceleration == 0
    }
}

impl fmt::Display for ProfileParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Velocity={}, Acceleration={}, Deceleration={}",
            self.velocity, self.acceleration, self.deceleration
        )
    }
}

/// 增量编码器参数（`VCS_GetIncEncoderParameter`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncEncoderParameters {
    /// 每圈线数（未经四倍频）
    pub resolution: u32,
    /// 极性反转
    pub inverted_polarity: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let p = ProfileParameters::new(800, 10000, 10000);
        assert_eq!(
            p.to_string(),
            "Velocity=800, Acceleration=10000, Deceleration=10000"
        );
    }

    #[test]
    fn test_degenerate() {
        assert!(!ProfileParameters::new(800, 10000, 10000).is_degenerate());
        assert!(ProfileParameters::new(0, 10000, 10000).is_degenerate());
        assert!(ProfileParameters::new(800, 10000, 0).is_degenerate());
    }
}
