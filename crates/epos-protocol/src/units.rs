//! 角度与编码器计数的换算
//!
//! 使用 NewType 模式区分弧度和原始计数，在编译期避免单位混淆。
//!
//! # 换算定律
//!
//! ```text
//! counts = round(angle * cpr / 2π)
//! angle  = counts * 2π / cpr
//! ```
//!
//! 取整规则固定为**四舍五入、远离零**（`f64::round`），正反方向对称。
//! 往返转换的误差不超过半个编码器计数对应的角度。
//!
//! # 示例
//!
//! ```rust
//! use epos_protocol::{EncoderGeometry, Rad};
//!
//! let geometry = EncoderGeometry::default();
//! assert_eq!(geometry.counts_per_revolution(), 143_360);
//! assert_eq!(geometry.angle_to_encoder(Rad::FRAC_PI_2), 35_840);
//! ```

use std::f64::consts::TAU;
use std::fmt;
use std::ops::{Add, Neg, Sub};

use crate::profile::IncEncoderParameters;

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度常量
    pub const ZERO: Self = Rad(0.0);

    /// π 弧度（180度）
    pub const PI: Self = Rad(std::f64::consts::PI);

    /// 2π 弧度（360度）
    pub const TAU: Self = Rad(TAU);

    /// π/2 弧度（90度）
    pub const FRAC_PI_2: Self = Rad(std::f64::consts::FRAC_PI_2);

    /// 创建新的弧度值
    #[inline]
    pub const fn new(value: f64) -> Self {
        Rad(value)
    }

    /// 从角度创建
    #[inline]
    pub fn from_degrees(degrees: f64) -> Self {
        Rad(degrees.to_radians())
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 转换为角度值
    #[inline]
    pub fn to_degrees(self) -> f64 {
        self.0.to_degrees()
    }

    /// 是否为有限值（非 NaN、非无穷）
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

impl Add for Rad {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Rad(self.0 + rhs.0)
    }
}

impl Sub for Rad {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Rad(self.0 - rhs.0)
    }
}

impl Neg for Rad {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Rad(-self.0)
    }
}

/// 角度 → 编码器计数
///
/// `round(angle * counts_per_revolution / 2π)`，四舍五入远离零。
/// 非有限输入按 `as` 转换的饱和语义处理（NaN → 0），调用方应预先校验。
#[inline]
pub fn angle_to_encoder(angle: Rad, counts_per_revolution: u32) -> i64 {
    (angle.0 * f64::from(counts_per_revolution) / TAU).round() as i64
}

/// 编码器计数 → 角度
#[inline]
pub fn encoder_to_angle(counts: i64, counts_per_revolution: u32) -> Rad {
    Rad(counts as f64 * TAU / f64::from(counts_per_revolution))
}

/// 编码器几何参数
///
/// 每圈计数 = 四倍频系数 × 编码器线数 × 减速比。这是设备常量，不随调用变化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderGeometry {
    /// 四倍频系数（Quadrature Decoding）
    pub quadrature: u32,
    /// 编码器线数
    pub resolution: u32,
    /// 减速比
    pub gear_ratio: u32,
}

impl Default for EncoderGeometry {
    fn default() -> Self {
        Self {
            quadrature: 4,
            resolution: 1024,
            gear_ratio: 35,
        }
    }
}

impl EncoderGeometry {
    /// 创建几何参数
    pub const fn new(quadrature: u32, resolution: u32, gear_ratio: u32) -> Self {
        Self {
            quadrature,
            resolution,
            gear_ratio,
        }
    }

    /// 由设备读取的增量编码器参数构造（四倍频）
    pub fn from_encoder_parameters(params: IncEncoderParameters, gear_ratio: u32) -> Self {
        Self::new(4, params.resolution, gear_ratio)
    }

    /// 每圈计数
    ///
    /// 乘积溢出 `u32` 时饱和到 `u32::MAX`。
    pub fn counts_per_revolution(&self) -> u32 {
        self.quadrature
            .saturating_mul(self.resolution)
            .saturating_mul(self.gear_ratio)
    }

    /// 角度 → 编码器计数
    #[inline]
    pub fn angle_to_encoder(&self, angle: Rad) -> i64 {
        angle_to_encoder(angle, self.counts_per_revolution())
    }

    /// 编码器计数 → 角度
    #[inline]
    pub fn encoder_to_angle(&self, counts: i64) -> Rad {
        encoder_to_angle(counts, self.counts_per_revolution())
    }

    /// 一个编码器计数对应的角度
    #[inline]
    pub fn count_angle(&self) -> Rad {
        Rad(TAU / f64::from(self.counts_per_revolution()))
    }

    /// 参数是否可用（任一项为 0 时无法换算）
    pub fn is_valid(&self) -> bool {
        self.quadrature != 0 && self.resolution != 0 && self.gear_ratio != 0
    }
}

impl fmt::Display for EncoderGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} x {} = {} counts/rev",
            self.quadrature,
            self.resolution,
            self.gear_ratio,
            self.counts_per_revolution()
        )
    }
}
