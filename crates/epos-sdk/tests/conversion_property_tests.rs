//! 角度/编码器换算的属性测试

use std::f64::consts::TAU;

use epos_sdk::protocol::{EncoderGeometry, Rad, angle_to_encoder, encoder_to_angle};
use proptest::prelude::*;

proptest! {
    /// 往返误差不超过一个编码器计数对应的角度
    #[test]
    fn roundtrip_within_one_count(angle in 0.0..TAU, cpr in 1u32..=10_000_000) {
        let counts = angle_to_encoder(Rad(angle), cpr);
        let back = encoder_to_angle(counts, cpr);
        let one_count = TAU / f64::from(cpr);
        prop_assert!((back.0 - angle).abs() <= one_count);
    }

    /// 零角度总是零计数
    #[test]
    fn zero_angle_is_zero_counts(cpr in 1u32..=u32::MAX) {
        prop_assert_eq!(angle_to_encoder(Rad::ZERO, cpr), 0);
    }

    /// 取整远离零，正反方向对称
    #[test]
    fn conversion_is_odd(angle in 0.0..TAU, cpr in 1u32..=10_000_000) {
        prop_assert_eq!(
            angle_to_encoder(Rad(-angle), cpr),
            -angle_to_encoder(Rad(angle), cpr)
        );
    }

    /// 换算单调不减
    #[test]
    fn conversion_is_monotonic(a in 0.0..TAU, b in 0.0..TAU) {
        let geometry = EncoderGeometry::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(geometry.angle_to_encoder(Rad(low)) <= geometry.angle_to_encoder(Rad(high)));
    }

    /// 默认几何参数下的往返
    #[test]
    fn default_geometry_roundtrip(angle in 0.0..TAU) {
        let geometry = EncoderGeometry::default();
        let back = geometry.encoder_to_angle(geometry.angle_to_encoder(Rad(angle)));
        prop_assert!((back.0 - angle).abs() <= geometry.count_angle().0);
    }
}
