//! 作用域收尾
//!
//! 无论主体成功与否，都执行去使能和关闭，让硬件回到安全的断电状态。

use epos_cmd::VcsApi;
use epos_driver::Result;
use tracing::warn;

use crate::motion::MotionController;

/// 执行 `body`，然后总是收尾（去使能 + 关闭）
///
/// 主体的错误优先于收尾错误；主体成功但收尾失败时返回收尾错误。
///
/// # 示例
///
/// ```rust,ignore
/// let position = with_teardown(&mut controller, |c| {
///     c.enable()?;
///     c.set_operation_mode(OperationMode::ProfilePosition)?;
///     c.move_to_angle(Rad::FRAC_PI_2, MoveOptions::default())?;
///     c.get_encoder_position()
/// })?;
/// ```
pub fn with_teardown<A, T, F>(controller: &mut MotionController<A>, body: F) -> Result<T>
where
    A: VcsApi,
    F: FnOnce(&mut MotionController<A>) -> Result<T>,
{
    let result = body(controller);
    let teardown = controller.shutdown();

    match (result, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(teardown_err)) => {
            warn!("Teardown also failed after an earlier error: {}", teardown_err);
            Err(e)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epos_cmd::{MockCall, MockVcs};
    use epos_driver::{DeviceAddress, DeviceSession, EposError, LifecycleStage};
    use epos_protocol::{EncoderGeometry, ErrorCode, OperationMode};

    use crate::outcome::MoveOptions;

    fn controller(mock: &MockVcs) -> MotionController<MockVcs> {
        let session = DeviceSession::new(mock.clone(), DeviceAddress::default());
        MotionController::new(session, EncoderGeometry::default())
    }

    #[test]
    fn test_teardown_after_success() {
        let mock = MockVcs::new();
        let mut controller = controller(&mock);
        let position = with_teardown(&mut controller, |c| {
            c.initialize()?;
            c.enable()?;
            c.set_operation_mode(OperationMode::ProfilePosition)?;
            c.move_to_encoder_position(1234, MoveOptions::default())?;
            c.get_encoder_position()
        })
        .unwrap();

        assert_eq!(position, 1234);
        assert_eq!(controller.stage(), LifecycleStage::Closed);
        assert!(!mock.is_enabled());
        assert!(!mock.is_open());
    }

    #[test]
    fn test_teardown_after_move_rejected() {
        let mock = MockVcs::new();
        mock.fail_on(MockCall::MoveToPosition, ErrorCode(0x1234));
        let mut controller = controller(&mock);

        let err = with_teardown(&mut controller, |c| {
            c.initialize()?;
            c.enable()?;
            c.set_operation_mode(OperationMode::ProfilePosition)?;
            c.move_to_encoder_position(1234, MoveOptions::default())?;
            // 不应执行到这里
            c.move_to_encoder_position(0, MoveOptions::default())
        })
        .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(mock.call_count(MockCall::MoveToPosition), 1);
        assert_eq!(mock.call_count(MockCall::SetDisableState), 1);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
        assert_eq!(controller.stage(), LifecycleStage::Closed);
    }

    #[test]
    fn test_body_error_wins_over_teardown_error() {
        let mock = MockVcs::new();
        mock.set_device_errors(2);
        let mut controller = controller(&mock);

        let err = with_teardown(&mut controller, |c| {
            c.initialize()?;
            mock.fail_on(MockCall::CloseDevice, ErrorCode(0x1000_0003));
            c.enable()
        })
        .unwrap_err();

        assert_eq!(err, EposError::DeviceHasOutstandingErrors { count: 2 });
        assert_eq!(controller.stage(), LifecycleStage::Ready);
    }

    #[test]
    fn test_teardown_error_reported_after_success() {
        let mock = MockVcs::new();
        let mut controller = controller(&mock);
        let err = with_teardown(&mut controller, |c| {
            c.initialize()?;
            mock.fail_on(MockCall::CloseDevice, ErrorCode(0x1000_0003));
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.report().map(|r| r.command), Some("VCS_CloseDevice"));
    }
}
