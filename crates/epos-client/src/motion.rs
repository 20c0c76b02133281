//! 运动控制器
//!
//! 建立在 [`DeviceSession`] 之上：设置操作模式和运动参数，发出位置指令，
//! 并在超时内等待到位确认。
//!
//! 运动指令的前置条件按顺序检查：
//!
//! 1. 生命周期必须为 `Enabled`（不满足时不发出任何硬件调用）
//! 2. 操作模式必须为 Profile Position（使用缓存；未知时读取一次）
//!
//! 指令被拒绝是唯一的致命错误（[`EposError::MoveRejected`]），此时不会等待到位。

use epos_cmd::{Handle, VcsApi};
use epos_driver::{
    DeviceSession, DiscoveryReport, EposError, LifecycleStage, LifecycleState,
    ProtocolStackSettings, Result,
};
use epos_protocol::{
    EncoderGeometry, IncEncoderParameters, OperationMode, ProfileParameters, Rad, SensorType,
};
use tracing::{debug, info, warn};

use crate::outcome::{MoveOptions, MoveOutcome};

/// 运动控制器
pub struct MotionController<A: VcsApi> {
    session: DeviceSession<A>,
    geometry: EncoderGeometry,
    /// 最近一次设置或读取的操作模式
    mode: Option<OperationMode>,
}

impl<A: VcsApi> MotionController<A> {
    /// 包装会话
    pub fn new(session: DeviceSession<A>, geometry: EncoderGeometry) -> Self {
        Self {
            session,
            geometry,
            mode: None,
        }
    }

    pub fn session(&self) -> &DeviceSession<A> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DeviceSession<A> {
        &mut self.session
    }

    pub fn geometry(&self) -> EncoderGeometry {
        self.geometry
    }

    /// 缓存的操作模式（未设置也未读取过时为 `None`）
    pub fn cached_mode(&self) -> Option<OperationMode> {
        self.mode
    }

    pub fn state(&self) -> LifecycleState {
        self.session.state()
    }

    pub fn stage(&self) -> LifecycleStage {
        self.session.stage()
    }

    // ==================== 生命周期（委托给会话） ====================

    /// 沿会话地址枚举候选设备
    pub fn discover(&mut self) -> Result<DiscoveryReport> {
        self.session.discover_for_address()
    }

    /// open → 协议栈 → 清除故障
    pub fn initialize(&mut self) -> Result<()> {
        self.session.initialize()
    }

    pub fn open(&mut self) -> Result<()> {
        self.session.open()
    }

    pub fn set_protocol_stack(&mut self, settings: ProtocolStackSettings) -> Result<()> {
        self.session.set_protocol_stack_settings(settings)
    }

    pub fn clear_fault(&mut self) -> Result<()> {
        self.session.clear_fault()
    }

    pub fn enable(&mut self) -> Result<()> {
        self.session.enable()
    }

    pub fn disable(&mut self) -> Result<()> {
        self.session.disable()
    }

    pub fn close(&mut self) -> Result<()> {
        let result = self.session.close();
        if self.session.state().is_closed() {
            self.mode = None;
        }
        result
    }

    /// 去使能（如已使能）并关闭
    pub fn shutdown(&mut self) -> Result<()> {
        let result = self.session.shutdown();
        if self.session.state().is_closed() {
            self.mode = None;
        }
        result
    }

    // ==================== 操作模式与运动参数 ====================

    /// 设置操作模式
    pub fn set_operation_mode(&mut self, mode: OperationMode) -> Result<()> {
        self.session
            .call("set operation mode", "VCS_SetOperationMode", |api, handle, node| {
                api.set_operation_mode(handle, node, mode.code())
            })?;
        self.mode = Some(mode);
        info!(mode = %mode, "Operation mode set");
        Ok(())
    }

    /// 读取操作模式
    ///
    /// 未知编码返回 [`EposError::UnknownMode`]，不会被强制归类。
    pub fn get_operation_mode(&mut self) -> Result<OperationMode> {
        let raw = self
            .session
            .call("read operation mode", "VCS_GetOperationMode", |api, handle, node| {
                api.get_operation_mode(handle, node)
            })?;
        match OperationMode::try_from(raw) {
            Ok(mode) => {
                self.mode = Some(mode);
                Ok(mode)
            },
            Err(_) => {
                self.mode = None;
                Err(EposError::UnknownMode { raw })
            },
        }
    }

    /// 设置 Profile Position 运动参数
    pub fn set_profile_parameters(&mut self, profile: ProfileParameters) -> Result<()> {
        if profile.is_degenerate() {
            warn!(profile = %profile, "Profile has a zero component, moves will not progress");
        }
        self.session.call(
            "set position profile",
            "VCS_SetPositionProfile",
            |api, handle, node| {
                api.set_position_profile(
                    handle,
                    node,
                    profile.velocity,
                    profile.acceleration,
                    profile.deceleration,
                )
            },
        )?;
        info!(profile = %profile, "Position profile set");
        Ok(())
    }

    /// 读取 Profile Position 运动参数
    pub fn get_profile_parameters(&mut self) -> Result<ProfileParameters> {
        let (velocity, acceleration, deceleration) = self.session.call(
            "read position profile",
            "VCS_GetPositionProfile",
            |api, handle, node| api.get_position_profile(handle, node),
        )?;
        Ok(ProfileParameters::new(velocity, acceleration, deceleration))
    }

    // ==================== 运动 ====================

    /// 确认处于 Profile Position 模式
    fn require_profile_position(&mut self) -> Result<()> {
        let actual = match self.mode {
            Some(mode) => mode,
            None => self.get_operation_mode()?,
        };
        if actual != OperationMode::ProfilePosition {
            return Err(EposError::OperationModeMismatch {
                required: OperationMode::ProfilePosition,
                actual,
            });
        }
        Ok(())
    }

    /// 移动到编码器位置
    ///
    /// # 错误
    ///
    /// - `InvalidState`: 未使能（不发出硬件调用）
    /// - `OperationModeMismatch` / `UnknownMode`: 不在 Profile Position 模式
    /// - `MoveRejected`: 设备拒绝指令（致命），不会等待到位
    ///
    /// 到位确认失败不是错误，而是 [`MoveOutcome::TargetReachedTimeout`]。
    pub fn move_to_encoder_position(
        &mut self,
        target: i32,
        options: MoveOptions,
    ) -> Result<MoveOutcome> {
        let handle: Handle = self.session.require_enabled("move")?;
        self.require_profile_position()?;

        let node = self.session.node_id();
        self.session
            .gateway_mut()
            .invoke("VCS_MoveToPosition", |api| {
                api.move_to_position(handle, node, target, options.absolute, options.immediate)
            })
            .map_err(|report| {
                warn!(target, "Move rejected: {}", report);
                EposError::MoveRejected(report)
            })?;
        info!(
            target,
            absolute = options.absolute,
            immediate = options.immediate,
            "Move accepted"
        );

        if options.wait_timeout_ms == 0 {
            return Ok(MoveOutcome::Accepted);
        }

        match self.session.gateway_mut().invoke("VCS_WaitForTargetReached", |api| {
            api.wait_for_target_reached(handle, node, options.wait_timeout_ms)
        }) {
            Ok(()) => {
                info!(target, "Target reached");
                Ok(MoveOutcome::Reached)
            },
            Err(report) => {
                warn!(
                    target,
                    timeout_ms = options.wait_timeout_ms,
                    "Target reached not confirmed: {}",
                    report
                );
                Ok(MoveOutcome::TargetReachedTimeout(report))
            },
        }
    }

    /// 移动到角度位置
    ///
    /// 通过编码器几何参数换算后委托给 [`move_to_encoder_position`](Self::move_to_encoder_position)。
    /// 非有限角度或超出 32 位位置范围的目标返回 `InvalidParameter`。
    pub fn move_to_angle(&mut self, angle: Rad, options: MoveOptions) -> Result<MoveOutcome> {
        let target = self.angle_to_target(angle)?;
        debug!(angle = %angle, target, "Converted angle to encoder target");
        self.move_to_encoder_position(target, options)
    }

    fn angle_to_target(&self, angle: Rad) -> Result<i32> {
        if !angle.is_finite() {
            return Err(EposError::InvalidParameter {
                param: "angle",
                reason: format!("{} is not finite", angle.value()),
            });
        }
        if !self.geometry.is_valid() {
            return Err(EposError::InvalidParameter {
                param: "geometry",
                reason: format!("invalid encoder geometry: {}", self.geometry),
            });
        }
        let counts = self.geometry.angle_to_encoder(angle);
        i32::try_from(counts).map_err(|_| EposError::InvalidParameter {
            param: "angle",
            reason: format!("target of {} counts exceeds the position range", counts),
        })
    }

    // ==================== 读取 ====================

    /// 当前编码器位置
    pub fn get_encoder_position(&mut self) -> Result<i32> {
        self.session
            .call("read position", "VCS_GetPositionIs", |api, handle, node| {
                api.get_position_is(handle, node)
            })
    }

    /// 当前角度位置
    pub fn get_angle_position(&mut self) -> Result<Rad> {
        let counts = self.get_encoder_position()?;
        Ok(self.geometry.encoder_to_angle(i64::from(counts)))
    }

    /// 位置传感器类型
    pub fn get_sensor_type(&mut self) -> Result<SensorType> {
        let raw = self
            .session
            .call("read sensor type", "VCS_GetSensorType", |api, handle, node| {
                api.get_sensor_type(handle, node)
            })?;
        Ok(SensorType::from(raw))
    }

    /// 增量编码器参数
    pub fn get_incremental_encoder_parameters(&mut self) -> Result<IncEncoderParameters> {
        let (resolution, inverted_polarity) = self.session.call(
            "read encoder parameters",
            "VCS_GetIncEncoderParameter",
            |api, handle, node| api.get_inc_encoder_parameter(handle, node),
        )?;
        Ok(IncEncoderParameters {
            resolution,
            inverted_polarity,
        })
    }
}

impl<A: VcsApi> std::fmt::Debug for MotionController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("session", &self.session)
            .field("geometry", &self.geometry)
            .field("mode", &self.mode)
            .finish()
    }
}
