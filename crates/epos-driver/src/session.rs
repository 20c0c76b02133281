//! 设备会话
//!
//! [`DeviceSession`] 独占一个连接：地址、生命周期状态（含句柄）和命令网关。
//! 所有操作都先检查生命周期状态，再发出硬件调用。
//!
//! # 示例
//!
//! ```rust,ignore
//! use epos_driver::{DeviceAddress, DeviceSession};
//!
//! let mut session = DeviceSession::new(api, DeviceAddress::default());
//! session.initialize()?;   // open → protocol stack → clear fault
//! session.enable()?;
//! // ...
//! session.shutdown()?;     // disable → close
//! ```

use std::fmt;

use epos_cmd::{CallResult, CommandGateway, ErrorReport, Handle, NodeId, VcsApi};
use epos_protocol::{DEFAULT_BAUDRATE, DEFAULT_TIMEOUT_MS, ErrorCode};
use tracing::{debug, info, warn};

use crate::address::DeviceAddress;
use crate::discovery;
use crate::error::{EposError, Result};
use crate::lifecycle::{LifecycleStage, LifecycleState};

/// 协议栈参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolStackSettings {
    /// 波特率（bit/s）
    pub baudrate: u32,
    /// 通信超时（毫秒）
    pub timeout_ms: u32,
}

impl ProtocolStackSettings {
    pub const fn new(baudrate: u32, timeout_ms: u32) -> Self {
        Self {
            baudrate,
            timeout_ms,
        }
    }
}

impl Default for ProtocolStackSettings {
    /// 1 000 000 baud / 500 ms
    fn default() -> Self {
        Self::new(DEFAULT_BAUDRATE, DEFAULT_TIMEOUT_MS)
    }
}

/// 按会话地址枚举到的候选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub devices: Vec<String>,
    pub protocols: Vec<String>,
    pub interfaces: Vec<String>,
    pub ports: Vec<String>,
}

/// 设备会话
///
/// 单线程使用：所有操作都需要 `&mut self`。多线程共享时由调用方用互斥锁包裹整个会话。
///
/// 会话在仍处于连接状态时被 drop，会尽力去使能并关闭连接。
pub struct DeviceSession<A: VcsApi> {
    gateway: CommandGateway<A>,
    address: DeviceAddress,
    state: LifecycleState,
    protocol_stack: ProtocolStackSettings,
    /// 已发出使能命令、尚未确认去使能
    enable_issued: bool,
}

impl<A: VcsApi> DeviceSession<A> {
    /// 创建会话（尚未打开）
    pub fn new(api: A, address: DeviceAddress) -> Self {
        Self {
            gateway: CommandGateway::new(api),
            address,
            state: LifecycleState::Unopened,
            protocol_stack: ProtocolStackSettings::default(),
            enable_issued: false,
        }
    }

    /// 指定 `initialize()` 使用的协议栈参数
    pub fn with_protocol_stack(mut self, settings: ProtocolStackSettings) -> Self {
        self.protocol_stack = settings;
        self
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn node_id(&self) -> NodeId {
        self.address.node_id()
    }

    /// 当前生命周期状态
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn stage(&self) -> LifecycleStage {
        self.state.stage()
    }

    /// 连接句柄（仅已连接状态）
    pub fn handle(&self) -> Option<Handle> {
        self.state.handle()
    }

    /// 最近一次应用（或待应用）的协议栈参数
    pub fn protocol_stack(&self) -> ProtocolStackSettings {
        self.protocol_stack
    }

    pub fn gateway(&self) -> &CommandGateway<A> {
        &self.gateway
    }

    /// 直接访问网关（由上层组件发出自己的命令）
    pub fn gateway_mut(&mut self) -> &mut CommandGateway<A> {
        &mut self.gateway
    }

    /// 在任意已连接状态下执行一次节点命令
    ///
    /// 状态不允许时返回 `InvalidState`（或 `AlreadyClosed`），不发出硬件调用；
    /// 命令失败映射为 `HardwareCallFailed`。
    pub fn call<T, F>(&mut self, attempted: &'static str, command: &'static str, call: F) -> Result<T>
    where
        F: FnOnce(&mut A, Handle, NodeId) -> CallResult<T>,
    {
        let handle = self.state.require_connected(attempted)?;
        let node = self.address.node_id();
        self.gateway
            .invoke(command, |api| call(api, handle, node))
            .map_err(EposError::HardwareCallFailed)
    }

    /// 仅 `Enabled` 状态下的句柄
    pub fn require_enabled(&self, attempted: &'static str) -> Result<Handle> {
        self.state.require_enabled(attempted)
    }

    // ==================== 枚举 ====================

    pub fn discover_devices(&mut self) -> Result<Vec<String>> {
        discovery::discover_devices(&mut self.gateway)
    }

    pub fn discover_protocols(&mut self, device: &str) -> Result<Vec<String>> {
        discovery::discover_protocols(&mut self.gateway, device)
    }

    pub fn discover_interfaces(&mut self, device: &str, protocol_stack: &str) -> Result<Vec<String>> {
        discovery::discover_interfaces(&mut self.gateway, device, protocol_stack)
    }

    pub fn discover_ports(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
    ) -> Result<Vec<String>> {
        discovery::discover_ports(&mut self.gateway, device, protocol_stack, interface)
    }

    pub fn discover_baudrates(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        port: &str,
    ) -> Result<Vec<u32>> {
        discovery::discover_baudrates(&mut self.gateway, device, protocol_stack, interface, port)
    }

    /// 沿会话地址枚举候选树：设备 → 协议栈 → 接口 → 端口
    pub fn discover_for_address(&mut self) -> Result<DiscoveryReport> {
        let device = self.address.device_name().to_string();
        let protocol = self.address.protocol_name().to_string();
        let interface = self.address.interface_name().to_string();

        let report = DiscoveryReport {
            devices: self.discover_devices()?,
            protocols: self.discover_protocols(&device)?,
            interfaces: self.discover_interfaces(&device, &protocol)?,
            ports: self.discover_ports(&device, &protocol, &interface)?,
        };

        info!(
            devices = ?report.devices,
            protocols = ?report.protocols,
            interfaces = ?report.interfaces,
            ports = ?report.ports,
            "Discovered candidates for {}",
            self.address
        );
        Ok(report)
    }

    /// 解析端口：未指定时取枚举到的第一个候选端口
    pub fn resolve_port(&mut self) -> Result<String> {
        if let Some(port) = self.address.port_name() {
            return Ok(port.to_string());
        }

        let ports = discovery::discover_ports(
            &mut self.gateway,
            self.address.device_name(),
            self.address.protocol_name(),
            self.address.interface_name(),
        )?;
        let first = ports.into_iter().next().ok_or(EposError::DiscoveryFailed {
            selection: "port",
            report: None,
        })?;

        let port = self.address.resolve_port(first).to_string();
        info!(port = %port, "Resolved port");
        Ok(port)
    }

    // ==================== 连接 ====================

    /// 打开连接：`Unopened` → `Opened`
    pub fn open(&mut self) -> Result<()> {
        match self.state {
            LifecycleState::Unopened => {},
            LifecycleState::Closed => return Err(EposError::AlreadyClosed),
            _ => {
                return Err(EposError::InvalidState {
                    attempted: "open",
                    current: self.state.stage(),
                });
            },
        }

        let port = self.resolve_port()?;
        let address = &self.address;
        let raw = self
            .gateway
            .invoke("VCS_OpenDevice", |api| {
                api.open_device(
                    address.device_name(),
                    address.protocol_name(),
                    address.interface_name(),
                    &port,
                )
            })
            .map_err(EposError::HardwareCallFailed)?;

        let handle = match Handle::new(raw) {
            Some(handle) => handle,
            None => {
                let description = self.gateway.describe(ErrorCode::HANDLE_NOT_VALID);
                return Err(EposError::HardwareCallFailed(ErrorReport::new(
                    "VCS_OpenDevice",
                    ErrorCode::HANDLE_NOT_VALID,
                    description,
                )));
            },
        };

        self.state = LifecycleState::Opened(handle);
        info!(handle = %handle, address = %self.address, "Device opened");
        Ok(())
    }

    /// 关闭连接（终态）
    ///
    /// 未打开时直接进入 `Closed`，不发出硬件调用；已关闭时返回 `AlreadyClosed`。
    /// 关闭失败时状态不变。
    pub fn close(&mut self) -> Result<()> {
        let Some(handle) = self.state.check_close()? else {
            self.state = LifecycleState::Closed;
            debug!("Session closed before it was opened");
            return Ok(());
        };

        self.gateway
            .invoke("VCS_CloseDevice", |api| api.close_device(handle))
            .map_err(EposError::HardwareCallFailed)?;

        self.state = LifecycleState::Closed;
        self.enable_issued = false;
        info!(handle = %handle, "Device closed");
        Ok(())
    }

    /// 设置协议栈参数
    pub fn set_protocol_stack(&mut self, baudrate: u32, timeout_ms: u32) -> Result<()> {
        self.set_protocol_stack_settings(ProtocolStackSettings::new(baudrate, timeout_ms))
    }

    /// 设置协议栈参数（`Opened`、`Ready` 或 `Disabled`）
    pub fn set_protocol_stack_settings(&mut self, settings: ProtocolStackSettings) -> Result<()> {
        let handle = self.state.check_protocol_stack()?;
        self.gateway
            .invoke("VCS_SetProtocolStackSettings", |api| {
                api.set_protocol_stack_settings(handle, settings.baudrate, settings.timeout_ms)
            })
            .map_err(EposError::HardwareCallFailed)?;

        self.protocol_stack = settings;
        info!(
            baudrate = settings.baudrate,
            timeout_ms = settings.timeout_ms,
            "Protocol stack configured"
        );
        Ok(())
    }

    // ==================== 生命周期 ====================

    /// 清除故障：`Opened` → `Ready`
    pub fn clear_fault(&mut self) -> Result<()> {
        let handle = self.state.check_clear_fault()?;
        let node = self.address.node_id();
        self.gateway
            .invoke("VCS_ClearFault", |api| api.clear_fault(handle, node))
            .map_err(EposError::HardwareCallFailed)?;

        self.state = LifecycleState::Ready(handle);
        info!(node_id = node.get(), "Fault cleared");
        Ok(())
    }

    /// 读取设备错误数量
    pub fn device_error_count(&mut self) -> Result<u8> {
        self.call(
            "read device errors",
            "VCS_GetNbOfDeviceError",
            |api, handle, node| api.get_nb_of_device_error(handle, node),
        )
    }

    /// 使能：`Ready`/`Disabled` → `Enabled`
    ///
    /// 设备存在错误时不发出使能命令；使能后复查状态，未生效则报告 `StateNotConfirmed`。
    pub fn enable(&mut self) -> Result<()> {
        let handle = self.state.check_enable()?;
        let node = self.address.node_id();

        let count = self.device_error_count()?;
        if count > 0 {
            warn!(node_id = node.get(), count, "Refusing to enable, device has errors");
            return Err(EposError::DeviceHasOutstandingErrors { count });
        }

        // 命令一旦发出，驱动器就可能已上电，收尾时必须去使能
        self.enable_issued = true;
        self.gateway
            .invoke("VCS_SetEnableState", |api| api.set_enable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        let enabled = self
            .gateway
            .invoke("VCS_GetEnableState", |api| api.get_enable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        if !enabled {
            warn!(node_id = node.get(), "Enable command accepted but device is not enabled");
            return Err(EposError::StateNotConfirmed { operation: "enable" });
        }

        self.state = LifecycleState::Enabled(handle);
        info!(node_id = node.get(), "Device enabled");
        Ok(())
    }

    /// 去使能：`Enabled` → `Disabled`
    pub fn disable(&mut self) -> Result<()> {
        let handle = self.state.check_disable()?;
        let node = self.address.node_id();

        self.gateway
            .invoke("VCS_SetDisableState", |api| api.set_disable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        let disabled = self
            .gateway
            .invoke("VCS_GetDisableState", |api| api.get_disable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        if !disabled {
            warn!(node_id = node.get(), "Disable command accepted but device is still enabled");
            return Err(EposError::StateNotConfirmed { operation: "disable" });
        }

        self.state = LifecycleState::Disabled(handle);
        self.enable_issued = false;
        info!(node_id = node.get(), "Device disabled");
        Ok(())
    }

    /// 使能命令已发出但未确认时的去使能
    ///
    /// 不经过 `Enabled` 状态检查，也不改变生命周期状态。
    fn disable_unconfirmed_enable(&mut self) -> Result<()> {
        let handle = self.state.require_connected("disable")?;
        let node = self.address.node_id();
        warn!(node_id = node.get(), "Enable was issued but not confirmed, disabling");

        self.gateway
            .invoke("VCS_SetDisableState", |api| api.set_disable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        let disabled = self
            .gateway
            .invoke("VCS_GetDisableState", |api| api.get_disable_state(handle, node))
            .map_err(EposError::HardwareCallFailed)?;
        if !disabled {
            return Err(EposError::StateNotConfirmed { operation: "disable" });
        }

        self.enable_issued = false;
        info!(node_id = node.get(), "Device disabled");
        Ok(())
    }

    /// 初始化：open → 协议栈 → 清除故障
    pub fn initialize(&mut self) -> Result<()> {
        self.open()?;
        self.set_protocol_stack_settings(self.protocol_stack)?;
        self.clear_fault()
    }

    /// 收尾：使能时（或使能命令已发出但未确认时）先去使能，然后关闭
    ///
    /// 两步都会尝试；返回第一个错误。已关闭的会话直接返回成功。
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state.is_closed() {
            return Ok(());
        }

        let disabled = if self.state.is_enabled() {
            self.disable()
        } else if self.enable_issued {
            self.disable_unconfirmed_enable()
        } else {
            Ok(())
        };
        if let Err(e) = &disabled {
            warn!("Failed to disable during shutdown: {}", e);
        }

        let closed = self.close();
        if let Err(e) = &closed {
            warn!("Failed to close during shutdown: {}", e);
        }

        disabled.and(closed)
    }
}

impl<A: VcsApi> fmt::Debug for DeviceSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("protocol_stack", &self.protocol_stack)
            .field("enable_issued", &self.enable_issued)
            .finish()
    }
}

impl<A: VcsApi> Drop for DeviceSession<A> {
    fn drop(&mut self) {
        if self.state.is_connected() {
            debug!(state = %self.state, "Session dropped while connected, shutting down");
            if let Err(e) = self.shutdown() {
                warn!("Shutdown on drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epos_cmd::{MockCall, MockVcs};

    fn session(mock: &MockVcs) -> DeviceSession<MockVcs> {
        DeviceSession::new(mock.clone(), DeviceAddress::default())
    }

    #[test]
    fn test_initialize_reaches_ready() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.initialize().unwrap();

        assert_eq!(session.stage(), LifecycleStage::Ready);
        assert_eq!(session.address().port_name(), Some("USB0"));
        assert_eq!(mock.protocol_stack_settings(), Some((1_000_000, 500)));
        assert_eq!(
            mock.hardware_calls(),
            vec![
                MockCall::PortNameSelection,
                MockCall::OpenDevice,
                MockCall::SetProtocolStackSettings,
                MockCall::ClearFault,
            ]
        );
    }

    #[test]
    fn test_open_with_given_port_skips_discovery() {
        let mock = MockVcs::new();
        let address = DeviceAddress::default().with_port("USB7").unwrap();
        let mut session = DeviceSession::new(mock.clone(), address);
        session.open().unwrap();
        assert_eq!(mock.call_count(MockCall::PortNameSelection), 0);
        assert_eq!(session.stage(), LifecycleStage::Opened);
    }

    #[test]
    fn test_open_fails_without_ports() {
        let mock = MockVcs::new();
        mock.set_ports(&[]);
        let mut session = session(&mock);
        assert_eq!(
            session.open(),
            Err(EposError::DiscoveryFailed {
                selection: "port",
                report: None
            })
        );
        assert_eq!(mock.call_count(MockCall::OpenDevice), 0);
        assert_eq!(session.stage(), LifecycleStage::Unopened);
    }

    #[test]
    fn test_zero_handle_is_failure() {
        let mock = MockVcs::new();
        mock.set_next_handle(0);
        let mut session = session(&mock);
        match session.open() {
            Err(EposError::HardwareCallFailed(report)) => {
                assert_eq!(report.command, "VCS_OpenDevice");
                assert_eq!(report.code, ErrorCode::HANDLE_NOT_VALID);
            },
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(session.stage(), LifecycleStage::Unopened);
    }

    #[test]
    fn test_enable_before_clear_fault_is_invalid_state() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.open().unwrap();
        mock.clear_calls();

        assert_eq!(
            session.enable(),
            Err(EposError::InvalidState {
                attempted: "enable",
                current: LifecycleStage::Opened
            })
        );
        assert!(mock.hardware_calls().is_empty());
    }

    #[test]
    fn test_enable_refused_with_device_errors() {
        let mock = MockVcs::new();
        mock.set_device_errors(1);
        let mut session = session(&mock);
        session.initialize().unwrap();

        assert_eq!(
            session.enable(),
            Err(EposError::DeviceHasOutstandingErrors { count: 1 })
        );
        assert_eq!(mock.call_count(MockCall::SetEnableState), 0);
        assert_eq!(session.stage(), LifecycleStage::Ready);
    }

    #[test]
    fn test_enable_requires_confirmation() {
        let mock = MockVcs::new();
        mock.set_enable_takes_effect(false);
        let mut session = session(&mock);
        session.initialize().unwrap();

        assert_eq!(
            session.enable(),
            Err(EposError::StateNotConfirmed { operation: "enable" })
        );
        assert_eq!(mock.call_count(MockCall::GetEnableState), 1);
        assert_eq!(session.stage(), LifecycleStage::Ready);
    }

    #[test]
    fn test_enable_disable_cycle() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.initialize().unwrap();
        session.enable().unwrap();
        assert_eq!(session.stage(), LifecycleStage::Enabled);
        assert!(mock.is_enabled());

        session.disable().unwrap();
        assert_eq!(session.stage(), LifecycleStage::Disabled);

        // Disabled → Enabled 允许再次使能
        session.enable().unwrap();
        assert_eq!(session.stage(), LifecycleStage::Enabled);
    }

    #[test]
    fn test_disable_outside_enabled_is_invalid_state() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.initialize().unwrap();
        mock.clear_calls();

        assert!(matches!(
            session.disable(),
            Err(EposError::InvalidState {
                attempted: "disable",
                ..
            })
        ));
        assert!(mock.hardware_calls().is_empty());
    }

    #[test]
    fn test_clear_fault_failure_keeps_state() {
        let mock = MockVcs::new();
        mock.fail_on(MockCall::ClearFault, ErrorCode(0x3456));
        let mut session = session(&mock);
        session.open().unwrap();

        let err = session.clear_fault().unwrap_err();
        assert_eq!(err.report().map(|r| r.code), Some(ErrorCode(0x3456)));
        assert_eq!(session.stage(), LifecycleStage::Opened);
    }

    #[test]
    fn test_close_semantics() {
        let mock = MockVcs::new();
        let mut session = session(&mock);

        // 未打开直接关闭：无硬件调用
        session.close().unwrap();
        assert_eq!(session.stage(), LifecycleStage::Closed);
        assert!(mock.hardware_calls().is_empty());

        assert_eq!(session.close(), Err(EposError::AlreadyClosed));
        assert_eq!(session.open(), Err(EposError::AlreadyClosed));
    }

    #[test]
    fn test_close_failure_keeps_state() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.open().unwrap();
        mock.fail_on(MockCall::CloseDevice, ErrorCode(0x1000_0003));

        assert!(session.close().is_err());
        assert_eq!(session.stage(), LifecycleStage::Opened);

        mock.clear_failures();
        session.close().unwrap();
        assert!(session.handle().is_none());
        assert!(!mock.is_open());
    }

    #[test]
    fn test_discover_for_address() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        let report = session.discover_for_address().unwrap();
        assert_eq!(report.devices, vec!["EPOS4"]);
        assert_eq!(report.protocols, vec!["MAXON SERIAL V2", "CANopen"]);
        assert_eq!(report.interfaces, vec!["USB"]);
        assert_eq!(report.ports, vec!["USB0"]);
    }

    #[test]
    fn test_drop_disables_and_closes() {
        let mock = MockVcs::new();
        {
            let mut session = session(&mock);
            session.initialize().unwrap();
            session.enable().unwrap();
        }
        assert!(!mock.is_enabled());
        assert!(!mock.is_open());
        assert_eq!(mock.call_count(MockCall::SetDisableState), 1);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
    }

    #[test]
    fn test_shutdown_closes_even_if_disable_fails() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        session.initialize().unwrap();
        session.enable().unwrap();
        mock.fail_on(MockCall::SetDisableState, ErrorCode(0x1234));

        let err = session.shutdown().unwrap_err();
        assert_eq!(err.report().map(|r| r.command), Some("VCS_SetDisableState"));
        assert_eq!(session.stage(), LifecycleStage::Closed);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
    }

    #[test]
    fn test_call_requires_connection() {
        let mock = MockVcs::new();
        let mut session = session(&mock);
        let result = session.call("read position", "VCS_GetPositionIs", |api, handle, node| {
            api.get_position_is(handle, node)
        });
        assert!(matches!(result, Err(EposError::InvalidState { .. })));
        assert!(mock.hardware_calls().is_empty());
    }

    #[test]
    fn test_shutdown_disables_after_unconfirmed_enable() {
        let mock = MockVcs::new();
        mock.set_enable_takes_effect(false);
        let mut session = session(&mock);
        session.initialize().unwrap();
        assert_eq!(
            session.enable(),
            Err(EposError::StateNotConfirmed { operation: "enable" })
        );
        assert_eq!(session.stage(), LifecycleStage::Ready);

        session.shutdown().unwrap();
        assert_eq!(mock.call_count(MockCall::SetDisableState), 1);
        assert_eq!(mock.call_count(MockCall::GetDisableState), 1);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
        assert_eq!(session.stage(), LifecycleStage::Closed);
    }

    #[test]
    fn test_shutdown_disables_when_enable_state_unreadable() {
        let mock = MockVcs::new();
        mock.fail_on(MockCall::GetEnableState, ErrorCode(0x1234));
        let mut session = session(&mock);
        session.initialize().unwrap();
        assert!(matches!(
            session.enable(),
            Err(EposError::HardwareCallFailed(_))
        ));
        assert!(mock.is_enabled());

        session.shutdown().unwrap();
        assert_eq!(mock.call_count(MockCall::SetDisableState), 1);
        assert!(!mock.is_enabled());
        assert!(!mock.is_open());
    }

    #[test]
    fn test_shutdown_skips_disable_when_enable_never_issued() {
        let mock = MockVcs::new();
        mock.set_device_errors(1);
        let mut session = session(&mock);
        session.initialize().unwrap();
        assert!(session.enable().is_err());

        session.shutdown().unwrap();
        assert_eq!(mock.call_count(MockCall::SetDisableState), 0);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
    }

    #[test]
    fn test_disable_requires_confirmation() {
        let mock = MockVcs::new();
        mock.set_disable_takes_effect(false);
        let mut session = session(&mock);
        session.initialize().unwrap();
        session.enable().unwrap();

        assert_eq!(
            session.disable(),
            Err(EposError::StateNotConfirmed { operation: "disable" })
        );
        assert_eq!(mock.call_count(MockCall::GetDisableState), 1);
        assert_eq!(session.stage(), LifecycleStage::Enabled);

        // 去使能未确认时仍然关闭连接
        assert_eq!(
            session.shutdown(),
            Err(EposError::StateNotConfirmed { operation: "disable" })
        );
        assert_eq!(mock.call_count(MockCall::SetDisableState), 2);
        assert_eq!(mock.call_count(MockCall::CloseDevice), 1);
        assert_eq!(session.stage(), LifecycleStage::Closed);
    }

    #[test]
    fn test_set_protocol_stack_guard() {
        let mock = MockVcs::new();
        let mut session = session(&mock);

        assert!(matches!(
            session.set_protocol_stack(500_000, 250),
            Err(EposError::InvalidState {
                attempted: "set protocol stack",
                current: LifecycleStage::Unopened
            })
        ));
        assert!(mock.hardware_calls().is_empty());

        session.open().unwrap();
        session.set_protocol_stack(500_000, 250).unwrap();
        assert_eq!(mock.protocol_stack_settings(), Some((500_000, 250)));
        assert_eq!(
            session.protocol_stack(),
            ProtocolStackSettings::new(500_000, 250)
        );

        session.clear_fault().unwrap();
        session.enable().unwrap();
        mock.clear_calls();
        assert_eq!(
            session.set_protocol_stack(250_000, 100),
            Err(EposError::InvalidState {
                attempted: "set protocol stack",
                current: LifecycleStage::Enabled
            })
        );
        assert!(mock.hardware_calls().is_empty());
        assert_eq!(mock.protocol_stack_settings(), Some((500_000, 250)));
    }
}
