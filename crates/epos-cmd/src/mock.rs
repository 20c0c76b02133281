//! Mock 命令库后端
//!
//! 纯内存实现的 [`VcsApi`]，用于无硬件测试。
//!
//! `MockVcs` 可克隆，所有克隆共享同一份状态：测试代码保留一个克隆用于
//! 编排场景（注入失败、设置候选列表）和检查调用记录，另一个交给被测对象。

use std::collections::HashMap;
use std::sync::Arc;

use epos_protocol::ErrorCode;
use parking_lot::Mutex;

use crate::{CallResult, Handle, NodeId, Selection, VcsApi};

/// 命令标识，用于注入失败和检查调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    DeviceNameSelection,
    ProtocolStackNameSelection,
    InterfaceNameSelection,
    PortNameSelection,
    BaudrateSelection,
    OpenDevice,
    CloseDevice,
    SetProtocolStackSettings,
    ClearFault,
    SetEnableState,
    GetEnableState,
    SetDisableState,
    GetDisableState,
    GetNbOfDeviceError,
    SetOperationMode,
    GetOperationMode,
    SetPositionProfile,
    GetPositionProfile,
    MoveToPosition,
    WaitForTargetReached,
    GetPositionIs,
    GetSensorType,
    GetIncEncoderParameter,
    GetErrorInfo,
}

impl MockCall {
    /// 命令库函数名
    pub fn command_name(self) -> &'static str {
        match self {
            MockCall::DeviceNameSelection => "VCS_GetDeviceNameSelection",
            MockCall::ProtocolStackNameSelection => "VCS_GetProtocolStackNameSelection",
            MockCall::InterfaceNameSelection => "VCS_GetInterfaceNameSelection",
            MockCall::PortNameSelection => "VCS_GetPortNameSelection",
            MockCall::BaudrateSelection => "VCS_GetBaudrateSelection",
            MockCall::OpenDevice => "VCS_OpenDevice",
            MockCall::CloseDevice => "VCS_CloseDevice",
            MockCall::SetProtocolStackSettings => "VCS_SetProtocolStackSettings",
            MockCall::ClearFault => "VCS_ClearFault",
            MockCall::SetEnableState => "VCS_SetEnableState",
            MockCall::GetEnableState => "VCS_GetEnableState",
            MockCall::SetDisableState => "VCS_SetDisableState",
            MockCall::GetDisableState => "VCS_GetDisableState",
            MockCall::GetNbOfDeviceError => "VCS_GetNbOfDeviceError",
            MockCall::SetOperationMode => "VCS_SetOperationMode",
            MockCall::GetOperationMode => "VCS_GetOperationMode",
            MockCall::SetPositionProfile => "VCS_SetPositionProfile",
            MockCall::GetPositionProfile => "VCS_GetPositionProfile",
            MockCall::MoveToPosition => "VCS_MoveToPosition",
            MockCall::WaitForTargetReached => "VCS_WaitForTargetReached",
            MockCall::GetPositionIs => "VCS_GetPositionIs",
            MockCall::GetSensorType => "VCS_GetSensorType",
            MockCall::GetIncEncoderParameter => "VCS_GetIncEncoderParameter",
            MockCall::GetErrorInfo => "VCS_GetErrorInfo",
        }
    }

    /// 是否为硬件命令（错误描述查询不算）
    pub fn is_hardware_command(self) -> bool {
        self != MockCall::GetErrorInfo
    }
}

/// 一次已接受的运动指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockMove {
    pub target: i32,
    pub absolute: bool,
    pub immediately: bool,
}

#[derive(Debug)]
struct MockState {
    devices: Vec<String>,
    protocols: Vec<String>,
    interfaces: Vec<String>,
    ports: Vec<String>,
    baudrates: Vec<u32>,
    cursors: HashMap<MockCall, usize>,
    endless_selection: bool,

    next_handle: usize,
    open: bool,
    protocol_stack: Option<(u32, u32)>,

    device_errors: u8,
    enabled: bool,
    enable_takes_effect: bool,
    disable_takes_effect: bool,

    operation_mode: i8,
    profile: (u32, u32, u32),
    position: i32,
    target_reached: bool,
    sensor_type: u16,
    encoder: (u32, bool),

    failures: HashMap<MockCall, ErrorCode>,
    descriptions: HashMap<u32, String>,
    calls: Vec<MockCall>,
    moves: Vec<MockMove>,
    waits: Vec<u32>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            devices: vec!["EPOS4".to_string()],
            protocols: vec!["MAXON SERIAL V2".to_string(), "CANopen".to_string()],
            interfaces: vec!["USB".to_string()],
            ports: vec!["USB0".to_string()],
            baudrates: vec![1_000_000],
            cursors: HashMap::new(),
            endless_selection: false,
            next_handle: 0x1,
            open: false,
            protocol_stack: None,
            device_errors: 0,
            enabled: false,
            enable_takes_effect: true,
            disable_takes_effect: true,
            operation_mode: 1,
            profile: (0, 0, 0),
            position: 0,
            target_reached: true,
            sensor_type: 1,
            encoder: (1024, false),
            failures: HashMap::new(),
            descriptions: HashMap::new(),
            calls: Vec::new(),
            moves: Vec::new(),
            waits: Vec::new(),
        }
    }
}

impl MockState {
    /// 记录调用；若注入了失败则返回对应错误码
    fn record(&mut self, call: MockCall) -> CallResult<()> {
        self.calls.push(call);
        match self.failures.get(&call) {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }

    fn select<T: Clone>(
        cursors: &mut HashMap<MockCall, usize>,
        endless: bool,
        call: MockCall,
        items: &[T],
        start: bool,
        empty: T,
    ) -> Selection<T> {
        let cursor = cursors.entry(call).or_insert(0);
        if start {
            *cursor = 0;
        }
        let index = *cursor;
        *cursor += 1;

        if endless {
            let value = match items.len() {
                0 => empty,
                len => items[index % len].clone(),
            };
            return Selection::new(value, false);
        }
        let value = items.get(index).cloned().unwrap_or(empty);
        Selection::new(value, index + 1 >= items.len())
    }
}

fn bounded(text: &str, max_len: u16) -> String {
    text.chars()
        .take(usize::from(max_len.saturating_sub(1)))
        .collect()
}

/// 内存模拟的命令库
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    state: Arc<Mutex<MockState>>,
}

impl MockVcs {
    /// 创建默认场景：单个 EPOS4，经 USB0 连接，无设备错误
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== 场景编排 ====================

    pub fn set_devices(&self, names: &[&str]) {
        self.state.lock().devices = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_protocols(&self, names: &[&str]) {
        self.state.lock().protocols = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_interfaces(&self, names: &[&str]) {
        self.state.lock().interfaces = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_ports(&self, names: &[&str]) {
        self.state.lock().ports = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_baudrates(&self, baudrates: &[u32]) {
        self.state.lock().baudrates = baudrates.to_vec();
    }

    /// 枚举永不报告结束（用于验证调用方的上限保护）
    pub fn set_endless_selection(&self, endless: bool) {
        self.state.lock().endless_selection = endless;
    }

    /// 下一次打开设备返回的原始句柄（0 模拟"打开失败但无错误码"）
    pub fn set_next_handle(&self, raw: usize) {
        self.state.lock().next_handle = raw;
    }

    pub fn set_device_errors(&self, count: u8) {
        self.state.lock().device_errors = count;
    }

    /// 使能命令是否真正生效（`false` 时复查使能状态仍为未使能）
    pub fn set_enable_takes_effect(&self, takes_effect: bool) {
        self.state.lock().enable_takes_effect = takes_effect;
    }

    pub fn set_disable_takes_effect(&self, takes_effect: bool) {
        self.state.lock().disable_takes_effect = takes_effect;
    }

    /// 到位等待是否成功（`false` 时返回超时错误码）
    pub fn set_target_reached(&self, reached: bool) {
        self.state.lock().target_reached = reached;
    }

    pub fn set_position(&self, position: i32) {
        self.state.lock().position = position;
    }

    /// 直接设置设备侧的操作模式原始编码
    pub fn set_operation_mode_raw(&self, mode: i8) {
        self.state.lock().operation_mode = mode;
    }

    pub fn set_sensor_type(&self, sensor: u16) {
        self.state.lock().sensor_type = sensor;
    }

    pub fn set_encoder_parameters(&self, resolution: u32, inverted_polarity: bool) {
        self.state.lock().encoder = (resolution, inverted_polarity);
    }

    /// 注入失败：之后每次调用 `call` 都返回 `code`，直到清除
    pub fn fail_on(&self, call: MockCall, code: ErrorCode) {
        self.state.lock().failures.insert(call, code);
    }

    pub fn clear_failure(&self, call: MockCall) {
        self.state.lock().failures.remove(&call);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// 设置 `VCS_GetErrorInfo` 对某个错误码返回的描述
    pub fn set_error_description(&self, code: ErrorCode, description: &str) {
        self.state
            .lock()
            .descriptions
            .insert(code.value(), description.to_string());
    }

    // ==================== 检查 ====================

    /// 全部调用记录（按顺序）
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    /// 硬件命令调用记录（不含错误描述查询）
    pub fn hardware_calls(&self) -> Vec<MockCall> {
        self.state
            .lock()
            .calls
            .iter()
            .copied()
            .filter(|call| call.is_hardware_command())
            .collect()
    }

    pub fn call_count(&self, call: MockCall) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// 已接受的运动指令
    pub fn moves(&self) -> Vec<MockMove> {
        self.state.lock().moves.clone()
    }

    /// 每次到位等待使用的超时
    pub fn waits(&self) -> Vec<u32> {
        self.state.lock().waits.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn operation_mode_raw(&self) -> i8 {
        self.state.lock().operation_mode
    }

    pub fn position(&self) -> i32 {
        self.state.lock().position
    }

    pub fn profile(&self) -> (u32, u32, u32) {
        self.state.lock().profile
    }

    /// 最近一次设置的协议栈参数 `(baudrate, timeout_ms)`
    pub fn protocol_stack_settings(&self) -> Option<(u32, u32)> {
        self.state.lock().protocol_stack
    }
}

impl VcsApi for MockVcs {
    fn device_name_selection(&mut self, start: bool, max_len: u16) -> CallResult<Selection<String>> {
        let mut state = self.state.lock();
        state.record(MockCall::DeviceNameSelection)?;
        let state = &mut *state;
        let selection = MockState::select(
            &mut state.cursors,
            state.endless_selection,
            MockCall::DeviceNameSelection,
            &state.devices,
            start,
            String::new(),
        );
        Ok(Selection::new(bounded(&selection.value, max_len), selection.end_of_selection))
    }

    fn protocol_stack_name_selection(
        &mut self,
        _device: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let mut state = self.state.lock();
        state.record(MockCall::ProtocolStackNameSelection)?;
        let state = &mut *state;
        let selection = MockState::select(
            &mut state.cursors,
            state.endless_selection,
            MockCall::ProtocolStackNameSelection,
            &state.protocols,
            start,
            String::new(),
        );
        Ok(Selection::new(bounded(&selection.value, max_len), selection.end_of_selection))
    }

    fn interface_name_selection(
        &mut self,
        _device: &str,
        _protocol_stack: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let mut state = self.state.lock();
        state.record(MockCall::InterfaceNameSelection)?;
        let state = &mut *state;
        let selection = MockState::select(
            &mut state.cursors,
            state.endless_selection,
            MockCall::InterfaceNameSelection,
            &state.interfaces,
            start,
            String::new(),
        );
        Ok(Selection::new(bounded(&selection.value, max_len), selection.end_of_selection))
    }

    fn port_name_selection(
        &mut self,
        _device: &str,
        _protocol_stack: &str,
        _interface: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let mut state = self.state.lock();
        state.record(MockCall::PortNameSelection)?;
        let state = &mut *state;
        let selection = MockState::select(
            &mut state.cursors,
            state.endless_selection,
            MockCall::PortNameSelection,
            &state.ports,
            start,
            String::new(),
        );
        Ok(Selection::new(bounded(&selection.value, max_len), selection.end_of_selection))
    }

    fn baudrate_selection(
        &mut self,
        _device: &str,
        _protocol_stack: &str,
        _interface: &str,
        _port: &str,
        start: bool,
    ) -> CallResult<Selection<u32>> {
        let mut state = self.state.lock();
        state.record(MockCall::BaudrateSelection)?;
        let state = &mut *state;
        Ok(MockState::select(
            &mut state.cursors,
            state.endless_selection,
            MockCall::BaudrateSelection,
            &state.baudrates,
            start,
            0,
        ))
    }

    fn open_device(
        &mut self,
        _device: &str,
        _protocol_stack: &str,
        _interface: &str,
        _port: &str,
    ) -> CallResult<usize> {
        let mut state = self.state.lock();
        state.record(MockCall::OpenDevice)?;
        state.open = state.next_handle != 0;
        Ok(state.next_handle)
    }

    fn close_device(&mut self, _handle: Handle) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::CloseDevice)?;
        state.open = false;
        state.enabled = false;
        Ok(())
    }

    fn set_protocol_stack_settings(
        &mut self,
        _handle: Handle,
        baudrate: u32,
        timeout_ms: u32,
    ) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::SetProtocolStackSettings)?;
        state.protocol_stack = Some((baudrate, timeout_ms));
        Ok(())
    }

    fn clear_fault(&mut self, _handle: Handle, _node: NodeId) -> CallResult<()> {
        self.state.lock().record(MockCall::ClearFault)
    }

    fn set_enable_state(&mut self, _handle: Handle, _node: NodeId) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::SetEnableState)?;
        if state.enable_takes_effect {
            state.enabled = true;
        }
        Ok(())
    }

    fn get_enable_state(&mut self, _handle: Handle, _node: NodeId) -> CallResult<bool> {
        let mut state = self.state.lock();
        state.record(MockCall::GetEnableState)?;
        Ok(state.enabled)
    }

    fn set_disable_state(&mut self, _handle: Handle, _node: NodeId) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::SetDisableState)?;
        if state.disable_takes_effect {
            state.enabled = false;
        }
        Ok(())
    }

    fn get_disable_state(&mut self, _handle: Handle, _node: NodeId) -> CallResult<bool> {
        let mut state = self.state.lock();
        state.record(MockCall::GetDisableState)?;
        Ok(!state.enabled)
    }

    fn get_nb_of_device_error(&mut self, _handle: Handle, _node: NodeId) -> CallResult<u8> {
        let mut state = self.state.lock();
        state.record(MockCall::GetNbOfDeviceError)?;
        Ok(state.device_errors)
    }

    fn set_operation_mode(&mut self, _handle: Handle, _node: NodeId, mode: i8) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::SetOperationMode)?;
        state.operation_mode = mode;
        Ok(())
    }

    fn get_operation_mode(&mut self, _handle: Handle, _node: NodeId) -> CallResult<i8> {
        let mut state = self.state.lock();
        state.record(MockCall::GetOperationMode)?;
        Ok(state.operation_mode)
    }

    fn set_position_profile(
        &mut self,
        _handle: Handle,
        _node: NodeId,
        velocity: u32,
        acceleration: u32,
        deceleration: u32,
    ) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::SetPositionProfile)?;
        state.profile = (velocity, acceleration, deceleration);
        Ok(())
    }

    fn get_position_profile(
        &mut self,
        _handle: Handle,
        _node: NodeId,
    ) -> CallResult<(u32, u32, u32)> {
        let mut state = self.state.lock();
        state.record(MockCall::GetPositionProfile)?;
        Ok(state.profile)
    }

    fn move_to_position(
        &mut self,
        _handle: Handle,
        _node: NodeId,
        target: i32,
        absolute: bool,
        immediately: bool,
    ) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::MoveToPosition)?;
        state.moves.push(MockMove {
            target,
            absolute,
            immediately,
        });
        if state.target_reached {
            state.position = if absolute {
                target
            } else {
                state.position.saturating_add(target)
            };
        }
        Ok(())
    }

    fn wait_for_target_reached(
        &mut self,
        _handle: Handle,
        _node: NodeId,
        timeout_ms: u32,
    ) -> CallResult<()> {
        let mut state = self.state.lock();
        state.record(MockCall::WaitForTargetReached)?;
        state.waits.push(timeout_ms);
        if state.target_reached {
            Ok(())
        } else {
            Err(ErrorCode::TIMEOUT)
        }
    }

    fn get_position_is(&mut self, _handle: Handle, _node: NodeId) -> CallResult<i32> {
        let mut state = self.state.lock();
        state.record(MockCall::GetPositionIs)?;
        Ok(state.position)
    }

    fn get_sensor_type(&mut self, _handle: Handle, _node: NodeId) -> CallResult<u16> {
        let mut state = self.state.lock();
        state.record(MockCall::GetSensorType)?;
        Ok(state.sensor_type)
    }

    fn get_inc_encoder_parameter(
        &mut self,
        _handle: Handle,
        _node: NodeId,
    ) -> CallResult<(u32, bool)> {
        let mut state = self.state.lock();
        state.record(MockCall::GetIncEncoderParameter)?;
        Ok(state.encoder)
    }

    fn get_error_info(&mut self, code: ErrorCode, max_len: u16) -> Option<String> {
        let mut state = self.state.lock();
        state.record(MockCall::GetErrorInfo).ok()?;
        state
            .descriptions
            .get(&code.value())
            .map(|text| bounded(text, max_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Handle {
        Handle::new(1).unwrap()
    }

    #[test]
    fn test_selection_walks_list_and_flags_end() {
        let mut mock = MockVcs::new();
        mock.set_ports(&["USB0", "USB1"]);

        let first = mock.port_name_selection("EPOS4", "MAXON SERIAL V2", "USB", true, 100).unwrap();
        assert_eq!(first, Selection::new("USB0".to_string(), false));
        let second = mock
            .port_name_selection("EPOS4", "MAXON SERIAL V2", "USB", false, 100)
            .unwrap();
        assert_eq!(second, Selection::new("USB1".to_string(), true));

        // start = true 重新开始
        let again = mock.port_name_selection("EPOS4", "MAXON SERIAL V2", "USB", true, 100).unwrap();
        assert_eq!(again.value, "USB0");
    }

    #[test]
    fn test_empty_selection_ends_immediately() {
        let mut mock = MockVcs::new();
        mock.set_devices(&[]);
        let selection = mock.device_name_selection(true, 100).unwrap();
        assert_eq!(selection.value, "");
        assert!(selection.end_of_selection);
    }

    #[test]
    fn test_injected_failure_is_recorded() {
        let mut mock = MockVcs::new();
        mock.fail_on(MockCall::ClearFault, ErrorCode(0x1234));
        assert_eq!(
            mock.clear_fault(handle(), NodeId::default()),
            Err(ErrorCode(0x1234))
        );
        mock.clear_failure(MockCall::ClearFault);
        assert_eq!(mock.clear_fault(handle(), NodeId::default()), Ok(()));
        assert_eq!(mock.call_count(MockCall::ClearFault), 2);
    }

    #[test]
    fn test_enable_toggle() {
        let mut mock = MockVcs::new();
        mock.set_enable_takes_effect(false);
        mock.set_enable_state(handle(), NodeId::default()).unwrap();
        assert!(!mock.get_enable_state(handle(), NodeId::default()).unwrap());

        mock.set_enable_takes_effect(true);
        mock.set_enable_state(handle(), NodeId::default()).unwrap();
        assert!(mock.get_enable_state(handle(), NodeId::default()).unwrap());
        assert!(!mock.get_disable_state(handle(), NodeId::default()).unwrap());
    }

    #[test]
    fn test_move_updates_position_when_reached() {
        let mut mock = MockVcs::new();
        mock.move_to_position(handle(), NodeId::default(), 500, true, true).unwrap();
        mock.move_to_position(handle(), NodeId::default(), -200, false, true).unwrap();
        assert_eq!(mock.position(), 300);
        assert_eq!(mock.moves().len(), 2);

        mock.set_target_reached(false);
        mock.move_to_position(handle(), NodeId::default(), 9000, true, true).unwrap();
        assert_eq!(mock.position(), 300);
        assert_eq!(
            mock.wait_for_target_reached(handle(), NodeId::default(), 1000),
            Err(ErrorCode::TIMEOUT)
        );
        assert_eq!(mock.waits(), vec![1000]);
    }

    #[test]
    fn test_error_info_bounded_and_optional() {
        let mut mock = MockVcs::new();
        assert_eq!(mock.get_error_info(ErrorCode(0x1234), 40), None);
        mock.set_error_description(ErrorCode(0x1234), "Some error");
        assert_eq!(
            mock.get_error_info(ErrorCode(0x1234), 40).as_deref(),
            Some("Some error")
        );
        assert_eq!(
            mock.get_error_info(ErrorCode(0x1234), 5).as_deref(),
            Some("Some")
        );
    }

    #[test]
    fn test_clones_share_state() {
        let observer = MockVcs::new();
        let mut device = observer.clone();
        device.open_device("EPOS4", "MAXON SERIAL V2", "USB", "USB0").unwrap();
        assert!(observer.is_open());
        assert_eq!(observer.hardware_calls(), vec![MockCall::OpenDevice]);
        assert_eq!(MockCall::OpenDevice.command_name(), "VCS_OpenDevice");
    }
}
