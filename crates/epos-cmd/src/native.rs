//! 原生命令库后端
//!
//! 运行时通过 `libloading` 加载 `libEposCmd.so`，在加载时一次性解析全部
//! `VCS_*` 符号；缺少任何符号都会导致加载失败，而不是在第一次调用时才失败。
//!
//! 命令库的 C 约定：返回 `BOOL`（非 0 为成功），错误码写入最后一个
//! `DWORD*` 输出参数。本模块把它转换为 [`CallResult`]。

use std::ffi::{CStr, CString, c_char, c_int, c_long, c_void};
use std::path::Path;

use epos_protocol::ErrorCode;
use libloading::Library;

use crate::{CallResult, Handle, LibraryError, NodeId, Selection, VcsApi};

/// 默认库文件名
pub const DEFAULT_LIBRARY_NAME: &str = "libEposCmd.so";

type Bool = c_int;
type Word = u16;
type Dword = u32;
type RawHandle = *mut c_void;

type NameSelectionFn =
    unsafe extern "C" fn(Bool, *mut c_char, Word, *mut Bool, *mut Dword) -> Bool;
type ProtocolStackSelectionFn =
    unsafe extern "C" fn(*mut c_char, Bool, *mut c_char, Word, *mut Bool, *mut Dword) -> Bool;
type InterfaceSelectionFn = unsafe extern "C" fn(
    *mut c_char,
    *mut c_char,
    Bool,
    *mut c_char,
    Word,
    *mut Bool,
    *mut Dword,
) -> Bool;
type PortSelectionFn = unsafe extern "C" fn(
    *mut c_char,
    *mut c_char,
    *mut c_char,
    Bool,
    *mut c_char,
    Word,
    *mut Bool,
    *mut Dword,
) -> Bool;
type BaudrateSelectionFn = unsafe extern "C" fn(
    *mut c_char,
    *mut c_char,
    *mut c_char,
    *mut c_char,
    Bool,
    *mut Dword,
    *mut Bool,
    *mut Dword,
) -> Bool;
type OpenDeviceFn = unsafe extern "C" fn(
    *mut c_char,
    *mut c_char,
    *mut c_char,
    *mut c_char,
    *mut Dword,
) -> RawHandle;
type CloseDeviceFn = unsafe extern "C" fn(RawHandle, *mut Dword) -> Bool;
type ProtocolStackSettingsFn = unsafe extern "C" fn(RawHandle, Dword, Dword, *mut Dword) -> Bool;
type NodeCommandFn = unsafe extern "C" fn(RawHandle, Word, *mut Dword) -> Bool;
type NodeQueryBoolFn = unsafe extern "C" fn(RawHandle, Word, *mut Bool, *mut Dword) -> Bool;
type DeviceErrorCountFn = unsafe extern "C" fn(RawHandle, Word, *mut u8, *mut Dword) -> Bool;
type SetOperationModeFn = unsafe extern "C" fn(RawHandle, Word, i8, *mut Dword) -> Bool;
type GetOperationModeFn = unsafe extern "C" fn(RawHandle, Word, *mut i8, *mut Dword) -> Bool;
type SetPositionProfileFn =
    unsafe extern "C" fn(RawHandle, Word, Dword, Dword, Dword, *mut Dword) -> Bool;
type GetPositionProfileFn = unsafe extern "C" fn(
    RawHandle,
    Word,
    *mut Dword,
    *mut Dword,
    *mut Dword,
    *mut Dword,
) -> Bool;
type MoveToPositionFn = unsafe extern "C" fn(RawHandle, Word, c_long, Bool, Bool, *mut Dword) -> Bool;
type WaitForTargetReachedFn = unsafe extern "C" fn(RawHandle, Word, Dword, *mut Dword) -> Bool;
type GetPositionIsFn = unsafe extern "C" fn(RawHandle, Word, *mut c_long, *mut Dword) -> Bool;
type GetSensorTypeFn = unsafe extern "C" fn(RawHandle, Word, *mut Word, *mut Dword) -> Bool;
type GetIncEncoderParameterFn =
    unsafe extern "C" fn(RawHandle, Word, *mut Dword, *mut Bool, *mut Dword) -> Bool;
type GetErrorInfoFn = unsafe extern "C" fn(Dword, *mut c_char, Word) -> Bool;

/// 已解析的函数指针表
struct Symbols {
    device_name_selection: NameSelectionFn,
    protocol_stack_name_selection: ProtocolStackSelectionFn,
    interface_name_selection: InterfaceSelectionFn,
    port_name_selection: PortSelectionFn,
    baudrate_selection: BaudrateSelectionFn,
    open_device: OpenDeviceFn,
    close_device: CloseDeviceFn,
    set_protocol_stack_settings: ProtocolStackSettingsFn,
    clear_fault: NodeCommandFn,
    set_enable_state: NodeCommandFn,
    get_enable_state: NodeQueryBoolFn,
    set_disable_state: NodeCommandFn,
    get_disable_state: NodeQueryBoolFn,
    get_nb_of_device_error: DeviceErrorCountFn,
    set_operation_mode: SetOperationModeFn,
    get_operation_mode: GetOperationModeFn,
    set_position_profile: SetPositionProfileFn,
    get_position_profile: GetPositionProfileFn,
    move_to_position: MoveToPositionFn,
    wait_for_target_reached: WaitForTargetReachedFn,
    get_position_is: GetPositionIsFn,
    get_sensor_type: GetSensorTypeFn,
    get_inc_encoder_parameter: GetIncEncoderParameterFn,
    get_error_info: GetErrorInfoFn,
}

macro_rules! resolve {
    ($library:expr, $ty:ty, $name:literal) => {{
        // SAFETY: 函数签名与命令库头文件一致
        let symbol = unsafe { $library.get::<$ty>($name.as_bytes()) }.map_err(|e| {
            LibraryError::MissingSymbol {
                symbol: $name,
                reason: e.to_string(),
            }
        })?;
        *symbol
    }};
}

impl Symbols {
    fn resolve(library: &Library) -> Result<Self, LibraryError> {
        Ok(Self {
            device_name_selection: resolve!(library, NameSelectionFn, "VCS_GetDeviceNameSelection"),
            protocol_stack_name_selection: resolve!(
                library,
                ProtocolStackSelectionFn,
                "VCS_GetProtocolStackNameSelection"
            ),
            interface_name_selection: resolve!(
                library,
                InterfaceSelectionFn,
                "VCS_GetInterfaceNameSelection"
            ),
            port_name_selection: resolve!(library, PortSelectionFn, "VCS_GetPortNameSelection"),
            baudrate_selection: resolve!(library, BaudrateSelectionFn, "VCS_GetBaudrateSelection"),
            open_device: resolve!(library, OpenDeviceFn, "VCS_OpenDevice"),
            close_device: resolve!(library, CloseDeviceFn, "VCS_CloseDevice"),
            set_protocol_stack_settings: resolve!(
                library,
                ProtocolStackSettingsFn,
                "VCS_SetProtocolStackSettings"
            ),
            clear_fault: resolve!(library, NodeCommandFn, "VCS_ClearFault"),
            set_enable_state: resolve!(library, NodeCommandFn, "VCS_SetEnableState"),
            get_enable_state: resolve!(library, NodeQueryBoolFn, "VCS_GetEnableState"),
            set_disable_state: resolve!(library, NodeCommandFn, "VCS_SetDisableState"),
            get_disable_state: resolve!(library, NodeQueryBoolFn, "VCS_GetDisableState"),
            get_nb_of_device_error: resolve!(library, DeviceErrorCountFn, "VCS_GetNbOfDeviceError"),
            set_operation_mode: resolve!(library, SetOperationModeFn, "VCS_SetOperationMode"),
            get_operation_mode: resolve!(library, GetOperationModeFn, "VCS_GetOperationMode"),
            set_position_profile: resolve!(library, SetPositionProfileFn, "VCS_SetPositionProfile"),
            get_position_profile: resolve!(library, GetPositionProfileFn, "VCS_GetPositionProfile"),
            move_to_position: resolve!(library, MoveToPositionFn, "VCS_MoveToPosition"),
            wait_for_target_reached: resolve!(
                library,
                WaitForTargetReachedFn,
                "VCS_WaitForTargetReached"
            ),
            get_position_is: resolve!(library, GetPositionIsFn, "VCS_GetPositionIs"),
            get_sensor_type: resolve!(library, GetSensorTypeFn, "VCS_GetSensorType"),
            get_inc_encoder_parameter: resolve!(
                library,
                GetIncEncoderParameterFn,
                "VCS_GetIncEncoderParameter"
            ),
            get_error_info: resolve!(library, GetErrorInfoFn, "VCS_GetErrorInfo"),
        })
    }
}

/// 原生命令库
///
/// 持有动态库本身，保证函数指针在 `VcsLibrary` 存活期间有效。
pub struct VcsLibrary {
    symbols: Symbols,
    path: String,
    // 必须最后释放
    _library: Library,
}

impl VcsLibrary {
    /// 按默认名称（`libEposCmd.so`）加载，由动态链接器搜索路径
    pub fn load() -> Result<Self, LibraryError> {
        Self::load_from(DEFAULT_LIBRARY_NAME)
    }

    /// 从指定路径加载
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        // SAFETY: 加载命令库会执行其初始化代码，这是使用厂商库的前提
        let library = unsafe {
            Library::new(path).map_err(|e| LibraryError::Load {
                path: display.clone(),
                reason: e.to_string(),
            })?
        };
        let symbols = Symbols::resolve(&library)?;

        Ok(Self {
            symbols,
            path: display,
            _library: library,
        })
    }

    /// 库文件路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for VcsLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcsLibrary").field("path", &self.path).finish()
    }
}

/// BOOL + 错误码 → CallResult
///
/// 命令库偶尔在失败时不写错误码，此时报告为内部错误。
fn check(ok: Bool, error_code: Dword) -> CallResult<()> {
    if ok != 0 {
        Ok(())
    } else if error_code == 0 {
        Err(ErrorCode::INTERNAL_ERROR)
    } else {
        Err(ErrorCode(error_code))
    }
}

fn c_string(value: &str) -> CallResult<CString> {
    CString::new(value).map_err(|_| ErrorCode::BAD_PARAMETER)
}

fn raw(handle: Handle) -> RawHandle {
    handle.raw() as RawHandle
}

fn c_bool(value: bool) -> Bool {
    Bool::from(value)
}

/// 读取以 NUL 结尾的定长缓冲区；没有 NUL 时取整个缓冲区
fn read_buffer(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(text) => text.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}

fn string_buffer(max_len: u16) -> Vec<u8> {
    vec![0u8; usize::from(max_len.max(1))]
}

impl VcsApi for VcsLibrary {
    fn device_name_selection(&mut self, start: bool, max_len: u16) -> CallResult<Selection<String>> {
        let mut buffer = string_buffer(max_len);
        let mut end: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: buffer 长度不小于 max_len；C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.device_name_selection)(
                c_bool(start),
                buffer.as_mut_ptr().cast(),
                max_len,
                &mut end,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(Selection::new(read_buffer(&buffer), end != 0))
    }

    fn protocol_stack_name_selection(
        &mut self,
        device: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let device = c_string(device)?;
        let mut buffer = string_buffer(max_len);
        let mut end: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: buffer 长度不小于 max_len；C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.protocol_stack_name_selection)(
                device.as_ptr().cast_mut(),
                c_bool(start),
                buffer.as_mut_ptr().cast(),
                max_len,
                &mut end,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(Selection::new(read_buffer(&buffer), end != 0))
    }

    fn interface_name_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let device = c_string(device)?;
        let protocol_stack = c_string(protocol_stack)?;
        let mut buffer = string_buffer(max_len);
        let mut end: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: buffer 长度不小于 max_len；C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.interface_name_selection)(
                device.as_ptr().cast_mut(),
                protocol_stack.as_ptr().cast_mut(),
                c_bool(start),
                buffer.as_mut_ptr().cast(),
                max_len,
                &mut end,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(Selection::new(read_buffer(&buffer), end != 0))
    }

    fn port_name_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        start: bool,
        max_len: u16,
    ) -> CallResult<Selection<String>> {
        let device = c_string(device)?;
        let protocol_stack = c_string(protocol_stack)?;
        let interface = c_string(interface)?;
        let mut buffer = string_buffer(max_len);
        let mut end: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: buffer 长度不小于 max_len；C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.port_name_selection)(
                device.as_ptr().cast_mut(),
                protocol_stack.as_ptr().cast_mut(),
                interface.as_ptr().cast_mut(),
                c_bool(start),
                buffer.as_mut_ptr().cast(),
                max_len,
                &mut end,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(Selection::new(read_buffer(&buffer), end != 0))
    }

    fn baudrate_selection(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        port: &str,
        start: bool,
    ) -> CallResult<Selection<u32>> {
        let device = c_string(device)?;
        let protocol_stack = c_string(protocol_stack)?;
        let interface = c_string(interface)?;
        let port = c_string(port)?;
        let mut baudrate: Dword = 0;
        let mut end: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.baudrate_selection)(
                device.as_ptr().cast_mut(),
                protocol_stack.as_ptr().cast_mut(),
                interface.as_ptr().cast_mut(),
                port.as_ptr().cast_mut(),
                c_bool(start),
                &mut baudrate,
                &mut end,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(Selection::new(baudrate, end != 0))
    }

    fn open_device(
        &mut self,
        device: &str,
        protocol_stack: &str,
        interface: &str,
        port: &str,
    ) -> CallResult<usize> {
        let device = c_string(device)?;
        let protocol_stack = c_string(protocol_stack)?;
        let interface = c_string(interface)?;
        let port = c_string(port)?;
        let mut error_code: Dword = 0;
        // SAFETY: C 字符串和输出参数在调用期间有效；函数指针随 _library 存活
        let handle = unsafe {
            (self.symbols.open_device)(
                device.as_ptr().cast_mut(),
                protocol_stack.as_ptr().cast_mut(),
                interface.as_ptr().cast_mut(),
                port.as_ptr().cast_mut(),
                &mut error_code,
            )
        };
        if handle.is_null() && error_code != 0 {
            return Err(ErrorCode(error_code));
        }
        Ok(handle as usize)
    }

    fn close_device(&mut self, handle: Handle) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe { (self.symbols.close_device)(raw(handle), &mut error_code) };
        check(ok, error_code)
    }

    fn set_protocol_stack_settings(
        &mut self,
        handle: Handle,
        baudrate: u32,
        timeout_ms: u32,
    ) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.set_protocol_stack_settings)(
                raw(handle),
                baudrate,
                timeout_ms,
                &mut error_code,
            )
        };
        check(ok, error_code)
    }

    fn clear_fault(&mut self, handle: Handle, node: NodeId) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe { (self.symbols.clear_fault)(raw(handle), node.get(), &mut error_code) };
        check(ok, error_code)
    }

    fn set_enable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok =
            unsafe { (self.symbols.set_enable_state)(raw(handle), node.get(), &mut error_code) };
        check(ok, error_code)
    }

    fn get_enable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<bool> {
        let mut enabled: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_enable_state)(raw(handle), node.get(), &mut enabled, &mut error_code)
        };
        check(ok, error_code)?;
        Ok(enabled != 0)
    }

    fn set_disable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok =
            unsafe { (self.symbols.set_disable_state)(raw(handle), node.get(), &mut error_code) };
        check(ok, error_code)
    }

    fn get_disable_state(&mut self, handle: Handle, node: NodeId) -> CallResult<bool> {
        let mut disabled: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_disable_state)(
                raw(handle),
                node.get(),
                &mut disabled,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(disabled != 0)
    }

    fn get_nb_of_device_error(&mut self, handle: Handle, node: NodeId) -> CallResult<u8> {
        let mut count: u8 = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_nb_of_device_error)(
                raw(handle),
                node.get(),
                &mut count,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok(count)
    }

    fn set_operation_mode(&mut self, handle: Handle, node: NodeId, mode: i8) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.set_operation_mode)(raw(handle), node.get(), mode, &mut error_code)
        };
        check(ok, error_code)
    }

    fn get_operation_mode(&mut self, handle: Handle, node: NodeId) -> CallResult<i8> {
        let mut mode: i8 = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_operation_mode)(raw(handle), node.get(), &mut mode, &mut error_code)
        };
        check(ok, error_code)?;
        Ok(mode)
    }

    fn set_position_profile(
        &mut self,
        handle: Handle,
        node: NodeId,
        velocity: u32,
        acceleration: u32,
        deceleration: u32,
    ) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.set_position_profile)(
                raw(handle),
                node.get(),
                velocity,
                acceleration,
                deceleration,
                &mut error_code,
            )
        };
        check(ok, error_code)
    }

    fn get_position_profile(
        &mut self,
        handle: Handle,
        node: NodeId,
    ) -> CallResult<(u32, u32, u32)> {
        let (mut velocity, mut acceleration, mut deceleration): (Dword, Dword, Dword) = (0, 0, 0);
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_position_profile)(
                raw(handle),
                node.get(),
                &mut velocity,
                &mut acceleration,
                &mut deceleration,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok((velocity, acceleration, deceleration))
    }

    fn move_to_position(
        &mut self,
        handle: Handle,
        node: NodeId,
        target: i32,
        absolute: bool,
        immediately: bool,
    ) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.move_to_position)(
                raw(handle),
                node.get(),
                c_long::from(target),
                c_bool(absolute),
                c_bool(immediately),
                &mut error_code,
            )
        };
        check(ok, error_code)
    }

    fn wait_for_target_reached(
        &mut self,
        handle: Handle,
        node: NodeId,
        timeout_ms: u32,
    ) -> CallResult<()> {
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.wait_for_target_reached)(
                raw(handle),
                node.get(),
                timeout_ms,
                &mut error_code,
            )
        };
        check(ok, error_code)
    }

    fn get_position_is(&mut self, handle: Handle, node: NodeId) -> CallResult<i32> {
        let mut position: c_long = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_position_is)(raw(handle), node.get(), &mut position, &mut error_code)
        };
        check(ok, error_code)?;
        // 位置寄存器为 32 位
        i32::try_from(position).map_err(|_| ErrorCode::INTERNAL_ERROR)
    }

    fn get_sensor_type(&mut self, handle: Handle, node: NodeId) -> CallResult<u16> {
        let mut sensor: Word = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_sensor_type)(raw(handle), node.get(), &mut sensor, &mut error_code)
        };
        check(ok, error_code)?;
        Ok(sensor)
    }

    fn get_inc_encoder_parameter(
        &mut self,
        handle: Handle,
        node: NodeId,
    ) -> CallResult<(u32, bool)> {
        let mut resolution: Dword = 0;
        let mut inverted: Bool = 0;
        let mut error_code: Dword = 0;
        // SAFETY: 句柄来自 VCS_OpenDevice；输出参数在调用期间有效；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_inc_encoder_parameter)(
                raw(handle),
                node.get(),
                &mut resolution,
                &mut inverted,
                &mut error_code,
            )
        };
        check(ok, error_code)?;
        Ok((resolution, inverted != 0))
    }

    fn get_error_info(&mut self, code: ErrorCode, max_len: u16) -> Option<String> {
        let mut buffer = string_buffer(max_len);
        // SAFETY: buffer 长度不小于 max_len；函数指针随 _library 存活
        let ok = unsafe {
            (self.symbols.get_error_info)(code.value(), buffer.as_mut_ptr().cast(), max_len)
        };
        if ok == 0 {
            return None;
        }
        // 最多 max_len - 1 个字符
        buffer.truncate(usize::from(max_len.saturating_sub(1)));
        Some(read_buffer(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_maps_bool_convention() {
        assert_eq!(check(1, 0), Ok(()));
        assert_eq!(check(0, 0x1234), Err(ErrorCode(0x1234)));
        assert_eq!(check(0, 0), Err(ErrorCode::INTERNAL_ERROR));
    }

    #[test]
    fn test_interior_nul_is_bad_parameter() {
        assert_eq!(c_string("US\0B").unwrap_err(), ErrorCode::BAD_PARAMETER);
        assert!(c_string("USB").is_ok());
    }

    #[test]
    fn test_read_buffer() {
        assert_eq!(read_buffer(b"USB0\0garbage"), "USB0");
        assert_eq!(read_buffer(b"full"), "full");
        assert_eq!(read_buffer(b"\0\0\0"), "");
    }

    #[test]
    fn test_load_missing_library_fails() {
        let err = VcsLibrary::load_from("/nonexistent/libEposCmd.so").unwrap_err();
        assert!(matches!(err, LibraryError::Load { .. }));
        assert!(err.to_string().contains("/nonexistent/libEposCmd.so"));
    }
}
