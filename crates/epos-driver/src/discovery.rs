//! 设备枚举
//!
//! 命令库的 `*Selection` 函数按"首次调用传 start = true，之后传 false，
//! 直到输出 end_of_selection"的协议逐项返回。这里用有界迭代器
//! [`SelectionIter`] 表达该协议，并在边界处一次性收集为 `Vec`。
//!
//! 即使命令库永不报告结束，迭代也会在 [`MAX_SELECTION_ITEMS`] 次调用后停止。

use epos_cmd::{CommandGateway, ErrorReport, Selection, VcsApi};
use epos_protocol::MAX_SELECTION_STR_LEN;
use tracing::{debug, trace, warn};

use crate::error::{EposError, Result};

/// 单次枚举的最大调用次数
pub const MAX_SELECTION_ITEMS: usize = 64;

/// 有界枚举迭代器
///
/// 每次 `next()` 执行一次枚举调用。调用失败时产出
/// [`EposError::DiscoveryFailed`] 并结束。
pub struct SelectionIter<T, F>
where
    F: FnMut(bool) -> std::result::Result<Selection<T>, ErrorReport>,
{
    selection: &'static str,
    step: F,
    calls: usize,
    limit: usize,
    finished: bool,
}

impl<T, F> SelectionIter<T, F>
where
    F: FnMut(bool) -> std::result::Result<Selection<T>, ErrorReport>,
{
    /// 创建迭代器，`step(start)` 执行一次枚举调用
    pub fn new(selection: &'static str, step: F) -> Self {
        Self::with_limit(selection, MAX_SELECTION_ITEMS, step)
    }

    /// 指定调用上限
    pub fn with_limit(selection: &'static str, limit: usize, step: F) -> Self {
        Self {
            selection,
            step,
            calls: 0,
            limit,
            finished: false,
        }
    }

    /// 已执行的调用次数
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl<T, F> Iterator for SelectionIter<T, F>
where
    F: FnMut(bool) -> std::result::Result<Selection<T>, ErrorReport>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.calls >= self.limit {
            warn!(
                selection = self.selection,
                limit = self.limit,
                "Selection did not report end of list, stopping"
            );
            self.finished = true;
            return None;
        }

        let start = self.calls == 0;
        self.calls += 1;
        match (self.step)(start) {
            Ok(Selection {
                value,
                end_of_selection,
            }) => {
                self.finished = end_of_selection;
                Some(Ok(value))
            },
            Err(report) => {
                self.finished = true;
                Some(Err(EposError::DiscoveryFailed {
                    selection: self.selection,
                    report: Some(report),
                }))
            },
        }
    }
}

/// 收集名称，跳过空条目
fn collect_names<F>(iter: SelectionIter<String, F>) -> Result<Vec<String>>
where
    F: FnMut(bool) -> std::result::Result<Selection<String>, ErrorReport>,
{
    let selection = iter.selection;
    let mut names = Vec::new();
    for name in iter {
        let name = name?;
        if name.is_empty() {
            continue;
        }
        trace!(selection, name = %name, "Discovered entry");
        names.push(name);
    }
    debug!(selection, count = names.len(), "Discovery finished");
    Ok(names)
}

/// 枚举设备名称
pub fn discover_devices<A: VcsApi>(gateway: &mut CommandGateway<A>) -> Result<Vec<String>> {
    collect_names(SelectionIter::new("device", |start| {
        gateway.invoke("VCS_GetDeviceNameSelection", |api| {
            api.device_name_selection(start, MAX_SELECTION_STR_LEN)
        })
    }))
}

/// 枚举设备支持的协议栈
pub fn discover_protocols<A: VcsApi>(
    gateway: &mut CommandGateway<A>,
    device: &str,
) -> Result<Vec<String>> {
    collect_names(SelectionIter::new("protocol stack", |start| {
        gateway.invoke("VCS_GetProtocolStackNameSelection", |api| {
            api.protocol_stack_name_selection(device, start, MAX_SELECTION_STR_LEN)
        })
    }))
}

/// 枚举协议栈可用的接口
pub fn discover_interfaces<A: VcsApi>(
    gateway: &mut CommandGateway<A>,
    device: &str,
    protocol_stack: &str,
) -> Result<Vec<String>> {
    collect_names(SelectionIter::new("interface", |start| {
        gateway.invoke("VCS_GetInterfaceNameSelection", |api| {
            api.interface_name_selection(device, protocol_stack, start, MAX_SELECTION_STR_LEN)
        })
    }))
}

/// 枚举接口下的端口
pub fn discover_ports<A: VcsApi>(
    gateway: &mut CommandGateway<A>,
    device: &str,
    protocol_stack: &str,
    interface: &str,
) -> Result<Vec<String>> {
    collect_names(SelectionIter::new("port", |start| {
        gateway.invoke("VCS_GetPortNameSelection", |api| {
            api.port_name_selection(device, protocol_stack, interface, start, MAX_SELECTION_STR_LEN)
        })
    }))
}

/// 枚举端口支持的波特率（跳过 0）
pub fn discover_baudrates<A: VcsApi>(
    gateway: &mut CommandGateway<A>,
    device: &str,
    protocol_stack: &str,
    interface: &str,
    port: &str,
) -> Result<Vec<u32>> {
    let iter = SelectionIter::new("baudrate", |start| {
        gateway.invoke("VCS_GetBaudrateSelection", |api| {
            api.baudrate_selection(device, protocol_stack, interface, port, start)
        })
    });
    let mut baudrates = Vec::new();
    for baudrate in iter {
        let baudrate = baudrate?;
        if baudrate != 0 {
            baudrates.push(baudrate);
        }
    }
    debug!(count = baudrates.len(), "Baudrate discovery finished");
    Ok(baudrates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epos_cmd::{MockCall, MockVcs};
    use epos_protocol::ErrorCode;

    #[test]
    fn test_terminates_when_end_flag_turns_true() {
        let mut polled = 0;
        let iter = SelectionIter::new("device", |start| {
            assert_eq!(start, polled == 0);
            polled += 1;
            Ok(Selection::new(format!("EPOS4-{}", polled), polled == 3))
        });
        let items: Vec<String> = iter.collect::<Result<_>>().unwrap();
        assert_eq!(items, vec!["EPOS4-1", "EPOS4-2", "EPOS4-3"]);
        assert_eq!(polled, 3);
    }

    #[test]
    fn test_stops_at_limit_without_end_flag() {
        let mut iter = SelectionIter::new("port", |_start| {
            Ok(Selection::new("USB0".to_string(), false))
        });
        let count = iter.by_ref().count();
        assert_eq!(count, MAX_SELECTION_ITEMS);
        assert_eq!(iter.calls(), MAX_SELECTION_ITEMS);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_error_ends_iteration() {
        let mut iter = SelectionIter::<String, _>::new("interface", |_start| {
            Err(ErrorReport::new(
                "VCS_GetInterfaceNameSelection",
                ErrorCode(0x1234),
                "Some error",
            ))
        });
        let first = iter.next().unwrap();
        assert!(matches!(
            first,
            Err(EposError::DiscoveryFailed {
                selection: "interface",
                report: Some(_)
            })
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_discover_through_gateway() {
        let mock = MockVcs::new();
        mock.set_protocols(&["MAXON SERIAL V2", "", "CANopen"]);
        let mut gateway = CommandGateway::new(mock.clone());

        let devices = discover_devices(&mut gateway).unwrap();
        assert_eq!(devices, vec!["EPOS4"]);

        let protocols = discover_protocols(&mut gateway, "EPOS4").unwrap();
        assert_eq!(protocols, vec!["MAXON SERIAL V2", "CANopen"]);
        assert_eq!(mock.call_count(MockCall::ProtocolStackNameSelection), 3);

        let baudrates =
            discover_baudrates(&mut gateway, "EPOS4", "MAXON SERIAL V2", "USB", "USB0").unwrap();
        assert_eq!(baudrates, vec![1_000_000]);
    }

    #[test]
    fn test_empty_list_is_valid() {
        let mock = MockVcs::new();
        mock.set_ports(&[]);
        let mut gateway = CommandGateway::new(mock);
        let ports = discover_ports(&mut gateway, "EPOS4", "MAXON SERIAL V2", "USB").unwrap();
        assert!(ports.is_empty());
    }

    #[test]
    fn test_endless_backend_is_bounded() {
        let mock = MockVcs::new();
        mock.set_endless_selection(true);
        let mut gateway = CommandGateway::new(mock.clone());
        let interfaces = discover_interfaces(&mut gateway, "EPOS4", "MAXON SERIAL V2").unwrap();
        assert_eq!(interfaces.len(), MAX_SELECTION_ITEMS);
        assert_eq!(
            mock.call_count(MockCall::InterfaceNameSelection),
            MAX_SELECTION_ITEMS
        );
    }

    #[test]
    fn test_call_failure_is_discovery_failed() {
        let mock = MockVcs::new();
        mock.fail_on(MockCall::DeviceNameSelection, ErrorCode(0x1000_0001));
        let mut gateway = CommandGateway::new(mock);
        let err = discover_devices(&mut gateway).unwrap_err();
        match err {
            EposError::DiscoveryFailed { selection, report } => {
                assert_eq!(selection, "device");
                assert_eq!(report.unwrap().command, "VCS_GetDeviceNameSelection");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
