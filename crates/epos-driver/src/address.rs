//! 设备地址

use std::fmt;

use epos_cmd::NodeId;
use epos_protocol::{DEFAULT_DEVICE_NAME, DEFAULT_INTERFACE_NAME, DEFAULT_PROTOCOL_STACK_NAME};

use crate::error::{EposError, Result};

/// 一个物理轴的完整地址
///
/// 设备/协议栈/接口名称在会话创建后不可变；端口可以留空，
/// 由会话在打开前从枚举到的候选列表中解析一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    device_name: String,
    protocol_name: String,
    interface_name: String,
    port_name: Option<String>,
    node_id: NodeId,
}

fn validate_name(param: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EposError::InvalidParameter {
            param,
            reason: "must not be empty".to_string(),
        });
    }
    if value.contains('\0') {
        return Err(EposError::InvalidParameter {
            param,
            reason: "must not contain NUL bytes".to_string(),
        });
    }
    Ok(())
}

impl DeviceAddress {
    /// 创建地址（端口待解析）
    pub fn new(
        device_name: impl Into<String>,
        protocol_name: impl Into<String>,
        interface_name: impl Into<String>,
        node_id: u16,
    ) -> Result<Self> {
        let device_name = device_name.into();
        let protocol_name = protocol_name.into();
        let interface_name = interface_name.into();
        validate_name("device_name", &device_name)?;
        validate_name("protocol_name", &protocol_name)?;
        validate_name("interface_name", &interface_name)?;
        let node_id = NodeId::new(node_id).ok_or_else(|| EposError::InvalidParameter {
            param: "node_id",
            reason: "must be at least 1".to_string(),
        })?;

        Ok(Self {
            device_name,
            protocol_name,
            interface_name,
            port_name: None,
            node_id,
        })
    }

    /// 指定端口（跳过端口枚举）
    pub fn with_port(mut self, port_name: impl Into<String>) -> Result<Self> {
        let port_name = port_name.into();
        validate_name("port_name", &port_name)?;
        self.port_name = Some(port_name);
        Ok(self)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn protocol_name(&self) -> &str {
        &self.protocol_name
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// 端口名（未解析时为 `None`）
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// 端口只能解析一次；已有端口时忽略
    pub(crate) fn resolve_port(&mut self, port_name: String) -> &str {
        self.port_name.get_or_insert(port_name)
    }
}

impl Default for DeviceAddress {
    /// EPOS4 / MAXON SERIAL V2 / USB，节点 1
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            protocol_name: DEFAULT_PROTOCOL_STACK_NAME.to_string(),
            interface_name: DEFAULT_INTERFACE_NAME.to_string(),
            port_name: None,
            node_id: NodeId::default(),
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{} node {}",
            self.device_name,
            self.protocol_name,
            self.interface_name,
            self.port_name.as_deref().unwrap_or("?"),
            self.node_id
        )
    }
}
