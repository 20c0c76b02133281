//! 运动控制器构建器

#[cfg(feature = "native")]
use std::path::PathBuf;

use epos_cmd::VcsApi;
use epos_driver::{DeviceAddress, DeviceSession, ProtocolStackSettings, Result};
use epos_protocol::{
    DEFAULT_DEVICE_NAME, DEFAULT_INTERFACE_NAME, DEFAULT_NODE_ID, DEFAULT_PROTOCOL_STACK_NAME,
    EncoderGeometry,
};
use tracing::debug;

use crate::motion::MotionController;

/// [`MotionController`] 构建器
///
/// # 示例
///
/// ```rust,ignore
/// use epos_client::EposBuilder;
///
/// let mut controller = EposBuilder::new()
///     .device("EPOS4")
///     .interface("USB")
///     .port("USB0")
///     .node_id(1)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct EposBuilder {
    device: String,
    protocol: String,
    interface: String,
    port: Option<String>,
    node_id: u16,
    protocol_stack: ProtocolStackSettings,
    geometry: EncoderGeometry,
    #[cfg(feature = "native")]
    library_path: Option<PathBuf>,
}

impl Default for EposBuilder {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE_NAME.to_string(),
            protocol: DEFAULT_PROTOCOL_STACK_NAME.to_string(),
            interface: DEFAULT_INTERFACE_NAME.to_string(),
            port: None,
            node_id: DEFAULT_NODE_ID,
            protocol_stack: ProtocolStackSettings::default(),
            geometry: EncoderGeometry::default(),
            #[cfg(feature = "native")]
            library_path: None,
        }
    }
}

impl EposBuilder {
    /// 创建构建器（EPOS4 / MAXON SERIAL V2 / USB，节点 1）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, name: impl Into<String>) -> Self {
        self.device = name.into();
        self
    }

    pub fn protocol(mut self, name: impl Into<String>) -> Self {
        self.protocol = name.into();
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interface = name.into();
        self
    }

    /// 指定端口（不指定时打开前从候选列表中取第一个）
    pub fn port(mut self, name: impl Into<String>) -> Self {
        self.port = Some(name.into());
        self
    }

    pub fn node_id(mut self, node_id: u16) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn protocol_stack(mut self, settings: ProtocolStackSettings) -> Self {
        self.protocol_stack = settings;
        self
    }

    pub fn baudrate(mut self, baudrate: u32) -> Self {
        self.protocol_stack.baudrate = baudrate;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.protocol_stack.timeout_ms = timeout_ms;
        self
    }

    pub fn geometry(mut self, geometry: EncoderGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// 命令库路径（默认由动态链接器搜索 `libEposCmd.so`）
    #[cfg(feature = "native")]
    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    fn address(&self) -> Result<DeviceAddress> {
        let address = DeviceAddress::new(
            self.device.clone(),
            self.protocol.clone(),
            self.interface.clone(),
            self.node_id,
        )?;
        match &self.port {
            Some(port) => address.with_port(port.clone()),
            None => Ok(address),
        }
    }

    /// 使用给定的命令库后端构建（未打开）
    pub fn build_with<A: VcsApi>(self, api: A) -> Result<MotionController<A>> {
        let address = self.address()?;
        debug!(address = %address, geometry = %self.geometry, "Building motion controller");
        let session = DeviceSession::new(api, address).with_protocol_stack(self.protocol_stack);
        Ok(MotionController::new(session, self.geometry))
    }

    /// 加载原生命令库并构建（未打开）
    #[cfg(feature = "native")]
    pub fn build(self) -> Result<MotionController<epos_cmd::VcsLibrary>> {
        let library = match &self.library_path {
            Some(path) => epos_cmd::VcsLibrary::load_from(path)?,
            None => epos_cmd::VcsLibrary::load()?,
        };
        self.build_with(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epos_cmd::MockVcs;
    use epos_driver::{EposError, LifecycleStage};

    #[test]
    fn test_build_with_defaults() {
        let mock = MockVcs::new();
        let controller = EposBuilder::new().build_with(mock).unwrap();
        let address = controller.session().address();
        assert_eq!(address.device_name(), "EPOS4");
        assert_eq!(address.node_id().get(), 1);
        assert_eq!(controller.stage(), LifecycleStage::Unopened);
        assert_eq!(controller.geometry().counts_per_revolution(), 143_360);
    }

    #[test]
    fn test_protocol_stack_flows_into_initialize() {
        let mock = MockVcs::new();
        let mut controller = EposBuilder::new()
            .port("USB1")
            .baudrate(500_000)
            .timeout_ms(250)
            .build_with(mock.clone())
            .unwrap();
        controller.initialize().unwrap();
        assert_eq!(mock.protocol_stack_settings(), Some((500_000, 250)));
        assert_eq!(controller.session().address().port_name(), Some("USB1"));
    }

    #[test]
    fn test_invalid_node_id() {
        let err = EposBuilder::new()
            .node_id(0)
            .build_with(MockVcs::new())
            .unwrap_err();
        assert!(matches!(err, EposError::InvalidParameter { param: "node_id", .. }));
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_build_with_missing_library() {
        let err = EposBuilder::new()
            .library_path("/nonexistent/libEposCmd.so")
            .build()
            .unwrap_err();
        assert!(matches!(err, EposError::Library(_)));
    }
}
