//! TOML 配置
//!
//! ```toml
//! [device]
//! device = "EPOS4"
//! protocol = "MAXON SERIAL V2"
//! interface = "USB"
//! port = "USB0"        # 可选，缺省时取第一个候选端口
//! node_id = 1
//!
//! [protocol_stack]
//! baudrate = 1000000
//! timeout_ms = 500
//!
//! [encoder]
//! quadrature = 4
//! resolution = 1024
//! gear_ratio = 35
//!
//! [profile]           # 可选
//! velocity = 800
//! acceleration = 10000
//! deceleration = 10000
//! ```
//!
//! 缺少的段落和字段使用默认值。

use std::path::{Path, PathBuf};

use epos_client::EposBuilder;
use epos_driver::ProtocolStackSettings;
use epos_protocol::{
    DEFAULT_BAUDRATE, DEFAULT_DEVICE_NAME, DEFAULT_INTERFACE_NAME, DEFAULT_NODE_ID,
    DEFAULT_PROTOCOL_STACK_NAME, DEFAULT_TIMEOUT_MS, EncoderGeometry, ProfileParameters,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取文件失败
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[device]` 段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub device: String,
    pub protocol: String,
    pub interface: String,
    pub port: Option<String>,
    pub node_id: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE_NAME.to_string(),
            protocol: DEFAULT_PROTOCOL_STACK_NAME.to_string(),
            interface: DEFAULT_INTERFACE_NAME.to_string(),
            port: None,
            node_id: DEFAULT_NODE_ID,
        }
    }
}

/// `[protocol_stack]` 段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolStackConfig {
    pub baudrate: u32,
    pub timeout_ms: u32,
}

impl Default for ProtocolStackConfig {
    fn default() -> Self {
        Self {
            baudrate: DEFAULT_BAUDRATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// `[encoder]` 段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    pub quadrature: u32,
    pub resolution: u32,
    pub gear_ratio: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        let geometry = EncoderGeometry::default();
        Self {
            quadrature: geometry.quadrature,
            resolution: geometry.resolution,
            gear_ratio: geometry.gear_ratio,
        }
    }
}

/// `[profile]` 段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub velocity: u32,
    pub acceleration: u32,
    pub deceleration: u32,
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EposConfig {
    pub device: DeviceConfig,
    pub protocol_stack: ProtocolStackConfig,
    pub encoder: EncoderConfig,
    pub profile: Option<ProfileConfig>,
}

impl EposConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn protocol_stack_settings(&self) -> ProtocolStackSettings {
        ProtocolStackSettings::new(self.protocol_stack.baudrate, self.protocol_stack.timeout_ms)
    }

    pub fn geometry(&self) -> EncoderGeometry {
        EncoderGeometry::new(
            self.encoder.quadrature,
            self.encoder.resolution,
            self.encoder.gear_ratio,
        )
    }

    /// 运动参数（未配置时为 `None`）
    pub fn profile_parameters(&self) -> Option<ProfileParameters> {
        self.profile
            .map(|p| ProfileParameters::new(p.velocity, p.acceleration, p.deceleration))
    }

    /// 转换为构建器
    pub fn builder(&self) -> EposBuilder {
        let builder = EposBuilder::new()
            .device(self.device.device.clone())
            .protocol(self.device.protocol.clone())
            .interface(self.device.interface.clone())
            .node_id(self.device.node_id)
            .protocol_stack(self.protocol_stack_settings())
            .geometry(self.geometry());
        match &self.device.port {
            Some(port) => builder.port(port.clone()),
            None => builder,
        }
    }
}
