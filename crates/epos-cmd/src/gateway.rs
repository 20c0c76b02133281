//! 命令网关
//!
//! 所有硬件调用的唯一入口。调用失败时，网关立即通过 `VCS_GetErrorInfo`
//! 解析错误描述，并返回 [`ErrorReport`]；上层永远不会看到裸错误码。
//!
//! 网关本身不打日志，由调用方决定日志级别。

use epos_protocol::{ErrorCode, MAX_ERROR_INFO_LEN};
use thiserror::Error;

use crate::{CallResult, VcsApi};

/// 命令失败报告
///
/// 包含失败的命令名、原始错误码和已解析的描述。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{command} failed with error code {code}: {description}")]
pub struct ErrorReport {
    /// 失败的命令（如 `"VCS_OpenDevice"`）
    pub command: &'static str,
    /// 原始错误码
    pub code: ErrorCode,
    /// 错误描述
    pub description: String,
}

impl ErrorReport {
    /// 创建报告
    pub fn new(command: &'static str, code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            command,
            code,
            description: description.into(),
        }
    }

    /// 是否为命令库超时
    pub fn is_timeout(&self) -> bool {
        self.code.is_timeout()
    }
}

/// 命令网关
///
/// 持有命令库后端，把每次调用的错误码翻译为 [`ErrorReport`]。
pub struct CommandGateway<A: VcsApi> {
    api: A,
}

impl<A: VcsApi> CommandGateway<A> {
    /// 包装命令库后端
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// 访问后端
    pub fn api(&self) -> &A {
        &self.api
    }

    /// 可变访问后端
    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    /// 取回后端
    pub fn into_inner(self) -> A {
        self.api
    }

    /// 执行一次命令调用
    ///
    /// # 参数
    ///
    /// - `command`: 命令名，写入失败报告
    /// - `call`: 实际调用
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let enabled = gateway.invoke("VCS_GetEnableState", |api| {
    ///     api.get_enable_state(handle, node)
    /// })?;
    /// ```
    pub fn invoke<T, F>(&mut self, command: &'static str, call: F) -> Result<T, ErrorReport>
    where
        F: FnOnce(&mut A) -> CallResult<T>,
    {
        match call(&mut self.api) {
            Ok(value) => Ok(value),
            Err(code) => {
                let description = self.describe(code);
                Err(ErrorReport::new(command, code, description))
            },
        }
    }

    /// 查询错误码描述
    ///
    /// 命令库查询失败时退回到已知通用错误码的描述，仍未知则为 `"unknown error"`。
    pub fn describe(&mut self, code: ErrorCode) -> String {
        self.api
            .get_error_info(code, MAX_ERROR_INFO_LEN)
            .filter(|text| !text.is_empty())
            .or_else(|| code.known_description().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

impl<A: VcsApi + std::fmt::Debug> std::fmt::Debug for CommandGateway<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGateway").field("api", &self.api).finish()
    }
}
