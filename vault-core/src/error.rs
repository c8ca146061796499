use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("参数无效 [{field}]: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("不支持的操作: {0}")]
    NotSupported(String),

    #[error("远程操作失败: {operation}, 错误码: {code}, 信息: {message}")]
    RemoteOperationFailed {
        operation: String,
        code: String,
        message: String,
    },

    #[error("网络传输错误: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("API请求失败: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("服务端响应无效: {0}")]
    InvalidResponse(String),

    #[error("操作已取消: {0}")]
    Cancelled(String),

    #[error("操作跟踪超时: {0}")]
    Timeout(String),

    #[error("配置错误: {0}")]
    Config(#[from] toml::de::Error),

    #[error("配置无效: {0}")]
    InvalidConfig(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),

    #[error("{} 个操作失败", .0.len())]
    Aggregate(Vec<VaultError>),
}

/// 错误大类，供调用方决定如何上报
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidArgument,
    NotSupported,
    RemoteOperationFailed,
    Transport,
    Other,
}

impl VaultError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn remote_failed(
        operation: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RemoteOperationFailed {
            operation: operation.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// 将多个错误合并；只有一个时直接返回该错误
    pub fn aggregate(mut errors: Vec<VaultError>) -> Self {
        if errors.len() == 1 {
            if let Some(single) = errors.pop() {
                return single;
            }
        }
        Self::Aggregate(errors)
    }

    /// 递归展开聚合错误，逐个返回内部原因
    pub fn causes(&self) -> Vec<&VaultError> {
        match self {
            Self::Aggregate(inner) => inner.iter().flat_map(|e| e.causes()).collect(),
            other => vec![other],
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } | Self::NotFound(_) => ErrorCategory::InvalidArgument,
            Self::NotSupported(_) => ErrorCategory::NotSupported,
            Self::RemoteOperationFailed { .. } | Self::Api { .. } => {
                ErrorCategory::RemoteOperationFailed
            }
            Self::Transport(_) => ErrorCategory::Transport,
            _ => ErrorCategory::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
