use thiserror::Error;

/// SDK 统一错误类型
///
/// 拉取失败（网络/服务端）记录在存储的 error 字段供 UI 渲染；
/// toggle 失败在集合层面静默回滚，错误仅返回给调用方决定是否提示。
#[derive(Debug, Error)]
pub enum FitClubSDKError {
    /// 网络错误（连接失败、超时等）
    #[error("Network error: {0}")]
    Network(String),
    /// 服务端错误（非 2xx 响应或业务层失败）
    #[error("Server error [{status}]: {message}")]
    Server { status: u16, message: String },
    /// JSON 序列化/反序列化错误
    #[error("JSON error: {0}")]
    Json(String),
    /// 本地集合中找不到目标实体（过期引用，通常按 no-op 处理）
    #[error("Not found: {0}")]
    NotFound(String),
    /// 同一实体上已有未结算的 toggle，拒绝重叠操作
    #[error("Toggle already in flight: {0}")]
    ToggleInFlight(String),
    /// 无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for FitClubSDKError {
    fn from(error: serde_json::Error) -> Self {
        FitClubSDKError::Json(error.to_string())
    }
}

impl From<reqwest::Error> for FitClubSDKError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => FitClubSDKError::Server {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None => FitClubSDKError::Network(error.to_string()),
        }
    }
}

impl FitClubSDKError {
    /// 判断是否是重叠 toggle 被拒绝（UI 一般直接忽略）
    pub fn is_toggle_in_flight(&self) -> bool {
        matches!(self, FitClubSDKError::ToggleInFlight(_))
    }

    /// 判断是否是拉取类失败（网络或服务端）
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            FitClubSDKError::Network(_) | FitClubSDKError::Server { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FitClubSDKError>;
