use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("client error: {0}")]
    Client(#[from] admin_client::BuildError),
    #[error("config error: {0}")]
    PageSize(#[from] admin_client::InvalidPageSize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("log setup error: {0}")]
    Logging(String),
    #[error("terminal error: {0}")]
    Terminal(String),
}
