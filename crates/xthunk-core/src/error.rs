#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("handle not found: {0:#x}")]
    HandleNotFound(u64),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("unknown structure type {0}")]
    UnknownStructure(i32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
