pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid flow graph: {message}")]
    InvalidGraph { message: String },

    #[error("flow graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
