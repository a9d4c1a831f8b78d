pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Flow matrix shape mismatch: {rows} rows x {cols} cols for {groups} groups (matrix must be square with one row per group)"
    )]
    Shape {
        rows: usize,
        cols: usize,
        groups: usize,
    },

    #[error("Duplicate group name: {name}")]
    DuplicateGroup { name: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
