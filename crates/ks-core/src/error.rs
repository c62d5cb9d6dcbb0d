use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog has no steps")]
    Empty,
    #[error("step {index} has ordinal {found}, expected {expected}")]
    Ordinal {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),
    #[error("step {ordinal} references unknown node '{node}'")]
    UnknownNode { ordinal: usize, node: String },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SourceImageError {
    #[error("image is empty")]
    Empty,
    #[error("unsupported image format")]
    Unsupported,
}
