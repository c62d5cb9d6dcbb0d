use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid value for {key}: '{value}'")]
    Config { key: &'static str, value: String },
    #[error("No surface format supported by the adapter")]
    NoSurfaceFormat,
    #[error("Failed to load step catalog: {0}")]
    Catalog(#[from] ks_core::error::CatalogError),
}
