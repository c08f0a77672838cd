//! Catalog error types.

use crossave_device::DeviceError;

/// Errors produced while discovering or persisting the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("game name {name:?} maps to several title ids: {}", .ids.join(", "))]
    AmbiguousGameName { name: String, ids: Vec<String> },
}
