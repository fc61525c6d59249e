//! View error types

use thiserror::Error;

/// Page rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Template failed to parse or render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Page data could not be turned into a template context
    #[error("Invalid page context for {template}: {message}")]
    Context { template: String, message: String },
}
