// Error taxonomy for the catalog core
//
// Every fallible catalog operation returns `Result<T>` with one of these
// variants. Storage and JSON failures are wrapped, never swallowed.

use std::fmt;
use thiserror::Error;

/// One offending field in a revision body (or in an edit request)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub entity: String,
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(entity: &str, field: &str, message: impl Into<String>) -> Self {
        FieldError {
            entity: entity.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.entity, self.field, self.message)
    }
}

/// Wrapper so the whole list renders in one error message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("gone (deleted): {0}")]
    Gone(String),

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("edit conflict: identity {ident} already has a pending edit in editgroup {editgroup}")]
    EditConflict { editgroup: String, ident: String },

    #[error("conflict on {ident}: {reason}")]
    Conflict { ident: String, reason: String },

    #[error("editgroup {editgroup} is not open (status: {status})")]
    NotOpen { editgroup: String, status: String },

    #[error("redirect chain: {0}")]
    RedirectChain(String),

    #[error("invalid identifier: {0}")]
    InvalidIdent(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn validation(errors: Vec<FieldError>) -> Self {
        CatalogError::Validation(FieldErrors(errors))
    }

    /// Field errors carried by a `Validation` error (empty for other kinds)
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            CatalogError::Validation(errors) => &errors.0,
            _ => &[],
        }
    }

    /// Errors the caller can fix by retrying with corrected input or a fresh base
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation(_)
                | CatalogError::EditConflict { .. }
                | CatalogError::Conflict { .. }
                | CatalogError::RedirectChain(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
