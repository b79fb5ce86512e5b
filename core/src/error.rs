//! Error types for the task client core.
//!
//! # Design
//! `ApiError` covers everything that can go wrong between building a request
//! and parsing its response. The backend's status codes are not interpreted
//! beyond success/failure, so every non-2xx response lands in `Status` with
//! the raw code and body. `StoreError` adds the client-side outcomes of Store
//! operations: a blank title and a declined delete confirmation.

use thiserror::Error;

/// Errors produced by `TaskClient` and by hosts executing its requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connection refused, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Errors returned by `Store` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Title is required")]
    BlankTitle,

    /// The user declined the delete confirmation. Not a failure; the
    /// operation is simply dropped.
    #[error("deletion cancelled")]
    ConfirmationDeclined,

    #[error("no deletion is awaiting confirmation")]
    NothingToConfirm,
}
