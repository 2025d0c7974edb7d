//! REST API module.
//!
//! Exposes a [`Backend`](crate::backend::Backend) over HTTP, one route per store
//! operation. Every response uses the same `{ success, data | error }` envelope.

mod memos;
mod tags;
mod topics;

pub use memos::*;
pub use tags::*;
pub use topics::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Success response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Wrap a store result in the response envelope, logging failures.
pub fn respond<T: Serialize>(operation: &str, result: Result<T, AppError>) -> ApiResult<T> {
    match result {
        Ok(data) => Ok(ApiResponse::new(data)),
        Err(e) => {
            tracing::warn!("{} failed: {}", operation, e);
            Err(e)
        }
    }
}
