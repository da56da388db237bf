use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::timeframe::Timeframe;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Failures of the status API. Handlers only read the published snapshot,
/// so a bad query or a snapshot that fails to serialize are the only cases.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid scan query: {0}")]
    Validation(String),
    #[error("failed to encode snapshot: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(message) | AppError::Internal(message) => message,
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Why one instrument could not be analysed. Too-short series are not an
/// error: the core answers them with a neutral result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("malformed {timeframe} series: {reason}")]
    MalformedSeries { timeframe: Timeframe, reason: String },
    #[error("failed to fetch {timeframe} candles: {reason}")]
    Fetch { timeframe: Timeframe, reason: String },
}
