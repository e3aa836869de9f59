use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use thiserror::Error;

use crate::story::StoryError;
use crate::voting::VoteError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("you have already voted in this story")]
    AlreadyVoted,

    // The real cause is logged; users only ever see the fixed fallback text
    #[error("An error occurred. Please try again.")]
    Generation,

    #[error("internal error")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyVoted => StatusCode::CONFLICT,
            AppError::Generation => StatusCode::BAD_GATEWAY,
            AppError::Internal(ref e) => {
                error!("Internal error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

impl From<VoteError> for AppError {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::AlreadyVoted => AppError::AlreadyVoted,
            VoteError::StoryNotFound(_) => AppError::NotFound("story"),
            VoteError::UnknownQuestion(_) | VoteError::InvalidOption { .. } => {
                AppError::BadRequest(err.to_string())
            }
            VoteError::Store(e) => AppError::Internal(e),
        }
    }
}

impl From<StoryError> for AppError {
    fn from(err: StoryError) -> Self {
        match err {
            StoryError::NotFound(_) => AppError::NotFound("story"),
            StoryError::Generation(e) => {
                error!("Story generation failed: {e}");
                AppError::Generation
            }
            StoryError::Parse(e) => {
                error!("Generated text did not parse: {e}");
                AppError::Generation
            }
            StoryError::Store(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::GENERATION_FALLBACK;

    #[test]
    fn generation_failures_surface_only_the_fallback_text() {
        let err = AppError::from(StoryError::Generation(
            crate::story::client::GenerateError::BadStatus(500),
        ));
        assert_eq!(err.to_string(), GENERATION_FALLBACK);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::Internal("secret detail".into());
        assert_eq!(err.to_string(), "internal error");
    }
}
