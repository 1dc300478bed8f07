use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use howl_core::net::messages::ErrorReplyMsg;
use howl_game::GameError;

/// REST-side errors.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    #[allow(dead_code)]
    Unauthorized(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Unauthorized(m) | Self::Internal(m) => {
                write!(f, "{m}")
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Wire error for a rejected game action: machine code + human message,
/// surfaced only to the submitting player.
pub fn game_error_reply(err: &GameError) -> ErrorReplyMsg {
    ErrorReplyMsg {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

/// Generic authentication failure. Deliberately vague: revealing whether the
/// room, the player, or the tag was wrong would enable identity probing.
pub fn auth_failure_reply() -> ErrorReplyMsg {
    ErrorReplyMsg {
        code: "AUTH_FAILED".to_string(),
        message: "authentication failed".to_string(),
    }
}
