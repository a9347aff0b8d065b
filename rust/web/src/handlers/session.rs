use crate::auth::Authenticator;
use crate::errors::IntoErrorResponse;
use crate::session::{SessionManager, SessionView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Request problems caught before any game state is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no address provided")]
    MissingAddress,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid action")]
    UnknownAction(String),
}

impl IntoErrorResponse for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingAddress => "missing_address",
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::UnknownAction(_) => "invalid_action",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            ValidationError::UnknownAction(action) => {
                Some(serde_json::json!({ "action": action }))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartQuery {
    pub address: Option<String>,
}

/// `POST /session` body. `action` selects the operation; `message` and
/// `signature` are only meaningful for `auth`.
#[derive(Debug, Deserialize)]
pub struct SessionActionRequest {
    pub action: String,
    pub address: Option<String>,
    pub message: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
}

/// Starts or resets the session for the queried address.
///
/// # HTTP Method and Path
/// - **Method**: GET
/// - **Path**: `/session?address=<addr>`
///
/// Unauthenticated by design: this is the read path, it reveals the score
/// for any address and deals a fresh round. 400 when `address` is missing,
/// 200 with `{playerHand, dealerHand (hole card masked), message, score}`
/// otherwise. A natural 21 on the deal resolves immediately, in which case
/// the message is set and the dealer hand is revealed.
pub async fn start_session(sessions: Arc<SessionManager>, query: StartQuery) -> Response {
    let address = match query.address.filter(|a| !a.is_empty()) {
        Some(address) => address,
        None => return ValidationError::MissingAddress.into_http_response(),
    };
    match sessions.start(&address) {
        Ok(state) => session_ok(state),
        Err(err) => err.into_http_response(),
    }
}

/// Dispatches a `POST /session` action.
///
/// - `auth`: verifies the wallet signature over the challenge message and
///   returns a one-hour bearer token; 400 on an invalid signature.
/// - `hit` / `stand`: require a valid `Authorization: Bearer` token bound to
///   the request address (401 on any gate failure), then mutate the round.
/// - anything else: 400 `invalid_action`.
pub async fn session_action(
    sessions: Arc<SessionManager>,
    auth: Arc<Authenticator>,
    authorization: Option<String>,
    request: SessionActionRequest,
) -> Response {
    let address = match request.address.filter(|a| !a.is_empty()) {
        Some(address) => address,
        None => return ValidationError::MissingField("address").into_http_response(),
    };

    match request.action.as_str() {
        "auth" => {
            let (message, signature) = match (request.message, request.signature) {
                (Some(message), Some(signature)) => (message, signature),
                (None, _) => {
                    return ValidationError::MissingField("message").into_http_response()
                }
                (_, None) => {
                    return ValidationError::MissingField("signature").into_http_response()
                }
            };
            match auth.authenticate(&address, &message, &signature) {
                Ok(token) => success_response(
                    StatusCode::OK,
                    AuthResponse {
                        message: "valid signature",
                        token,
                    },
                ),
                Err(err) => err.into_http_response(),
            }
        }
        action @ ("hit" | "stand") => {
            if let Err(err) = auth.authorize(bearer_token(authorization.as_deref()), &address) {
                return err.into_http_response();
            }
            let result = match action {
                "hit" => sessions.hit(&address),
                _ => sessions.stand(&address),
            };
            match result {
                Ok(state) => session_ok(state),
                Err(err) => err.into_http_response(),
            }
        }
        other => ValidationError::UnknownAction(other.to_string()).into_http_response(),
    }
}

fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
}

fn session_ok(state: SessionView) -> Response {
    success_response(StatusCode::OK, state)
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}
