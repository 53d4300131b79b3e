use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use relay_core::{
    domain::{ChatId, Format, OutboundMessage},
    errors::SendError,
    utils::truncate_text,
};

use crate::HttpState;

/// Body of `POST /telegram`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub message: Option<String>,
    pub parse_mode: Option<String>,
    pub chat_ids: Option<Vec<i64>>,
}

impl SendRequest {
    /// Field-level checks; every problem is reported, joined by `, `.
    fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.message.as_deref().map_or(true, str::is_empty) {
            problems.push("field message is a required field".to_string());
        }

        if let Some(mode) = self.parse_mode.as_deref() {
            if !mode.is_empty() && Format::recognize(mode).is_none() {
                problems.push(
                    "field parseMode must be empty or have following value: markdownv2, markdown or html"
                        .to_string(),
                );
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join(", "))
        }
    }

    fn into_message(self, token: String) -> OutboundMessage {
        OutboundMessage {
            text: self.message.unwrap_or_default(),
            format: Format::parse(self.parse_mode.as_deref().unwrap_or_default()),
            token,
            chat_ids: self
                .chat_ids
                .unwrap_or_default()
                .into_iter()
                .map(ChatId)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

/// `POST /telegram`: relay the message to the chats of the company owning the token.
pub async fn send_message(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let op = "rest.send_message";

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token.is_empty() {
        tracing::debug!(op, "token not found");
        return error_response(StatusCode::UNAUTHORIZED, "token is required");
    }

    let req: SendRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(op, error = %e, "failed to decode request body");
            return error_response(StatusCode::BAD_REQUEST, "failed to decode request");
        }
    };

    if let Err(reason) = req.validate() {
        tracing::error!(op, reason = %reason, "invalid request");
        return error_response(StatusCode::BAD_REQUEST, reason);
    }

    let message = req.into_message(token.to_string());
    tracing::debug!(
        op,
        format = %message.format,
        chat_ids = message.chat_ids.len(),
        preview = %truncate_text(&message.text, 80),
        "request decoded"
    );

    match state.router.send_message(message).await {
        Ok(()) => (StatusCode::OK, "message sent").into_response(),
        Err(e) => {
            tracing::error!(op, error = %e, "can not send message");
            send_error_response(e)
        }
    }
}

/// Every routing failure is a 500; the message tells them apart.
fn send_error_response(e: SendError) -> Response {
    let message = match e {
        SendError::ChatsNotFound => "chats not found",
        SendError::ChatsNotAllowed => "chats not allowed",
        SendError::CannotSend => "can't send message",
    };
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
