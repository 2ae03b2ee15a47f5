//! REST endpoints for the wizard.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::warn;
use uuid::Uuid;

use super::manager::{WizardAction, WizardManager};
use crate::error::{Error, WizardError};

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub manager: Arc<WizardManager>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Wizard(WizardError::InvalidFileName(_)) => StatusCode::BAD_REQUEST,
            Error::Wizard(_) => StatusCode::CONFLICT,
            Error::Config(_) | Error::Database(_) | Error::Gateway(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            warn!(error = %self, "Wizard request failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message.into()})),
    )
        .into_response()
}

fn parse_session_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| bad_request("Invalid session ID"))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "intake-wizard"
    }))
}

/// POST /api/wizard/sessions
async fn start_session(State(state): State<WizardRouteState>) -> Response {
    match state.manager.start().await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/wizard/sessions/{id}/load
///
/// What the page calls on every load: restores the step, empties the form.
async fn load_session(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.manager.load(session_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/wizard/sessions/{id}
async fn get_session(State(state): State<WizardRouteState>, Path(id): Path<String>) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.manager.view(session_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /api/wizard/sessions/{id}
async fn close_session(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if state.manager.close(session_id).await {
        Json(serde_json::json!({"status": "closed"})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Session not open"})),
        )
            .into_response()
    }
}

/// POST /api/wizard/sessions/{id}/actions
async fn apply_action(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
    Json(action): Json<WizardAction>,
) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.manager.apply(session_id, action).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/wizard/sessions/{id}/files
///
/// Multipart body with the file in a field named `file`.
async fn upload_file(
    State(state): State<WizardRouteState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let session_id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return bad_request("Missing 'file' field"),
            Err(e) => return bad_request(format!("Malformed multipart body: {e}")),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return bad_request(format!("Failed to read upload: {e}")),
        };

        return match state
            .manager
            .upload(session_id, &file_name, bytes.to_vec(), content_type.as_deref())
            .await
        {
            Ok(view) => Json(view).into_response(),
            Err(e) => e.into_response(),
        };
    }
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/wizard/sessions", post(start_session))
        .route(
            "/api/wizard/sessions/{id}",
            get(get_session).delete(close_session),
        )
        .route("/api/wizard/sessions/{id}/load", post(load_session))
        .route("/api/wizard/sessions/{id}/actions", post(apply_action))
        .route(
            "/api/wizard/sessions/{id}/files",
            post(upload_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::step::Step;

    #[test]
    fn invalid_file_name_is_bad_request() {
        let resp = Error::from(WizardError::InvalidFileName("..".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn flow_errors_are_conflicts() {
        let resp = Error::from(WizardError::InvalidTransition {
            from: Step::Welcome,
            to: Step::Thanks,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = Error::from(WizardError::ActionNotAvailable {
            action: "finish".into(),
            step: Step::Name,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
