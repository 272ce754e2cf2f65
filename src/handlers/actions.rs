// src/handlers/actions.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    services::action_service::{ActionRequest, ActionResponse},
};

// POST /api/actions
#[utoipa::path(
    post,
    path = "/api/actions",
    tag = "Actions",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Ação executada", body = ActionResponse),
        (status = 400, description = "Ação não reconhecida"),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn run_action(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.action_service.run(&principal, request).await?;
    Ok((StatusCode::OK, Json(response)))
}
