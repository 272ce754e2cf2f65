// src/handlers/deals.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::deal::{
        ConvertDealPayload, ConvertDealResponse, Deal, DealFilter, DealListEntry, DealPayload,
        DealStatus, DealView,
    },
};

// =============================================================================
//  COTAÇÕES
// =============================================================================

// POST /api/quotes
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "Quotes",
    request_body = DealPayload,
    responses(
        (status = 201, description = "Cotação criada", body = Deal),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Não autorizado"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_quote(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(payload): Json<DealPayload>,
) -> Result<impl IntoResponse, AppError> {
    let deal = app_state.deal_service.create_quote(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(deal)))
}

// GET /api/quotes
#[utoipa::path(
    get,
    path = "/api/quotes",
    tag = "Quotes",
    params(DealFilter),
    responses(
        (status = 200, description = "Cotações pendentes, mais recentes primeiro", body = Vec<DealListEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DealFilter>,
) -> Result<impl IntoResponse, AppError> {
    let quotes = app_state.deal_service
        .list_deals(&principal, DealStatus::Pending, filter)
        .await?;
    Ok((StatusCode::OK, Json(quotes)))
}

// GET /api/quotes/{id}
#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID da cotação")),
    responses(
        (status = 200, description = "Cotação no formato do formulário", body = DealView),
        (status = 404, description = "Cotação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.deal_service.get_deal(&principal, id, DealStatus::Pending).await?;
    Ok((StatusCode::OK, Json(view)))
}

// PUT /api/quotes/{id}
#[utoipa::path(
    put,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    request_body = DealPayload,
    params(("id" = Uuid, Path, description = "ID da cotação")),
    responses(
        (status = 200, description = "Cotação atualizada (itens substituídos)", body = Deal),
        (status = 404, description = "Cotação não encontrada"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_quote(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DealPayload>,
) -> Result<impl IntoResponse, AppError> {
    let deal = app_state.deal_service.update_quote(&principal, id, payload).await?;
    Ok((StatusCode::OK, Json(deal)))
}

// DELETE /api/quotes/{id}
#[utoipa::path(
    delete,
    path = "/api/quotes/{id}",
    tag = "Quotes",
    params(("id" = Uuid, Path, description = "ID da cotação")),
    responses(
        (status = 200, description = "Cotação excluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_quote(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.deal_service.delete_quote(&principal, id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}

// =============================================================================
//  VENDAS E NÃO-VENDAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(DealFilter),
    responses(
        (status = 200, description = "Vendas finalizadas", body = Vec<DealListEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DealFilter>,
) -> Result<impl IntoResponse, AppError> {
    let sales = app_state.deal_service
        .list_deals(&principal, DealStatus::Finalized, filter)
        .await?;
    Ok((StatusCode::OK, Json(sales)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda", body = DealView),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.deal_service.get_deal(&principal, id, DealStatus::Finalized).await?;
    Ok((StatusCode::OK, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/lost-deals",
    tag = "Sales",
    params(DealFilter),
    responses(
        (status = 200, description = "Não-vendas", body = Vec<DealListEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lost_deals(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DealFilter>,
) -> Result<impl IntoResponse, AppError> {
    let lost = app_state.deal_service
        .list_deals(&principal, DealStatus::Cancelled, filter)
        .await?;
    Ok((StatusCode::OK, Json(lost)))
}

#[utoipa::path(
    get,
    path = "/api/lost-deals/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da não-venda")),
    responses(
        (status = 200, description = "Não-venda", body = DealView),
        (status = 404, description = "Não-venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lost_deal(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.deal_service.get_deal(&principal, id, DealStatus::Cancelled).await?;
    Ok((StatusCode::OK, Json(view)))
}

// POST /api/deals/{id}/status
#[utoipa::path(
    post,
    path = "/api/deals/{id}/status",
    tag = "Sales",
    request_body = ConvertDealPayload,
    params(("id" = Uuid, Path, description = "ID da negociação")),
    responses(
        (status = 200, description = "Status convertido", body = ConvertDealResponse),
        (status = 400, description = "Dados obrigatórios ausentes"),
        (status = 404, description = "Negociação não encontrada"),
        (status = 422, description = "Transição de status inválida"),
        (status = 500, description = "Falha em todos os métodos de conversão.")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_deal(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertDealPayload>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.deal_service.convert(&principal, id, payload).await?;
    Ok((StatusCode::OK, Json(result)))
}
