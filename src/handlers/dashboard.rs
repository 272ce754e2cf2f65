// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    // Importamos os models para referenciar no Swagger
    models::dashboard::{
        DashboardFilter, DashboardSummary, ObjectionEntry, SellerPerformance, TopClientEntry,
        TopProductEntry,
    },
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    params(DashboardFilter),
    responses(
        (status = 200, description = "Cards por status, taxa de conversão e ticket médio", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DashboardFilter>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.dashboard_service
        .get_summary(&app_state.db_pool, &principal, filter)
        .await?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/sellers
#[utoipa::path(
    get,
    path = "/api/dashboard/sellers",
    tag = "Dashboard",
    params(DashboardFilter),
    responses(
        (status = 200, description = "Desempenho por vendedor", body = Vec<SellerPerformance>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_sellers(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DashboardFilter>,
) -> Result<impl IntoResponse, AppError> {
    let sellers = app_state.dashboard_service
        .get_seller_performance(&app_state.db_pool, &principal, filter)
        .await?;

    Ok((StatusCode::OK, Json(sellers)))
}

// GET /api/dashboard/top-products
#[utoipa::path(
    get,
    path = "/api/dashboard/top-products",
    tag = "Dashboard",
    params(DashboardFilter),
    responses(
        (status = 200, description = "Top 10 produtos vendidos (por receita)", body = Vec<TopProductEntry>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_top_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DashboardFilter>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.dashboard_service
        .get_top_products(&app_state.db_pool, &principal, filter)
        .await?;

    Ok((StatusCode::OK, Json(products)))
}

// GET /api/dashboard/top-clients
#[utoipa::path(
    get,
    path = "/api/dashboard/top-clients",
    tag = "Dashboard",
    params(DashboardFilter),
    responses(
        (status = 200, description = "Top 10 clientes (por valor vendido)", body = Vec<TopClientEntry>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_top_clients(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DashboardFilter>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.dashboard_service
        .get_top_clients(&app_state.db_pool, &principal, filter)
        .await?;

    Ok((StatusCode::OK, Json(clients)))
}

// GET /api/dashboard/objections
#[utoipa::path(
    get,
    path = "/api/dashboard/objections",
    tag = "Dashboard",
    params(DashboardFilter),
    responses(
        (status = 200, description = "Objeções mais frequentes nas não-vendas", body = Vec<ObjectionEntry>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_objections(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<DashboardFilter>,
) -> Result<impl IntoResponse, AppError> {
    let objections = app_state.dashboard_service
        .get_objections(&app_state.db_pool, &principal, filter)
        .await?;

    Ok((StatusCode::OK, Json(objections)))
}
