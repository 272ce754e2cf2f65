//src/main.rs

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::side_effects::{OutboxWorker, TagGenerator, TalkBiSync};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Consumidor dos efeitos colaterais (etiquetas e TalkBI)
    let pool = app_state.db_pool.clone();
    OutboxWorker::new(pool.clone(), app_state.config.outbox_poll)
        .with_handler(Arc::new(TagGenerator::new(pool.clone())))
        .with_handler(Arc::new(TalkBiSync::new(pool, app_state.config.talkbi.clone())))
        .spawn();

    let addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me));

    let quote_routes = Router::new()
        .route("/"
               ,post(handlers::deals::create_quote)
               .get(handlers::deals::list_quotes)
        )
        .route("/{id}"
               ,get(handlers::deals::get_quote)
               .put(handlers::deals::update_quote)
               .delete(handlers::deals::delete_quote)
        );

    let sale_routes = Router::new()
        .route("/", get(handlers::deals::list_sales))
        .route("/{id}", get(handlers::deals::get_sale));

    let lost_routes = Router::new()
        .route("/", get(handlers::deals::list_lost_deals))
        .route("/{id}", get(handlers::deals::get_lost_deal));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/sellers", get(handlers::dashboard::get_sellers))
        .route("/top-products", get(handlers::dashboard::get_top_products))
        .route("/top-clients", get(handlers::dashboard::get_top_clients))
        .route("/objections", get(handlers::dashboard::get_objections));

    let client_routes = Router::new()
        .route("/", get(handlers::catalog::list_clients))
        .route("/{id}", get(handlers::catalog::get_client));

    // Tudo aqui dentro passa pelo auth_guard
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/quotes", quote_routes)
        .nest("/sales", sale_routes)
        .nest("/lost-deals", lost_routes)
        .route("/deals/{id}/status", post(handlers::deals::convert_deal))
        .nest("/dashboard", dashboard_routes)
        .nest("/clients", client_routes)
        .route("/products", get(handlers::catalog::list_products))
        .route("/settings"
               ,get(handlers::settings::get_settings)
               .put(handlers::settings::update_settings)
        )
        .route("/actions", post(handlers::actions::run_action))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::models::auth::{Claims, UserRole};

    const SECRET: &str = "segredo-de-teste";

    // Pool preguiçoso: as rotas testadas aqui respondem antes de tocar no banco
    fn app() -> Router {
        let config = AppConfig {
            database_url: "postgres://localhost/cotacoes_test".to_string(),
            jwt_secret: SECRET.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            max_connections: 1,
            talkbi: None,
            outbox_poll: Duration::from_secs(5),
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::with_pool(pool, config))
    }

    fn token(role: UserRole) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "Teste".to_string(),
            role,
            exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_session_is_401() {
        let response = app()
            .oneshot(Request::get("/api/quotes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Não autorizado");
    }

    #[tokio::test]
    async fn forged_token_is_401() {
        let response = app()
            .oneshot(
                Request::post("/api/actions")
                    .header(header::AUTHORIZATION, "Bearer nao.e.valido")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"acao":"exportar"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_action_is_400() {
        let response = app()
            .oneshot(
                Request::post("/api/actions")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Vendedor)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"acao":"apagar-tudo","filtros":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Ação não reconhecida: apagar-tudo");
    }

    #[tokio::test]
    async fn sellers_cannot_change_settings() {
        let response = app()
            .oneshot(
                Request::put("/api/settings")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token(UserRole::Vendedor)))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"codePrefix":"ORC"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(Request::get("/api/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/deals/{id}/status"].is_object());
    }
}
