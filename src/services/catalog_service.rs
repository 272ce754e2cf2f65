// src/services/catalog_service.rs
//
// Cadastros de apoio: clientes, produtos e configurações.

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ClientRepository, ProductRepository, SettingsRepository},
    models::{
        auth::Principal,
        client::{Client, ClientDetail, ClientFilter},
        product::Product,
        settings::{AppSettings, UpdateSettingsRequest},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    client_repo: ClientRepository,
    product_repo: ProductRepository,
    settings_repo: SettingsRepository,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            client_repo: ClientRepository::new(),
            product_repo: ProductRepository::new(),
            settings_repo: SettingsRepository::new(),
        }
    }

    pub async fn list_clients(&self, principal: &Principal, filter: ClientFilter) -> Result<Vec<Client>, AppError> {
        self.client_repo
            .list(&self.pool, &filter.scoped(principal), false)
            .await
    }

    pub async fn get_client(&self, principal: &Principal, id: Uuid) -> Result<ClientDetail, AppError> {
        let mut conn = self.pool.acquire().await?;

        let client = self.client_repo
            .find_by_id(&mut *conn, id)
            .await?
            .filter(|c| principal.is_admin() || c.created_by_id == principal.id)
            .ok_or_else(|| AppError::NotFound("Cliente não encontrado".to_string()))?;

        let stats = self.client_repo.deal_stats(&mut *conn, client.id).await?;
        Ok(ClientDetail { client, stats })
    }

    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, AppError> {
        self.product_repo.list(&self.pool, search).await
    }

    pub async fn get_settings(&self) -> Result<AppSettings, AppError> {
        self.settings_repo.get_settings(&self.pool).await
    }

    pub async fn update_settings(&self, payload: UpdateSettingsRequest) -> Result<AppSettings, AppError> {
        payload.validate()?;

        let prefix = payload.code_prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::BadRequest(
                "O prefixo deve conter apenas letras e números.".to_string(),
            ));
        }

        let settings = self.settings_repo.update_code_prefix(&self.pool, &prefix.to_uppercase()).await?;
        tracing::info!("⚙️ Prefixo de código alterado para {}", settings.code_prefix);
        Ok(settings)
    }
}
