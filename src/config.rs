// src/config.rs

use crate::{
    db::{DashboardRepository, UserRepository},
    services::{
        action_service::ActionService, auth::AuthService, catalog_service::CatalogService,
        dashboard_service::DashboardService, deal_service::DealService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct TalkBiConfig {
    pub url: String,
    pub token: String,
}

/// Tudo que vem do ambiente (.env em desenvolvimento).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub talkbi: Option<TalkBiConfig>,
    pub outbox_poll: Duration,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(optional)
    }

    /// Separado do `from_env` para poder ser testado sem mexer no ambiente do processo.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DATABASE_MAX_CONNECTIONS inválido")?,
            None => 5,
        };
        let outbox_poll = match get("OUTBOX_POLL_SECONDS") {
            Some(v) => Duration::from_secs(v.parse().context("OUTBOX_POLL_SECONDS inválido")?),
            None => Duration::from_secs(5),
        };

        // O TalkBI só é ativado com URL e token
        let talkbi = match (get("TALKBI_URL"), get("TALKBI_TOKEN")) {
            (Some(url), Some(token)) => Some(TalkBiConfig { url, token }),
            _ => None,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, max_connections, talkbi, outbox_poll })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub auth_service: AuthService,
    pub deal_service: DealService,
    pub dashboard_service: DashboardService,
    pub catalog_service: CatalogService,
    pub action_service: ActionService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, config: AppConfig) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), db_pool.clone());

        Self {
            auth_service,
            deal_service: DealService::new(db_pool.clone()),
            dashboard_service: DashboardService::new(DashboardRepository::new()),
            catalog_service: CatalogService::new(db_pool.clone()),
            action_service: ActionService::new(db_pool.clone()),
            db_pool,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cotacoes"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.outbox_poll, Duration::from_secs(5));
        assert!(config.talkbi.is_none());
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn talkbi_needs_url_and_token() {
        let base = [("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")];

        let only_url = [base[0], base[1], ("TALKBI_URL", "https://talkbi.example/api/contacts")];
        assert!(AppConfig::from_lookup(lookup(&only_url)).unwrap().talkbi.is_none());

        let both = [
            base[0],
            base[1],
            ("TALKBI_URL", "https://talkbi.example/api/contacts"),
            ("TALKBI_TOKEN", "tk"),
        ];
        let talkbi = AppConfig::from_lookup(lookup(&both)).unwrap().talkbi.unwrap();
        assert_eq!(talkbi.token, "tk");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DATABASE_MAX_CONNECTIONS", "muitas"),
        ]));
        assert!(result.is_err());
    }
}
