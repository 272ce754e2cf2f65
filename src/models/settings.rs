// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Configuração única da aplicação (linha única em app_settings)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Prefixo dos códigos gerados automaticamente
    #[schema(example = "COT")]
    pub code_prefix: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 10, message = "invalid_prefix"))]
    #[schema(example = "ORC")]
    pub code_prefix: String,
}
