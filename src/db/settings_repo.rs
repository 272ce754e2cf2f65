// src/db/settings_repo.rs

use sqlx::{Executor, Postgres};
use crate::{common::error::AppError, models::settings::AppSettings};

#[derive(Clone)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<AppSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // A migration já insere a linha única; o fallback cobre um banco limpo à mão.
        let settings = sqlx::query_as::<_, AppSettings>(
            "SELECT code_prefix, updated_at FROM app_settings WHERE id = TRUE",
        )
            .fetch_optional(executor)
            .await?;

        Ok(settings.unwrap_or_else(|| AppSettings {
            code_prefix: "COT".to_string(),
            updated_at: chrono::Utc::now(),
        }))
    }

    pub async fn update_code_prefix<'e, E>(&self, executor: E, code_prefix: &str) -> Result<AppSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update)
        let settings = sqlx::query_as::<_, AppSettings>(
            r#"
            INSERT INTO app_settings (id, code_prefix)
            VALUES (TRUE, $1)
            ON CONFLICT (id)
            DO UPDATE SET
                code_prefix = EXCLUDED.code_prefix,
                updated_at = NOW()
            RETURNING code_prefix, updated_at
            "#,
        )
            .bind(code_prefix)
            .fetch_one(executor)
            .await?;

        Ok(settings)
    }
}
