// src/db/event_repo.rs

use sqlx::{Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::event::{DealEvent, DealEventKind, CLAIM_LEASE_SECS},
};

#[derive(Clone)]
pub struct EventRepository;

impl EventRepository {
    pub fn new() -> Self {
        Self
    }

    /// Enfileira um efeito colateral. Chamado dentro da transação da operação.
    pub async fn enqueue<'e, E>(
        &self,
        executor: E,
        kind: DealEventKind,
        client_id: Uuid,
        deal_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO deal_events (kind, client_id, deal_id) VALUES ($1, $2, $3)")
            .bind(kind)
            .bind(client_id)
            .bind(deal_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Reserva um lote de eventos pendentes num único UPDATE (commit imediato).
    /// O SKIP LOCKED evita que duas instâncias peguem o mesmo evento e o
    /// `locked_until` o esconde das próximas rodadas enquanto é processado.
    pub async fn claim_pending<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<DealEvent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let events = sqlx::query_as::<_, DealEvent>(
            r#"
            UPDATE deal_events
            SET locked_until = NOW() + make_interval(secs => $2)
            WHERE id IN (
                SELECT id
                FROM deal_events
                WHERE processed_at IS NULL
                  AND failed_at IS NULL
                  AND (locked_until IS NULL OR locked_until < NOW())
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, kind, client_id, deal_id, attempts
            "#,
        )
            .bind(limit)
            .bind(CLAIM_LEASE_SECS)
            .fetch_all(executor)
            .await?;
        Ok(events)
    }

    pub async fn mark_processed<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE deal_events SET processed_at = NOW(), locked_until = NULL WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn record_failure<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        error: &str,
        give_up: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE deal_events
            SET attempts = attempts + 1,
                last_error = $2,
                locked_until = NULL,
                failed_at = CASE WHEN $3 THEN NOW() ELSE NULL END
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(error)
            .bind(give_up)
            .execute(executor)
            .await?;
        Ok(())
    }
}
